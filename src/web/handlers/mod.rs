//! # Web API Request Handlers
//!
//! HTTP handlers grouped by functional area.

pub mod analysis;
pub mod chat;
pub mod feedback;
pub mod health;
pub mod stats;
pub mod workflows;
