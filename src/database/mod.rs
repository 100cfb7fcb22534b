//! # Database Operations
//!
//! PostgreSQL connection pooling and the schema migration runner.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use feedback_core::config::DatabaseConfig;
//! use feedback_core::database::{DatabaseConnection, DatabaseMigrations};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = DatabaseConnection::connect(&DatabaseConfig::default()).await?;
//! DatabaseMigrations::run_all(db.pool(), Path::new("migrations")).await?;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod migrations;

pub use connection::DatabaseConnection;
pub use migrations::{DatabaseMigrations, Migration};
