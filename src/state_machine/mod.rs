// State machine module for feedback workflow instances
//
// Guards the fixed step order retrieve -> analyze-sentiment -> extract-topics -> save
// and records the transition history shown by the instance status endpoint.

pub mod errors;
pub mod events;
pub mod states;
pub mod workflow_state_machine;

pub use errors::{StateMachineError, StateMachineResult};
pub use events::WorkflowEvent;
pub use states::WorkflowState;
pub use workflow_state_machine::{StateTransition, WorkflowStateMachine};
