//! In-process view of workflow instances: which are live, where they are in the
//! state machine, and how the finished ones ended.

use super::types::WorkflowInstanceId;
use crate::state_machine::{StateTransition, WorkflowState};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceSnapshot {
    pub instance_id: WorkflowInstanceId,
    pub feedback_id: i64,
    pub state: WorkflowState,
    pub transitions: Vec<StateTransition>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Number of times this instance id has been started in this process
    pub runs: u32,
}

impl InstanceSnapshot {
    fn new(instance_id: WorkflowInstanceId, feedback_id: i64, runs: u32) -> Self {
        let now = Utc::now();
        Self {
            instance_id,
            feedback_id,
            state: WorkflowState::default(),
            transitions: Vec::new(),
            error: None,
            started_at: now,
            updated_at: now,
            runs,
        }
    }

    pub fn is_live(&self) -> bool {
        !self.state.is_terminal()
    }
}

/// Result of [`InstanceRegistry::claim`]
#[derive(Debug, Clone, PartialEq)]
pub enum Claim {
    Acquired { previous: Option<InstanceSnapshot> },
    /// A run with this id is still live
    Live,
}

#[derive(Debug, Default)]
pub struct InstanceRegistry {
    instances: DashMap<WorkflowInstanceId, InstanceSnapshot>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim an instance id for a new run. A finished snapshot being replaced
    /// is handed back so an unstarted claim can be undone with [`Self::release`].
    pub fn claim(&self, instance_id: &WorkflowInstanceId, feedback_id: i64) -> Claim {
        match self.instances.entry(instance_id.clone()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_live() {
                    return Claim::Live;
                }
                let runs = occupied.get().runs + 1;
                let previous =
                    occupied.insert(InstanceSnapshot::new(instance_id.clone(), feedback_id, runs));
                Claim::Acquired {
                    previous: Some(previous),
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(InstanceSnapshot::new(instance_id.clone(), feedback_id, 1));
                Claim::Acquired { previous: None }
            }
        }
    }

    /// Returns false while a run with the same id is still live
    pub fn try_claim(&self, instance_id: &WorkflowInstanceId, feedback_id: i64) -> bool {
        matches!(self.claim(instance_id, feedback_id), Claim::Acquired { .. })
    }

    /// Record the latest state of a run
    pub fn update(
        &self,
        instance_id: &WorkflowInstanceId,
        state: WorkflowState,
        transitions: &[StateTransition],
        error: Option<String>,
    ) {
        if let Some(mut snapshot) = self.instances.get_mut(instance_id) {
            snapshot.state = state;
            snapshot.transitions = transitions.to_vec();
            snapshot.error = error;
            snapshot.updated_at = Utc::now();
        }
    }

    /// Undo a claim whose run never started, restoring the snapshot it replaced
    pub fn release(&self, instance_id: &WorkflowInstanceId, previous: Option<InstanceSnapshot>) {
        match previous {
            Some(previous) => {
                if let Some(mut snapshot) = self.instances.get_mut(instance_id) {
                    if snapshot.is_live() {
                        *snapshot = previous;
                    }
                }
            }
            None => {
                self.instances
                    .remove_if(instance_id, |_, snapshot| snapshot.is_live());
            }
        }
    }

    pub fn get(&self, instance_id: &WorkflowInstanceId) -> Option<InstanceSnapshot> {
        self.instances
            .get(instance_id)
            .map(|snapshot| snapshot.value().clone())
    }

    pub fn live_count(&self) -> usize {
        self.instances
            .iter()
            .filter(|snapshot| snapshot.is_live())
            .count()
    }
}
