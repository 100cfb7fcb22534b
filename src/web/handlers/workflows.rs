//! # Workflow Instance Handlers

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::orchestration::{InstanceSnapshot, StepRecord, WorkflowInstanceId};
use crate::web::errors::{ApiError, ApiResult};
use crate::web::state::AppState;

#[derive(Debug, Serialize)]
pub struct WorkflowStatusResponse {
    pub instance_id: WorkflowInstanceId,
    /// Present when the instance ran in this process
    pub instance: Option<InstanceSnapshot>,
    /// Journaled step results, oldest first
    pub steps: Vec<StepRecord>,
}

/// Instance status from the registry and the step journal: GET /api/workflows/:instance_id
pub async fn get_workflow(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<WorkflowStatusResponse>> {
    let instance_id = WorkflowInstanceId::parse(&raw_id)
        .ok_or_else(|| ApiError::bad_request(format!("Invalid workflow instance id: {raw_id}")))?;

    let instance = state.workflow.registry().get(&instance_id);
    let steps = state.journal().steps_for(instance_id.as_str()).await?;

    if instance.is_none() && steps.is_empty() {
        return Err(ApiError::not_found(format!(
            "Workflow instance {instance_id} not found"
        )));
    }

    Ok(Json(WorkflowStatusResponse {
        instance_id,
        instance,
        steps,
    }))
}
