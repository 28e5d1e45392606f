//! Task routes (spec §4.5 / §6): `v2` operator-facing CRUD plus the `v1`
//! signed poll/update surface used by agents.

use std::collections::HashMap;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use hostlink_core::{NewTask, Task, TaskFilter, TaskService, TaskStatus, TaskUpdate};

use crate::auth::AuthenticatedAgent;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    Json(new_task): Json<NewTask>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let service = TaskService::new(state.tasks);
    let task = service.create(new_task).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Vec<Task>>> {
    let filter = TaskFilter {
        status: params.get("status").and_then(|s| match s.as_str() {
            "pending" => Some(TaskStatus::Pending),
            "running" => Some(TaskStatus::Running),
            "completed" => Some(TaskStatus::Completed),
            "failed" => Some(TaskStatus::Failed),
            _ => None,
        }),
        agent_id: params.get("agent").cloned(),
    };
    let service = TaskService::new(state.tasks);
    let tasks = service.list(filter).await?;
    Ok(Json(tasks))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Task>> {
    let service = TaskService::new(state.tasks);
    let task = service.get(&id).await?;
    Ok(Json(task))
}

/// `GET /api/v1/tasks`, signature-authenticated. The agent identity comes
/// from [`AuthenticatedAgent`], inserted by the [`crate::auth`] middleware —
/// never from a query parameter the caller could spoof.
pub async fn poll(
    State(state): State<AppState>,
    Extension(AuthenticatedAgent(agent_id)): Extension<AuthenticatedAgent>,
) -> ApiResult<Json<Vec<Task>>> {
    let service = TaskService::new(state.tasks);
    let tasks = service.poll(&agent_id).await?;
    Ok(Json(tasks))
}

/// `PUT /api/v1/tasks/{id}`, signature-authenticated.
pub async fn update(
    State(state): State<AppState>,
    Extension(AuthenticatedAgent(_agent_id)): Extension<AuthenticatedAgent>,
    Path(id): Path<String>,
    Json(update): Json<TaskUpdate>,
) -> ApiResult<Json<Task>> {
    let service = TaskService::new(state.tasks);
    let task = service.update(&id, update).await?;
    Ok(Json(task))
}
