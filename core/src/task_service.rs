//! Task service (spec §4.5): operator-facing create/list/get plus
//! agent-facing poll and update.

use std::sync::Arc;

use crate::{
    error::{HostlinkError, Result},
    models::{NewTask, Task, TaskFilter, TaskStatus, TaskUpdate},
    repository::TaskRepository,
    validation::HostlinkValidator,
};

pub struct TaskService<T: TaskRepository + ?Sized> {
    repository: Arc<T>,
}

impl<T: TaskRepository + ?Sized> TaskService<T> {
    pub fn new(repository: Arc<T>) -> Self {
        Self { repository }
    }

    /// `POST /api/v2/tasks`. Produces a pending task.
    pub async fn create(&self, new_task: NewTask) -> Result<Task> {
        HostlinkValidator::validate_new_task(&new_task)?;
        self.repository.create(new_task).await
    }

    /// `GET /api/v2/tasks`.
    pub async fn list(&self, filter: TaskFilter) -> Result<Vec<Task>> {
        self.repository.find_all(filter).await
    }

    /// `GET /api/v2/tasks/{id}`.
    pub async fn get(&self, id: &str) -> Result<Task> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| HostlinkError::not_found_task(id))
    }

    /// `GET /api/v1/tasks`, authenticated. Read-only: does not change task
    /// status (spec §4.5 — the subsequent `PUT` is the effective claim).
    pub async fn poll(&self, agent_id: &str) -> Result<Vec<Task>> {
        self.repository.poll_for_agent(agent_id).await
    }

    /// `PUT /api/v1/tasks/{id}`, authenticated. Validates the target
    /// status, the DAG transition, and the `exit_code` requirement on
    /// terminal statuses, then applies the update.
    pub async fn update(&self, id: &str, update: TaskUpdate) -> Result<Task> {
        let target = TaskStatus::parse_agent_settable(&update.status).ok_or_else(|| {
            HostlinkError::Validation(format!(
                "status must be one of running, completed, failed (got '{}')",
                update.status
            ))
        })?;

        if target.is_terminal() && update.exit_code.is_none() {
            return Err(HostlinkError::Validation(
                "exit_code is required when status is completed or failed".to_string(),
            ));
        }

        let current = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| HostlinkError::not_found_task(id))?;

        if !current.status.can_transition_to(target) {
            return Err(HostlinkError::illegal_transition(
                &current.status.to_string(),
                &target.to_string(),
            ));
        }

        self.repository.apply_update(id, target, update).await
    }
}
