//! Custom assertion helpers: partial matchers and DAG-transition checks.

use hostlink_core::models::{Agent, AgentStatus, Task, TaskStatus};

/// Assert two agents are equal ignoring `last_seen`/`updated_at` churn.
pub fn assert_agent_equals(actual: &Agent, expected: &Agent) {
    assert_eq!(actual.id, expected.id, "agent ids don't match");
    assert_eq!(
        actual.fingerprint, expected.fingerprint,
        "agent fingerprints don't match"
    );
    assert_eq!(
        actual.public_key, expected.public_key,
        "agent public keys don't match"
    );
    assert_eq!(actual.status, expected.status, "agent statuses don't match");
    assert_eq!(actual.tags, expected.tags, "agent tags don't match");
}

/// Assert a task-status DAG transition (spec §3) is permitted.
pub fn assert_transition_valid(from: TaskStatus, to: TaskStatus) {
    assert!(
        from.can_transition_to(to),
        "expected {from} -> {to} to be a valid transition, but it's not"
    );
}

/// Assert a task-status DAG transition (spec §3) is rejected.
pub fn assert_transition_invalid(from: TaskStatus, to: TaskStatus) {
    assert!(
        !from.can_transition_to(to),
        "expected {from} -> {to} to be an invalid transition, but it's allowed"
    );
}

/// Assert `tasks` contains one whose id matches `id`.
pub fn assert_contains_task_with_id(tasks: &[Task], id: &str) {
    assert!(
        tasks.iter().any(|t| t.id == id),
        "expected to find task '{id}' in list, found: {:?}",
        tasks.iter().map(|t| &t.id).collect::<Vec<_>>()
    );
}

/// Assert `tasks` is sorted by `created_at` descending, per the list
/// ordering spec §4.5 specifies.
pub fn assert_tasks_sorted_by_created_at_desc(tasks: &[Task]) {
    for window in tasks.windows(2) {
        assert!(
            window[0].created_at >= window[1].created_at,
            "tasks are not sorted by created_at descending: '{}' ({}) comes before '{}' ({})",
            window[0].id,
            window[0].created_at,
            window[1].id,
            window[1].created_at
        );
    }
}

/// Flexible partial-match matcher for [`Agent`].
#[derive(Debug, Default)]
pub struct AgentMatcher {
    pub fingerprint: Option<String>,
    pub status: Option<AgentStatus>,
}

impl AgentMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    pub fn with_status(mut self, status: AgentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, agent: &Agent) -> bool {
        self.fingerprint
            .as_ref()
            .map(|f| *f == agent.fingerprint)
            .unwrap_or(true)
            && self.status.map(|s| s == agent.status).unwrap_or(true)
    }
}

/// Flexible partial-match matcher for [`Task`].
#[derive(Debug, Default)]
pub struct TaskMatcher {
    pub status: Option<TaskStatus>,
    pub agent_id: Option<String>,
}

impl TaskMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.status.map(|s| s == task.status).unwrap_or(true)
            && self
                .agent_id
                .as_ref()
                .map(|a| task.agent_ids.iter().any(|id| id == a))
                .unwrap_or(true)
    }
}
