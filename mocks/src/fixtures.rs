//! Pre-built test data: standard agents, tasks and nonces in various states.

use chrono::Utc;

use hostlink_core::ids;
use hostlink_core::models::{
    Agent, AgentStatus, AgentTag, NewTask, Nonce, Task, TaskStatus, TaskUpdate,
};

/// A single active agent with a stable fingerprint.
pub fn create_test_agent() -> Agent {
    let now = Utc::now();
    Agent {
        id: ids::new_agent_id(),
        fingerprint: "fixture-fingerprint".to_string(),
        public_key: "dGVzdC1wdWJsaWMta2V5".to_string(),
        public_key_type: "rsa".to_string(),
        hostname: Some("fixture-host".to_string()),
        ip_address: Some("10.0.0.1".to_string()),
        mac_address: None,
        machine_id: None,
        status: AgentStatus::Active,
        registered_at: now,
        last_seen: now,
        created_at: now,
        updated_at: now,
        tags: vec![AgentTag {
            key: "env".to_string(),
            value: "test".to_string(),
        }],
    }
}

/// An agent with the given status, otherwise identical to [`create_test_agent`].
pub fn create_test_agent_with_status(status: AgentStatus) -> Agent {
    let mut agent = create_test_agent();
    agent.status = status;
    agent
}

/// Several agents with distinct fingerprints, for list/filter tests.
pub fn create_test_agents(count: usize) -> Vec<Agent> {
    (1..=count)
        .map(|i| {
            let mut agent = create_test_agent();
            agent.id = ids::new_agent_id();
            agent.fingerprint = format!("fixture-fingerprint-{i}");
            agent.hostname = Some(format!("fixture-host-{i}"));
            agent
        })
        .collect()
}

/// A pending task with no targeting, visible to every agent's poll.
pub fn create_test_task() -> Task {
    let now = Utc::now();
    Task {
        id: ids::new_task_id(),
        command: "echo fixture".to_string(),
        priority: 0,
        status: TaskStatus::Pending,
        agent_ids: Vec::new(),
        output: None,
        error: None,
        exit_code: None,
        created_at: now,
        updated_at: now,
        started_at: None,
        completed_at: None,
    }
}

/// A task in the given status, with timestamps filled in consistently.
pub fn create_test_task_with_status(status: TaskStatus) -> Task {
    let mut task = create_test_task();
    task.status = status;
    let now = Utc::now();
    if status == TaskStatus::Running || status.is_terminal() {
        task.started_at = Some(now);
    }
    if status.is_terminal() {
        task.completed_at = Some(now);
        task.exit_code = Some(0);
    }
    task
}

/// One task per lifecycle status (spec §3 DAG).
pub fn create_tasks_in_all_statuses() -> Vec<Task> {
    vec![
        create_test_task_with_status(TaskStatus::Pending),
        create_test_task_with_status(TaskStatus::Running),
        create_test_task_with_status(TaskStatus::Completed),
        create_test_task_with_status(TaskStatus::Failed),
    ]
}

/// A standard [`NewTask`] request body.
pub fn create_new_task() -> NewTask {
    NewTask {
        command: "echo fixture".to_string(),
        priority: 0,
        agent_ids: Vec::new(),
    }
}

/// A task update moving to `running`.
pub fn create_running_update() -> TaskUpdate {
    TaskUpdate {
        status: "running".to_string(),
        output: None,
        error: None,
        exit_code: None,
    }
}

/// A task update moving to `completed` with a zero exit code.
pub fn create_completed_update() -> TaskUpdate {
    TaskUpdate {
        status: "completed".to_string(),
        output: Some("done\n".to_string()),
        error: None,
        exit_code: Some(0),
    }
}

/// A fresh, unexpired nonce.
pub fn create_test_nonce() -> Nonce {
    Nonce {
        value: format!("nonce-{}", ids::new_task_id()),
        created_at: Utc::now(),
    }
}

/// A nonce stamped as older than `age`, for expiry-sweep tests.
pub fn create_expired_nonce(age: chrono::Duration) -> Nonce {
    Nonce {
        value: format!("nonce-{}", ids::new_task_id()),
        created_at: Utc::now() - age,
    }
}
