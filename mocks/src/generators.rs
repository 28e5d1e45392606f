//! Random test data generators, for fuzz-ish unit tests and proptest strategies.

use chrono::Utc;
use fake::faker::lorem::en::Word;
use fake::Fake;
use proptest::prelude::*;
use rand::Rng;

use hostlink_core::ids;
use hostlink_core::models::{Agent, AgentStatus, NewTask, Task, TaskStatus};

/// A realistic-looking fingerprint: `host-<8 hex chars>`.
pub fn generate_fingerprint() -> String {
    let suffix: String = (0..8)
        .map(|_| {
            let n: u8 = rand::thread_rng().gen_range(0..16);
            std::char::from_digit(n as u32, 16).unwrap()
        })
        .collect();
    format!("host-{suffix}")
}

/// A realistic hostname.
pub fn generate_hostname() -> String {
    let word: String = Word().fake();
    format!("{word}-01")
}

/// A realistic shell command for a task.
pub fn generate_command() -> String {
    let words: Vec<String> = (0..3).map(|_| Word().fake()).collect();
    format!("echo {}", words.join(" "))
}

/// A random, syntactically plausible IPv4 address.
pub fn generate_ip_address() -> String {
    let mut rng = rand::thread_rng();
    format!(
        "10.{}.{}.{}",
        rng.gen_range(0..256),
        rng.gen_range(0..256),
        rng.gen_range(1..255)
    )
}

/// A random agent with realistic-looking fields and a fresh id/fingerprint.
pub fn generate_random_agent() -> Agent {
    let now = Utc::now();
    Agent {
        id: ids::new_agent_id(),
        fingerprint: generate_fingerprint(),
        public_key: "dGVzdC1wdWJsaWMta2V5".to_string(),
        public_key_type: "rsa".to_string(),
        hostname: Some(generate_hostname()),
        ip_address: Some(generate_ip_address()),
        mac_address: None,
        machine_id: None,
        status: generate_random_agent_status(),
        registered_at: now,
        last_seen: now,
        created_at: now,
        updated_at: now,
        tags: Vec::new(),
    }
}

pub fn generate_random_agent_status() -> AgentStatus {
    if rand::thread_rng().gen_bool(0.5) {
        AgentStatus::Active
    } else {
        AgentStatus::Inactive
    }
}

/// A random [`NewTask`] request with a realistic command and priority.
pub fn generate_random_new_task() -> NewTask {
    NewTask {
        command: generate_command(),
        priority: rand::thread_rng().gen_range(0..10),
        agent_ids: Vec::new(),
    }
}

/// A random, fully-formed task in a random lifecycle status.
pub fn generate_random_task() -> Task {
    let now = Utc::now();
    let status = generate_random_task_status();
    Task {
        id: ids::new_task_id(),
        command: generate_command(),
        priority: rand::thread_rng().gen_range(0..10),
        status,
        agent_ids: Vec::new(),
        output: None,
        error: None,
        exit_code: if status.is_terminal() { Some(0) } else { None },
        created_at: now,
        updated_at: now,
        started_at: None,
        completed_at: None,
    }
}

pub fn generate_random_task_status() -> TaskStatus {
    let statuses = [
        TaskStatus::Pending,
        TaskStatus::Running,
        TaskStatus::Completed,
        TaskStatus::Failed,
    ];
    statuses[rand::thread_rng().gen_range(0..statuses.len())]
}

/// Proptest strategy for the four task statuses.
pub fn task_status_strategy() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::Pending),
        Just(TaskStatus::Running),
        Just(TaskStatus::Completed),
        Just(TaskStatus::Failed),
    ]
}

/// Proptest strategy for a plausible fingerprint string.
pub fn fingerprint_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9-]{5,32}".prop_map(|s| s)
}

/// Proptest strategy for a plausible shell command.
pub fn command_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ._-]{1,80}".prop_map(|s| s)
}
