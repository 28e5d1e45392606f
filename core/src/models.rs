use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An agent: a long-running process on a remote host that has registered
/// with the server and polls for tasks (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    /// Opaque id, `agt_<ULID>`. Never reassigned or mutated once set.
    pub id: String,
    /// Agent-chosen stable string; the re-registration pivot. Unique.
    pub fingerprint: String,
    /// Base64-encoded DER public key (RSA-2048 or compatible).
    pub public_key: String,
    pub public_key_type: String,
    pub hostname: Option<String>,
    pub ip_address: Option<String>,
    pub mac_address: Option<String>,
    pub machine_id: Option<String>,
    pub status: AgentStatus,
    /// Set once, at first registration.
    pub registered_at: DateTime<Utc>,
    /// Bumped on re-registration and on each authenticated request.
    pub last_seen: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<AgentTag>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Active,
    Inactive,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentStatus::Active => write!(f, "active"),
            AgentStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// A (key, value) label attached to an agent, used for operator-side
/// targeting. Uniqueness is per (agent, key).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentTag {
    pub key: String,
    pub value: String,
}

/// Append-only audit row for a registration attempt (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentRegistration {
    /// Opaque id, `agr_<ULID>`.
    pub id: String,
    /// Empty when the attempt failed before the agent was created.
    pub agent_id: String,
    pub fingerprint: String,
    pub event: RegistrationEvent,
    pub success: bool,
    pub error: Option<String>,
    pub hardware_snapshot: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RegistrationEvent {
    Register,
    ReRegister,
}

impl fmt::Display for RegistrationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationEvent::Register => write!(f, "register"),
            RegistrationEvent::ReRegister => write!(f, "re-register"),
        }
    }
}

/// Request body for `POST /api/v1/agents/register` (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterAgentRequest {
    pub fingerprint: String,
    pub token_id: String,
    pub token_key: String,
    pub public_key: String,
    pub public_key_type: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub machine_id: Option<String>,
    #[serde(default)]
    pub hardware_info: Option<String>,
    /// Ordered (key, value) pairs. Order is preserved on storage for
    /// traceability but is not semantic. An empty or absent list on
    /// re-registration is a no-op, not a clear (spec §9).
    #[serde(default)]
    pub tags: Option<Vec<AgentTag>>,
}

/// Optional filters for `AgentRepository::find_all` (spec §4.1).
#[derive(Debug, Clone, Default)]
pub struct AgentFilter {
    pub status: Option<AgentStatus>,
    pub fingerprint: Option<String>,
}

/// Response body for `POST /api/v1/agents/register` (spec §6). The
/// `message` differentiates new vs returning registrations by whether
/// `created_at == updated_at` — a fresh agent's two timestamps are
/// stamped from the same `now` and never diverge until its first
/// re-registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegisterAgentResponse {
    pub id: String,
    pub fingerprint: String,
    pub status: String,
    pub message: String,
    pub registered_at: DateTime<Utc>,
}

impl From<Agent> for RegisterAgentResponse {
    fn from(agent: Agent) -> Self {
        let message = if agent.created_at == agent.updated_at {
            "Agent successfully registered"
        } else {
            "Agent successfully re-registered"
        };
        Self {
            id: agent.id,
            fingerprint: agent.fingerprint,
            status: "registered".to_string(),
            message: message.to_string(),
            registered_at: agent.registered_at,
        }
    }
}

/// A shell command dispatched to one or more agents (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Opaque id, `tsk_<ULID>`.
    pub id: String,
    pub command: String,
    /// Higher is sooner when agents dequeue (spec §4.5 poll ordering).
    pub priority: i64,
    pub status: TaskStatus,
    /// Empty set means "any agent may claim this task".
    pub agent_ids: Vec<String>,
    pub output: Option<String>,
    pub error: Option<String>,
    /// Meaningful only when `status` is `completed` or `failed`.
    pub exit_code: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Task lifecycle states. Transitions follow the DAG
/// `Pending -> Running -> {Completed, Failed}`, no backward edges (spec §3).
#[derive(Debug, Clone, Copy, Hash, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl TaskStatus {
    /// Parse the `status` field of an update request. Only the three
    /// agent-settable states are valid targets (spec §4.5).
    pub fn parse_agent_settable(s: &str) -> Option<Self> {
        match s {
            "running" => Some(TaskStatus::Running),
            "completed" => Some(TaskStatus::Completed),
            "failed" => Some(TaskStatus::Failed),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, target: TaskStatus) -> bool {
        matches!(
            (self, target),
            (TaskStatus::Pending, TaskStatus::Running)
                | (TaskStatus::Running, TaskStatus::Completed)
                | (TaskStatus::Running, TaskStatus::Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// Request body for `POST /api/v2/tasks` (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub command: String,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub agent_ids: Vec<String>,
}

/// Request body for `PUT /api/v1/tasks/{id}` (spec §4.5 / §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub status: String,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub exit_code: Option<i32>,
}

/// Optional filters for `TaskRepository::find_all` (spec §4.1 / §4.5 list).
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub agent_id: Option<String>,
}

/// A single-use token bound to one authenticated request (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Nonce {
    pub value: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_status_dag_forward_only() {
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Running));
        assert!(TaskStatus::Running.can_transition_to(TaskStatus::Completed));
        assert!(TaskStatus::Running.can_transition_to(TaskStatus::Failed));

        assert!(!TaskStatus::Pending.can_transition_to(TaskStatus::Completed));
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Running));
        assert!(!TaskStatus::Failed.can_transition_to(TaskStatus::Running));
        assert!(!TaskStatus::Running.can_transition_to(TaskStatus::Pending));
    }

    #[test]
    fn task_status_display_matches_wire_format() {
        assert_eq!(TaskStatus::Pending.to_string(), "pending");
        assert_eq!(TaskStatus::Running.to_string(), "running");
        assert_eq!(TaskStatus::Completed.to_string(), "completed");
        assert_eq!(TaskStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn parse_agent_settable_rejects_pending() {
        assert!(TaskStatus::parse_agent_settable("pending").is_none());
        assert_eq!(
            TaskStatus::parse_agent_settable("running"),
            Some(TaskStatus::Running)
        );
    }

    #[test]
    fn registration_event_display() {
        assert_eq!(RegistrationEvent::Register.to_string(), "register");
        assert_eq!(RegistrationEvent::ReRegister.to_string(), "re-register");
    }

    #[test]
    fn register_response_differentiates_new_from_returning() {
        let now = Utc::now();
        let mut agent = Agent {
            id: "agt_1".to_string(),
            fingerprint: "fp-1".to_string(),
            public_key: "key".to_string(),
            public_key_type: "rsa".to_string(),
            hostname: None,
            ip_address: None,
            mac_address: None,
            machine_id: None,
            status: AgentStatus::Active,
            registered_at: now,
            last_seen: now,
            created_at: now,
            updated_at: now,
            tags: Vec::new(),
        };

        let fresh = RegisterAgentResponse::from(agent.clone());
        assert_eq!(fresh.message, "Agent successfully registered");

        agent.updated_at = now + chrono::Duration::seconds(1);
        let returning = RegisterAgentResponse::from(agent);
        assert_eq!(returning.message, "Agent successfully re-registered");
    }
}
