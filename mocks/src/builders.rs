//! Fluent builders for constructing domain values in tests.

use chrono::{DateTime, Utc};

use hostlink_core::ids;
use hostlink_core::models::{
    Agent, AgentFilter, AgentStatus, AgentTag, NewTask, RegisterAgentRequest, TaskFilter,
    TaskStatus, TaskUpdate,
};

/// Builder for constructing [`Agent`] instances in tests.
pub struct AgentBuilder {
    agent: Agent,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            agent: Agent {
                id: ids::new_agent_id(),
                fingerprint: "test-fingerprint".to_string(),
                public_key: "dGVzdC1rZXk=".to_string(),
                public_key_type: "rsa".to_string(),
                hostname: Some("test-host".to_string()),
                ip_address: None,
                mac_address: None,
                machine_id: None,
                status: AgentStatus::Active,
                registered_at: now,
                last_seen: now,
                created_at: now,
                updated_at: now,
                tags: Vec::new(),
            },
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.agent.id = id.into();
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.agent.fingerprint = fingerprint.into();
        self
    }

    pub fn with_public_key(mut self, public_key: impl Into<String>) -> Self {
        self.agent.public_key = public_key.into();
        self
    }

    pub fn with_status(mut self, status: AgentStatus) -> Self {
        self.agent.status = status;
        self
    }

    pub fn with_tags(mut self, tags: Vec<AgentTag>) -> Self {
        self.agent.tags = tags;
        self
    }

    pub fn with_last_seen(mut self, last_seen: DateTime<Utc>) -> Self {
        self.agent.last_seen = last_seen;
        self
    }

    pub fn build(self) -> Agent {
        self.agent
    }
}

/// Builder for constructing [`RegisterAgentRequest`] instances in tests.
pub struct RegisterRequestBuilder {
    request: RegisterAgentRequest,
}

impl Default for RegisterRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterRequestBuilder {
    pub fn new() -> Self {
        Self {
            request: RegisterAgentRequest {
                fingerprint: "test-fingerprint".to_string(),
                token_id: "tok_1".to_string(),
                token_key: "secret".to_string(),
                public_key: "dGVzdC1rZXk=".to_string(),
                public_key_type: "rsa".to_string(),
                hostname: None,
                ip_address: None,
                mac_address: None,
                machine_id: None,
                hardware_info: None,
                tags: None,
            },
        }
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.request.fingerprint = fingerprint.into();
        self
    }

    pub fn with_token(mut self, id: impl Into<String>, key: impl Into<String>) -> Self {
        self.request.token_id = id.into();
        self.request.token_key = key.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<AgentTag>) -> Self {
        self.request.tags = Some(tags);
        self
    }

    pub fn build(self) -> RegisterAgentRequest {
        self.request
    }
}

/// Builder for constructing [`NewTask`] instances in tests.
pub struct NewTaskBuilder {
    new_task: NewTask,
}

impl Default for NewTaskBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NewTaskBuilder {
    pub fn new() -> Self {
        Self {
            new_task: NewTask {
                command: "echo test".to_string(),
                priority: 0,
                agent_ids: Vec::new(),
            },
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.new_task.command = command.into();
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.new_task.priority = priority;
        self
    }

    pub fn with_agent_ids(mut self, agent_ids: Vec<String>) -> Self {
        self.new_task.agent_ids = agent_ids;
        self
    }

    pub fn build(self) -> NewTask {
        self.new_task
    }
}

/// Builder for constructing [`TaskUpdate`] instances in tests.
pub struct TaskUpdateBuilder {
    update: TaskUpdate,
}

impl Default for TaskUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskUpdateBuilder {
    pub fn new() -> Self {
        Self {
            update: TaskUpdate {
                status: "running".to_string(),
                output: None,
                error: None,
                exit_code: None,
            },
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.update.status = status.into();
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.update.output = Some(output.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.update.error = Some(error.into());
        self
    }

    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.update.exit_code = Some(exit_code);
        self
    }

    pub fn build(self) -> TaskUpdate {
        self.update
    }
}

/// Builder for constructing [`TaskFilter`] instances in tests.
#[derive(Default)]
pub struct TaskFilterBuilder {
    filter: TaskFilter,
}

impl TaskFilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.filter.status = Some(status);
        self
    }

    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.filter.agent_id = Some(agent_id.into());
        self
    }

    pub fn build(self) -> TaskFilter {
        self.filter
    }
}

/// Builder for constructing [`AgentFilter`] instances in tests.
#[derive(Default)]
pub struct AgentFilterBuilder {
    filter: AgentFilter,
}

impl AgentFilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: AgentStatus) -> Self {
        self.filter.status = Some(status);
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.filter.fingerprint = Some(fingerprint.into());
        self
    }

    pub fn build(self) -> AgentFilter {
        self.filter
    }
}
