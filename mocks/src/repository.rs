//! In-memory mock implementations of the three repository traits, with
//! error injection and call-history tracking for exercising the service
//! and API layers without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;

use hostlink_core::{
    error::{HostlinkError, Result},
    ids,
    models::{
        Agent, AgentFilter, AgentRegistration, AgentTag, NewTask, Nonce, Task, TaskFilter,
        TaskStatus, TaskUpdate,
    },
    repository::{AgentRepository, NonceRepository, TaskRepository},
};

/// Shared call-history / error-injection bookkeeping, embedded in each mock.
#[derive(Default)]
struct MockState {
    error: Mutex<Option<HostlinkError>>,
    history: Mutex<Vec<String>>,
}

impl MockState {
    fn record(&self, call: impl Into<String>) {
        self.history.lock().push(call.into());
    }

    fn check(&self) -> Result<()> {
        if let Some(err) = self.error.lock().clone() {
            return Err(err);
        }
        Ok(())
    }
}

/// In-memory [`AgentRepository`], keyed by agent id.
pub struct MockAgentRepository {
    agents: Mutex<HashMap<String, Agent>>,
    registrations: Mutex<Vec<AgentRegistration>>,
    state: MockState,
}

impl Default for MockAgentRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAgentRepository {
    pub fn new() -> Self {
        Self {
            agents: Mutex::new(HashMap::new()),
            registrations: Mutex::new(Vec::new()),
            state: MockState::default(),
        }
    }

    /// Inserts an agent directly, bypassing the registration algorithm —
    /// for tests that just need a pre-existing agent on hand.
    pub fn seed(&self, agent: Agent) {
        self.agents.lock().insert(agent.id.clone(), agent);
    }

    pub fn inject_error(&self, err: HostlinkError) {
        *self.state.error.lock() = Some(err);
    }

    pub fn clear_error(&self) {
        *self.state.error.lock() = None;
    }

    pub fn call_history(&self) -> Vec<String> {
        self.state.history.lock().clone()
    }

    pub fn clear_history(&self) {
        self.state.history.lock().clear();
    }

    pub fn assert_called(&self, call: &str) {
        assert!(
            self.state.history.lock().iter().any(|c| c == call),
            "expected call '{call}' was not recorded; history: {:?}",
            self.state.history.lock()
        );
    }

    pub fn registrations(&self) -> Vec<AgentRegistration> {
        self.registrations.lock().clone()
    }
}

#[async_trait]
impl AgentRepository for MockAgentRepository {
    async fn create(&self, agent: Agent) -> Result<Agent> {
        self.state.record("create");
        self.state.check()?;

        let mut agents = self.agents.lock();
        if agents.values().any(|a| a.fingerprint == agent.fingerprint) {
            return Err(HostlinkError::Conflict(format!(
                "fingerprint '{}' already registered",
                agent.fingerprint
            )));
        }
        agents.insert(agent.id.clone(), agent.clone());
        Ok(agent)
    }

    async fn update(&self, agent: Agent) -> Result<Agent> {
        self.state.record("update");
        self.state.check()?;

        let mut agents = self.agents.lock();
        if !agents.contains_key(&agent.id) {
            return Err(HostlinkError::not_found_agent(&agent.id));
        }
        agents.insert(agent.id.clone(), agent.clone());
        Ok(agent)
    }

    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<Agent>> {
        self.state.record("find_by_fingerprint");
        self.state.check()?;
        Ok(self
            .agents
            .lock()
            .values()
            .find(|a| a.fingerprint == fingerprint)
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Agent>> {
        self.state.record("find_by_id");
        self.state.check()?;
        Ok(self.agents.lock().get(id).cloned())
    }

    async fn find_all(&self, filter: AgentFilter) -> Result<Vec<Agent>> {
        self.state.record("find_all");
        self.state.check()?;
        let mut agents: Vec<Agent> = self
            .agents
            .lock()
            .values()
            .filter(|a| filter.status.map(|s| s == a.status).unwrap_or(true))
            .filter(|a| {
                filter
                    .fingerprint
                    .as_deref()
                    .map(|f| f == a.fingerprint)
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        agents.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        Ok(agents)
    }

    async fn get_public_key(&self, agent_id: &str) -> Result<String> {
        self.state.record("get_public_key");
        self.state.check()?;
        let agents = self.agents.lock();
        let agent = agents
            .get(agent_id)
            .ok_or_else(|| HostlinkError::not_found_agent(agent_id))?;
        if agent.public_key.is_empty() {
            return Err(HostlinkError::PublicKeyNotFound(agent_id.to_string()));
        }
        Ok(agent.public_key.clone())
    }

    async fn add_tags(&self, agent_id: &str, tags: &[AgentTag]) -> Result<()> {
        self.state.record("add_tags");
        self.state.check()?;
        let mut agents = self.agents.lock();
        let agent = agents
            .get_mut(agent_id)
            .ok_or_else(|| HostlinkError::not_found_agent(agent_id))?;
        agent.tags.extend_from_slice(tags);
        Ok(())
    }

    async fn update_tags(&self, agent_id: &str, tags: &[AgentTag]) -> Result<()> {
        self.state.record("update_tags");
        self.state.check()?;
        let mut agents = self.agents.lock();
        let agent = agents
            .get_mut(agent_id)
            .ok_or_else(|| HostlinkError::not_found_agent(agent_id))?;
        agent.tags = tags.to_vec();
        Ok(())
    }

    async fn add_registration(&self, event: AgentRegistration) -> Result<AgentRegistration> {
        self.state.record("add_registration");
        self.state.check()?;
        self.registrations.lock().push(event.clone());
        Ok(event)
    }

    async fn register_new(
        &self,
        agent: Agent,
        tags: Vec<AgentTag>,
        registration: AgentRegistration,
    ) -> Result<Agent> {
        self.state.record("register_new");
        self.state.check()?;

        let mut agents = self.agents.lock();
        if agents.values().any(|a| a.fingerprint == agent.fingerprint) {
            return Err(HostlinkError::Conflict(format!(
                "fingerprint '{}' already registered",
                agent.fingerprint
            )));
        }
        let mut agent = agent;
        agent.tags = tags;
        agents.insert(agent.id.clone(), agent.clone());
        drop(agents);
        self.registrations.lock().push(registration);
        Ok(agent)
    }

    async fn register_existing(
        &self,
        agent: Agent,
        tags: Option<Vec<AgentTag>>,
        registration: AgentRegistration,
    ) -> Result<Agent> {
        self.state.record("register_existing");
        self.state.check()?;

        let mut agents = self.agents.lock();
        let mut agent = agent;
        if let Some(tags) = tags {
            agent.tags = tags;
        } else if let Some(existing) = agents.get(&agent.id) {
            agent.tags = existing.tags.clone();
        }
        agents.insert(agent.id.clone(), agent.clone());
        drop(agents);
        self.registrations.lock().push(registration);
        Ok(agent)
    }

    async fn touch_last_seen(&self, agent_id: &str) -> Result<()> {
        self.state.record("touch_last_seen");
        self.state.check()?;
        if let Some(agent) = self.agents.lock().get_mut(agent_id) {
            agent.last_seen = Utc::now();
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        self.state.check()
    }
}

/// In-memory [`TaskRepository`], keyed by task id.
pub struct MockTaskRepository {
    tasks: Mutex<HashMap<String, Task>>,
    insertion_order: AtomicU64,
    state: MockState,
}

impl Default for MockTaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTaskRepository {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            insertion_order: AtomicU64::new(0),
            state: MockState::default(),
        }
    }

    pub fn seed(&self, task: Task) {
        self.tasks.lock().insert(task.id.clone(), task);
    }

    pub fn inject_error(&self, err: HostlinkError) {
        *self.state.error.lock() = Some(err);
    }

    pub fn clear_error(&self) {
        *self.state.error.lock() = None;
    }

    pub fn call_history(&self) -> Vec<String> {
        self.state.history.lock().clone()
    }

    pub fn clear_history(&self) {
        self.state.history.lock().clear();
    }

    pub fn assert_called(&self, call: &str) {
        assert!(
            self.state.history.lock().iter().any(|c| c == call),
            "expected call '{call}' was not recorded; history: {:?}",
            self.state.history.lock()
        );
    }
}

#[async_trait]
impl TaskRepository for MockTaskRepository {
    async fn create(&self, new_task: NewTask) -> Result<Task> {
        self.state.record("create");
        self.state.check()?;

        let now = Utc::now();
        let task = Task {
            id: ids::new_task_id(),
            command: new_task.command,
            priority: new_task.priority,
            status: TaskStatus::Pending,
            agent_ids: new_task.agent_ids,
            output: None,
            error: None,
            exit_code: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        };
        self.insertion_order.fetch_add(1, Ordering::SeqCst);
        self.tasks.lock().insert(task.id.clone(), task.clone());
        Ok(task)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Task>> {
        self.state.record("find_by_id");
        self.state.check()?;
        Ok(self.tasks.lock().get(id).cloned())
    }

    async fn find_all(&self, filter: TaskFilter) -> Result<Vec<Task>> {
        self.state.record("find_all");
        self.state.check()?;
        let mut tasks: Vec<Task> = self
            .tasks
            .lock()
            .values()
            .filter(|t| filter.status.map(|s| s == t.status).unwrap_or(true))
            .filter(|t| {
                filter
                    .agent_id
                    .as_deref()
                    .map(|a| t.agent_ids.iter().any(|id| id == a))
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn poll_for_agent(&self, agent_id: &str) -> Result<Vec<Task>> {
        self.state.record("poll_for_agent");
        self.state.check()?;
        let mut tasks: Vec<Task> = self
            .tasks
            .lock()
            .values()
            .filter(|t| {
                t.status == TaskStatus::Pending
                    && (t.agent_ids.is_empty() || t.agent_ids.iter().any(|a| a == agent_id))
            })
            .cloned()
            .collect();
        tasks.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(tasks)
    }

    async fn apply_update(
        &self,
        id: &str,
        target: TaskStatus,
        update: TaskUpdate,
    ) -> Result<Task> {
        self.state.record("apply_update");
        self.state.check()?;

        let mut tasks = self.tasks.lock();
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| HostlinkError::not_found_task(id))?;
        task.status = target;
        if update.output.is_some() {
            task.output = update.output;
        }
        if update.error.is_some() {
            task.error = update.error;
        }
        if update.exit_code.is_some() {
            task.exit_code = update.exit_code;
        }
        task.updated_at = Utc::now();
        if target == TaskStatus::Running {
            task.started_at = Some(task.updated_at);
        }
        if target.is_terminal() {
            task.completed_at = Some(task.updated_at);
        }
        Ok(task.clone())
    }

    async fn health_check(&self) -> Result<()> {
        self.state.check()
    }
}

/// In-memory [`NonceRepository`], keyed by nonce value.
pub struct MockNonceRepository {
    nonces: Mutex<HashMap<String, Nonce>>,
    state: MockState,
}

impl Default for MockNonceRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNonceRepository {
    pub fn new() -> Self {
        Self {
            nonces: Mutex::new(HashMap::new()),
            state: MockState::default(),
        }
    }

    pub fn inject_error(&self, err: HostlinkError) {
        *self.state.error.lock() = Some(err);
    }

    pub fn clear_error(&self) {
        *self.state.error.lock() = None;
    }

    pub fn call_history(&self) -> Vec<String> {
        self.state.history.lock().clone()
    }
}

#[async_trait]
impl NonceRepository for MockNonceRepository {
    async fn save(&self, nonce: Nonce) -> Result<()> {
        self.state.record("save");
        self.state.check()?;
        let mut nonces = self.nonces.lock();
        if nonces.contains_key(&nonce.value) {
            return Err(HostlinkError::Conflict(format!(
                "nonce '{}' already present",
                nonce.value
            )));
        }
        nonces.insert(nonce.value.clone(), nonce);
        Ok(())
    }

    async fn exists(&self, value: &str) -> Result<bool> {
        self.state.record("exists");
        self.state.check()?;
        Ok(self.nonces.lock().contains_key(value))
    }

    async fn delete_expired(&self, older_than: Duration) -> Result<u64> {
        self.state.record("delete_expired");
        self.state.check()?;
        let cutoff = Utc::now() - older_than;
        let mut nonces = self.nonces.lock();
        let before = nonces.len();
        nonces.retain(|_, n| n.created_at >= cutoff);
        Ok((before - nonces.len()) as u64)
    }

    async fn count(&self) -> Result<u64> {
        self.state.record("count");
        self.state.check()?;
        let cutoff = Utc::now()
            - Duration::seconds(hostlink_core::repository::NONCE_EXPIRY_SECS);
        Ok(self
            .nonces
            .lock()
            .values()
            .filter(|n| n.created_at >= cutoff)
            .count() as u64)
    }

    async fn health_check(&self) -> Result<()> {
        self.state.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostlink_core::models::AgentStatus;

    fn sample_agent() -> Agent {
        let now = Utc::now();
        Agent {
            id: ids::new_agent_id(),
            fingerprint: "fp-1".to_string(),
            public_key: "base64key".to_string(),
            public_key_type: "rsa".to_string(),
            hostname: Some("host-1".to_string()),
            ip_address: None,
            mac_address: None,
            machine_id: None,
            status: AgentStatus::Active,
            registered_at: now,
            last_seen: now,
            created_at: now,
            updated_at: now,
            tags: Vec::new(),
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_fingerprint() {
        let repo = MockAgentRepository::new();
        repo.create(sample_agent()).await.unwrap();
        let dup = sample_agent();
        let err = repo.create(dup).await.unwrap_err();
        assert!(matches!(err, HostlinkError::Conflict(_)));
    }

    #[tokio::test]
    async fn error_injection_short_circuits_calls() {
        let repo = MockAgentRepository::new();
        repo.inject_error(HostlinkError::Transient("db down".to_string()));
        let err = repo.find_by_id("agt_x").await.unwrap_err();
        assert!(matches!(err, HostlinkError::Transient(_)));
        repo.clear_error();
        assert!(repo.find_by_id("agt_x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn seed_makes_agent_visible_by_id_and_fingerprint() {
        let repo = MockAgentRepository::new();
        let agent = sample_agent();
        repo.seed(agent.clone());
        assert_eq!(
            repo.find_by_id(&agent.id).await.unwrap().unwrap().id,
            agent.id
        );
        assert!(repo
            .find_by_fingerprint(&agent.fingerprint)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn call_history_records_method_names() {
        let repo = MockTaskRepository::new();
        repo.create(NewTask {
            command: "echo hi".to_string(),
            priority: 0,
            agent_ids: vec![],
        })
        .await
        .unwrap();
        repo.assert_called("create");
        assert_eq!(repo.call_history(), vec!["create".to_string()]);
    }

    #[tokio::test]
    async fn duplicate_nonce_rejected() {
        let repo = MockNonceRepository::new();
        let nonce = Nonce {
            value: "n1".to_string(),
            created_at: Utc::now(),
        };
        repo.save(nonce.clone()).await.unwrap();
        let err = repo.save(nonce).await.unwrap_err();
        assert!(matches!(err, HostlinkError::Conflict(_)));
    }
}
