//! End-to-end scenarios for agent registration, exercised against an
//! in-memory `AgentRepository` so they run without a database.

use async_trait::async_trait;
use hostlink_core::{
    Agent, AgentFilter, AgentRegistration, AgentTag, HostlinkError, RegisterAgentRequest,
    RegistrationService, Result,
};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MemAgentRepository {
    agents: Mutex<Vec<Agent>>,
    registrations: Mutex<Vec<AgentRegistration>>,
}

#[async_trait]
impl hostlink_core::AgentRepository for MemAgentRepository {
    async fn create(&self, agent: Agent) -> Result<Agent> {
        let mut agents = self.agents.lock().unwrap();
        if agents.iter().any(|a| a.fingerprint == agent.fingerprint) {
            return Err(HostlinkError::Conflict(format!(
                "fingerprint '{}' already registered",
                agent.fingerprint
            )));
        }
        agents.push(agent.clone());
        Ok(agent)
    }

    async fn update(&self, agent: Agent) -> Result<Agent> {
        let mut agents = self.agents.lock().unwrap();
        let slot = agents
            .iter_mut()
            .find(|a| a.id == agent.id)
            .ok_or_else(|| HostlinkError::not_found_agent(&agent.id))?;
        *slot = agent.clone();
        Ok(agent)
    }

    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<Agent>> {
        Ok(self
            .agents
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.fingerprint == fingerprint)
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Agent>> {
        Ok(self.agents.lock().unwrap().iter().find(|a| a.id == id).cloned())
    }

    async fn find_all(&self, _filter: AgentFilter) -> Result<Vec<Agent>> {
        Ok(self.agents.lock().unwrap().clone())
    }

    async fn get_public_key(&self, agent_id: &str) -> Result<String> {
        let agents = self.agents.lock().unwrap();
        let agent = agents
            .iter()
            .find(|a| a.id == agent_id)
            .ok_or_else(|| HostlinkError::not_found_agent(agent_id))?;
        if agent.public_key.is_empty() {
            return Err(HostlinkError::PublicKeyNotFound(agent_id.to_string()));
        }
        Ok(agent.public_key.clone())
    }

    async fn add_tags(&self, agent_id: &str, tags: &[AgentTag]) -> Result<()> {
        let mut agents = self.agents.lock().unwrap();
        let agent = agents
            .iter_mut()
            .find(|a| a.id == agent_id)
            .ok_or_else(|| HostlinkError::not_found_agent(agent_id))?;
        agent.tags.extend_from_slice(tags);
        Ok(())
    }

    async fn update_tags(&self, agent_id: &str, tags: &[AgentTag]) -> Result<()> {
        let mut agents = self.agents.lock().unwrap();
        let agent = agents
            .iter_mut()
            .find(|a| a.id == agent_id)
            .ok_or_else(|| HostlinkError::not_found_agent(agent_id))?;
        agent.tags = tags.to_vec();
        Ok(())
    }

    async fn add_registration(&self, event: AgentRegistration) -> Result<AgentRegistration> {
        self.registrations.lock().unwrap().push(event.clone());
        Ok(event)
    }

    async fn register_new(
        &self,
        agent: Agent,
        tags: Vec<AgentTag>,
        registration: AgentRegistration,
    ) -> Result<Agent> {
        let created = self.create(agent).await?;
        if !tags.is_empty() {
            self.add_tags(&created.id, &tags).await?;
        }
        self.add_registration(registration).await?;
        self.find_by_id(&created.id).await.map(|a| a.unwrap())
    }

    async fn register_existing(
        &self,
        agent: Agent,
        tags: Option<Vec<AgentTag>>,
        registration: AgentRegistration,
    ) -> Result<Agent> {
        let updated = self.update(agent).await?;
        if let Some(tags) = tags {
            self.update_tags(&updated.id, &tags).await?;
        }
        self.add_registration(registration).await?;
        self.find_by_id(&updated.id).await.map(|a| a.unwrap())
    }

    async fn touch_last_seen(&self, agent_id: &str) -> Result<()> {
        let mut agents = self.agents.lock().unwrap();
        if let Some(agent) = agents.iter_mut().find(|a| a.id == agent_id) {
            agent.last_seen = chrono::Utc::now();
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

fn request(fingerprint: &str, public_key: &str) -> RegisterAgentRequest {
    RegisterAgentRequest {
        fingerprint: fingerprint.to_string(),
        token_id: "t1".to_string(),
        token_key: "k1".to_string(),
        public_key: public_key.to_string(),
        public_key_type: "rsa".to_string(),
        hostname: None,
        ip_address: None,
        mac_address: None,
        machine_id: None,
        hardware_info: Some("cpu=4;ram=8G".to_string()),
        tags: Some(vec![AgentTag {
            key: "env".to_string(),
            value: "prod".to_string(),
        }]),
    }
}

/// Scenario 1 (spec §8): new registration.
#[tokio::test]
async fn scenario_new_registration() {
    let repo = Arc::new(MemAgentRepository::default());
    let service = RegistrationService::new(repo.clone());

    let agent = service.register(request("fp-a", "key-v1")).await.unwrap();

    assert_eq!(agent.status, hostlink_core::AgentStatus::Active);
    assert_eq!(agent.tags.len(), 1);
    assert_eq!(agent.created_at, agent.updated_at);

    let registrations = repo.registrations.lock().unwrap();
    assert_eq!(registrations.len(), 1);
    assert!(registrations[0].success);
    assert_eq!(
        registrations[0].event,
        hostlink_core::RegistrationEvent::Register
    );
}

/// Scenario 2 (spec §8): re-registration updates the key but keeps the id.
#[tokio::test]
async fn scenario_reregistration_updates_key_keeps_id() {
    let repo = Arc::new(MemAgentRepository::default());
    let service = RegistrationService::new(repo.clone());

    let first = service.register(request("fp-a", "key-v1")).await.unwrap();
    let second = service.register(request("fp-a", "key-v2")).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.registered_at, second.registered_at);
    assert_eq!(second.public_key, "key-v2");

    let registrations = repo.registrations.lock().unwrap();
    assert_eq!(registrations.len(), 2);
    assert_eq!(
        registrations[0].event,
        hostlink_core::RegistrationEvent::Register
    );
    assert_eq!(
        registrations[1].event,
        hostlink_core::RegistrationEvent::ReRegister
    );
}

/// Scenario 3 (spec §8): invalid token.
#[tokio::test]
async fn scenario_invalid_token_leaves_no_agent_but_one_audit_row() {
    let repo = Arc::new(MemAgentRepository::default());
    let service = RegistrationService::new(repo.clone());

    let mut req = request("fp-b", "key-v1");
    req.token_id = String::new();

    let err = service.register(req).await.unwrap_err();
    assert!(matches!(err, HostlinkError::InvalidToken));

    assert!(repo.agents.lock().unwrap().is_empty());
    let registrations = repo.registrations.lock().unwrap();
    assert_eq!(registrations.len(), 1);
    assert!(!registrations[0].success);
}

/// Invariant (spec §8): exactly one row per fingerprint regardless of
/// how many registration attempts have occurred.
#[tokio::test]
async fn exactly_one_agent_row_per_fingerprint() {
    let repo = Arc::new(MemAgentRepository::default());
    let service = RegistrationService::new(repo.clone());

    for i in 0..5 {
        service
            .register(request("fp-stable", &format!("key-v{i}")))
            .await
            .unwrap();
    }

    let agents = repo.agents.lock().unwrap();
    assert_eq!(agents.iter().filter(|a| a.fingerprint == "fp-stable").count(), 1);
}

/// Boundary behaviour (spec §8): an empty tags list on re-registration
/// preserves the existing tags rather than clearing them.
#[tokio::test]
async fn empty_tags_on_reregistration_is_a_no_op() {
    let repo = Arc::new(MemAgentRepository::default());
    let service = RegistrationService::new(repo.clone());

    let first = service.register(request("fp-c", "key-v1")).await.unwrap();
    assert_eq!(first.tags.len(), 1);

    let mut follow_up = request("fp-c", "key-v2");
    follow_up.tags = Some(vec![]);
    let second = service.register(follow_up).await.unwrap();

    assert_eq!(second.tags.len(), 1);
    assert_eq!(second.tags[0].key, "env");
}
