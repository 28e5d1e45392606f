//! Registration service (spec §4.2): accepts a registration request,
//! produces or updates the agent atomically, and always emits an audit
//! record — even when the primary write path fails.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    error::{HostlinkError, Result},
    ids::{new_agent_id, new_registration_id},
    models::{Agent, AgentRegistration, AgentStatus, RegisterAgentRequest, RegistrationEvent},
    repository::AgentRepository,
    validation::HostlinkValidator,
};

pub struct RegistrationService<A: AgentRepository + ?Sized> {
    repository: Arc<A>,
}

impl<A: AgentRepository + ?Sized> RegistrationService<A> {
    pub fn new(repository: Arc<A>) -> Self {
        Self { repository }
    }

    /// Runs the full algorithm of spec §4.2. Returns the agent as now
    /// persisted, including id and timestamps.
    pub async fn register(&self, req: RegisterAgentRequest) -> Result<Agent> {
        // Required-field validation, ahead of the token gate (spec §6).
        // token_id/token_key are excluded here — only the token gate below
        // classifies those as invalid, so an empty token surfaces as
        // `InvalidToken`, not a generic validation error.
        if let Err(e) = HostlinkValidator::validate_register_request(&req) {
            self.record_failure(&req, None, &e).await;
            return Err(e);
        }

        // Step 1: token gate, before any I/O.
        if let Err(e) = HostlinkValidator::validate_token_gate(&req.token_id, &req.token_key) {
            self.record_failure(&req, None, &e).await;
            return Err(e);
        }

        // Step 2: fingerprint lookup.
        let existing = match self.repository.find_by_fingerprint(&req.fingerprint).await {
            Ok(existing) => existing,
            Err(e) => {
                self.record_failure(&req, None, &e).await;
                return Err(e);
            }
        };

        let result = match existing {
            None => self.register_new(&req).await,
            Some(agent) => self.register_existing(&req, agent).await,
        };

        if let Err(ref e) = result {
            self.record_failure(&req, None, e).await;
        }

        result
    }

    /// Branch A (spec §4.2 step 3): not found -> new registration.
    async fn register_new(&self, req: &RegisterAgentRequest) -> Result<Agent> {
        let now = Utc::now();
        let agent = Agent {
            id: new_agent_id(),
            fingerprint: req.fingerprint.clone(),
            public_key: req.public_key.clone(),
            public_key_type: req.public_key_type.clone(),
            hostname: req.hostname.clone(),
            ip_address: req.ip_address.clone(),
            mac_address: req.mac_address.clone(),
            machine_id: req.machine_id.clone(),
            status: AgentStatus::Active,
            registered_at: now,
            last_seen: now,
            created_at: now,
            updated_at: now,
            tags: Vec::new(),
        };

        let tags = req.tags.clone().unwrap_or_default();
        let registration = AgentRegistration {
            id: new_registration_id(),
            agent_id: agent.id.clone(),
            fingerprint: req.fingerprint.clone(),
            event: RegistrationEvent::Register,
            success: true,
            error: None,
            hardware_snapshot: req.hardware_info.clone(),
            created_at: now,
        };

        let created = self
            .repository
            .register_new(agent, tags, registration)
            .await?;
        info!(agent_id = %created.id, fingerprint = %req.fingerprint, "agent registered");
        Ok(created)
    }

    /// Branch B (spec §4.2 step 4): found -> re-registration.
    async fn register_existing(&self, req: &RegisterAgentRequest, mut agent: Agent) -> Result<Agent> {
        let now = Utc::now();
        // Fingerprint and id are never changed; every other credential and
        // attribute field is overwritten.
        agent.public_key = req.public_key.clone();
        agent.public_key_type = req.public_key_type.clone();
        agent.hostname = req.hostname.clone();
        agent.ip_address = req.ip_address.clone();
        agent.mac_address = req.mac_address.clone();
        agent.machine_id = req.machine_id.clone();
        agent.last_seen = now;
        agent.updated_at = now;

        // spec §9: an empty/absent tags field on re-registration is a
        // no-op, not a clear. Only a non-empty list replaces the set.
        let tags = match &req.tags {
            Some(tags) if !tags.is_empty() => Some(tags.clone()),
            _ => None,
        };

        let registration = AgentRegistration {
            id: new_registration_id(),
            agent_id: agent.id.clone(),
            fingerprint: req.fingerprint.clone(),
            event: RegistrationEvent::ReRegister,
            success: true,
            error: None,
            hardware_snapshot: req.hardware_info.clone(),
            created_at: now,
        };

        let updated = self
            .repository
            .register_existing(agent, tags, registration)
            .await?;
        info!(agent_id = %updated.id, fingerprint = %req.fingerprint, "agent re-registered");
        Ok(updated)
    }

    /// Step 5 (spec §4.2): best-effort failure audit row, emitted outside
    /// the failed transaction so forensic visibility survives even when
    /// the primary write path collapses. Never escalates its own failure —
    /// the caller's original error is what gets surfaced.
    async fn record_failure(
        &self,
        req: &RegisterAgentRequest,
        agent_id: Option<String>,
        error: &HostlinkError,
    ) {
        let registration = AgentRegistration {
            id: new_registration_id(),
            agent_id: agent_id.unwrap_or_default(),
            fingerprint: req.fingerprint.clone(),
            event: RegistrationEvent::Register,
            success: false,
            error: Some(error.to_string()),
            hardware_snapshot: req.hardware_info.clone(),
            created_at: Utc::now(),
        };

        if let Err(e) = self.repository.add_registration(registration).await {
            warn!(error = %e, "failed to record registration-failure audit row");
        }
    }
}
