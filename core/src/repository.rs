use async_trait::async_trait;

use crate::{
    error::Result,
    models::{
        Agent, AgentFilter, AgentRegistration, AgentTag, Nonce, NewTask, Task, TaskFilter,
        TaskStatus, TaskUpdate,
    },
};

/// Persistence for the `Agent` aggregate root (spec §4.1).
///
/// Implementations must be thread-safe and support concurrent access; every
/// method call is expected to honour the ambient cancellation/deadline
/// context of its caller.
#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Assigns an id, sets `status = active`, stamps
    /// `registered_at = last_seen = now`. Fails with
    /// [`crate::error::HostlinkError::Conflict`] if the fingerprint
    /// already exists.
    async fn create(&self, agent: Agent) -> Result<Agent>;

    /// Overwrites mutable attributes by id. Fails with
    /// [`crate::error::HostlinkError::NotFound`] if the id is unknown.
    async fn update(&self, agent: Agent) -> Result<Agent>;

    /// Returns the agent with its tag set eagerly loaded, or `Ok(None)`.
    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<Agent>>;

    /// Returns the agent with its tag set eagerly loaded, or `Ok(None)`.
    async fn find_by_id(&self, id: &str) -> Result<Option<Agent>>;

    /// Ordered by `last_seen` descending; tags preloaded.
    async fn find_all(&self, filter: AgentFilter) -> Result<Vec<Agent>>;

    /// Returns [`crate::error::HostlinkError::PublicKeyNotFound`] if the
    /// agent exists but its stored key is empty — distinct from the agent
    /// not existing at all.
    async fn get_public_key(&self, agent_id: &str) -> Result<String>;

    /// Bulk insert.
    async fn add_tags(&self, agent_id: &str, tags: &[AgentTag]) -> Result<()>;

    /// Deletes all existing tags for the agent, then inserts the new set,
    /// in the same transaction.
    async fn update_tags(&self, agent_id: &str, tags: &[AgentTag]) -> Result<()>;

    /// Appends an audit row, assigning its id.
    async fn add_registration(&self, event: AgentRegistration) -> Result<AgentRegistration>;

    /// Branch A of the registration algorithm (spec §4.2 step 3): create
    /// the agent, optionally add tags, and append the `register` audit
    /// row, all inside one repository transaction. `tags` is empty when
    /// the request carried none.
    async fn register_new(
        &self,
        agent: Agent,
        tags: Vec<AgentTag>,
        registration: AgentRegistration,
    ) -> Result<Agent>;

    /// Branch B of the registration algorithm (spec §4.2 step 4): persist
    /// the overwritten mutable attributes of an existing agent, optionally
    /// replace its tag set, and append the `re-register` audit row, all
    /// inside one repository transaction. `tags = None` means the request
    /// supplied no tags and the existing set must be left untouched
    /// (spec §9: empty/absent tags on re-registration is a no-op, not a
    /// clear).
    async fn register_existing(
        &self,
        agent: Agent,
        tags: Option<Vec<AgentTag>>,
        registration: AgentRegistration,
    ) -> Result<Agent>;

    /// Best-effort bump of `last_seen` to now. Used by the authenticator
    /// on every accepted request (spec §4.3 step 6); failure to bump must
    /// not fail the request.
    async fn touch_last_seen(&self, agent_id: &str) -> Result<()>;

    async fn health_check(&self) -> Result<()>;
}

/// Persistence for the `Task` aggregate root (spec §4.1, §4.5).
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Assigns an id and sets `status = pending`.
    async fn create(&self, task: NewTask) -> Result<Task>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Task>>;

    /// Filters AND together. Ordered by `created_at` descending, ties
    /// broken by insertion order (spec §4.5 list).
    async fn find_all(&self, filter: TaskFilter) -> Result<Vec<Task>>;

    /// Tasks visible to `agent_id`: `status = pending` and (`agent_ids` is
    /// empty OR contains `agent_id`). Ordered by `priority` descending
    /// then `created_at` ascending (spec §4.5 poll). Read-only — does not
    /// mutate task status.
    async fn poll_for_agent(&self, agent_id: &str) -> Result<Vec<Task>>;

    /// Replaces the mutable result fields and advances `status`.
    /// Implementations must reject the write (NotFound/IllegalTransition)
    /// rather than silently clamp if the target status does not follow
    /// from the current one per the §3 DAG.
    async fn apply_update(&self, id: &str, target: TaskStatus, update: TaskUpdate) -> Result<Task>;

    async fn health_check(&self) -> Result<()>;
}

/// Age past which a nonce is considered expired for [`NonceRepository::count`]
/// purposes, independent of how often the sweeper actually runs (spec §4.4).
/// Matches the default signature-timestamp skew window.
pub const NONCE_EXPIRY_SECS: i64 = 300;

/// Persistence for the `Nonce` aggregate root — the atomic dedup surface
/// for request-signature replay defense (spec §4.1, §4.4).
#[async_trait]
pub trait NonceRepository: Send + Sync {
    /// Fails with [`crate::error::HostlinkError::Conflict`] on a duplicate
    /// `value` — the unique constraint is what makes insert-and-check
    /// atomic under concurrent requests.
    async fn save(&self, nonce: Nonce) -> Result<()>;

    async fn exists(&self, value: &str) -> Result<bool>;

    /// Deletes nonces with `created_at < now - older_than` and returns the
    /// count removed.
    async fn delete_expired(&self, older_than: chrono::Duration) -> Result<u64>;

    /// Count of non-expired entries (`created_at >= now - NONCE_EXPIRY_SECS`),
    /// used for health/metrics. Must not rely on the sweeper having already
    /// run — rows older than the window are excluded by the query itself.
    async fn count(&self) -> Result<u64>;

    async fn health_check(&self) -> Result<()>;
}
