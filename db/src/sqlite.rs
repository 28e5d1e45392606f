use crate::common::{
    agent_status_to_string, row_to_agent, row_to_agent_tag, row_to_task,
    sqlx_error_to_hostlink_error, task_status_to_string,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use hostlink_core::{
    Agent, AgentFilter, AgentRegistration, AgentRepository, AgentStatus, AgentTag, HostlinkError,
    Nonce, NonceRepository, NewTask, Result, Task, TaskFilter, TaskRepository, TaskStatus,
    TaskUpdate,
};
use sqlx::{migrate::MigrateDatabase, Row, Sqlite, SqlitePool};

/// Shared connection-pool setup for every repository in this crate — they
/// all talk to the same SQLite database, so one pool is opened once and
/// handed to each repository struct.
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let db_url = if database_url.starts_with(":memory:") {
        database_url.to_string()
    } else if database_url.starts_with("sqlite://") {
        database_url.to_string()
    } else {
        format!("sqlite://{database_url}")
    };

    if !db_url.contains(":memory:") && !Sqlite::database_exists(&db_url).await.unwrap_or(false) {
        Sqlite::create_database(&db_url)
            .await
            .map_err(|e| HostlinkError::Transient(format!("failed to create database: {e}")))?;
    }

    let connect_options = if db_url.contains(":memory:") {
        sqlx::sqlite::SqliteConnectOptions::new()
            .filename(&db_url)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Memory)
            .busy_timeout(std::time::Duration::from_secs(5))
            .foreign_keys(true)
    } else {
        sqlx::sqlite::SqliteConnectOptions::new()
            .filename(db_url.replace("sqlite://", ""))
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .foreign_keys(true)
    };

    SqlitePool::connect_with(connect_options)
        .await
        .map_err(sqlx_error_to_hostlink_error)
}

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .map_err(|e| HostlinkError::Transient(format!("migration failed: {e}")))?;
    tracing::info!("database migrations completed");
    Ok(())
}

#[derive(Debug, Clone)]
pub struct SqliteAgentRepository {
    pool: SqlitePool,
}

impl SqliteAgentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn load_tags(&self, agent_id: &str) -> Result<Vec<AgentTag>> {
        let rows = sqlx::query("SELECT key, value FROM agent_tags WHERE agent_id = ?")
            .bind(agent_id)
            .fetch_all(&self.pool)
            .await
            .map_err(sqlx_error_to_hostlink_error)?;
        Ok(rows.iter().map(row_to_agent_tag).collect())
    }

    async fn insert_tags_tx(
        tx: &mut sqlx::Transaction<'_, Sqlite>,
        agent_id: &str,
        tags: &[AgentTag],
    ) -> Result<()> {
        for tag in tags {
            sqlx::query("INSERT INTO agent_tags (agent_id, key, value) VALUES (?, ?, ?)")
                .bind(agent_id)
                .bind(&tag.key)
                .bind(&tag.value)
                .execute(&mut **tx)
                .await
                .map_err(sqlx_error_to_hostlink_error)?;
        }
        Ok(())
    }

    async fn insert_registration_tx(
        tx: &mut sqlx::Transaction<'_, Sqlite>,
        reg: &AgentRegistration,
    ) -> Result<()> {
        let agent_id = if reg.agent_id.is_empty() {
            None
        } else {
            Some(reg.agent_id.clone())
        };
        sqlx::query(
            r#"
            INSERT INTO agent_registrations
                (id, agent_id, fingerprint, event, success, error, hardware_snapshot, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&reg.id)
        .bind(agent_id)
        .bind(&reg.fingerprint)
        .bind(reg.event.to_string())
        .bind(reg.success)
        .bind(&reg.error)
        .bind(&reg.hardware_snapshot)
        .bind(reg.created_at)
        .execute(&mut **tx)
        .await
        .map_err(sqlx_error_to_hostlink_error)?;
        Ok(())
    }
}

#[async_trait]
impl AgentRepository for SqliteAgentRepository {
    async fn create(&self, agent: Agent) -> Result<Agent> {
        sqlx::query(
            r#"
            INSERT INTO agents
                (id, fingerprint, public_key, public_key_type, hostname, ip_address,
                 mac_address, machine_id, status, registered_at, last_seen, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&agent.id)
        .bind(&agent.fingerprint)
        .bind(&agent.public_key)
        .bind(&agent.public_key_type)
        .bind(&agent.hostname)
        .bind(&agent.ip_address)
        .bind(&agent.mac_address)
        .bind(&agent.machine_id)
        .bind(agent_status_to_string(agent.status))
        .bind(agent.registered_at)
        .bind(agent.last_seen)
        .bind(agent.created_at)
        .bind(agent.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                HostlinkError::Conflict(format!(
                    "fingerprint '{}' already registered",
                    agent.fingerprint
                ))
            }
            other => sqlx_error_to_hostlink_error(other),
        })?;
        Ok(agent)
    }

    async fn update(&self, agent: Agent) -> Result<Agent> {
        let result = sqlx::query(
            r#"
            UPDATE agents SET
                public_key = ?, public_key_type = ?, hostname = ?, ip_address = ?,
                mac_address = ?, machine_id = ?, status = ?, last_seen = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&agent.public_key)
        .bind(&agent.public_key_type)
        .bind(&agent.hostname)
        .bind(&agent.ip_address)
        .bind(&agent.mac_address)
        .bind(&agent.machine_id)
        .bind(agent_status_to_string(agent.status))
        .bind(agent.last_seen)
        .bind(agent.updated_at)
        .bind(&agent.id)
        .execute(&self.pool)
        .await
        .map_err(sqlx_error_to_hostlink_error)?;

        if result.rows_affected() == 0 {
            return Err(HostlinkError::not_found_agent(&agent.id));
        }
        Ok(agent)
    }

    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<Agent>> {
        let row = sqlx::query("SELECT * FROM agents WHERE fingerprint = ?")
            .bind(fingerprint)
            .fetch_optional(&self.pool)
            .await
            .map_err(sqlx_error_to_hostlink_error)?;

        match row {
            Some(row) => {
                let mut agent = row_to_agent(&row)?;
                agent.tags = self.load_tags(&agent.id).await?;
                Ok(Some(agent))
            }
            None => Ok(None),
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Agent>> {
        let row = sqlx::query("SELECT * FROM agents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(sqlx_error_to_hostlink_error)?;

        match row {
            Some(row) => {
                let mut agent = row_to_agent(&row)?;
                agent.tags = self.load_tags(&agent.id).await?;
                Ok(Some(agent))
            }
            None => Ok(None),
        }
    }

    async fn find_all(&self, filter: AgentFilter) -> Result<Vec<Agent>> {
        let mut query_builder: sqlx::QueryBuilder<Sqlite> =
            sqlx::QueryBuilder::new("SELECT * FROM agents");
        let mut has_conditions = false;

        if let Some(status) = filter.status {
            query_builder.push(" WHERE status = ");
            query_builder.push_bind(agent_status_to_string(status));
            has_conditions = true;
        }
        if let Some(fingerprint) = filter.fingerprint {
            query_builder.push(if has_conditions { " AND " } else { " WHERE " });
            query_builder.push("fingerprint = ");
            query_builder.push_bind(fingerprint);
        }
        query_builder.push(" ORDER BY last_seen DESC");

        let rows = query_builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(sqlx_error_to_hostlink_error)?;

        let mut agents = Vec::with_capacity(rows.len());
        for row in rows {
            let mut agent = row_to_agent(&row)?;
            agent.tags = self.load_tags(&agent.id).await?;
            agents.push(agent);
        }
        Ok(agents)
    }

    async fn get_public_key(&self, agent_id: &str) -> Result<String> {
        let row = sqlx::query("SELECT public_key FROM agents WHERE id = ?")
            .bind(agent_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(sqlx_error_to_hostlink_error)?
            .ok_or_else(|| HostlinkError::not_found_agent(agent_id))?;

        let public_key: String = row.get("public_key");
        if public_key.is_empty() {
            return Err(HostlinkError::PublicKeyNotFound(agent_id.to_string()));
        }
        Ok(public_key)
    }

    async fn add_tags(&self, agent_id: &str, tags: &[AgentTag]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(sqlx_error_to_hostlink_error)?;
        Self::insert_tags_tx(&mut tx, agent_id, tags).await?;
        tx.commit().await.map_err(sqlx_error_to_hostlink_error)?;
        Ok(())
    }

    async fn update_tags(&self, agent_id: &str, tags: &[AgentTag]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(sqlx_error_to_hostlink_error)?;
        sqlx::query("DELETE FROM agent_tags WHERE agent_id = ?")
            .bind(agent_id)
            .execute(&mut *tx)
            .await
            .map_err(sqlx_error_to_hostlink_error)?;
        Self::insert_tags_tx(&mut tx, agent_id, tags).await?;
        tx.commit().await.map_err(sqlx_error_to_hostlink_error)?;
        Ok(())
    }

    async fn add_registration(&self, event: AgentRegistration) -> Result<AgentRegistration> {
        let mut tx = self.pool.begin().await.map_err(sqlx_error_to_hostlink_error)?;
        Self::insert_registration_tx(&mut tx, &event).await?;
        tx.commit().await.map_err(sqlx_error_to_hostlink_error)?;
        Ok(event)
    }

    async fn register_new(
        &self,
        agent: Agent,
        tags: Vec<AgentTag>,
        registration: AgentRegistration,
    ) -> Result<Agent> {
        let mut tx = self.pool.begin().await.map_err(sqlx_error_to_hostlink_error)?;

        sqlx::query(
            r#"
            INSERT INTO agents
                (id, fingerprint, public_key, public_key_type, hostname, ip_address,
                 mac_address, machine_id, status, registered_at, last_seen, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&agent.id)
        .bind(&agent.fingerprint)
        .bind(&agent.public_key)
        .bind(&agent.public_key_type)
        .bind(&agent.hostname)
        .bind(&agent.ip_address)
        .bind(&agent.mac_address)
        .bind(&agent.machine_id)
        .bind(agent_status_to_string(agent.status))
        .bind(agent.registered_at)
        .bind(agent.last_seen)
        .bind(agent.created_at)
        .bind(agent.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                HostlinkError::Conflict(format!(
                    "fingerprint '{}' already registered",
                    agent.fingerprint
                ))
            }
            other => sqlx_error_to_hostlink_error(other),
        })?;

        if !tags.is_empty() {
            Self::insert_tags_tx(&mut tx, &agent.id, &tags).await?;
        }
        Self::insert_registration_tx(&mut tx, &registration).await?;

        tx.commit().await.map_err(sqlx_error_to_hostlink_error)?;

        let mut created = agent;
        created.tags = tags;
        Ok(created)
    }

    async fn register_existing(
        &self,
        agent: Agent,
        tags: Option<Vec<AgentTag>>,
        registration: AgentRegistration,
    ) -> Result<Agent> {
        let mut tx = self.pool.begin().await.map_err(sqlx_error_to_hostlink_error)?;

        let result = sqlx::query(
            r#"
            UPDATE agents SET
                public_key = ?, public_key_type = ?, hostname = ?, ip_address = ?,
                mac_address = ?, machine_id = ?, last_seen = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&agent.public_key)
        .bind(&agent.public_key_type)
        .bind(&agent.hostname)
        .bind(&agent.ip_address)
        .bind(&agent.mac_address)
        .bind(&agent.machine_id)
        .bind(agent.last_seen)
        .bind(agent.updated_at)
        .bind(&agent.id)
        .execute(&mut *tx)
        .await
        .map_err(sqlx_error_to_hostlink_error)?;

        if result.rows_affected() == 0 {
            return Err(HostlinkError::not_found_agent(&agent.id));
        }

        let final_tags = if let Some(ref tags) = tags {
            sqlx::query("DELETE FROM agent_tags WHERE agent_id = ?")
                .bind(&agent.id)
                .execute(&mut *tx)
                .await
                .map_err(sqlx_error_to_hostlink_error)?;
            Self::insert_tags_tx(&mut tx, &agent.id, tags).await?;
            tags.clone()
        } else {
            agent.tags.clone()
        };

        Self::insert_registration_tx(&mut tx, &registration).await?;

        tx.commit().await.map_err(sqlx_error_to_hostlink_error)?;

        let mut updated = agent;
        updated.tags = final_tags;
        Ok(updated)
    }

    async fn touch_last_seen(&self, agent_id: &str) -> Result<()> {
        sqlx::query("UPDATE agents SET last_seen = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(agent_id)
            .execute(&self.pool)
            .await
            .map_err(sqlx_error_to_hostlink_error)?;
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(sqlx_error_to_hostlink_error)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn create(&self, new_task: NewTask) -> Result<Task> {
        let now = Utc::now();
        let id = format!("tsk_{}", ulid::Ulid::new());
        let agent_ids_json = serde_json::to_string(&new_task.agent_ids)
            .map_err(|e| HostlinkError::Transient(format!("failed to encode agent_ids: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO tasks (id, command, priority, status, agent_ids, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&new_task.command)
        .bind(new_task.priority)
        .bind(task_status_to_string(TaskStatus::Pending))
        .bind(&agent_ids_json)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(sqlx_error_to_hostlink_error)?;

        Ok(Task {
            id,
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
        })
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Task>> {
        let row = sqlx::query("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(sqlx_error_to_hostlink_error)?;

        match row {
            Some(row) => Ok(Some(row_to_task(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_all(&self, filter: TaskFilter) -> Result<Vec<Task>> {
        let mut query_builder: sqlx::QueryBuilder<Sqlite> =
            sqlx::QueryBuilder::new("SELECT * FROM tasks");
        let mut has_conditions = false;

        if let Some(status) = filter.status {
            query_builder.push(" WHERE status = ");
            query_builder.push_bind(task_status_to_string(status));
            has_conditions = true;
        }
        if let Some(agent_id) = filter.agent_id {
            query_builder.push(if has_conditions { " AND " } else { " WHERE " });
            query_builder.push("(agent_ids = '[]' OR agent_ids LIKE ");
            query_builder.push_bind(format!("%\"{agent_id}\"%"));
            query_builder.push(")");
        }
        query_builder.push(" ORDER BY created_at DESC, id DESC");

        let rows = query_builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(sqlx_error_to_hostlink_error)?;

        rows.iter().map(row_to_task).collect()
    }

    async fn poll_for_agent(&self, agent_id: &str) -> Result<Vec<Task>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM tasks
            WHERE status = 'pending' AND (agent_ids = '[]' OR agent_ids LIKE ?)
            ORDER BY priority DESC, created_at ASC
            "#,
        )
        .bind(format!("%\"{agent_id}\"%"))
        .fetch_all(&self.pool)
        .await
        .map_err(sqlx_error_to_hostlink_error)?;

        rows.iter().map(row_to_task).collect()
    }

    async fn apply_update(&self, id: &str, target: TaskStatus, update: TaskUpdate) -> Result<Task> {
        let now = Utc::now();
        let started_at = if target == TaskStatus::Running {
            Some(now)
        } else {
            None
        };
        let completed_at = if target.is_terminal() { Some(now) } else { None };

        let mut query_builder: sqlx::QueryBuilder<Sqlite> =
            sqlx::QueryBuilder::new("UPDATE tasks SET status = ");
        query_builder.push_bind(task_status_to_string(target));
        query_builder.push(", updated_at = ");
        query_builder.push_bind(now);
        if let Some(output) = &update.output {
            query_builder.push(", output = ");
            query_builder.push_bind(output);
        }
        if let Some(error) = &update.error {
            query_builder.push(", error = ");
            query_builder.push_bind(error);
        }
        if let Some(exit_code) = update.exit_code {
            query_builder.push(", exit_code = ");
            query_builder.push_bind(exit_code);
        }
        if let Some(started_at) = started_at {
            query_builder.push(", started_at = ");
            query_builder.push_bind(started_at);
        }
        if let Some(completed_at) = completed_at {
            query_builder.push(", completed_at = ");
            query_builder.push_bind(completed_at);
        }
        query_builder.push(" WHERE id = ");
        query_builder.push_bind(id);

        let result = query_builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(sqlx_error_to_hostlink_error)?;

        if result.rows_affected() == 0 {
            return Err(HostlinkError::not_found_task(id));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| HostlinkError::not_found_task(id))
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(sqlx_error_to_hostlink_error)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SqliteNonceRepository {
    pool: SqlitePool,
}

impl SqliteNonceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NonceRepository for SqliteNonceRepository {
    async fn save(&self, nonce: Nonce) -> Result<()> {
        sqlx::query("INSERT INTO nonces (value, created_at) VALUES (?, ?)")
            .bind(&nonce.value)
            .bind(nonce.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                    HostlinkError::Conflict(format!("nonce '{}' already present", nonce.value))
                }
                other => sqlx_error_to_hostlink_error(other),
            })?;
        Ok(())
    }

    async fn exists(&self, value: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM nonces WHERE value = ?)")
            .bind(value)
            .fetch_one(&self.pool)
            .await
            .map_err(sqlx_error_to_hostlink_error)?;
        Ok(exists)
    }

    async fn delete_expired(&self, older_than: Duration) -> Result<u64> {
        let cutoff = Utc::now() - older_than;
        let result = sqlx::query("DELETE FROM nonces WHERE created_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(sqlx_error_to_hostlink_error)?;
        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<u64> {
        let cutoff = Utc::now() - Duration::seconds(hostlink_core::repository::NONCE_EXPIRY_SECS);
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM nonces WHERE created_at >= ?")
            .bind(cutoff)
            .fetch_one(&self.pool)
            .await
            .map_err(sqlx_error_to_hostlink_error)?;
        Ok(count as u64)
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(sqlx_error_to_hostlink_error)?;
        Ok(())
    }
}
