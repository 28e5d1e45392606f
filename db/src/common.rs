use chrono::{DateTime, Utc};
use hostlink_core::{
    Agent, AgentStatus, AgentTag, HostlinkError, Nonce, Result, Task, TaskStatus,
};
use sqlx::{sqlite::SqliteRow, Row};

pub fn agent_status_to_string(status: AgentStatus) -> &'static str {
    match status {
        AgentStatus::Active => "active",
        AgentStatus::Inactive => "inactive",
    }
}

pub fn string_to_agent_status(s: &str) -> Result<AgentStatus> {
    match s {
        "active" => Ok(AgentStatus::Active),
        "inactive" => Ok(AgentStatus::Inactive),
        other => Err(HostlinkError::Transient(format!(
            "invalid agent status in database: {other}"
        ))),
    }
}

pub fn task_status_to_string(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "pending",
        TaskStatus::Running => "running",
        TaskStatus::Completed => "completed",
        TaskStatus::Failed => "failed",
    }
}

pub fn string_to_task_status(s: &str) -> Result<TaskStatus> {
    match s {
        "pending" => Ok(TaskStatus::Pending),
        "running" => Ok(TaskStatus::Running),
        "completed" => Ok(TaskStatus::Completed),
        "failed" => Ok(TaskStatus::Failed),
        other => Err(HostlinkError::Transient(format!(
            "invalid task status in database: {other}"
        ))),
    }
}

/// Builds an `Agent` from an `agents` row. Tags must be attached by the
/// caller — this only covers the scalar columns.
pub fn row_to_agent(row: &SqliteRow) -> Result<Agent> {
    let status_str: String = row.get("status");
    let status = string_to_agent_status(&status_str)?;

    Ok(Agent {
        id: row.get("id"),
        fingerprint: row.get("fingerprint"),
        public_key: row.get("public_key"),
        public_key_type: row.get("public_key_type"),
        hostname: row.get("hostname"),
        ip_address: row.get("ip_address"),
        mac_address: row.get("mac_address"),
        machine_id: row.get("machine_id"),
        status,
        registered_at: row.get("registered_at"),
        last_seen: row.get("last_seen"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        tags: Vec::new(),
    })
}

pub fn row_to_agent_tag(row: &SqliteRow) -> AgentTag {
    AgentTag {
        key: row.get("key"),
        value: row.get("value"),
    }
}

pub fn row_to_task(row: &SqliteRow) -> Result<Task> {
    let status_str: String = row.get("status");
    let status = string_to_task_status(&status_str)?;

    let agent_ids_json: String = row.get("agent_ids");
    let agent_ids: Vec<String> = serde_json::from_str(&agent_ids_json).map_err(|e| {
        HostlinkError::Transient(format!("corrupt agent_ids column: {e}"))
    })?;

    let created_at: DateTime<Utc> = row.get("created_at");
    let updated_at: DateTime<Utc> = row.get("updated_at");
    let started_at: Option<DateTime<Utc>> = row.get("started_at");
    let completed_at: Option<DateTime<Utc>> = row.get("completed_at");

    Ok(Task {
        id: row.get("id"),
        command: row.get("command"),
        priority: row.get("priority"),
        status,
        agent_ids,
        output: row.get("output"),
        error: row.get("error"),
        exit_code: row.get("exit_code"),
        created_at,
        updated_at,
        started_at,
        completed_at,
    })
}

pub fn row_to_nonce(row: &SqliteRow) -> Nonce {
    Nonce {
        value: row.get("value"),
        created_at: row.get("created_at"),
    }
}

/// Translates a raw `sqlx::Error` into the domain error taxonomy (spec §4.1).
/// The caller is responsible for picking `Conflict` vs. the more specific
/// `NotFound`/`PublicKeyNotFound` where the unique constraint alone is
/// ambiguous (e.g. duplicate fingerprint vs. duplicate nonce).
pub fn sqlx_error_to_hostlink_error(err: sqlx::Error) -> HostlinkError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if db_err.is_unique_violation() {
                HostlinkError::Conflict(db_err.message().to_string())
            } else {
                HostlinkError::Transient(format!("database constraint error: {}", db_err.message()))
            }
        }
        sqlx::Error::RowNotFound => HostlinkError::NotFound("row not found".to_string()),
        sqlx::Error::PoolTimedOut => HostlinkError::Transient("connection pool timeout".to_string()),
        sqlx::Error::Io(io_err) => HostlinkError::Transient(format!("database I/O error: {io_err}")),
        _ => HostlinkError::Transient(format!("database operation failed: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_status_round_trips() {
        assert_eq!(agent_status_to_string(AgentStatus::Active), "active");
        assert_eq!(
            string_to_agent_status("active").unwrap(),
            AgentStatus::Active
        );
        assert!(string_to_agent_status("bogus").is_err());
    }

    #[test]
    fn task_status_round_trips() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::Running,
            TaskStatus::Completed,
            TaskStatus::Failed,
        ] {
            let s = task_status_to_string(status);
            assert_eq!(string_to_task_status(s).unwrap(), status);
        }
        assert!(string_to_task_status("bogus").is_err());
    }
}
