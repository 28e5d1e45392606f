use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;

use hostlink_api::{auth::SignatureAuth, build_router, AppState};
use hostlink_core::repository::NonceRepository;
use hostlink_db::{connect, migrate, SqliteAgentRepository, SqliteNonceRepository, SqliteTaskRepository};

use crate::config::{Config, NonceConfig};

/// Connects to SQLite, runs migrations, and builds the router's
/// [`AppState`] on top of the three `hostlink-db` repositories.
///
/// Returns the router alongside the nonce repository handle so the
/// caller can hand it to [`spawn_nonce_sweeper`] without reaching back
/// into `AppState`.
pub async fn initialize_app(config: &Config) -> Result<(Router, Arc<dyn NonceRepository>)> {
    ensure_database_directory_from_config(config)
        .context("Failed to ensure database directory exists")?;

    let database_url = config.database_url();
    let pool = connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    migrate(&pool).await.context("Failed to run database migrations")?;

    let agents = Arc::new(SqliteAgentRepository::new(pool.clone()));
    let tasks = Arc::new(SqliteTaskRepository::new(pool.clone()));
    let nonces: Arc<dyn NonceRepository> = Arc::new(SqliteNonceRepository::new(pool));

    let state = AppState::new(agents, tasks, nonces.clone(), SignatureAuth::new(true));

    Ok((build_router(state), nonces))
}

/// Spawns the background task that periodically sweeps expired nonces
/// (spec §4.4). Runs until `shutdown` resolves.
pub fn spawn_nonce_sweeper(
    nonces: Arc<dyn NonceRepository>,
    config: NonceConfig,
    mut shutdown: tokio::sync::oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(config.sweep_interval_secs));
        let retention = chrono::Duration::seconds(config.retention_secs as i64);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match nonces.delete_expired(retention).await {
                        Ok(count) if count > 0 => {
                            tracing::info!(count, "swept expired nonces");
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::error!(error = %e, "nonce sweep failed");
                        }
                    }
                }
                _ = &mut shutdown => {
                    tracing::info!("nonce sweeper shutting down");
                    break;
                }
            }
        }
    })
}

/// Ensures the parent directory of a `sqlite://` database path exists,
/// creating it if necessary. No-op for `:memory:` URLs.
pub fn ensure_database_directory_from_config(config: &Config) -> Result<()> {
    ensure_database_directory(&config.database_url())
}

pub fn ensure_database_directory(database_url: &str) -> Result<()> {
    if database_url.contains(":memory:") {
        return Ok(());
    }

    let path_part = database_url
        .strip_prefix("sqlite://")
        .unwrap_or(database_url);

    let path = Path::new(path_part);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, LogFormat, LoggingConfig, ServerConfig};
    use tempfile::TempDir;

    fn test_config(database_url: String) -> Config {
        Config {
            database: DatabaseConfig {
                url: Some(database_url),
                max_connections: 5,
                connection_timeout: 30,
            },
            server: ServerConfig {
                listen_addr: "127.0.0.1".to_string(),
                port: 0,
                workers: 1,
            },
            nonce: NonceConfig {
                sweep_interval_secs: 60,
                retention_secs: 600,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Pretty,
            },
        }
    }

    #[tokio::test]
    async fn initialize_app_connects_and_migrates_in_memory() {
        let config = test_config(":memory:".to_string());
        let router = initialize_app(&config).await;
        assert!(router.is_ok());
    }

    #[tokio::test]
    async fn initialize_app_creates_database_directory_on_disk() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("nested").join("hostlink.sqlite");
        let config = test_config(format!("sqlite://{}", db_path.display()));

        let router = initialize_app(&config).await;
        assert!(router.is_ok());
        assert!(db_path.parent().unwrap().exists());
    }

    #[test]
    fn ensure_database_directory_is_noop_for_memory_url() {
        assert!(ensure_database_directory(":memory:").is_ok());
    }

    #[test]
    fn ensure_database_directory_creates_missing_parent() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("sub").join("db.sqlite");
        let url = format!("sqlite://{}", db_path.display());

        assert!(ensure_database_directory(&url).is_ok());
        assert!(db_path.parent().unwrap().exists());
    }

    #[tokio::test]
    async fn nonce_sweeper_stops_on_shutdown_signal() {
        use hostlink_mocks::MockNonceRepository;

        let nonces: Arc<dyn NonceRepository> = Arc::new(MockNonceRepository::new());
        let (tx, rx) = tokio::sync::oneshot::channel();
        let handle = spawn_nonce_sweeper(
            nonces,
            NonceConfig {
                sweep_interval_secs: 60,
                retention_secs: 600,
            },
            rx,
        );

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper task should exit promptly")
            .expect("sweeper task should not panic");
    }
}
