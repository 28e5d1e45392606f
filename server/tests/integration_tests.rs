use hostlink_server::config::{Config, DatabaseConfig, LogFormat, LoggingConfig, NonceConfig, ServerConfig};
use hostlink_server::setup::{ensure_database_directory, initialize_app};
use std::env;
use tempfile::TempDir;

fn base_config(database_url: Option<String>) -> Config {
    Config {
        database: DatabaseConfig {
            url: database_url,
            max_connections: 5,
            connection_timeout: 30,
        },
        server: ServerConfig {
            listen_addr: "127.0.0.1".to_string(),
            port: 3000,
            workers: 4,
        },
        nonce: NonceConfig {
            sweep_interval_secs: 60,
            retention_secs: 300,
        },
        logging: LoggingConfig {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        },
    }
}

#[tokio::test]
async fn server_initializes_with_sqlite_and_migrates() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let database_url = format!("sqlite://{}", db_path.display());

    let config = base_config(Some(database_url));
    let result = initialize_app(&config).await;
    assert!(result.is_ok(), "failed to initialize app: {:?}", result.err());
    assert!(db_path.exists());
}

#[test]
fn default_configuration_is_valid() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.server.listen_addr, "127.0.0.1");
    assert_eq!(config.server.port, 3000);
}

#[test]
fn environment_overrides_apply_to_default_config() {
    env::set_var("DATABASE_URL", "sqlite://test_env.db");
    env::set_var("LISTEN_ADDR", "0.0.0.0");
    env::set_var("LOG_LEVEL", "debug");

    let config = Config::default().merge_with_env().unwrap();

    assert_eq!(config.database.url, Some("sqlite://test_env.db".to_string()));
    assert_eq!(config.server.listen_addr, "0.0.0.0");
    assert_eq!(config.logging.level, "debug");

    env::remove_var("DATABASE_URL");
    env::remove_var("LISTEN_ADDR");
    env::remove_var("LOG_LEVEL");
}

#[test]
fn default_database_path_falls_back_to_home() {
    let config = Config::default();
    let url = config.database_url();
    assert!(url.starts_with("sqlite://"));
    assert!(url.contains("hostlink.sqlite"));
}

#[test]
fn database_directory_creation_creates_missing_parent() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("subdir").join("test.db");
    let database_url = format!("sqlite://{}", db_path.display());

    let result = ensure_database_directory(&database_url);
    assert!(result.is_ok());
    assert!(db_path.parent().unwrap().exists());
}

#[test]
fn config_validation_rejects_bad_values() {
    let mut config = base_config(None);

    config.logging.level = "invalid".to_string();
    assert!(config.validate().is_err());

    config.logging.level = "info".to_string();
    config.database.url = Some("postgres://invalid".to_string());
    assert!(config.validate().is_err());

    config.database.url = None;
    config.server.port = 0;
    assert!(config.validate().is_err());

    config.server.port = 3000;
    config.server.workers = 0;
    assert!(config.validate().is_err());

    config.server.workers = 4;
    config.database.max_connections = 0;
    assert!(config.validate().is_err());

    config.database.max_connections = 5;
    config.nonce.retention_secs = 10;
    config.nonce.sweep_interval_secs = 60;
    assert!(config.validate().is_err());
}

#[test]
fn server_address_formatting() {
    let mut config = base_config(None);
    config.server.listen_addr = "0.0.0.0".to_string();
    config.server.port = 8080;

    assert_eq!(config.server_address(), "0.0.0.0:8080");
}

#[tokio::test]
async fn repository_creation_runs_migrations_idempotently() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("migration_test.db");
    let database_url = format!("sqlite://{}", db_path.display());

    let config = base_config(Some(database_url));

    let first = initialize_app(&config).await;
    assert!(first.is_ok());

    let second = initialize_app(&config).await;
    assert!(second.is_ok());

    assert!(db_path.exists());
}
