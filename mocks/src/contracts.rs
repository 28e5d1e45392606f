//! Contract tests: a standardized suite any [`AgentRepository`],
//! [`TaskRepository`], or [`NonceRepository`] implementation should pass,
//! independent of whether it is backed by memory or SQL.

use chrono::Duration;

use hostlink_core::error::HostlinkError;
use hostlink_core::models::{AgentFilter, AgentRegistration, RegistrationEvent, TaskFilter};
use hostlink_core::repository::{AgentRepository, NonceRepository, TaskRepository};

use crate::{create_new_task, create_test_agent, create_test_nonce};

/// Runs the full agent-repository contract against `repo`.
pub async fn test_agent_repository_contract<R: AgentRepository>(repo: &R) {
    test_agent_create_contract(repo).await;
    test_agent_find_contract(repo).await;
    test_agent_tags_contract(repo).await;
    test_agent_health_check_contract(repo).await;
}

pub async fn test_agent_create_contract<R: AgentRepository>(repo: &R) {
    let agent = create_test_agent();
    let created = repo.create(agent.clone()).await.expect("create should succeed");
    assert_eq!(created.id, agent.id);
    assert_eq!(created.fingerprint, agent.fingerprint);

    let dup = create_test_agent();
    let dup = hostlink_core::models::Agent {
        fingerprint: agent.fingerprint.clone(),
        ..dup
    };
    let err = repo
        .create(dup)
        .await
        .expect_err("duplicate fingerprint should be rejected");
    assert!(matches!(err, HostlinkError::Conflict(_)));
}

pub async fn test_agent_find_contract<R: AgentRepository>(repo: &R) {
    let agent = create_test_agent();
    let agent = hostlink_core::models::Agent {
        fingerprint: format!("{}-find", agent.fingerprint),
        ..agent
    };
    let created = repo.create(agent.clone()).await.expect("create should succeed");

    let by_id = repo
        .find_by_id(&created.id)
        .await
        .expect("find_by_id should succeed")
        .expect("agent should exist");
    assert_eq!(by_id.id, created.id);

    let by_fingerprint = repo
        .find_by_fingerprint(&created.fingerprint)
        .await
        .expect("find_by_fingerprint should succeed")
        .expect("agent should exist");
    assert_eq!(by_fingerprint.id, created.id);

    assert!(repo
        .find_by_id("agt_does_not_exist")
        .await
        .expect("find_by_id should not error for unknown id")
        .is_none());

    let all = repo
        .find_all(AgentFilter::default())
        .await
        .expect("find_all should succeed");
    assert!(all.iter().any(|a| a.id == created.id));
}

pub async fn test_agent_tags_contract<R: AgentRepository>(repo: &R) {
    let mut agent = create_test_agent();
    agent.fingerprint = format!("{}-tags", agent.fingerprint);
    agent.tags = Vec::new();
    let created = repo.create(agent).await.expect("create should succeed");

    let tag = hostlink_core::models::AgentTag {
        key: "role".to_string(),
        value: "worker".to_string(),
    };
    repo.add_tags(&created.id, std::slice::from_ref(&tag))
        .await
        .expect("add_tags should succeed");

    let replacement = hostlink_core::models::AgentTag {
        key: "role".to_string(),
        value: "coordinator".to_string(),
    };
    repo.update_tags(&created.id, std::slice::from_ref(&replacement))
        .await
        .expect("update_tags should succeed");

    let err = repo
        .add_tags("agt_does_not_exist", &[tag])
        .await
        .expect_err("add_tags on unknown agent should fail");
    assert!(err.is_not_found());
}

pub async fn test_agent_health_check_contract<R: AgentRepository>(repo: &R) {
    repo.health_check()
        .await
        .expect("health_check should succeed for a working repository");
}

/// Runs the full task-repository contract against `repo`.
pub async fn test_task_repository_contract<R: TaskRepository>(repo: &R) {
    test_task_create_contract(repo).await;
    test_task_poll_and_update_contract(repo).await;
    test_task_list_contract(repo).await;
}

pub async fn test_task_create_contract<R: TaskRepository>(repo: &R) {
    let task = repo
        .create(create_new_task())
        .await
        .expect("create should succeed");
    assert_eq!(
        task.status,
        hostlink_core::models::TaskStatus::Pending,
        "new tasks start pending"
    );

    let found = repo
        .find_by_id(&task.id)
        .await
        .expect("find_by_id should succeed")
        .expect("task should exist");
    assert_eq!(found.id, task.id);

    assert!(repo
        .find_by_id("tsk_does_not_exist")
        .await
        .expect("find_by_id should not error")
        .is_none());
}

pub async fn test_task_poll_and_update_contract<R: TaskRepository>(repo: &R) {
    let task = repo
        .create(create_new_task())
        .await
        .expect("create should succeed");

    let visible = repo
        .poll_for_agent("agt_any")
        .await
        .expect("poll should succeed");
    assert!(visible.iter().any(|t| t.id == task.id));

    let updated = repo
        .apply_update(
            &task.id,
            hostlink_core::models::TaskStatus::Running,
            crate::create_running_update(),
        )
        .await
        .expect("transition to running should succeed");
    assert_eq!(updated.status, hostlink_core::models::TaskStatus::Running);

    let no_longer_visible = repo
        .poll_for_agent("agt_any")
        .await
        .expect("poll should succeed");
    assert!(!no_longer_visible.iter().any(|t| t.id == task.id));

    let err = repo
        .apply_update(
            "tsk_does_not_exist",
            hostlink_core::models::TaskStatus::Running,
            crate::create_running_update(),
        )
        .await
        .expect_err("update on unknown task should fail");
    assert!(err.is_not_found());
}

pub async fn test_task_list_contract<R: TaskRepository>(repo: &R) {
    let task = repo
        .create(create_new_task())
        .await
        .expect("create should succeed");

    let all = repo
        .find_all(TaskFilter::default())
        .await
        .expect("find_all should succeed");
    assert!(all.iter().any(|t| t.id == task.id));

    let pending_only = repo
        .find_all(TaskFilter {
            status: Some(hostlink_core::models::TaskStatus::Pending),
            agent_id: None,
        })
        .await
        .expect("filtered find_all should succeed");
    assert!(pending_only
        .iter()
        .all(|t| t.status == hostlink_core::models::TaskStatus::Pending));
}

/// Runs the full nonce-repository contract against `repo`.
pub async fn test_nonce_repository_contract<R: NonceRepository>(repo: &R) {
    let nonce = create_test_nonce();
    repo.save(nonce.clone()).await.expect("save should succeed");

    assert!(repo
        .exists(&nonce.value)
        .await
        .expect("exists should succeed"));

    let err = repo
        .save(nonce.clone())
        .await
        .expect_err("duplicate nonce should be rejected");
    assert!(matches!(err, HostlinkError::Conflict(_)));

    let removed = repo
        .delete_expired(Duration::seconds(0))
        .await
        .expect("delete_expired should succeed");
    assert!(removed >= 1);

    repo.health_check()
        .await
        .expect("health_check should succeed");
}

/// Produces a throwaway failure-audit [`AgentRegistration`] row, for tests
/// exercising [`AgentRepository::add_registration`] directly.
pub fn sample_failed_registration(fingerprint: &str, error: &HostlinkError) -> AgentRegistration {
    AgentRegistration {
        id: hostlink_core::ids::new_registration_id(),
        agent_id: String::new(),
        fingerprint: fingerprint.to_string(),
        event: RegistrationEvent::Register,
        success: false,
        error: Some(error.to_string()),
        hardware_snapshot: None,
        created_at: chrono::Utc::now(),
    }
}
