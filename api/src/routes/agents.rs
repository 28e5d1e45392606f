//! `POST /api/v1/agents/register`, `GET /api/v1/agents`,
//! `GET /api/v1/agents/{id}` (spec §6). None of these carry signature
//! authentication — registration is how an agent first proves itself, and
//! the two directory reads are operator-facing.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use hostlink_core::{
    Agent, AgentFilter, AgentStatus, RegisterAgentRequest, RegisterAgentResponse,
    RegistrationService,
};

use crate::error::ApiResult;
use crate::state::AppState;

/// Spec §6: the response differentiates new from returning registrations
/// via `message`, not via the HTTP status code — both cases are `200 OK`.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterAgentRequest>,
) -> ApiResult<Json<RegisterAgentResponse>> {
    let service = RegistrationService::new(state.agents);
    let agent = service.register(req).await?;
    Ok(Json(agent.into()))
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Vec<Agent>>> {
    let filter = AgentFilter {
        status: params.get("status").and_then(|s| match s.as_str() {
            "active" => Some(AgentStatus::Active),
            "inactive" => Some(AgentStatus::Inactive),
            _ => None,
        }),
        fingerprint: params.get("fingerprint").cloned(),
    };
    let agents = state.agents.find_all(filter).await?;
    Ok(Json(agents))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Agent>> {
    let agent = state
        .agents
        .find_by_id(&id)
        .await?
        .ok_or_else(|| hostlink_core::HostlinkError::not_found_agent(&id))?;
    Ok(Json(agent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    fn valid_request() -> RegisterAgentRequest {
        RegisterAgentRequest {
            fingerprint: "fp-1".to_string(),
            token_id: "t1".to_string(),
            token_key: "k1".to_string(),
            public_key: "base64der".to_string(),
            public_key_type: "rsa".to_string(),
            hostname: None,
            ip_address: None,
            mac_address: None,
            machine_id: None,
            hardware_info: None,
            tags: None,
        }
    }

    #[tokio::test]
    async fn register_then_list_round_trips() {
        let state = crate::state::test_state_with_agent(None).await;
        let Json(response) = register(State(state.clone()), Json(valid_request()))
            .await
            .unwrap();
        assert_eq!(response.message, "Agent successfully registered");

        let Json(agents) = list(State(state), Query(HashMap::new())).await.unwrap();
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].fingerprint, "fp-1");
    }

    #[tokio::test]
    async fn re_registration_message_differs_from_new() {
        let state = crate::state::test_state_with_agent(None).await;
        register(State(state.clone()), Json(valid_request()))
            .await
            .unwrap();

        let Json(response) = register(State(state), Json(valid_request())).await.unwrap();
        assert_eq!(response.message, "Agent successfully re-registered");
    }

    #[tokio::test]
    async fn get_unknown_agent_is_404() {
        let state = crate::state::test_state_with_agent(None).await;
        let err = get(State(state), Path("agt_missing".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
