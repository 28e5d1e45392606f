use crate::{
    error::{HostlinkError, Result},
    models::{NewTask, RegisterAgentRequest},
};

/// Validation utilities for registration and task-creation inputs.
pub struct HostlinkValidator;

impl HostlinkValidator {
    /// Required-field validation, excluding `token_id`/`token_key` — those
    /// are exclusively the token gate's concern below, so a missing token
    /// produces `InvalidToken` rather than a generic validation error.
    pub fn validate_register_request(req: &RegisterAgentRequest) -> Result<()> {
        if req.fingerprint.trim().is_empty() {
            return Err(HostlinkError::empty_field("fingerprint"));
        }
        if req.public_key.trim().is_empty() {
            return Err(HostlinkError::empty_field("public_key"));
        }
        if req.public_key_type.trim().is_empty() {
            return Err(HostlinkError::empty_field("public_key_type"));
        }
        Ok(())
    }

    /// Token gate (spec §4.2 step 1). A non-empty token that merely fails a
    /// richer check (not yet implemented — spec §4.2 calls this "a
    /// documented extension point") still passes here.
    pub fn validate_token_gate(token_id: &str, token_key: &str) -> Result<()> {
        if token_id.trim().is_empty() || token_key.trim().is_empty() {
            return Err(HostlinkError::InvalidToken);
        }
        Ok(())
    }

    pub fn validate_new_task(task: &NewTask) -> Result<()> {
        if task.command.trim().is_empty() {
            return Err(HostlinkError::empty_field("command"));
        }
        if task.priority < 0 {
            return Err(HostlinkError::Validation(
                "priority must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> RegisterAgentRequest {
        RegisterAgentRequest {
            fingerprint: "fp-a".to_string(),
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

    #[test]
    fn empty_fingerprint_is_rejected() {
        let mut req = valid_request();
        req.fingerprint = String::new();
        let err = HostlinkValidator::validate_register_request(&req).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn register_request_validation_ignores_empty_token_fields() {
        let mut req = valid_request();
        req.token_id = String::new();
        req.token_key = String::new();
        assert!(HostlinkValidator::validate_register_request(&req).is_ok());
    }

    #[test]
    fn token_gate_rejects_empty_token_id_or_key() {
        assert!(HostlinkValidator::validate_token_gate("", "k1").is_err());
        assert!(HostlinkValidator::validate_token_gate("t1", "").is_err());
        assert!(HostlinkValidator::validate_token_gate("t1", "k1").is_ok());
    }

    #[test]
    fn new_task_requires_nonempty_command() {
        let task = NewTask {
            command: "  ".to_string(),
            priority: 0,
            agent_ids: vec![],
        };
        assert!(HostlinkValidator::validate_new_task(&task).is_err());
    }

    #[test]
    fn new_task_rejects_negative_priority() {
        let task = NewTask {
            command: "echo hi".to_string(),
            priority: -1,
            agent_ids: vec![],
        };
        assert!(HostlinkValidator::validate_new_task(&task).is_err());
    }
}
