//! Opaque id minting (spec §9: a single string opaque id per aggregate,
//! `<prefix>_<ULID>`, replacing the source's dual numeric/string identity).

use ulid::Ulid;

pub fn new_agent_id() -> String {
    format!("agt_{}", Ulid::new())
}

pub fn new_task_id() -> String {
    format!("tsk_{}", Ulid::new())
}

pub fn new_registration_id() -> String {
    format!("agr_{}", Ulid::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_carry_the_expected_prefix() {
        assert!(new_agent_id().starts_with("agt_"));
        assert!(new_task_id().starts_with("tsk_"));
        assert!(new_registration_id().starts_with("agr_"));
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(new_agent_id(), new_agent_id());
    }
}
