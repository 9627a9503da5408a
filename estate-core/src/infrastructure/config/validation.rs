use crate::foundation::{MAX_COORDINATION_TIMEOUT_MS, MAX_PARTY_ID_LENGTH};
use crate::infrastructure::config::types::AppConfig;
use std::collections::BTreeSet;

impl AppConfig {
    /// Returns every problem found rather than the first.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        check_party(&mut errors, "node.party", &self.node.party);
        check_party(&mut errors, "node.notary", &self.node.notary);
        if !self.node.party.trim().is_empty() && self.node.party.trim() == self.node.notary.trim() {
            errors.push("node.party and node.notary must differ".to_string());
        }

        let timeouts = [
            ("coordination.signature_timeout_ms", self.coordination.signature_timeout_ms),
            ("coordination.finality_timeout_ms", self.coordination.finality_timeout_ms),
            ("coordination.session_open_timeout_ms", self.coordination.session_open_timeout_ms),
        ];
        for (name, value) in timeouts {
            if value == 0 {
                errors.push(format!("{name} must be > 0"));
            } else if value > MAX_COORDINATION_TIMEOUT_MS {
                errors.push(format!("{name} should not exceed {MAX_COORDINATION_TIMEOUT_MS}"));
            }
        }

        if self.logging.filters.trim().is_empty() {
            errors.push("logging.filters must not be empty".to_string());
        }

        let mut seen = BTreeSet::new();
        for party in &self.devnet.parties {
            check_party(&mut errors, "devnet.parties entry", party);
            if !seen.insert(party.trim()) {
                errors.push(format!("duplicate devnet.parties entry: {party}"));
            }
            if party.trim() == self.node.notary.trim() {
                errors.push(format!("devnet.parties must not include the notary: {party}"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_party(errors: &mut Vec<String>, name: &str, value: &str) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(format!("{name} must not be empty"));
    } else if trimmed.len() > MAX_PARTY_ID_LENGTH {
        errors.push(format!("{name} exceeds {MAX_PARTY_ID_LENGTH} characters"));
    }
}
