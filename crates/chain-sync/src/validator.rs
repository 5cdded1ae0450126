//! Proposer signature gate: structural checks on an incoming block plus
//! an optional trusted-proposer allowlist.

use std::collections::HashSet;

use crate::metrics;
use crate::IncomingBlock;

#[derive(Debug, Default)]
pub struct ProposerSignatureValidator {
    trusted: HashSet<String>,
}

impl ProposerSignatureValidator {
    pub fn new(trusted_proposers: impl IntoIterator<Item = String>) -> Self {
        Self {
            trusted: trusted_proposers.into_iter().collect(),
        }
    }

    pub fn trusted_proposers(&self) -> &HashSet<String> {
        &self.trusted
    }

    pub fn add_trusted(&mut self, proposer_id: impl Into<String>) {
        self.trusted.insert(proposer_id.into());
    }

    pub fn remove_trusted(&mut self, proposer_id: &str) {
        self.trusted.remove(proposer_id);
    }

    /// Returns `Ok(())` if the block passes the gate, `Err(reason)` otherwise.
    pub fn validate(&self, block: &IncomingBlock) -> Result<(), String> {
        let proposer = match &block.proposer {
            Some(p) if !p.is_empty() => p,
            _ => return Err("missing proposer field".to_string()),
        };

        let hash = match &block.hash {
            Some(h) if h.starts_with("0x") => h,
            Some(h) => return Err(format!("invalid block hash format: {h}")),
            None => return Err("invalid block hash format: <missing>".to_string()),
        };

        if block.height.is_none() {
            return Err("missing required field: height".to_string());
        }
        if block.parent_hash.is_none() {
            return Err("missing required field: parent_hash".to_string());
        }
        if block.timestamp.is_none() {
            return Err("missing required field: timestamp".to_string());
        }

        if !self.trusted.is_empty() && !self.trusted.contains(proposer) {
            metrics::SIGNATURE_REJECTED_TOTAL.inc();
            return Err(format!("proposer '{proposer}' not in trusted set"));
        }

        let hash_hex = &hash[2..];
        if hash_hex.len() != 64 {
            return Err(format!("invalid hash length: {}", hash_hex.len()));
        }
        if !hash_hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("invalid hex in hash: {hash_hex}"));
        }

        metrics::SIGNATURE_VALIDATED_TOTAL.inc();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn valid_block() -> IncomingBlock {
        IncomingBlock {
            height: Some(1),
            hash: Some(format!("0x{}", "a".repeat(64))),
            parent_hash: Some("0x00".to_string()),
            proposer: Some("p1".to_string()),
            timestamp: Some(Utc::now()),
            tx_count: Some(0),
            state_root: None,
        }
    }

    #[test]
    fn accepts_well_formed_block() {
        let validator = ProposerSignatureValidator::default();
        assert!(validator.validate(&valid_block()).is_ok());
    }

    #[test]
    fn rejects_missing_proposer() {
        let mut block = valid_block();
        block.proposer = None;
        let validator = ProposerSignatureValidator::default();
        assert!(validator.validate(&block).is_err());
    }

    #[test]
    fn rejects_hash_without_0x_prefix() {
        let mut block = valid_block();
        block.hash = Some("a".repeat(64));
        let validator = ProposerSignatureValidator::default();
        assert!(validator.validate(&block).is_err());
    }

    #[test]
    fn rejects_wrong_length_hash() {
        let mut block = valid_block();
        block.hash = Some("0xabc".to_string());
        let validator = ProposerSignatureValidator::default();
        assert!(validator.validate(&block).is_err());
    }

    #[test]
    fn rejects_untrusted_proposer_when_trust_set_configured() {
        let validator = ProposerSignatureValidator::new(["only-this-one".to_string()]);
        assert!(validator.validate(&valid_block()).is_err());
    }

    #[test]
    fn accepts_trusted_proposer() {
        let validator = ProposerSignatureValidator::new(["p1".to_string()]);
        assert!(validator.validate(&valid_block()).is_ok());
    }
}
