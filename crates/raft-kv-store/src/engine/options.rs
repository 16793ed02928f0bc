//! # options
//!
//! why: transaction limits and fsync policy vary per deployment
//! relations: consumed by RedbEngine and BTreeEngine at construction
//! what: EngineOptions with serde defaults, json loading

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// tuning knobs shared by both engines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// advisory cap on mutations per transaction
    pub max_batch_count: usize,
    /// flush to disk before a commit returns (redb `Durability::Immediate`)
    pub sync_writes: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_batch_count: 10_000,
            sync_writes: true,
        }
    }
}

impl EngineOptions {
    /// parse options from json; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json).map_err(|e| EngineError::InvalidOptions(e.to_string()))
    }

    pub fn with_max_batch_count(mut self, max_batch_count: usize) -> Self {
        self.max_batch_count = max_batch_count;
        self
    }

    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), EngineError> {
        if self.max_batch_count == 0 {
            return Err(EngineError::InvalidOptions(
                "max_batch_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let options = EngineOptions::default();
        assert_eq!(options.max_batch_count, 10_000);
        assert!(options.sync_writes);
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let options = EngineOptions::from_json(r#"{ "max_batch_count": 16 }"#).unwrap();
        assert_eq!(options.max_batch_count, 16);
        assert!(options.sync_writes);
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = EngineOptions::from_json("{ max_batch_count }").unwrap_err();
        assert!(matches!(err, EngineError::InvalidOptions(_)));
    }

    #[test]
    fn zero_batch_count_fails_validation() {
        let options = EngineOptions::default().with_max_batch_count(0);
        assert!(options.validate().is_err());
    }
}
