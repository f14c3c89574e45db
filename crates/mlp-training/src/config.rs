//! Object-store configuration, read once at process start.

use crate::error::{TrainingError, TrainingResult};
use std::str::FromStr;

pub const ENV_BUCKET: &str = "BUCKET_NAME";
pub const ENV_ENDPOINT: &str = "MINIO_ENDPOINT";
pub const ENV_ACCESS_KEY: &str = "MINIO_ACCESS_KEY";
pub const ENV_SECRET_KEY: &str = "MINIO_SECRET_KEY";
pub const ENV_REGION: &str = "MINIO_REGION";
pub const ENV_ORPHAN_POLICY: &str = "ORPHAN_POLICY";

/// What to do with an already uploaded `model.bin` when the schema upload fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrphanPolicy {
    /// Delete the model object so no half-published pair remains.
    #[default]
    Rollback,
    /// Leave the model object in place for external reconciliation.
    Leave,
}

impl FromStr for OrphanPolicy {
    type Err = TrainingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rollback" => Ok(Self::Rollback),
            "leave" => Ok(Self::Leave),
            other => Err(TrainingError::ConfigurationMissing(format!(
                "{ENV_ORPHAN_POLICY} must be 'rollback' or 'leave', got '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for OrphanPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rollback => f.write_str("rollback"),
            Self::Leave => f.write_str("leave"),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct PublishConfig {
    pub bucket: String,
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub orphan_policy: OrphanPolicy,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            bucket: "model".to_string(),
            endpoint: "http://localhost:9000".to_string(),
            access_key: "admin".to_string(),
            secret_key: "admin123".to_string(),
            region: "us-east-1".to_string(),
            orphan_policy: OrphanPolicy::default(),
        }
    }
}

impl std::fmt::Debug for PublishConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishConfig")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"***")
            .field("region", &self.region)
            .field("orphan_policy", &self.orphan_policy)
            .finish()
    }
}

impl PublishConfig {
    /// Build from the process environment, falling back to defaults.
    pub fn from_env() -> TrainingResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> TrainingResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let orphan_policy = match get(ENV_ORPHAN_POLICY) {
            Some(raw) => raw.parse()?,
            None => defaults.orphan_policy,
        };

        Ok(Self {
            bucket: get(ENV_BUCKET).unwrap_or(defaults.bucket),
            endpoint: get(ENV_ENDPOINT).unwrap_or(defaults.endpoint),
            access_key: get(ENV_ACCESS_KEY).unwrap_or(defaults.access_key),
            secret_key: get(ENV_SECRET_KEY).unwrap_or(defaults.secret_key),
            region: get(ENV_REGION).unwrap_or(defaults.region),
            orphan_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let config = PublishConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.bucket, "model");
        assert_eq!(config.endpoint, "http://localhost:9000");
        assert_eq!(config.access_key, "admin");
        assert_eq!(config.secret_key, "admin123");
        assert_eq!(config.orphan_policy, OrphanPolicy::Rollback);
    }

    #[test]
    fn test_lookup_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("BUCKET_NAME", "models-prod"),
            ("MINIO_ENDPOINT", "http://minio:9000"),
            ("MINIO_SECRET_KEY", ""),
            ("ORPHAN_POLICY", "Leave"),
        ]);
        let config = PublishConfig::from_lookup(|k| env.get(k).map(|v| (*v).to_string())).unwrap();

        assert_eq!(config.bucket, "models-prod");
        assert_eq!(config.endpoint, "http://minio:9000");
        assert_eq!(config.secret_key, "admin123");
        assert_eq!(config.orphan_policy, OrphanPolicy::Leave);
    }

    #[test]
    fn test_invalid_orphan_policy() {
        let err = PublishConfig::from_lookup(|k| (k == ENV_ORPHAN_POLICY).then(|| "shrug".to_string())).unwrap_err();
        assert!(matches!(err, TrainingError::ConfigurationMissing(_)));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", PublishConfig::default());
        assert!(!rendered.contains("admin123"));
    }
}
