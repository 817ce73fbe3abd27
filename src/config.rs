//! Service configuration from environment variables.
use super::error::LedgerError;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// What to do when an amount would overrun its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapacityPolicy {
    /// Report success and leave the ledger untouched.
    #[default]
    Silent,
    /// Fail the operation with `CapacityExceeded`.
    Reject,
}

impl FromStr for CapacityPolicy {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "silent" => Ok(CapacityPolicy::Silent),
            "reject" => Ok(CapacityPolicy::Reject),
            other => Err(LedgerError::Validation(format!(
                "unknown capacity policy {other:?}, expected silent or reject"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Directory of the sled database
    pub db_path: PathBuf,

    /// Role allowed to create programs
    pub assigner_role: String,

    pub capacity_policy: CapacityPolicy,

    /// `EnvFilter` directive for the CLI's subscriber
    pub log_filter: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("scf.db"),
            assigner_role: "assigner".to_string(),
            capacity_policy: CapacityPolicy::Silent,
            log_filter: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SCF_DB_PATH`: sled database directory (default: scf.db)
    /// - `SCF_ASSIGNER_ROLE`: role allowed to create programs (default: assigner)
    /// - `SCF_CAPACITY_POLICY`: `silent` or `reject` (default: silent)
    /// - `SCF_LOG` or `RUST_LOG`: log filter (default: info)
    pub fn from_env() -> Result<Self, LedgerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ServiceConfig::from_env`] but reads through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LedgerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let capacity_policy = match lookup("SCF_CAPACITY_POLICY") {
            Some(raw) => raw.parse()?,
            None => defaults.capacity_policy,
        };

        Ok(Self {
            db_path: lookup("SCF_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),

            assigner_role: lookup("SCF_ASSIGNER_ROLE")
                .filter(|role| !role.is_empty())
                .unwrap_or(defaults.assigner_role),

            capacity_policy,

            log_filter: lookup("SCF_LOG")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_filter),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ServiceConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.db_path, PathBuf::from("scf.db"));
        assert_eq!(config.assigner_role, "assigner");
        assert_eq!(config.capacity_policy, CapacityPolicy::Silent);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn scf_log_wins_over_rust_log() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("SCF_LOG", "debug"),
            ("RUST_LOG", "warn"),
            ("SCF_CAPACITY_POLICY", "Reject"),
        ]))
        .unwrap();
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.capacity_policy, CapacityPolicy::Reject);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let err = ServiceConfig::from_lookup(lookup_from(&[("SCF_CAPACITY_POLICY", "loud")]))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }
}
