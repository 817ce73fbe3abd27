//! Smoke Screen Unit tests for supply-chain financing components
//!
//! These test are unit tests that span the codebase, testing behavior in
//! isolation from integration scenarios. These are intended as smoke-screen
//! and generally test the happy-path.
//!
#![allow(unused_imports)]

use supply_finance::{
    CapacityPolicy, CertificateIdentity, Command, Credential, Identity, IdentityProvider,
    LedgerError, Outcome, Role, ServiceConfig,
    command::InvoiceTransfer,
    journal::{self, JournalEntry},
    store::{self, KeyValueStore, MemoryStore, WriteSet},
    types::field,
    utils::new_uuid_to_bech32,
};

// UTILS MODULE TESTS
#[cfg(test)]
mod utils_tests {
    use super::*;

    /// Test that new_uuid_to_bech32 generates valid bech32-encoded strings
    /// with the correct human-readable prefix
    #[test]
    fn generates_valid_bech32_with_hrp() {
        let result = new_uuid_to_bech32("acct");
        assert!(result.is_ok());

        let encoded = result.unwrap();
        assert!(encoded.starts_with("acct1"));
        assert!(encoded.len() > 10); // UUID should produce substantial output
    }

    /// Test that the function handles empty strings appropriately
    #[test]
    fn handles_empty_hrp() {
        // Empty string should fail
        let result = new_uuid_to_bech32("");
        assert!(result.is_err());
    }

    /// Successive account ids never collide
    #[test]
    fn generates_unique_ids() {
        let first = new_uuid_to_bech32("acct").unwrap();
        let second = new_uuid_to_bech32("acct").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn undefined_fields_read_as_unset() {
        assert_eq!(field(""), None);
        assert_eq!(field("UNDEFINED"), None);
        assert_eq!(field("PO1"), Some("PO1".to_string()));
    }
}

// IDENTITY MODULE TESTS
#[cfg(test)]
mod identity_tests {
    use super::*;

    /// A minted credential resolves back to the identity it was minted for
    #[test]
    fn credential_round_trips_to_identity() {
        let encoded = Credential::new("acct_vendor", &Role::Vendor).encode().unwrap();
        assert!(encoded.starts_with("cred1"));

        let provider = CertificateIdentity::from_encoded(&encoded).unwrap();
        let caller = Identity::resolve(&provider).unwrap();

        assert_eq!(caller, Identity::new("acct_vendor", Role::Vendor));
    }

    #[test]
    fn foreign_prefix_is_rejected() {
        let foreign = new_uuid_to_bech32("acct").unwrap();
        let err = Credential::decode(&foreign).unwrap_err();
        assert!(matches!(err, LedgerError::Identity(_)));
    }

    #[test]
    fn unknown_roles_are_kept_verbatim() {
        let role = Role::from("Auditor");
        assert_eq!(role, Role::Other("Auditor".to_string()));
        assert_eq!(role.as_str(), "Auditor");
        assert_eq!(Role::from("assigner"), Role::Admin);
    }

    /// Providers that cannot name an attribute fail identity resolution
    #[test]
    fn missing_attribute_fails_resolution() {
        struct Anonymous;
        impl IdentityProvider for Anonymous {
            fn attribute(&self, name: &str) -> Result<Vec<u8>, LedgerError> {
                Err(LedgerError::Identity(format!("no {name}")))
            }
            fn decode_credential(&self, _: &str) -> Result<Identity, LedgerError> {
                Err(LedgerError::Identity("unsupported".into()))
            }
        }

        assert!(matches!(
            Identity::resolve(&Anonymous),
            Err(LedgerError::Identity(_))
        ));
    }
}

// COMMAND MODULE TESTS
#[cfg(test)]
mod command_tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn parses_transfer_edges() {
        let command = Command::parse(
            "transfer_vendor_to_anchor_invoice",
            &args(&["P1", "cred1xyz", "I1"]),
        )
        .unwrap();

        assert_eq!(
            command,
            Command::TransferInvoice {
                edge: InvoiceTransfer::VendorToAnchor,
                program_id: "P1".into(),
                recipient: "cred1xyz".into(),
                invoice_id: "I1".into(),
            }
        );
        assert!(!command.is_query());
    }

    #[test]
    fn wrong_argument_count_is_validation() {
        let err = Command::parse("create_program", &args(&["P1", "extra"])).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn unknown_function_is_validation() {
        let err = Command::parse("delete_everything", &[]).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }
}

// CONFIG MODULE TESTS
#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn defaults_are_silent_assigner() {
        let config = ServiceConfig::default();
        assert_eq!(config.assigner_role, Role::Admin.as_str());
        assert_eq!(config.capacity_policy, CapacityPolicy::Silent);
    }

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!("REJECT".parse::<CapacityPolicy>().unwrap(), CapacityPolicy::Reject);
        assert!("loud".parse::<CapacityPolicy>().is_err());
    }
}

// STORE AND JOURNAL TESTS
#[cfg(test)]
mod store_tests {
    use super::*;

    #[test]
    fn write_set_lands_together() {
        let db = MemoryStore::new();
        let mut writes = WriteSet::new();
        writes.stage("a", &1u32).unwrap();
        writes.stage("b", &2u32).unwrap();
        db.apply(writes).unwrap();

        assert_eq!(store::load::<u32, _>(&db, "b").unwrap(), 2);
        assert!(matches!(
            store::load::<u32, _>(&db, "c"),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn journal_entries_hash_their_encoding() {
        let db = MemoryStore::new();
        let admin = Identity::new("acct_admin", Role::Admin);
        let entry = JournalEntry::new("P1", &admin, "create_program");
        let (hash, cbor) = entry.build().unwrap();
        assert_eq!(hash, sha256::digest(&cbor));

        let mut writes = WriteSet::new();
        entry.stage(&mut writes).unwrap();
        db.apply(writes).unwrap();

        let history = journal::history(&db, "P1").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].hash, hash);
        assert_eq!(history[0].entry, entry);
    }

    #[test]
    fn outcome_renders_as_tagged_json() {
        let skipped = Outcome::Skipped {
            reason: "over limit".into(),
        };
        assert_eq!(
            serde_json::to_value(skipped).unwrap(),
            serde_json::json!({"outcome": "skipped", "reason": "over limit"})
        );
    }
}
