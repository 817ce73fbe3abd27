//! Append-only audit trail of applied operations
use super::error::LedgerError;
use super::identity::Identity;
use super::store::{self, KeyValueStore, WriteSet};
use super::types::TimeStamp;
use chrono::Utc;
use serde::Serialize;

const JOURNAL_PREFIX: &str = "journal";

/// One applied operation as seen from one record it touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, minicbor::Encode, minicbor::Decode)]
pub struct JournalEntry {
    #[n(0)]
    pub record_id: String,
    #[n(1)]
    pub actor: String,
    #[n(2)]
    pub role: String,
    #[n(3)]
    pub action: String,
    #[n(4)]
    pub at: TimeStamp<Utc>, // issued when the operation is applied
}

impl JournalEntry {
    pub fn new(record_id: &str, caller: &Identity, action: &str) -> Self {
        Self {
            record_id: record_id.to_string(),
            actor: caller.account.clone(),
            role: caller.role.as_str().to_string(),
            action: action.to_string(),
            at: TimeStamp::new(),
        }
    }

    pub fn build(&self) -> Result<(String, Vec<u8>), LedgerError> {
        let cbor = minicbor::to_vec(self)?;
        let hash = sha256::digest(&cbor);

        Ok((hash, cbor))
    }

    /// Stages the entry under a key that sorts by application time within its record.
    pub fn stage(&self, writes: &mut WriteSet) -> Result<String, LedgerError> {
        let (hash, cbor) = self.build()?;
        let nanos = self.at.to_datetime_utc().timestamp_nanos_opt().unwrap_or_default();
        writes.stage_raw(
            format!("{JOURNAL_PREFIX}:{}:{nanos:020}:{hash}", self.record_id),
            cbor,
        );
        Ok(hash)
    }
}

/// A journal entry together with the hash it is stored under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recorded {
    pub hash: String,
    #[serde(flatten)]
    pub entry: JournalEntry,
}

pub fn history<S: KeyValueStore + ?Sized>(
    store: &S,
    record_id: &str,
) -> Result<Vec<Recorded>, LedgerError> {
    store
        .scan_prefix(&format!("{JOURNAL_PREFIX}:{record_id}:"))?
        .into_iter()
        .map(|(key, bytes)| {
            let entry: JournalEntry = store::decode(&key, &bytes)?;
            let hash = key.rsplit(':').next().unwrap_or_default().to_string();
            Ok(Recorded { hash, entry })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Role;
    use crate::store::MemoryStore;

    #[test]
    fn entry_hash_is_content_address() {
        let entry = JournalEntry::new("P1", &Identity::new("a", Role::Admin), "create_program");
        let (hash, cbor) = entry.build().unwrap();
        assert_eq!(hash, sha256::digest(&cbor));
    }

    #[test]
    fn history_is_scoped_to_one_record() {
        let store = MemoryStore::new();
        let admin = Identity::new("a", Role::Admin);
        let mut writes = WriteSet::new();
        JournalEntry::new("P1", &admin, "create_program").stage(&mut writes).unwrap();
        JournalEntry::new("P1-R1", &admin, "anchor_to_admin_rev").stage(&mut writes).unwrap();
        store.apply(writes).unwrap();

        let trail = history(&store, "P1").unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].entry.action, "create_program");
        assert_eq!(trail[0].hash.len(), 64);
    }
}
