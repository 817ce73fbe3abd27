//! Ledger singletons: the enumerable id registries and the stored assigner role
use super::error::LedgerError;
use super::store::{self, KeyValueStore, WriteSet};
use serde::Serialize;

pub const ASSIGNER_ROLE_KEY: &str = "config:assigner_role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Programs,
    Invoices,
}

impl IndexKind {
    pub fn key(&self) -> &'static str {
        match self {
            IndexKind::Programs => "index:programs",
            IndexKind::Invoices => "index:invoices",
        }
    }
}

/// Append-only, ordered record ids. Used for enumeration only.
#[derive(minicbor::Encode, minicbor::Decode, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordIndex {
    #[n(0)]
    pub ids: Vec<String>,
}

impl RecordIndex {
    pub fn load<S: KeyValueStore + ?Sized>(
        store: &S,
        kind: IndexKind,
    ) -> Result<Self, LedgerError> {
        Ok(store::load_opt(store, kind.key())?.unwrap_or_default())
    }
}

/// Appends `id` to the index and stages the result alongside the record writes.
pub fn register<S: KeyValueStore + ?Sized>(
    store: &S,
    writes: &mut WriteSet,
    kind: IndexKind,
    id: &str,
) -> Result<(), LedgerError> {
    let mut index = RecordIndex::load(store, kind)?;
    index.ids.push(id.to_string());
    writes.stage(kind.key(), &index)?;
    tracing::debug!(index = kind.key(), id, "registered id");
    Ok(())
}

/// The role allowed to create programs, as written at bootstrap.
pub fn assigner_role<S: KeyValueStore + ?Sized>(store: &S) -> Result<String, LedgerError> {
    store::load(store, ASSIGNER_ROLE_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn absent_index_reads_empty() {
        let store = MemoryStore::new();
        let index = RecordIndex::load(&store, IndexKind::Programs).unwrap();
        assert!(index.ids.is_empty());
    }

    #[test]
    fn register_appends_in_order() {
        let store = MemoryStore::new();
        for id in ["P1", "P1-R1"] {
            let mut writes = WriteSet::new();
            register(&store, &mut writes, IndexKind::Programs, id).unwrap();
            store.apply(writes).unwrap();
        }
        let index = RecordIndex::load(&store, IndexKind::Programs).unwrap();
        assert_eq!(index.ids, vec!["P1".to_string(), "P1-R1".to_string()]);
        assert!(
            RecordIndex::load(&store, IndexKind::Invoices)
                .unwrap()
                .ids
                .is_empty()
        );
    }
}
