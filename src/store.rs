//! Record store adapter.
//!
//! Typed records go in and out of a byte-oriented key-value backend through
//! this module. Every mutating operation stages its writes into a [`WriteSet`]
//! and hands the whole set to [`KeyValueStore::apply`], so a record, its
//! lineage neighbours and the index entries it needs land together.
use super::error::LedgerError;
use std::collections::BTreeMap;
use std::sync::Mutex;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError>;
    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), LedgerError>;
    /// Applies every staged write or none of them.
    fn apply(&self, writes: WriteSet) -> Result<(), LedgerError>;
    /// All entries whose key starts with `prefix`, in key order.
    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, LedgerError>;
}

/// Writes collected during one operation, committed as a single batch.
#[derive(Debug, Default)]
pub struct WriteSet {
    writes: Vec<(String, Vec<u8>)>,
}

impl WriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes `record` as CBOR and queues it under `key`.
    pub fn stage<T: minicbor::Encode<()>>(
        &mut self,
        key: impl Into<String>,
        record: &T,
    ) -> Result<(), LedgerError> {
        let bytes = minicbor::to_vec(record)?;
        self.writes.push((key.into(), bytes));
        Ok(())
    }

    pub fn stage_raw(&mut self, key: impl Into<String>, bytes: Vec<u8>) {
        self.writes.push((key.into(), bytes));
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn into_inner(self) -> Vec<(String, Vec<u8>)> {
        self.writes
    }
}

/// Fetches and decodes the record at `key`.
pub fn load<T, S>(store: &S, key: &str) -> Result<T, LedgerError>
where
    T: for<'b> minicbor::Decode<'b, ()>,
    S: KeyValueStore + ?Sized,
{
    let bytes = store
        .get(key)?
        .ok_or_else(|| LedgerError::NotFound(key.to_string()))?;
    decode(key, &bytes)
}

/// Like [`load`], but an absent key is `Ok(None)` instead of `NotFound`.
pub fn load_opt<T, S>(store: &S, key: &str) -> Result<Option<T>, LedgerError>
where
    T: for<'b> minicbor::Decode<'b, ()>,
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        Some(bytes) => decode(key, &bytes).map(Some),
        None => Ok(None),
    }
}

pub fn exists<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Result<bool, LedgerError> {
    Ok(store.get(key)?.is_some())
}

pub(crate) fn decode<T>(key: &str, bytes: &[u8]) -> Result<T, LedgerError>
where
    T: for<'b> minicbor::Decode<'b, ()>,
{
    minicbor::decode(bytes).map_err(|e| LedgerError::CorruptRecord {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

impl KeyValueStore for sled::Db {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        Ok(sled::Tree::get(self, key.as_bytes())?.map(|value| value.to_vec()))
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        sled::Tree::insert(self, key.as_bytes(), value)?;
        Ok(())
    }

    fn apply(&self, writes: WriteSet) -> Result<(), LedgerError> {
        let mut batch = sled::Batch::default();
        for (key, value) in writes.into_inner() {
            batch.insert(key.as_bytes(), value);
        }
        sled::Tree::apply_batch(self, batch)?;
        Ok(())
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, LedgerError> {
        sled::Tree::scan_prefix(self, prefix.as_bytes())
            .map(|entry| -> Result<(String, Vec<u8>), LedgerError> {
                let (key, value) = entry?;
                Ok((String::from_utf8_lossy(&key).into_owned(), value.to_vec()))
            })
            .collect()
    }
}

/// Process-local backend, used by tests and short-lived tooling.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>>, LedgerError> {
        self.entries
            .lock()
            .map_err(|_| LedgerError::Store("memory store lock poisoned".into()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        self.entries()?.insert(key.to_string(), value);
        Ok(())
    }

    fn apply(&self, writes: WriteSet) -> Result<(), LedgerError> {
        let mut entries = self.entries()?;
        for (key, value) in writes.into_inner() {
            entries.insert(key, value);
        }
        Ok(())
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, LedgerError> {
        Ok(self
            .entries()?
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_set_lands_in_one_apply() {
        let store = MemoryStore::new();
        let mut writes = WriteSet::new();
        writes.stage("a", &1u32).unwrap();
        writes.stage("b", &"two").unwrap();
        assert_eq!(writes.len(), 2);

        store.apply(writes).unwrap();

        let a: u32 = load(&store, "a").unwrap();
        assert_eq!(a, 1);
        assert!(exists(&store, "b").unwrap());
    }

    #[test]
    fn missing_and_corrupt_keys_are_distinguished() {
        let store = MemoryStore::new();
        store.put("junk", vec![0xff, 0x00]).unwrap();

        let missing = load::<String, _>(&store, "nope").unwrap_err();
        assert!(matches!(missing, LedgerError::NotFound(_)));

        let corrupt = load::<String, _>(&store, "junk").unwrap_err();
        assert!(matches!(corrupt, LedgerError::CorruptRecord { .. }));
    }

    #[test]
    fn scan_prefix_stops_at_prefix_boundary() {
        let store = MemoryStore::new();
        store.put("journal:P1:1", vec![1]).unwrap();
        store.put("journal:P1:2", vec![2]).unwrap();
        store.put("journal:P2:1", vec![3]).unwrap();

        let hits = store.scan_prefix("journal:P1:").unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1].1, vec![2]);
    }
}
