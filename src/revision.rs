//! Amendments as new linked records.
//!
//! A fork copies its source under a suffix-derived id, points back at the
//! source through its parent id and is appended to the source's fork list.
//! The source keeps its status. Both records are staged by the caller into
//! the same write set.
use super::error::LedgerError;
use super::store::{self, KeyValueStore};

pub trait Revisable: Clone {
    fn record_id(&self) -> &str;
    fn fork_ids(&self) -> &[String];
    fn fork_ids_mut(&mut self) -> &mut Vec<String>;
    /// Moves a fresh copy onto `id` under `parent`. Record specific state that
    /// must not be inherited is dropped here.
    fn rebase(&mut self, id: String, parent: String, remark: Option<String>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suffix {
    ProgramBackToAdmin,
    ProgramBackToAnchor,
    InvoiceBackToVendor,
    InvoiceBackToAnchor,
    InvoiceBackFromAdmin,
    InvoiceBackToAdmin,
    InvoiceBackToMaker,
    PaymentApproval,
    PaymentResult,
}

impl Suffix {
    pub fn as_str(&self) -> &'static str {
        match self {
            Suffix::ProgramBackToAdmin => "-R1",
            Suffix::ProgramBackToAnchor => "-R2",
            Suffix::InvoiceBackToVendor => "-RIN1",
            Suffix::InvoiceBackToAnchor => "-RIN2",
            Suffix::InvoiceBackFromAdmin => "-RIN3",
            Suffix::InvoiceBackToAdmin => "-RIN4",
            Suffix::InvoiceBackToMaker => "-RIN5",
            Suffix::PaymentApproval => "-RIU1",
            Suffix::PaymentResult => "-RIU2",
        }
    }
}

pub fn fork_id(source_id: &str, suffix: Suffix) -> String {
    format!("{source_id}{}", suffix.as_str())
}

/// Derives the amended copy of `source` and links it into the source's fork list.
///
/// Fails with `DuplicateId` when the derived id is already taken, in which case
/// `source` is left as it was.
pub fn fork<R, S, F>(
    store: &S,
    source: &mut R,
    suffix: Suffix,
    remark: Option<String>,
    reset: F,
) -> Result<R, LedgerError>
where
    R: Revisable,
    S: KeyValueStore + ?Sized,
    F: FnOnce(&mut R),
{
    let id = fork_id(source.record_id(), suffix);
    if store::exists(store, &id)? || source.fork_ids().contains(&id) {
        return Err(LedgerError::DuplicateId(id));
    }

    let mut child = source.clone();
    child.rebase(id.clone(), source.record_id().to_string(), remark);
    child.fork_ids_mut().clear();
    reset(&mut child);

    tracing::debug!(source = source.record_id(), fork = %id, "forked record");
    source.fork_ids_mut().push(id);

    Ok(child)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: String,
        parent: Option<String>,
        forks: Vec<String>,
        remark: Option<String>,
        body: u32,
    }

    impl Revisable for Note {
        fn record_id(&self) -> &str {
            &self.id
        }
        fn fork_ids(&self) -> &[String] {
            &self.forks
        }
        fn fork_ids_mut(&mut self) -> &mut Vec<String> {
            &mut self.forks
        }
        fn rebase(&mut self, id: String, parent: String, remark: Option<String>) {
            self.id = id;
            self.parent = Some(parent);
            self.remark = remark;
        }
    }

    fn note() -> Note {
        Note {
            id: "N".into(),
            parent: None,
            forks: vec!["N-old".into()],
            remark: None,
            body: 7,
        }
    }

    #[test]
    fn fork_links_both_directions() {
        let store = MemoryStore::new();
        let mut source = note();

        let child = fork(&store, &mut source, Suffix::ProgramBackToAdmin, Some("fix".into()), |c| {
            c.body = 0
        })
        .unwrap();

        assert_eq!(child.id, "N-R1");
        assert_eq!(child.parent.as_deref(), Some("N"));
        assert!(child.forks.is_empty());
        assert_eq!(child.body, 0);
        assert_eq!(source.forks, vec!["N-old".to_string(), "N-R1".to_string()]);
        assert_eq!(source.body, 7);
    }

    #[test]
    fn taken_id_leaves_source_alone() {
        let store = MemoryStore::new();
        store.put("N-RIN1", vec![0]).unwrap();
        let mut source = note();

        let err = fork(&store, &mut source, Suffix::InvoiceBackToVendor, None, |_| {}).unwrap_err();

        assert!(matches!(err, LedgerError::DuplicateId(id) if id == "N-RIN1"));
        assert_eq!(source, note());
    }
}
