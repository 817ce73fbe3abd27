//! Read-side views over programs and invoices, filtered by caller visibility
use super::error::LedgerError;
use super::identity::{Identity, Role};
use super::invoice::{InvoiceLineItem, InvoiceStatus};
use super::program::{Program, ProgramStatus};
use super::registry::{IndexKind, RecordIndex};
use super::store::{self, KeyValueStore};
use super::types::Amount;
use super::utils::validate_record_id;
use serde::Serialize;

/// Public projection of a program for enumeration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramSummary {
    pub program_id: String,
    pub status: ProgramStatus,
    pub settled: bool,
    pub acknowledged: bool,
    pub raised_by: Option<String>,
    pub anchor_id: Option<String>,
    pub anchor_name: Option<String>,
    pub anchor_account: Option<String>,
    pub anchor_ifsc: Option<String>,
    pub anchor_limit: Amount,
    pub anchor_expiry: Option<String>,
    pub anchor_interest: Option<String>,
    pub anchor_grace_interest: Option<String>,
    pub anchor_grace_period: Option<String>,
    pub anchor_penal_interest: Option<String>,
    pub anchor_liquidation: Option<String>,
    pub po_id: Option<String>,
    pub po_amount: Amount,
    pub vendor_id: Option<String>,
    pub vendor_first_name: Option<String>,
    pub vendor_last_name: Option<String>,
    pub vendor_email: Option<String>,
    pub vendor_phone: Option<String>,
    pub vendor_pan: Option<String>,
    pub vendor_address: Option<String>,
    pub vendor_bank: Option<String>,
    pub vendor_bank_address: Option<String>,
    pub vendor_account: Option<String>,
    pub vendor_ifsc: Option<String>,
    pub vendor_limit: Amount,
    pub vendor_expiry: Option<String>,
}

impl From<&Program> for ProgramSummary {
    fn from(p: &Program) -> Self {
        Self {
            program_id: p.program_id.clone(),
            status: p.status,
            settled: p.settled,
            acknowledged: p.acknowledged,
            raised_by: p.raised_by.clone(),
            anchor_id: p.anchor.id.clone(),
            anchor_name: p.anchor.name.clone(),
            anchor_account: p.anchor.account.clone(),
            anchor_ifsc: p.anchor.ifsc.clone(),
            anchor_limit: p.anchor.limit,
            anchor_expiry: p.anchor.expiry.clone(),
            anchor_interest: p.anchor.interest.clone(),
            anchor_grace_interest: p.anchor.grace_interest.clone(),
            anchor_grace_period: p.anchor.grace_period.clone(),
            anchor_penal_interest: p.anchor.penal_interest.clone(),
            anchor_liquidation: p.anchor.liquidation.clone(),
            po_id: p.purchase_order.po_id.clone(),
            po_amount: p.purchase_order.amount,
            vendor_id: p.vendor.id.clone(),
            vendor_first_name: p.vendor.first_name.clone(),
            vendor_last_name: p.vendor.last_name.clone(),
            vendor_email: p.vendor.email.clone(),
            vendor_phone: p.vendor.phone.clone(),
            vendor_pan: p.vendor.pan.clone(),
            vendor_address: p.vendor.address.clone(),
            vendor_bank: p.vendor.bank.clone(),
            vendor_bank_address: p.vendor.bank_address.clone(),
            vendor_account: p.vendor.account.clone(),
            vendor_ifsc: p.vendor.ifsc.clone(),
            vendor_limit: p.vendor.limit,
            vendor_expiry: p.vendor.expiry.clone(),
        }
    }
}

/// Public projection of an invoice for enumeration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceSummary {
    pub invoice_id: String,
    pub program_id: String,
    pub owner: String,
    pub raised_by: Option<String>,
    pub raised_against: Option<String>,
    pub status: InvoiceStatus,
    pub claimed_amount: Amount,
    pub approved_amount: Amount,
    pub invoice_ref: Option<String>,
    pub checker_approved: bool,
    pub paid: bool,
    pub settled: bool,
    pub reference: Option<String>,
    pub anchor_name: Option<String>,
    pub anchor_account: Option<String>,
    pub anchor_ifsc: Option<String>,
    pub anchor_interest: Option<String>,
    pub po_id: Option<String>,
    pub po_amount: Amount,
    pub vendor_name: Option<String>,
    pub vendor_bank: Option<String>,
    pub vendor_ifsc: Option<String>,
}

impl From<&InvoiceLineItem> for InvoiceSummary {
    fn from(i: &InvoiceLineItem) -> Self {
        Self {
            invoice_id: i.invoice_id.clone(),
            program_id: i.program_id.clone(),
            owner: i.owner.clone(),
            raised_by: i.raised_by.clone(),
            raised_against: i.raised_against.clone(),
            status: i.status,
            claimed_amount: i.claimed_amount,
            approved_amount: i.approved_amount,
            invoice_ref: i.invoice_ref.clone(),
            checker_approved: i.checker_approved,
            paid: i.paid,
            settled: i.settled,
            reference: i.reference.clone(),
            anchor_name: i.terms.anchor_name.clone(),
            anchor_account: i.terms.anchor_account.clone(),
            anchor_ifsc: i.terms.anchor_ifsc.clone(),
            anchor_interest: i.terms.anchor_interest.clone(),
            po_id: i.terms.po_id.clone(),
            po_amount: i.terms.po_amount,
            vendor_name: i.terms.vendor_name.clone(),
            vendor_bank: i.terms.vendor_bank.clone(),
            vendor_ifsc: i.terms.vendor_ifsc.clone(),
        }
    }
}

pub fn get_program<S: KeyValueStore + ?Sized>(
    store: &S,
    caller: &Identity,
    program_id: &str,
) -> Result<Program, LedgerError> {
    validate_record_id(program_id)?;
    let program: Program = store::load(store, program_id)?;
    if !program.is_visible_to(caller) {
        return Err(LedgerError::denied("get_program", "program is not visible to caller"));
    }
    Ok(program)
}

pub fn get_invoice<S: KeyValueStore + ?Sized>(
    store: &S,
    caller: &Identity,
    invoice_id: &str,
) -> Result<InvoiceLineItem, LedgerError> {
    validate_record_id(invoice_id)?;
    let invoice: InvoiceLineItem = store::load(store, invoice_id)?;
    if !invoice.is_visible_to(caller) {
        return Err(LedgerError::denied("get_invoice", "invoice is not visible to caller"));
    }
    Ok(invoice)
}

/// Every indexed record, in index order. A single failed fetch fails the listing.
fn fetch_all<T, S>(store: &S, kind: IndexKind) -> Result<Vec<T>, LedgerError>
where
    T: for<'b> minicbor::Decode<'b, ()>,
    S: KeyValueStore + ?Sized,
{
    RecordIndex::load(store, kind)?
        .ids
        .iter()
        .map(|id| store::load(store, id))
        .collect()
}

pub fn list_programs<S: KeyValueStore + ?Sized>(
    store: &S,
    caller: &Identity,
) -> Result<Vec<Program>, LedgerError> {
    let programs: Vec<Program> = fetch_all(store, IndexKind::Programs)?;
    Ok(programs
        .into_iter()
        .filter(|p| p.is_visible_to(caller))
        .collect())
}

pub fn list_invoices<S: KeyValueStore + ?Sized>(
    store: &S,
    caller: &Identity,
) -> Result<Vec<InvoiceLineItem>, LedgerError> {
    let invoices: Vec<InvoiceLineItem> = fetch_all(store, IndexKind::Invoices)?;
    Ok(invoices
        .into_iter()
        .filter(|i| i.is_visible_to(caller))
        .collect())
}

pub fn list_program_ids<S: KeyValueStore + ?Sized>(
    store: &S,
    caller: &Identity,
) -> Result<Vec<ProgramSummary>, LedgerError> {
    let programs: Vec<Program> = fetch_all(store, IndexKind::Programs)?;
    Ok(programs
        .iter()
        .filter(|p| {
            p.is_visible_to(caller)
                || p.raised_against.as_deref() == Some(caller.account.as_str())
        })
        .map(ProgramSummary::from)
        .collect())
}

pub fn list_invoice_ids<S: KeyValueStore + ?Sized>(
    store: &S,
    caller: &Identity,
) -> Result<Vec<InvoiceSummary>, LedgerError> {
    let invoices: Vec<InvoiceLineItem> = fetch_all(store, IndexKind::Invoices)?;
    Ok(invoices
        .iter()
        .filter(|i| i.is_visible_to(caller))
        .map(InvoiceSummary::from)
        .collect())
}

/// Items filed under `program`, read through its child index.
pub fn program_invoices<S: KeyValueStore + ?Sized>(
    store: &S,
    program: &Program,
) -> Result<Vec<InvoiceLineItem>, LedgerError> {
    program
        .invoice_ids
        .iter()
        .map(|id| store::load(store, id))
        .collect()
}

pub(crate) fn is_admin(caller: &Identity) -> bool {
    caller.role == Role::Admin
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::register;
    use crate::store::{MemoryStore, WriteSet};

    fn seed(store: &MemoryStore, program: &Program) {
        let mut writes = WriteSet::new();
        writes.stage(program.program_id.clone(), program).unwrap();
        register(store, &mut writes, IndexKind::Programs, &program.program_id).unwrap();
        store.apply(writes).unwrap();
    }

    #[test]
    fn strangers_cannot_read_a_program() {
        let store = MemoryStore::new();
        seed(&store, &Program::new("P1", "acct_admin"));

        let stranger = Identity::new("acct_x", Role::Vendor);
        let err = get_program(&store, &stranger, "P1").unwrap_err();
        assert!(err.is_permission_denied());

        let admin = Identity::new("acct_other_admin", Role::Admin);
        assert!(get_program(&store, &admin, "P1").is_ok());
    }

    #[test]
    fn summaries_admit_raised_against() {
        let store = MemoryStore::new();
        let mut program = Program::new("P1", "acct_vendor");
        program.raised_against = Some("acct_vendor_2".into());
        seed(&store, &program);

        let counterparty = Identity::new("acct_vendor_2", Role::Vendor);
        assert!(list_programs(&store, &counterparty).unwrap().is_empty());
        assert_eq!(list_program_ids(&store, &counterparty).unwrap().len(), 1);
    }

    #[test]
    fn dangling_index_entry_aborts_listing() {
        let store = MemoryStore::new();
        seed(&store, &Program::new("P1", "acct_admin"));
        let mut writes = WriteSet::new();
        register(&store, &mut writes, IndexKind::Programs, "P404").unwrap();
        store.apply(writes).unwrap();

        let admin = Identity::new("acct_admin", Role::Admin);
        let err = list_programs(&store, &admin).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(id) if id == "P404"));
    }
}
