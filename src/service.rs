//! Service layer API for program and invoice operations
use super::command::{Command, InvoiceRevision, InvoiceTransfer};
use super::config::{CapacityPolicy, ServiceConfig};
use super::error::LedgerError;
use super::identity::{Identity, IdentityProvider};
use super::invoice::{InvoiceLineItem, approved_total};
use super::journal::{self, JournalEntry, Recorded};
use super::program::{AnchorTerms, Program, VendorTerms};
use super::query::{self, InvoiceSummary, ProgramSummary};
use super::registry::{self, ASSIGNER_ROLE_KEY, IndexKind, RecordIndex};
use super::store::{self, KeyValueStore, WriteSet};
use super::types::{Amount, Outcome};
use super::utils::validate_record_id;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct FinancingService<S> {
    instance: Arc<S>,
    config: ServiceConfig,
}

impl FinancingService<sled::Db> {
    /// Opens the sled database named by the configuration.
    pub fn open(config: ServiceConfig) -> Result<Self, LedgerError> {
        let db = sled::open(&config.db_path)?;
        Ok(Self::new(Arc::new(db), config))
    }
}

impl<S: KeyValueStore> FinancingService<S> {
    pub fn new(instance: Arc<S>, config: ServiceConfig) -> Self {
        Self { instance, config }
    }

    fn store(&self) -> &S {
        &self.instance
    }

    /// Writes the ledger singletons that are still missing. Safe to call on every start.
    pub fn bootstrap(&self) -> Result<(), LedgerError> {
        let mut writes = WriteSet::new();
        for kind in [IndexKind::Programs, IndexKind::Invoices] {
            if !store::exists(self.store(), kind.key())? {
                writes.stage(kind.key(), &RecordIndex::default())?;
            }
        }
        if !store::exists(self.store(), ASSIGNER_ROLE_KEY)? {
            writes.stage(ASSIGNER_ROLE_KEY, &self.config.assigner_role)?;
        }
        if writes.is_empty() {
            return Ok(());
        }

        info!(
            assigner_role = %self.config.assigner_role,
            keys = writes.len(),
            "bootstrapped ledger"
        );
        self.instance.apply(writes)
    }

    fn load_program(&self, program_id: &str) -> Result<Program, LedgerError> {
        validate_record_id(program_id)?;
        store::load(self.store(), program_id)
    }

    fn load_pair(
        &self,
        program_id: &str,
        invoice_id: &str,
    ) -> Result<(Program, InvoiceLineItem), LedgerError> {
        let program = self.load_program(program_id)?;
        validate_record_id(invoice_id)?;
        let invoice = store::load(self.store(), invoice_id)?;
        Ok((program, invoice))
    }

    /// Journals the operation against every touched record and commits the batch.
    fn commit(
        &self,
        caller: &Identity,
        op: &'static str,
        mut writes: WriteSet,
        touched: &[String],
    ) -> Result<Outcome, LedgerError> {
        for record_id in touched {
            JournalEntry::new(record_id, caller, op).stage(&mut writes)?;
        }
        self.instance.apply(writes)?;
        info!(op, account = %caller.account, records = ?touched, "applied");
        Ok(Outcome::Applied)
    }

    fn save_program(
        &self,
        caller: &Identity,
        op: &'static str,
        program: &Program,
    ) -> Result<Outcome, LedgerError> {
        let mut writes = WriteSet::new();
        writes.stage(program.program_id.as_str(), program)?;
        self.commit(caller, op, writes, &[program.program_id.clone()])
    }

    /// Persists a program fork together with its source and its index entry.
    fn save_program_fork(
        &self,
        caller: &Identity,
        op: &'static str,
        source: &Program,
        fork: &Program,
    ) -> Result<Outcome, LedgerError> {
        let mut writes = WriteSet::new();
        writes.stage(source.program_id.as_str(), source)?;
        writes.stage(fork.program_id.as_str(), fork)?;
        registry::register(self.store(), &mut writes, IndexKind::Programs, &fork.program_id)?;
        info!(op, program_id = %source.program_id, fork_id = %fork.program_id, "program forked");
        self.commit(
            caller,
            op,
            writes,
            &[source.program_id.clone(), fork.program_id.clone()],
        )
    }

    /// Persists an invoice. With `retire` set, its parent (if any) is retired in the same batch.
    fn save_invoice(
        &self,
        caller: &Identity,
        op: &'static str,
        invoice: &InvoiceLineItem,
        retire: Option<bool>,
    ) -> Result<Outcome, LedgerError> {
        let mut writes = WriteSet::new();
        let mut touched = vec![invoice.invoice_id.clone()];

        if let (Some(carry_claim), Some(parent_id)) = (retire, invoice.parent_invoice_id.as_deref())
        {
            let mut parent: InvoiceLineItem = store::load(self.store(), parent_id)?;
            if parent.retire(carry_claim) {
                debug!(
                    op,
                    invoice_id = %invoice.invoice_id,
                    parent_id,
                    "retired superseded invoice"
                );
                writes.stage(parent_id, &parent)?;
                touched.push(parent_id.to_string());
            }
        }

        writes.stage(invoice.invoice_id.as_str(), invoice)?;
        self.commit(caller, op, writes, &touched)
    }

    /// Persists an invoice fork, its source, the program's child index and the invoice index.
    fn save_invoice_fork(
        &self,
        caller: &Identity,
        op: &'static str,
        mut program: Program,
        source: &InvoiceLineItem,
        fork: &InvoiceLineItem,
    ) -> Result<Outcome, LedgerError> {
        program.invoice_ids.push(fork.invoice_id.clone());

        let mut writes = WriteSet::new();
        writes.stage(source.invoice_id.as_str(), source)?;
        writes.stage(fork.invoice_id.as_str(), fork)?;
        writes.stage(program.program_id.as_str(), &program)?;
        registry::register(self.store(), &mut writes, IndexKind::Invoices, &fork.invoice_id)?;
        info!(op, invoice_id = %source.invoice_id, fork_id = %fork.invoice_id, "invoice forked");
        self.commit(
            caller,
            op,
            writes,
            &[
                source.invoice_id.clone(),
                fork.invoice_id.clone(),
                program.program_id.clone(),
            ],
        )
    }

    /// Maps a capacity overrun onto the configured policy. `None` means carry on.
    fn within_capacity(
        &self,
        op: &'static str,
        record_id: &str,
        checked: Result<(), LedgerError>,
    ) -> Result<Option<Outcome>, LedgerError> {
        match checked {
            Ok(()) => Ok(None),
            Err(err @ LedgerError::CapacityExceeded { .. })
                if self.config.capacity_policy == CapacityPolicy::Silent =>
            {
                warn!(op, record_id, %err, "capacity exceeded, leaving record unchanged");
                Ok(Some(Outcome::Skipped {
                    reason: err.to_string(),
                }))
            }
            Err(err) => Err(err),
        }
    }

    /// Creates an empty program template owned by the caller.
    pub fn create_program(
        &self,
        caller: &Identity,
        program_id: &str,
    ) -> Result<Outcome, LedgerError> {
        validate_record_id(program_id)?;
        let assigner = registry::assigner_role(self.store())?;
        if caller.role.as_str() != assigner {
            return Err(LedgerError::denied(
                "create_program",
                format!("caller role {} is not {assigner}", caller.role),
            ));
        }
        if store::exists(self.store(), program_id)? {
            return Err(LedgerError::DuplicateId(program_id.to_string()));
        }

        let program = Program::new(program_id, caller.account.clone());
        let mut writes = WriteSet::new();
        writes.stage(program_id, &program)?;
        registry::register(self.store(), &mut writes, IndexKind::Programs, program_id)?;
        self.commit(caller, "create_program", writes, &[program_id.to_string()])
    }

    pub fn update_program_terms(
        &self,
        caller: &Identity,
        program_id: &str,
        terms: AnchorTerms,
    ) -> Result<Outcome, LedgerError> {
        let mut program = self.load_program(program_id)?;
        program.update_anchor_terms(caller, terms)?;
        self.save_program(caller, "update_program_terms", &program)
    }

    pub fn update_vendor_terms(
        &self,
        caller: &Identity,
        program_id: &str,
        terms: VendorTerms,
    ) -> Result<Outcome, LedgerError> {
        let mut program = self.load_program(program_id)?;
        program.update_vendor_terms(caller, terms)?;
        self.save_program(caller, "update_vendor_terms", &program)
    }

    pub fn admin_to_anchor(
        &self,
        caller: &Identity,
        program_id: &str,
        recipient: &Identity,
    ) -> Result<Outcome, LedgerError> {
        let mut program = self.load_program(program_id)?;
        program.admin_to_anchor(caller, recipient)?;
        self.save_program(caller, "admin_to_anchor", &program)
    }

    pub fn anchor_to_admin_rev(
        &self,
        caller: &Identity,
        program_id: &str,
        recipient: &Identity,
        remark: &str,
    ) -> Result<Outcome, LedgerError> {
        let mut program = self.load_program(program_id)?;
        let fork = program.revise_to_admin(self.store(), caller, recipient, remark)?;
        self.save_program_fork(caller, "anchor_to_admin_rev", &program, &fork)
    }

    pub fn update_po(
        &self,
        caller: &Identity,
        program_id: &str,
        amount: Amount,
        image: &str,
        po_id: &str,
    ) -> Result<Outcome, LedgerError> {
        let mut program = self.load_program(program_id)?;
        let checked = program.update_po(caller, amount, image, po_id);
        if let Some(skipped) = self.within_capacity("update_po", program_id, checked)? {
            return Ok(skipped);
        }
        self.save_program(caller, "update_po", &program)
    }

    pub fn anchor_to_vendor(
        &self,
        caller: &Identity,
        program_id: &str,
        recipient: &Identity,
    ) -> Result<Outcome, LedgerError> {
        let mut program = self.load_program(program_id)?;
        program.anchor_to_vendor(caller, recipient)?;
        self.save_program(caller, "anchor_to_vendor", &program)
    }

    pub fn vendor_to_anchor_rev(
        &self,
        caller: &Identity,
        program_id: &str,
        recipient: &Identity,
        remark: &str,
    ) -> Result<Outcome, LedgerError> {
        let mut program = self.load_program(program_id)?;
        let fork = program.revise_to_anchor(self.store(), caller, recipient, remark)?;
        self.save_program_fork(caller, "vendor_to_anchor_rev", &program, &fork)
    }

    pub fn acknowledge_po(
        &self,
        caller: &Identity,
        program_id: &str,
    ) -> Result<Outcome, LedgerError> {
        let mut program = self.load_program(program_id)?;
        program.acknowledge_po(caller)?;
        self.save_program(caller, "acknowledge_po", &program)
    }

    pub fn close_program(
        &self,
        caller: &Identity,
        program_id: &str,
    ) -> Result<Outcome, LedgerError> {
        let mut program = self.load_program(program_id)?;
        program.close(caller)?;
        self.save_program(caller, "close_program", &program)
    }

    /// Files a new template invoice under the program and both indexes.
    pub fn create_invoice(
        &self,
        caller: &Identity,
        program_id: &str,
        invoice_id: &str,
    ) -> Result<Outcome, LedgerError> {
        let mut program = self.load_program(program_id)?;
        validate_record_id(invoice_id)?;
        let invoice = InvoiceLineItem::create(&program, caller, invoice_id)?;
        if store::exists(self.store(), invoice_id)? {
            return Err(LedgerError::DuplicateId(invoice_id.to_string()));
        }

        program.invoice_ids.push(invoice_id.to_string());
        let mut writes = WriteSet::new();
        writes.stage(invoice_id, &invoice)?;
        writes.stage(program_id, &program)?;
        registry::register(self.store(), &mut writes, IndexKind::Invoices, invoice_id)?;
        self.commit(
            caller,
            "create_invoice",
            writes,
            &[invoice_id.to_string(), program_id.to_string()],
        )
    }

    pub fn update_invoice_details(
        &self,
        caller: &Identity,
        program_id: &str,
        invoice_id: &str,
        amount: Amount,
        invoice_ref: &str,
        image: &str,
    ) -> Result<Outcome, LedgerError> {
        let (program, mut invoice) = self.load_pair(program_id, invoice_id)?;
        let siblings = query::program_invoices(self.store(), &program)?;
        let approved = approved_total(&siblings, None);

        let checked =
            invoice.update_details(&program, caller, amount, invoice_ref, image, approved);
        if let Some(skipped) =
            self.within_capacity("update_invoice_details", invoice_id, checked)?
        {
            return Ok(skipped);
        }
        self.save_invoice(caller, "update_invoice_details", &invoice, None)
    }

    pub fn approve_invoice_amount(
        &self,
        caller: &Identity,
        program_id: &str,
        invoice_id: &str,
        amount: Amount,
    ) -> Result<Outcome, LedgerError> {
        let (program, mut invoice) = self.load_pair(program_id, invoice_id)?;
        let siblings = query::program_invoices(self.store(), &program)?;
        let approved_elsewhere = approved_total(&siblings, Some(invoice_id));

        let checked = invoice.approve_amount(&program, caller, amount, approved_elsewhere);
        if let Some(skipped) =
            self.within_capacity("approve_invoice_amount", invoice_id, checked)?
        {
            return Ok(skipped);
        }
        self.save_invoice(caller, "approve_invoice_amount", &invoice, None)
    }

    /// Hands the invoice to the next party and retires the item it superseded.
    pub fn transfer_invoice(
        &self,
        caller: &Identity,
        edge: InvoiceTransfer,
        program_id: &str,
        recipient: &Identity,
        invoice_id: &str,
    ) -> Result<Outcome, LedgerError> {
        let (program, mut invoice) = self.load_pair(program_id, invoice_id)?;
        let carry_claim = match edge {
            InvoiceTransfer::VendorToAnchor => {
                invoice.raise_to_anchor(&program, caller, recipient)?;
                true
            }
            InvoiceTransfer::AnchorToVendor => {
                invoice.authorize(&program, caller, recipient)?;
                false
            }
            InvoiceTransfer::VendorToAdmin => {
                invoice.request_payment(&program, caller, recipient)?;
                false
            }
            InvoiceTransfer::AdminToPaymentMaker => {
                invoice.initiate_payment(&program, caller, recipient)?;
                false
            }
            InvoiceTransfer::PaymentMakerToPaymentChecker => {
                invoice.submit_for_approval(&program, caller, recipient)?;
                false
            }
            InvoiceTransfer::PaymentCheckerToPaymentMaker => {
                invoice.return_to_maker(&program, caller, recipient)?;
                false
            }
        };
        self.save_invoice(caller, edge.name(), &invoice, Some(carry_claim))
    }

    /// Hands a new amended copy of the invoice back to an earlier party.
    pub fn revise_invoice(
        &self,
        caller: &Identity,
        edge: InvoiceRevision,
        program_id: &str,
        recipient: &Identity,
        invoice_id: &str,
        remark: &str,
    ) -> Result<Outcome, LedgerError> {
        let (program, mut invoice) = self.load_pair(program_id, invoice_id)?;
        let store = self.store();
        let fork = match edge {
            InvoiceRevision::AnchorToVendor => {
                invoice.revise_to_vendor(store, &program, caller, recipient, remark)?
            }
            InvoiceRevision::VendorToAnchor => {
                invoice.revise_to_anchor(store, &program, caller, recipient, remark)?
            }
            InvoiceRevision::AdminToVendor => {
                invoice.revise_from_admin(store, &program, caller, recipient, remark)?
            }
            InvoiceRevision::PaymentToAdmin => {
                invoice.revise_to_admin(store, &program, caller, recipient, remark)?
            }
            InvoiceRevision::PaymentCheckerToPaymentMaker => {
                invoice.revise_to_maker(store, &program, caller, recipient, remark)?
            }
        };
        self.save_invoice_fork(caller, edge.name(), program, &invoice, &fork)
    }

    pub fn record_payment(
        &self,
        caller: &Identity,
        program_id: &str,
        invoice_id: &str,
        amount: Amount,
        channel: &str,
    ) -> Result<Outcome, LedgerError> {
        let (program, mut invoice) = self.load_pair(program_id, invoice_id)?;
        invoice.record_payment(&program, caller, amount, channel)?;
        self.save_invoice(caller, "record_payment", &invoice, None)
    }

    pub fn approve_payment(
        &self,
        caller: &Identity,
        program_id: &str,
        invoice_id: &str,
    ) -> Result<Outcome, LedgerError> {
        let (program, mut invoice) = self.load_pair(program_id, invoice_id)?;
        invoice.approve_payment(&program, caller)?;
        self.save_invoice(caller, "approve_payment", &invoice, Some(false))
    }

    pub fn revert_payment_approval(
        &self,
        caller: &Identity,
        program_id: &str,
        invoice_id: &str,
        remark: &str,
    ) -> Result<Outcome, LedgerError> {
        let (program, mut invoice) = self.load_pair(program_id, invoice_id)?;
        let fork = invoice.revert_payment_approval(self.store(), &program, caller, remark)?;
        self.save_invoice_fork(caller, "revert_payment_approval", program, &invoice, &fork)
    }

    /// Records the reported transaction and retires the superseded item whatever the outcome.
    pub fn record_payment_result(
        &self,
        caller: &Identity,
        program_id: &str,
        invoice_id: &str,
        txn_status: &str,
        reference: &str,
    ) -> Result<Outcome, LedgerError> {
        let (program, mut invoice) = self.load_pair(program_id, invoice_id)?;
        invoice.record_payment_result(&program, caller, txn_status, reference)?;
        self.save_invoice(caller, "record_payment_result", &invoice, Some(false))
    }

    pub fn revert_payment_result(
        &self,
        caller: &Identity,
        program_id: &str,
        invoice_id: &str,
        remark: &str,
    ) -> Result<Outcome, LedgerError> {
        let (program, mut invoice) = self.load_pair(program_id, invoice_id)?;
        let fork = invoice.revert_payment_result(self.store(), &program, caller, remark)?;
        self.save_invoice_fork(caller, "revert_payment_result", program, &invoice, &fork)
    }

    pub fn settle_invoice(
        &self,
        caller: &Identity,
        program_id: &str,
        invoice_id: &str,
        amount: Amount,
    ) -> Result<Outcome, LedgerError> {
        let (program, mut invoice) = self.load_pair(program_id, invoice_id)?;
        invoice.settle(&program, caller, amount)?;
        self.save_invoice(caller, "settle_invoice", &invoice, Some(false))
    }

    pub fn get_program(&self, caller: &Identity, program_id: &str) -> Result<Program, LedgerError> {
        query::get_program(self.store(), caller, program_id)
    }

    pub fn get_invoice(
        &self,
        caller: &Identity,
        invoice_id: &str,
    ) -> Result<InvoiceLineItem, LedgerError> {
        query::get_invoice(self.store(), caller, invoice_id)
    }

    pub fn list_programs(&self, caller: &Identity) -> Result<Vec<Program>, LedgerError> {
        query::list_programs(self.store(), caller)
    }

    pub fn list_invoices(&self, caller: &Identity) -> Result<Vec<InvoiceLineItem>, LedgerError> {
        query::list_invoices(self.store(), caller)
    }

    pub fn list_program_ids(&self, caller: &Identity) -> Result<Vec<ProgramSummary>, LedgerError> {
        query::list_program_ids(self.store(), caller)
    }

    pub fn list_invoice_ids(&self, caller: &Identity) -> Result<Vec<InvoiceSummary>, LedgerError> {
        query::list_invoice_ids(self.store(), caller)
    }

    /// The journal of one record, oldest first. Admin only.
    pub fn get_history(
        &self,
        caller: &Identity,
        record_id: &str,
    ) -> Result<Vec<Recorded>, LedgerError> {
        if !query::is_admin(caller) {
            return Err(LedgerError::denied("get_history", "only the admin reads history"));
        }
        validate_record_id(record_id)?;
        journal::history(self.store(), record_id)
    }

    /// Runs one command as the caller named by `provider` and renders the result as JSON.
    pub fn execute<P: IdentityProvider + ?Sized>(
        &self,
        provider: &P,
        command: Command,
    ) -> Result<serde_json::Value, LedgerError> {
        let caller = Identity::resolve(provider)?;
        debug!(
            op = command.name(),
            query = command.is_query(),
            account = %caller.account,
            "executing"
        );
        let recipient = |credential: &str| provider.decode_credential(credential);

        let value = match command {
            Command::CreateProgram { program_id } => {
                serde_json::to_value(self.create_program(&caller, &program_id)?)?
            }
            Command::UpdateProgramTerms { program_id, terms } => {
                serde_json::to_value(self.update_program_terms(&caller, &program_id, terms)?)?
            }
            Command::UpdateVendorTerms { program_id, terms } => {
                serde_json::to_value(self.update_vendor_terms(&caller, &program_id, terms)?)?
            }
            Command::AdminToAnchor {
                program_id,
                recipient: cred,
            } => serde_json::to_value(self.admin_to_anchor(
                &caller,
                &program_id,
                &recipient(&cred)?,
            )?)?,
            Command::AnchorToAdminRev {
                program_id,
                recipient: cred,
                remark,
            } => serde_json::to_value(self.anchor_to_admin_rev(
                &caller,
                &program_id,
                &recipient(&cred)?,
                &remark,
            )?)?,
            Command::UpdatePo {
                program_id,
                amount,
                image,
                po_id,
            } => {
                serde_json::to_value(self.update_po(&caller, &program_id, amount, &image, &po_id)?)?
            }
            Command::AnchorToVendor {
                program_id,
                recipient: cred,
            } => serde_json::to_value(self.anchor_to_vendor(
                &caller,
                &program_id,
                &recipient(&cred)?,
            )?)?,
            Command::VendorToAnchorRev {
                program_id,
                recipient: cred,
                remark,
            } => serde_json::to_value(self.vendor_to_anchor_rev(
                &caller,
                &program_id,
                &recipient(&cred)?,
                &remark,
            )?)?,
            Command::AcknowledgePo { program_id } => {
                serde_json::to_value(self.acknowledge_po(&caller, &program_id)?)?
            }
            Command::CloseProgram { program_id } => {
                serde_json::to_value(self.close_program(&caller, &program_id)?)?
            }
            Command::CreateInvoice {
                program_id,
                invoice_id,
            } => serde_json::to_value(self.create_invoice(&caller, &program_id, &invoice_id)?)?,
            Command::UpdateInvoiceDetails {
                program_id,
                invoice_id,
                amount,
                invoice_ref,
                image,
            } => serde_json::to_value(self.update_invoice_details(
                &caller,
                &program_id,
                &invoice_id,
                amount,
                &invoice_ref,
                &image,
            )?)?,
            Command::ApproveInvoiceAmount {
                program_id,
                invoice_id,
                amount,
            } => serde_json::to_value(self.approve_invoice_amount(
                &caller,
                &program_id,
                &invoice_id,
                amount,
            )?)?,
            Command::TransferInvoice {
                edge,
                program_id,
                recipient: cred,
                invoice_id,
            } => serde_json::to_value(self.transfer_invoice(
                &caller,
                edge,
                &program_id,
                &recipient(&cred)?,
                &invoice_id,
            )?)?,
            Command::ReviseInvoice {
                edge,
                program_id,
                recipient: cred,
                invoice_id,
                remark,
            } => serde_json::to_value(self.revise_invoice(
                &caller,
                edge,
                &program_id,
                &recipient(&cred)?,
                &invoice_id,
                &remark,
            )?)?,
            Command::RecordPayment {
                program_id,
                invoice_id,
                amount,
                channel,
            } => serde_json::to_value(self.record_payment(
                &caller,
                &program_id,
                &invoice_id,
                amount,
                &channel,
            )?)?,
            Command::ApprovePayment {
                program_id,
                invoice_id,
            } => serde_json::to_value(self.approve_payment(&caller, &program_id, &invoice_id)?)?,
            Command::RevertPaymentApproval {
                program_id,
                invoice_id,
                remark,
            } => serde_json::to_value(self.revert_payment_approval(
                &caller,
                &program_id,
                &invoice_id,
                &remark,
            )?)?,
            Command::RecordPaymentResult {
                program_id,
                invoice_id,
                status,
                reference,
            } => serde_json::to_value(self.record_payment_result(
                &caller,
                &program_id,
                &invoice_id,
                &status,
                &reference,
            )?)?,
            Command::RevertPaymentResult {
                program_id,
                invoice_id,
                remark,
            } => serde_json::to_value(self.revert_payment_result(
                &caller,
                &program_id,
                &invoice_id,
                &remark,
            )?)?,
            Command::SettleInvoice {
                program_id,
                invoice_id,
                amount,
            } => serde_json::to_value(self.settle_invoice(
                &caller,
                &program_id,
                &invoice_id,
                amount,
            )?)?,
            Command::GetProgram { program_id } => {
                serde_json::to_value(self.get_program(&caller, &program_id)?)?
            }
            Command::GetInvoice { invoice_id } => {
                serde_json::to_value(self.get_invoice(&caller, &invoice_id)?)?
            }
            Command::ListPrograms => serde_json::to_value(self.list_programs(&caller)?)?,
            Command::ListInvoices => serde_json::to_value(self.list_invoices(&caller)?)?,
            Command::ListProgramIds => serde_json::to_value(self.list_program_ids(&caller)?)?,
            Command::ListInvoiceIds => serde_json::to_value(self.list_invoice_ids(&caller)?)?,
            Command::GetHistory { record_id } => {
                serde_json::to_value(self.get_history(&caller, &record_id)?)?
            }
        };
        Ok(value)
    }
}
