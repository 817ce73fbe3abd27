//! Invoice line items and their lifecycle.
//!
//! Every operation is checked against the program the invoice was raised
//! under: the program must still be placed and unsettled. Forward hand-offs
//! move custody to the recipient. Reversals fork a new item and leave the
//! source where it was.
use super::error::LedgerError;
use super::identity::{Gate, Identity, Role};
use super::program::{Program, ProgramStatus};
use super::revision::{self, Revisable, Suffix};
use super::store::KeyValueStore;
use super::types::{Amount, TimeStamp, field, is_set};
use super::utils::validate_amount;
use chrono::Utc;
use serde::Serialize;

/// Transaction status that marks a reported payment as successful.
pub const PAYMENT_SUCCESS: &str = "SUCCESS";

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cbor(index_only)]
pub enum InvoiceStatus {
    #[n(0)]
    Template,
    #[n(3)]
    Raised,
    #[n(4)]
    VendorApproved,
    #[n(5)]
    AnchorAuthorized,
    #[n(6)]
    PaymentRequested,
    #[n(7)]
    PaymentInitiated,
    #[n(8)]
    PendingApproval,
    #[n(9)]
    PaymentApproved,
    #[n(10)]
    Paid,
    #[n(11)]
    Settled,
    #[n(20)]
    Retired,
}

impl InvoiceStatus {
    pub fn code(&self) -> u8 {
        match self {
            InvoiceStatus::Template => 0,
            InvoiceStatus::Raised => 3,
            InvoiceStatus::VendorApproved => 4,
            InvoiceStatus::AnchorAuthorized => 5,
            InvoiceStatus::PaymentRequested => 6,
            InvoiceStatus::PaymentInitiated => 7,
            InvoiceStatus::PendingApproval => 8,
            InvoiceStatus::PaymentApproved => 9,
            InvoiceStatus::Paid => 10,
            InvoiceStatus::Settled => 11,
            InvoiceStatus::Retired => 20,
        }
    }
}

impl Serialize for InvoiceStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// Program terms copied onto the item when it is created.
#[derive(minicbor::Encode, minicbor::Decode, Serialize, Debug, Clone, Default, PartialEq)]
pub struct TermsSnapshot {
    #[n(0)]
    pub anchor_name: Option<String>,
    #[n(1)]
    pub anchor_account: Option<String>,
    #[n(2)]
    pub anchor_ifsc: Option<String>,
    #[n(3)]
    pub anchor_interest: Option<String>,
    #[n(4)]
    pub po_id: Option<String>,
    #[n(5)]
    pub po_amount: Amount,
    #[n(6)]
    pub vendor_name: Option<String>,
    #[n(7)]
    pub vendor_bank: Option<String>,
    #[n(8)]
    pub vendor_ifsc: Option<String>,
}

impl From<&Program> for TermsSnapshot {
    fn from(program: &Program) -> Self {
        Self {
            anchor_name: program.anchor.name.clone(),
            anchor_account: program.anchor.account.clone(),
            anchor_ifsc: program.anchor.ifsc.clone(),
            anchor_interest: program.anchor.interest.clone(),
            po_id: program.purchase_order.po_id.clone(),
            po_amount: program.purchase_order.amount,
            vendor_name: program.vendor.first_name.clone(),
            vendor_bank: program.vendor.bank.clone(),
            vendor_ifsc: program.vendor.ifsc.clone(),
        }
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Serialize, Debug, Clone, PartialEq)]
pub struct InvoiceLineItem {
    #[n(0)]
    pub invoice_id: String,
    #[n(1)]
    pub program_id: String,
    #[n(2)]
    pub parent_invoice_id: Option<String>,
    #[n(3)]
    pub fork_ids: Vec<String>,
    #[n(4)]
    pub owner: String,
    #[n(5)]
    pub raised_by: Option<String>,
    #[n(6)]
    pub raised_against: Option<String>,
    #[n(7)]
    pub terms: TermsSnapshot,
    #[n(8)]
    pub claimed_amount: Amount,
    #[n(9)]
    pub invoice_ref: Option<String>,
    #[n(10)]
    pub image: Option<String>,
    #[n(11)]
    pub approved_amount: Amount,
    #[n(12)]
    pub receivable_amount: Amount,
    #[n(13)]
    pub settlement_amount: Amount,
    #[n(14)]
    pub payment_channel: Option<String>,
    #[n(15)]
    pub txn_status: Option<String>,
    #[n(16)]
    pub reference: Option<String>,
    #[n(17)]
    pub original_amount: Amount,
    #[n(18)]
    pub checker_approved: bool,
    #[n(19)]
    pub status: InvoiceStatus,
    #[n(20)]
    pub paid: bool,
    #[n(21)]
    pub settled: bool,
    #[n(22)]
    pub remarks: Option<String>,
    #[n(23)]
    pub raised_at: Option<TimeStamp<Utc>>,
}

impl Revisable for InvoiceLineItem {
    fn record_id(&self) -> &str {
        &self.invoice_id
    }

    fn fork_ids(&self) -> &[String] {
        &self.fork_ids
    }

    fn fork_ids_mut(&mut self) -> &mut Vec<String> {
        &mut self.fork_ids
    }

    fn rebase(&mut self, id: String, parent: String, remark: Option<String>) {
        self.invoice_id = id;
        self.parent_invoice_id = Some(parent);
        self.remarks = remark;
    }
}

/// Sum of approved amounts over `items` in `VendorApproved`, leaving out `excluding`.
pub fn approved_total<'a>(
    items: impl IntoIterator<Item = &'a InvoiceLineItem>,
    excluding: Option<&str>,
) -> Amount {
    items
        .into_iter()
        .filter(|item| item.status == InvoiceStatus::VendorApproved)
        .filter(|item| Some(item.invoice_id.as_str()) != excluding)
        .map(|item| item.approved_amount)
        .sum()
}

impl InvoiceLineItem {
    /// A template claim against `program`, owned and raised by the Vendor.
    pub fn create(
        program: &Program,
        caller: &Identity,
        invoice_id: impl Into<String>,
    ) -> Result<Self, LedgerError> {
        Gate::new("create_invoice")
            .open(program.settled)?
            .role(caller, &Role::Vendor)?
            .owner(caller, &program.owner)?
            .state(program.status == ProgramStatus::POPlaced, "placed")?;

        Ok(Self {
            invoice_id: invoice_id.into(),
            program_id: program.program_id.clone(),
            parent_invoice_id: None,
            fork_ids: Vec::new(),
            owner: caller.account.clone(),
            raised_by: Some(caller.account.clone()),
            raised_against: None,
            terms: TermsSnapshot::from(program),
            claimed_amount: 0.0,
            invoice_ref: None,
            image: None,
            approved_amount: 0.0,
            receivable_amount: 0.0,
            settlement_amount: 0.0,
            payment_channel: None,
            txn_status: None,
            reference: None,
            original_amount: 0.0,
            checker_approved: false,
            status: InvoiceStatus::Template,
            paid: false,
            settled: false,
            remarks: None,
            raised_at: None,
        })
    }

    pub fn is_visible_to(&self, caller: &Identity) -> bool {
        let account = Some(caller.account.as_str());
        caller.role == Role::Admin
            || caller.account == self.owner
            || self.raised_by.as_deref() == account
            || self.raised_against.as_deref() == account
    }

    /// Settled locks first, then role and custody, then record state.
    fn gate(
        &self,
        op: &'static str,
        program: &Program,
        caller: &Identity,
        role: Role,
        paid: bool,
    ) -> Result<Gate, LedgerError> {
        Gate::new(op)
            .open(program.settled)?
            .open(self.settled)?
            .role(caller, &role)?
            .owner(caller, &self.owner)?
            .state(self.program_id == program.program_id, "filed under this program")?
            .state(program.status == ProgramStatus::POPlaced, "under a placed program")?
            .state(self.paid == paid, if paid { "paid" } else { "unpaid" })
    }

    fn require_documents(&self) -> Result<(), LedgerError> {
        let missing: Vec<&str> = [
            ("invoice reference", is_set(&self.invoice_ref)),
            ("invoice image", is_set(&self.image)),
        ]
        .iter()
        .filter(|(_, ok)| !ok)
        .map(|(name, _)| *name)
        .collect();
        if missing.is_empty() {
            return Ok(());
        }
        Err(LedgerError::Validation(format!("missing {}", missing.join(", "))))
    }

    fn hand_to(&mut self, recipient: &Identity, status: InvoiceStatus) {
        self.owner = recipient.account.clone();
        self.status = status;
    }

    /// Fills in the claim. `approved` is the approved total of the program's items.
    pub fn update_details(
        &mut self,
        program: &Program,
        caller: &Identity,
        amount: Amount,
        invoice_ref: &str,
        image: &str,
        approved: Amount,
    ) -> Result<(), LedgerError> {
        self.gate("update_invoice_details", program, caller, Role::Vendor, false)?
            .owner(caller, &program.owner)?
            .state(self.status == InvoiceStatus::Template, "a template")?;

        check_capacity(amount, approved, program.purchase_order.amount)?;

        self.claimed_amount = amount;
        self.invoice_ref = field(invoice_ref);
        self.image = field(image);
        Ok(())
    }

    pub fn raise_to_anchor(
        &mut self,
        program: &Program,
        caller: &Identity,
        recipient: &Identity,
    ) -> Result<(), LedgerError> {
        self.gate("transfer_vendor_to_anchor_invoice", program, caller, Role::Vendor, false)?
            .owner(caller, &program.owner)?
            .recipient(recipient, &Role::Anchor)?
            .state(self.status == InvoiceStatus::Template, "a template")?;

        self.require_documents()?;
        if self.claimed_amount == 0.0 {
            return Err(LedgerError::Validation("missing claimed amount".into()));
        }

        self.hand_to(recipient, InvoiceStatus::Raised);
        self.raised_against = Some(recipient.account.clone());
        self.raised_at = Some(TimeStamp::new());
        Ok(())
    }

    pub fn revise_to_vendor<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &S,
        program: &Program,
        caller: &Identity,
        recipient: &Identity,
        remark: &str,
    ) -> Result<InvoiceLineItem, LedgerError> {
        self.gate("transfer_rev_anchor_to_vendor_invoice", program, caller, Role::Anchor, false)?
            .recipient(recipient, &Role::Vendor)?
            .state(self.status == InvoiceStatus::Raised, "raised")?;

        revision::fork(store, self, Suffix::InvoiceBackToVendor, field(remark), |child| {
            child.hand_to(recipient, InvoiceStatus::Template);
            child.claimed_amount = 0.0;
            child.invoice_ref = None;
            child.image = None;
        })
    }

    /// Sets the approved amount. `approved_elsewhere` excludes this item.
    pub fn approve_amount(
        &mut self,
        program: &Program,
        caller: &Identity,
        amount: Amount,
        approved_elsewhere: Amount,
    ) -> Result<(), LedgerError> {
        self.gate("approve_invoice_amount", program, caller, Role::Anchor, false)?
            .state(
                matches!(
                    self.status,
                    InvoiceStatus::Raised | InvoiceStatus::VendorApproved
                ),
                "raised or vendor approved",
            )?;

        check_capacity(amount, approved_elsewhere, program.purchase_order.amount)?;

        self.approved_amount = amount;
        self.status = InvoiceStatus::VendorApproved;
        Ok(())
    }

    pub fn authorize(
        &mut self,
        program: &Program,
        caller: &Identity,
        recipient: &Identity,
    ) -> Result<(), LedgerError> {
        self.gate("transfer_anchor_to_vendor_invoice", program, caller, Role::Anchor, false)?
            .recipient(recipient, &Role::Vendor)?
            .state(self.status == InvoiceStatus::VendorApproved, "vendor approved")?;
        self.require_documents()?;

        self.hand_to(recipient, InvoiceStatus::AnchorAuthorized);
        Ok(())
    }

    pub fn revise_to_anchor<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &S,
        program: &Program,
        caller: &Identity,
        recipient: &Identity,
        remark: &str,
    ) -> Result<InvoiceLineItem, LedgerError> {
        self.gate("transfer_rev_vendor_to_anchor_invoice", program, caller, Role::Vendor, false)?
            .recipient(recipient, &Role::Anchor)?
            .state(self.status == InvoiceStatus::AnchorAuthorized, "anchor authorized")?;

        revision::fork(store, self, Suffix::InvoiceBackToAnchor, field(remark), |child| {
            child.hand_to(recipient, InvoiceStatus::VendorApproved);
            child.approved_amount = 0.0;
        })
    }

    pub fn request_payment(
        &mut self,
        program: &Program,
        caller: &Identity,
        recipient: &Identity,
    ) -> Result<(), LedgerError> {
        self.gate("transfer_vendor_to_admin_invoice", program, caller, Role::Vendor, false)?
            .recipient(recipient, &Role::Admin)?
            .state(self.status == InvoiceStatus::AnchorAuthorized, "anchor authorized")?;
        self.require_documents()?;

        self.hand_to(recipient, InvoiceStatus::PaymentRequested);
        Ok(())
    }

    pub fn revise_from_admin<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &S,
        program: &Program,
        caller: &Identity,
        recipient: &Identity,
        remark: &str,
    ) -> Result<InvoiceLineItem, LedgerError> {
        self.gate("transfer_rev_admin_to_vendor_invoice", program, caller, Role::Admin, false)?
            .recipient(recipient, &Role::Vendor)?
            .state(self.status == InvoiceStatus::PaymentRequested, "payment requested")?;

        revision::fork(store, self, Suffix::InvoiceBackFromAdmin, field(remark), |child| {
            child.hand_to(recipient, InvoiceStatus::AnchorAuthorized);
        })
    }

    pub fn initiate_payment(
        &mut self,
        program: &Program,
        caller: &Identity,
        recipient: &Identity,
    ) -> Result<(), LedgerError> {
        self.gate("transfer_admin_to_payment_invoice", program, caller, Role::Admin, false)?
            .recipient(recipient, &Role::PaymentMaker)?
            .state(self.status == InvoiceStatus::PaymentRequested, "payment requested")?;
        self.require_documents()?;

        self.hand_to(recipient, InvoiceStatus::PaymentInitiated);
        Ok(())
    }

    pub fn revise_to_admin<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &S,
        program: &Program,
        caller: &Identity,
        recipient: &Identity,
        remark: &str,
    ) -> Result<InvoiceLineItem, LedgerError> {
        self.gate(
            "transfer_rev_payment_to_admin_invoice",
            program,
            caller,
            Role::PaymentMaker,
            false,
        )?
        .recipient(recipient, &Role::Admin)?
        .state(self.status == InvoiceStatus::PaymentInitiated, "payment initiated")?;

        revision::fork(store, self, Suffix::InvoiceBackToAdmin, field(remark), |child| {
            child.hand_to(recipient, InvoiceStatus::PaymentRequested);
        })
    }

    pub fn record_payment(
        &mut self,
        program: &Program,
        caller: &Identity,
        amount: Amount,
        channel: &str,
    ) -> Result<(), LedgerError> {
        self.gate("record_payment", program, caller, Role::PaymentMaker, false)?
            .state(self.status == InvoiceStatus::PaymentInitiated, "payment initiated")?;

        self.receivable_amount = amount;
        self.payment_channel = field(channel);
        Ok(())
    }

    pub fn submit_for_approval(
        &mut self,
        program: &Program,
        caller: &Identity,
        recipient: &Identity,
    ) -> Result<(), LedgerError> {
        self.gate(
            "transfer_payment_maker_to_payment_checker_invoice",
            program,
            caller,
            Role::PaymentMaker,
            false,
        )?
        .recipient(recipient, &Role::PaymentChecker)?
        .state(self.status == InvoiceStatus::PaymentInitiated, "payment initiated")?;
        self.require_documents()?;

        self.hand_to(recipient, InvoiceStatus::PendingApproval);
        Ok(())
    }

    pub fn return_to_maker(
        &mut self,
        program: &Program,
        caller: &Identity,
        recipient: &Identity,
    ) -> Result<(), LedgerError> {
        self.gate(
            "transfer_payment_checker_to_payment_maker_invoice",
            program,
            caller,
            Role::PaymentChecker,
            false,
        )?
        .recipient(recipient, &Role::PaymentMaker)?
        .state(self.status == InvoiceStatus::PendingApproval, "pending approval")?;

        self.hand_to(recipient, InvoiceStatus::PaymentInitiated);
        Ok(())
    }

    pub fn revise_to_maker<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &S,
        program: &Program,
        caller: &Identity,
        recipient: &Identity,
        remark: &str,
    ) -> Result<InvoiceLineItem, LedgerError> {
        self.gate(
            "transfer_rev_payment_checker_to_payment_maker_invoice",
            program,
            caller,
            Role::PaymentChecker,
            false,
        )?
        .recipient(recipient, &Role::PaymentMaker)?
        .state(self.status == InvoiceStatus::PendingApproval, "pending approval")?;

        revision::fork(store, self, Suffix::InvoiceBackToMaker, field(remark), |child| {
            child.hand_to(recipient, InvoiceStatus::PaymentInitiated);
        })
    }

    pub fn approve_payment(
        &mut self,
        program: &Program,
        caller: &Identity,
    ) -> Result<(), LedgerError> {
        self.gate("approve_payment", program, caller, Role::PaymentChecker, false)?
            .state(self.status == InvoiceStatus::PendingApproval, "pending approval")?;

        self.checker_approved = true;
        self.status = InvoiceStatus::PaymentApproved;
        Ok(())
    }

    pub fn revert_payment_approval<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &S,
        program: &Program,
        caller: &Identity,
        remark: &str,
    ) -> Result<InvoiceLineItem, LedgerError> {
        self.gate("revert_payment_approval", program, caller, Role::PaymentChecker, false)?
            .state(self.status == InvoiceStatus::PaymentApproved, "payment approved")?;

        revision::fork(store, self, Suffix::PaymentApproval, field(remark), |child| {
            child.status = InvoiceStatus::PendingApproval;
            child.checker_approved = false;
        })
    }

    /// Records the payment outcome and its reference; only a successful
    /// transaction marks the item paid.
    pub fn record_payment_result(
        &mut self,
        program: &Program,
        caller: &Identity,
        txn_status: &str,
        reference: &str,
    ) -> Result<(), LedgerError> {
        self.gate("record_payment_result", program, caller, Role::PaymentChecker, false)?
            .state(self.status == InvoiceStatus::PaymentApproved, "payment approved")?;

        self.txn_status = field(txn_status);
        self.reference = field(reference);
        if txn_status == PAYMENT_SUCCESS {
            self.paid = true;
            self.status = InvoiceStatus::Paid;
        }
        Ok(())
    }

    pub fn revert_payment_result<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &S,
        program: &Program,
        caller: &Identity,
        remark: &str,
    ) -> Result<InvoiceLineItem, LedgerError> {
        self.gate("revert_payment_result", program, caller, Role::PaymentChecker, true)?
            .state(self.status == InvoiceStatus::Paid, "paid")?;

        revision::fork(store, self, Suffix::PaymentResult, field(remark), |child| {
            child.status = InvoiceStatus::PaymentApproved;
            child.paid = false;
            child.reference = None;
        })
    }

    pub fn settle(
        &mut self,
        program: &Program,
        caller: &Identity,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.gate("settle_invoice", program, caller, Role::PaymentChecker, true)?
            .state(self.status == InvoiceStatus::Paid, "paid")?;

        self.settlement_amount = amount;
        self.settled = true;
        self.status = InvoiceStatus::Settled;
        Ok(())
    }

    /// Marks a superseded item retired. Settled or already retired items are left alone.
    ///
    /// With `carry_claim` the claimed amount moves to `original_amount`.
    pub fn retire(&mut self, carry_claim: bool) -> bool {
        if self.settled || self.status == InvoiceStatus::Retired {
            return false;
        }
        self.status = InvoiceStatus::Retired;
        if carry_claim {
            self.original_amount = self.claimed_amount;
            self.claimed_amount = 0.0;
        }
        true
    }
}

fn check_capacity(amount: Amount, committed: Amount, po_amount: Amount) -> Result<(), LedgerError> {
    validate_amount(amount)?;
    if amount > po_amount {
        return Err(LedgerError::CapacityExceeded {
            requested: amount,
            limit: po_amount,
        });
    }
    if committed + amount > po_amount {
        return Err(LedgerError::CapacityExceeded {
            requested: committed + amount,
            limit: po_amount,
        });
    }
    Ok(())
}
