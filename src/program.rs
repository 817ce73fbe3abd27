//! Financing programs and their lifecycle
use super::error::LedgerError;
use super::identity::{Gate, Identity, Role};
use super::revision::{self, Revisable, Suffix};
use super::store::KeyValueStore;
use super::types::{Amount, TimeStamp, field, is_set};
use super::utils::{parse_amount, validate_amount};
use chrono::Utc;
use serde::Serialize;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cbor(index_only)]
pub enum ProgramStatus {
    #[n(0)]
    Template,
    #[n(1)]
    Initiated,
    #[n(2)]
    POPlaced,
    #[n(12)]
    Closed,
}

impl ProgramStatus {
    pub fn code(&self) -> u8 {
        match self {
            ProgramStatus::Template => 0,
            ProgramStatus::Initiated => 1,
            ProgramStatus::POPlaced => 2,
            ProgramStatus::Closed => 12,
        }
    }
}

impl Serialize for ProgramStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// Terms the Admin negotiates with the Anchor.
#[derive(minicbor::Encode, minicbor::Decode, Serialize, Debug, Clone, Default, PartialEq)]
pub struct AnchorTerms {
    #[n(0)]
    pub name: Option<String>,
    #[n(1)]
    pub id: Option<String>,
    #[n(2)]
    pub ifsc: Option<String>,
    #[n(3)]
    pub agreement: Option<String>,
    #[n(4)]
    pub account: Option<String>,
    #[n(5)]
    pub limit: Amount,
    #[n(6)]
    pub expiry: Option<String>,
    #[n(7)]
    pub interest: Option<String>,
    #[n(8)]
    pub grace_interest: Option<String>,
    #[n(9)]
    pub grace_period: Option<String>,
    #[n(10)]
    pub penal_interest: Option<String>,
    #[n(11)]
    pub liquidation: Option<String>,
}

impl AnchorTerms {
    pub const FIELDS: usize = 12;

    /// Positional order: name, id, ifsc, agreement, account, limit, expiry, interest,
    /// grace interest, grace period, penal interest, liquidation.
    pub fn from_args(args: &[String]) -> Result<Self, LedgerError> {
        let [
            name,
            id,
            ifsc,
            agreement,
            account,
            limit,
            expiry,
            interest,
            grace_interest,
            grace_period,
            penal_interest,
            liquidation,
        ] = args
        else {
            return Err(LedgerError::Validation(format!(
                "anchor terms take {} fields, got {}",
                Self::FIELDS,
                args.len()
            )));
        };
        Ok(Self {
            name: field(name.as_str()),
            id: field(id.as_str()),
            ifsc: field(ifsc.as_str()),
            agreement: field(agreement.as_str()),
            account: field(account.as_str()),
            limit: parse_amount(limit),
            expiry: field(expiry.as_str()),
            interest: field(interest.as_str()),
            grace_interest: field(grace_interest.as_str()),
            grace_period: field(grace_period.as_str()),
            penal_interest: field(penal_interest.as_str()),
            liquidation: field(liquidation.as_str()),
        })
    }

    fn missing(&self, out: &mut Vec<&'static str>) {
        let checks = [
            ("anchor name", is_set(&self.name)),
            ("anchor id", is_set(&self.id)),
            ("anchor account", is_set(&self.account)),
            ("anchor ifsc", is_set(&self.ifsc)),
            ("anchor expiry", is_set(&self.expiry)),
            ("anchor interest", is_set(&self.interest)),
            ("anchor grace interest", is_set(&self.grace_interest)),
            ("anchor grace period", is_set(&self.grace_period)),
            ("anchor penal interest", is_set(&self.penal_interest)),
            ("anchor liquidation", is_set(&self.liquidation)),
            ("anchor limit", self.limit != 0.0),
        ];
        out.extend(checks.iter().filter(|(_, ok)| !ok).map(|(name, _)| *name));
    }
}

/// Terms the Admin negotiates with the Vendor.
#[derive(minicbor::Encode, minicbor::Decode, Serialize, Debug, Clone, Default, PartialEq)]
pub struct VendorTerms {
    #[n(0)]
    pub id: Option<String>,
    #[n(1)]
    pub limit: Amount,
    #[n(2)]
    pub first_name: Option<String>,
    #[n(3)]
    pub last_name: Option<String>,
    #[n(4)]
    pub email: Option<String>,
    #[n(5)]
    pub phone: Option<String>,
    #[n(6)]
    pub address: Option<String>,
    #[n(7)]
    pub pan: Option<String>,
    #[n(8)]
    pub agreement: Option<String>,
    #[n(9)]
    pub expiry: Option<String>,
    #[n(10)]
    pub bank: Option<String>,
    #[n(11)]
    pub bank_address: Option<String>,
    #[n(12)]
    pub account: Option<String>,
    #[n(13)]
    pub ifsc: Option<String>,
}

impl VendorTerms {
    pub const FIELDS: usize = 14;

    /// Positional order: id, limit, first name, last name, email, phone, address, pan,
    /// agreement, expiry, bank, bank address, account, ifsc.
    pub fn from_args(args: &[String]) -> Result<Self, LedgerError> {
        let [
            id,
            limit,
            first_name,
            last_name,
            email,
            phone,
            address,
            pan,
            agreement,
            expiry,
            bank,
            bank_address,
            account,
            ifsc,
        ] = args
        else {
            return Err(LedgerError::Validation(format!(
                "vendor terms take {} fields, got {}",
                Self::FIELDS,
                args.len()
            )));
        };
        Ok(Self {
            id: field(id.as_str()),
            limit: parse_amount(limit),
            first_name: field(first_name.as_str()),
            last_name: field(last_name.as_str()),
            email: field(email.as_str()),
            phone: field(phone.as_str()),
            address: field(address.as_str()),
            pan: field(pan.as_str()),
            agreement: field(agreement.as_str()),
            expiry: field(expiry.as_str()),
            bank: field(bank.as_str()),
            bank_address: field(bank_address.as_str()),
            account: field(account.as_str()),
            ifsc: field(ifsc.as_str()),
        })
    }

    fn missing_contact(&self, out: &mut Vec<&'static str>) {
        let checks = [
            ("vendor first name", is_set(&self.first_name)),
            ("vendor last name", is_set(&self.last_name)),
            ("vendor phone", is_set(&self.phone)),
            ("vendor address", is_set(&self.address)),
            ("vendor email", is_set(&self.email)),
            ("vendor limit", self.limit != 0.0),
        ];
        out.extend(checks.iter().filter(|(_, ok)| !ok).map(|(name, _)| *name));
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Serialize, Debug, Clone, Default, PartialEq)]
pub struct PurchaseOrder {
    #[n(0)]
    pub amount: Amount,
    #[n(1)]
    pub image: Option<String>,
    #[n(2)]
    pub po_id: Option<String>,
    #[n(3)]
    pub placed_at: Option<TimeStamp<Utc>>,
}

#[derive(minicbor::Encode, minicbor::Decode, Serialize, Debug, Clone, PartialEq)]
pub struct Program {
    #[n(0)]
    pub program_id: String,
    #[n(1)]
    pub parent_program_id: Option<String>,
    #[n(2)]
    pub fork_ids: Vec<String>,
    #[n(3)]
    pub owner: String,
    #[n(4)]
    pub raised_by: Option<String>,
    #[n(5)]
    pub raised_against: Option<String>,
    #[n(6)]
    pub anchor: AnchorTerms,
    #[n(7)]
    pub vendor: VendorTerms,
    #[n(8)]
    pub purchase_order: PurchaseOrder,
    #[n(9)]
    pub status: ProgramStatus,
    #[n(10)]
    pub settled: bool,
    #[n(11)]
    pub acknowledged: bool,
    #[n(12)]
    pub remarks: Option<String>,
    #[n(13)]
    pub invoice_ids: Vec<String>,
}

impl Revisable for Program {
    fn record_id(&self) -> &str {
        &self.program_id
    }

    fn fork_ids(&self) -> &[String] {
        &self.fork_ids
    }

    fn fork_ids_mut(&mut self) -> &mut Vec<String> {
        &mut self.fork_ids
    }

    fn rebase(&mut self, id: String, parent: String, remark: Option<String>) {
        self.program_id = id;
        self.parent_program_id = Some(parent);
        self.remarks = remark;
        // invoices stay with the program they were raised under
        self.invoice_ids.clear();
    }
}

impl Program {
    /// A blank template owned by its creator.
    pub fn new(program_id: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            program_id: program_id.into(),
            parent_program_id: None,
            fork_ids: Vec::new(),
            owner: owner.into(),
            raised_by: None,
            raised_against: None,
            anchor: AnchorTerms::default(),
            vendor: VendorTerms::default(),
            purchase_order: PurchaseOrder::default(),
            status: ProgramStatus::Template,
            settled: false,
            acknowledged: false,
            remarks: None,
            invoice_ids: Vec::new(),
        }
    }

    pub fn is_visible_to(&self, caller: &Identity) -> bool {
        caller.role == Role::Admin
            || caller.account == self.owner
            || self.raised_by.as_deref() == Some(caller.account.as_str())
    }

    pub fn update_anchor_terms(
        &mut self,
        caller: &Identity,
        terms: AnchorTerms,
    ) -> Result<(), LedgerError> {
        self.admin_template_gate("update_program_terms", caller)?;
        self.anchor = terms;
        Ok(())
    }

    pub fn update_vendor_terms(
        &mut self,
        caller: &Identity,
        terms: VendorTerms,
    ) -> Result<(), LedgerError> {
        self.admin_template_gate("update_vendor_terms", caller)?;
        self.vendor = terms;
        Ok(())
    }

    fn admin_template_gate(&self, op: &'static str, caller: &Identity) -> Result<(), LedgerError> {
        Gate::new(op)
            .open(self.settled)?
            .role(caller, &Role::Admin)?
            .owner(caller, &self.owner)?
            .state(self.status == ProgramStatus::Template, "a template")?;
        Ok(())
    }

    /// Hands a fully termed template to the Anchor.
    pub fn admin_to_anchor(
        &mut self,
        caller: &Identity,
        recipient: &Identity,
    ) -> Result<(), LedgerError> {
        Gate::new("admin_to_anchor")
            .open(self.settled)?
            .role(caller, &Role::Admin)?
            .owner(caller, &self.owner)?
            .recipient(recipient, &Role::Anchor)?
            .state(self.status == ProgramStatus::Template, "a template")?;

        let mut missing = Vec::new();
        self.vendor.missing_contact(&mut missing);
        self.anchor.missing(&mut missing);
        require_all(missing)?;

        self.status = ProgramStatus::Initiated;
        self.owner = recipient.account.clone();
        self.raised_by = Some(recipient.account.clone());
        Ok(())
    }

    /// Sends an initiated program back to the Admin as a fresh template.
    pub fn revise_to_admin<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &S,
        caller: &Identity,
        recipient: &Identity,
        remark: &str,
    ) -> Result<Program, LedgerError> {
        Gate::new("anchor_to_admin_rev")
            .open(self.settled)?
            .role(caller, &Role::Anchor)?
            .owner(caller, &self.owner)?
            .recipient(recipient, &Role::Admin)?
            .state(self.status == ProgramStatus::Initiated, "initiated")?;

        revision::fork(
            store,
            self,
            Suffix::ProgramBackToAdmin,
            field(remark),
            |child| child.reset_for_revision(ProgramStatus::Template, &recipient.account),
        )
    }

    /// Places the purchase order amount. Fails with `CapacityExceeded` above the vendor limit.
    pub fn update_po(
        &mut self,
        caller: &Identity,
        amount: Amount,
        image: &str,
        po_id: &str,
    ) -> Result<(), LedgerError> {
        Gate::new("update_po")
            .open(self.settled)?
            .role(caller, &Role::Anchor)?
            .owner(caller, &self.owner)?
            .state(self.status == ProgramStatus::Initiated, "initiated")?
            .state(self.purchase_order.amount == 0.0, "awaiting a purchase order")?;

        validate_amount(amount)?;

        if amount > self.vendor.limit {
            return Err(LedgerError::CapacityExceeded {
                requested: amount,
                limit: self.vendor.limit,
            });
        }

        self.purchase_order.amount = amount;
        self.purchase_order.image = field(image);
        self.purchase_order.po_id = field(po_id);
        Ok(())
    }

    /// Places the purchase order with the Vendor.
    pub fn anchor_to_vendor(
        &mut self,
        caller: &Identity,
        recipient: &Identity,
    ) -> Result<(), LedgerError> {
        Gate::new("anchor_to_vendor")
            .open(self.settled)?
            .role(caller, &Role::Anchor)?
            .owner(caller, &self.owner)?
            .recipient(recipient, &Role::Vendor)?
            .state(self.status == ProgramStatus::Initiated, "initiated")?;

        let mut missing = Vec::new();
        if self.purchase_order.amount == 0.0 {
            missing.push("po amount");
        }
        if !is_set(&self.purchase_order.image) {
            missing.push("po image");
        }
        if !is_set(&self.purchase_order.po_id) {
            missing.push("po id");
        }
        if !is_set(&self.vendor.id) {
            missing.push("vendor id");
        }
        self.vendor.missing_contact(&mut missing);
        require_all(missing)?;

        self.status = ProgramStatus::POPlaced;
        self.owner = recipient.account.clone();
        self.raised_against = Some(recipient.account.clone());
        self.purchase_order.placed_at = Some(TimeStamp::new());
        Ok(())
    }

    /// Sends a placed program back to the Anchor.
    pub fn revise_to_anchor<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &S,
        caller: &Identity,
        recipient: &Identity,
        remark: &str,
    ) -> Result<Program, LedgerError> {
        Gate::new("vendor_to_anchor_rev")
            .open(self.settled)?
            .role(caller, &Role::Vendor)?
            .owner(caller, &self.owner)?
            .recipient(recipient, &Role::Anchor)?
            .state(self.status == ProgramStatus::POPlaced, "placed")?;

        revision::fork(
            store,
            self,
            Suffix::ProgramBackToAnchor,
            field(remark),
            |child| child.reset_for_revision(ProgramStatus::Initiated, &recipient.account),
        )
    }

    pub fn acknowledge_po(&mut self, caller: &Identity) -> Result<(), LedgerError> {
        Gate::new("acknowledge_po")
            .open(self.settled)?
            .role(caller, &Role::Vendor)?
            .owner(caller, &self.owner)?
            .state(self.status == ProgramStatus::POPlaced, "placed")?
            .state(!self.acknowledged, "unacknowledged")?;

        self.acknowledged = true;
        Ok(())
    }

    /// Settles the program. Nothing may change it afterwards.
    pub fn close(&mut self, caller: &Identity) -> Result<(), LedgerError> {
        Gate::new("close_program")
            .open(self.settled)?
            .role(caller, &Role::PaymentChecker)?
            .state(self.status == ProgramStatus::POPlaced, "placed")?;

        self.status = ProgramStatus::Closed;
        self.settled = true;
        Ok(())
    }

    fn reset_for_revision(&mut self, status: ProgramStatus, owner: &str) {
        self.status = status;
        self.owner = owner.to_string();
        self.purchase_order.amount = 0.0;
        self.purchase_order.image = None;
        self.purchase_order.po_id = None;
        self.purchase_order.placed_at = None;
        self.acknowledged = false;
    }
}

fn require_all(missing: Vec<&'static str>) -> Result<(), LedgerError> {
    if missing.is_empty() {
        return Ok(());
    }
    Err(LedgerError::Validation(format!(
        "missing {}",
        missing.join(", ")
    )))
}
