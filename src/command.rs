//! Typed operations parsed from a function name and positional arguments
use super::error::LedgerError;
use super::program::{AnchorTerms, VendorTerms};
use super::types::Amount;
use super::utils::parse_amount;

/// Forward hand-offs of an invoice to the next party.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceTransfer {
    VendorToAnchor,
    AnchorToVendor,
    VendorToAdmin,
    AdminToPaymentMaker,
    PaymentMakerToPaymentChecker,
    PaymentCheckerToPaymentMaker,
}

impl InvoiceTransfer {
    pub fn name(&self) -> &'static str {
        match self {
            InvoiceTransfer::VendorToAnchor => "transfer_vendor_to_anchor_invoice",
            InvoiceTransfer::AnchorToVendor => "transfer_anchor_to_vendor_invoice",
            InvoiceTransfer::VendorToAdmin => "transfer_vendor_to_admin_invoice",
            InvoiceTransfer::AdminToPaymentMaker => "transfer_admin_to_payment_invoice",
            InvoiceTransfer::PaymentMakerToPaymentChecker => {
                "transfer_payment_maker_to_payment_checker_invoice"
            }
            InvoiceTransfer::PaymentCheckerToPaymentMaker => {
                "transfer_payment_checker_to_payment_maker_invoice"
            }
        }
    }
}

/// Hand-backs that fork the invoice instead of moving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceRevision {
    AnchorToVendor,
    VendorToAnchor,
    AdminToVendor,
    PaymentToAdmin,
    PaymentCheckerToPaymentMaker,
}

impl InvoiceRevision {
    pub fn name(&self) -> &'static str {
        match self {
            InvoiceRevision::AnchorToVendor => "transfer_rev_anchor_to_vendor_invoice",
            InvoiceRevision::VendorToAnchor => "transfer_rev_vendor_to_anchor_invoice",
            InvoiceRevision::AdminToVendor => "transfer_rev_admin_to_vendor_invoice",
            InvoiceRevision::PaymentToAdmin => "transfer_rev_payment_to_admin_invoice",
            InvoiceRevision::PaymentCheckerToPaymentMaker => {
                "transfer_rev_payment_checker_to_payment_maker_invoice"
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateProgram {
        program_id: String,
    },
    UpdateProgramTerms {
        program_id: String,
        terms: AnchorTerms,
    },
    UpdateVendorTerms {
        program_id: String,
        terms: VendorTerms,
    },
    AdminToAnchor {
        program_id: String,
        recipient: String,
    },
    AnchorToAdminRev {
        program_id: String,
        recipient: String,
        remark: String,
    },
    UpdatePo {
        program_id: String,
        amount: Amount,
        image: String,
        po_id: String,
    },
    AnchorToVendor {
        program_id: String,
        recipient: String,
    },
    VendorToAnchorRev {
        program_id: String,
        recipient: String,
        remark: String,
    },
    AcknowledgePo {
        program_id: String,
    },
    CloseProgram {
        program_id: String,
    },
    CreateInvoice {
        program_id: String,
        invoice_id: String,
    },
    UpdateInvoiceDetails {
        program_id: String,
        invoice_id: String,
        amount: Amount,
        invoice_ref: String,
        image: String,
    },
    ApproveInvoiceAmount {
        program_id: String,
        invoice_id: String,
        amount: Amount,
    },
    TransferInvoice {
        edge: InvoiceTransfer,
        program_id: String,
        recipient: String,
        invoice_id: String,
    },
    ReviseInvoice {
        edge: InvoiceRevision,
        program_id: String,
        recipient: String,
        invoice_id: String,
        remark: String,
    },
    RecordPayment {
        program_id: String,
        invoice_id: String,
        amount: Amount,
        channel: String,
    },
    ApprovePayment {
        program_id: String,
        invoice_id: String,
    },
    RevertPaymentApproval {
        program_id: String,
        invoice_id: String,
        remark: String,
    },
    RecordPaymentResult {
        program_id: String,
        invoice_id: String,
        status: String,
        reference: String,
    },
    RevertPaymentResult {
        program_id: String,
        invoice_id: String,
        remark: String,
    },
    SettleInvoice {
        program_id: String,
        invoice_id: String,
        amount: Amount,
    },
    GetProgram {
        program_id: String,
    },
    GetInvoice {
        invoice_id: String,
    },
    ListPrograms,
    ListInvoices,
    ListProgramIds,
    ListInvoiceIds,
    GetHistory {
        record_id: String,
    },
}

fn arity<'a, const N: usize>(
    function: &str,
    args: &'a [String],
) -> Result<&'a [String; N], LedgerError> {
    <&[String; N]>::try_from(args).map_err(|_| {
        LedgerError::Validation(format!(
            "{function} takes {N} arguments, got {}",
            args.len()
        ))
    })
}

impl Command {
    pub fn parse(function: &str, args: &[String]) -> Result<Self, LedgerError> {
        let transfer = |edge: InvoiceTransfer| -> Result<Self, LedgerError> {
            let [program_id, recipient, invoice_id] = arity::<3>(function, args)?;
            Ok(Command::TransferInvoice {
                edge,
                program_id: program_id.clone(),
                recipient: recipient.clone(),
                invoice_id: invoice_id.clone(),
            })
        };
        let revise = |edge: InvoiceRevision| -> Result<Self, LedgerError> {
            let [program_id, recipient, invoice_id, remark] = arity::<4>(function, args)?;
            Ok(Command::ReviseInvoice {
                edge,
                program_id: program_id.clone(),
                recipient: recipient.clone(),
                invoice_id: invoice_id.clone(),
                remark: remark.clone(),
            })
        };

        let command = match function {
            "create_program" => {
                let [program_id] = arity::<1>(function, args)?;
                Command::CreateProgram {
                    program_id: program_id.clone(),
                }
            }
            "update_program_terms" => {
                let (program_id, rest) = split_first(function, args)?;
                Command::UpdateProgramTerms {
                    program_id,
                    terms: AnchorTerms::from_args(rest)?,
                }
            }
            "update_vendor_terms" => {
                let (program_id, rest) = split_first(function, args)?;
                Command::UpdateVendorTerms {
                    program_id,
                    terms: VendorTerms::from_args(rest)?,
                }
            }
            "admin_to_anchor" => {
                let [program_id, recipient] = arity::<2>(function, args)?;
                Command::AdminToAnchor {
                    program_id: program_id.clone(),
                    recipient: recipient.clone(),
                }
            }
            "anchor_to_admin_rev" => {
                let [program_id, recipient, remark] = arity::<3>(function, args)?;
                Command::AnchorToAdminRev {
                    program_id: program_id.clone(),
                    recipient: recipient.clone(),
                    remark: remark.clone(),
                }
            }
            "update_po" => {
                let [program_id, amount, image, po_id] = arity::<4>(function, args)?;
                Command::UpdatePo {
                    program_id: program_id.clone(),
                    amount: parse_amount(amount),
                    image: image.clone(),
                    po_id: po_id.clone(),
                }
            }
            "anchor_to_vendor" => {
                let [program_id, recipient] = arity::<2>(function, args)?;
                Command::AnchorToVendor {
                    program_id: program_id.clone(),
                    recipient: recipient.clone(),
                }
            }
            "vendor_to_anchor_rev" => {
                let [program_id, recipient, remark] = arity::<3>(function, args)?;
                Command::VendorToAnchorRev {
                    program_id: program_id.clone(),
                    recipient: recipient.clone(),
                    remark: remark.clone(),
                }
            }
            "acknowledge_po" => {
                let [program_id] = arity::<1>(function, args)?;
                Command::AcknowledgePo {
                    program_id: program_id.clone(),
                }
            }
            "close_program" => {
                let [program_id] = arity::<1>(function, args)?;
                Command::CloseProgram {
                    program_id: program_id.clone(),
                }
            }
            "create_invoice" => {
                let [program_id, invoice_id] = arity::<2>(function, args)?;
                Command::CreateInvoice {
                    program_id: program_id.clone(),
                    invoice_id: invoice_id.clone(),
                }
            }
            "update_invoice_details" => {
                let [program_id, invoice_id, amount, invoice_ref, image] =
                    arity::<5>(function, args)?;
                Command::UpdateInvoiceDetails {
                    program_id: program_id.clone(),
                    invoice_id: invoice_id.clone(),
                    amount: parse_amount(amount),
                    invoice_ref: invoice_ref.clone(),
                    image: image.clone(),
                }
            }
            "approve_invoice_amount" => {
                let [program_id, invoice_id, amount] = arity::<3>(function, args)?;
                Command::ApproveInvoiceAmount {
                    program_id: program_id.clone(),
                    invoice_id: invoice_id.clone(),
                    amount: parse_amount(amount),
                }
            }
            "transfer_vendor_to_anchor_invoice" => transfer(InvoiceTransfer::VendorToAnchor)?,
            "transfer_anchor_to_vendor_invoice" => transfer(InvoiceTransfer::AnchorToVendor)?,
            "transfer_vendor_to_admin_invoice" => transfer(InvoiceTransfer::VendorToAdmin)?,
            "transfer_admin_to_payment_invoice" => transfer(InvoiceTransfer::AdminToPaymentMaker)?,
            "transfer_payment_maker_to_payment_checker_invoice" => {
                transfer(InvoiceTransfer::PaymentMakerToPaymentChecker)?
            }
            "transfer_payment_checker_to_payment_maker_invoice" => {
                transfer(InvoiceTransfer::PaymentCheckerToPaymentMaker)?
            }
            "transfer_rev_anchor_to_vendor_invoice" => revise(InvoiceRevision::AnchorToVendor)?,
            "transfer_rev_vendor_to_anchor_invoice" => revise(InvoiceRevision::VendorToAnchor)?,
            "transfer_rev_admin_to_vendor_invoice" => revise(InvoiceRevision::AdminToVendor)?,
            "transfer_rev_payment_to_admin_invoice" => revise(InvoiceRevision::PaymentToAdmin)?,
            "transfer_rev_payment_checker_to_payment_maker_invoice" => {
                revise(InvoiceRevision::PaymentCheckerToPaymentMaker)?
            }
            "record_payment" => {
                let [program_id, invoice_id, amount, channel] = arity::<4>(function, args)?;
                Command::RecordPayment {
                    program_id: program_id.clone(),
                    invoice_id: invoice_id.clone(),
                    amount: parse_amount(amount),
                    channel: channel.clone(),
                }
            }
            "approve_payment" => {
                let [program_id, invoice_id] = arity::<2>(function, args)?;
                Command::ApprovePayment {
                    program_id: program_id.clone(),
                    invoice_id: invoice_id.clone(),
                }
            }
            "revert_payment_approval" => {
                let [program_id, invoice_id, remark] = arity::<3>(function, args)?;
                Command::RevertPaymentApproval {
                    program_id: program_id.clone(),
                    invoice_id: invoice_id.clone(),
                    remark: remark.clone(),
                }
            }
            "record_payment_result" => {
                let [program_id, invoice_id, status, reference] = arity::<4>(function, args)?;
                Command::RecordPaymentResult {
                    program_id: program_id.clone(),
                    invoice_id: invoice_id.clone(),
                    status: status.clone(),
                    reference: reference.clone(),
                }
            }
            "revert_payment_result" => {
                let [program_id, invoice_id, remark] = arity::<3>(function, args)?;
                Command::RevertPaymentResult {
                    program_id: program_id.clone(),
                    invoice_id: invoice_id.clone(),
                    remark: remark.clone(),
                }
            }
            "settle_invoice" => {
                let [program_id, invoice_id, amount] = arity::<3>(function, args)?;
                Command::SettleInvoice {
                    program_id: program_id.clone(),
                    invoice_id: invoice_id.clone(),
                    amount: parse_amount(amount),
                }
            }
            "get_program" => {
                let [program_id] = arity::<1>(function, args)?;
                Command::GetProgram {
                    program_id: program_id.clone(),
                }
            }
            "get_invoice" => {
                let [invoice_id] = arity::<1>(function, args)?;
                Command::GetInvoice {
                    invoice_id: invoice_id.clone(),
                }
            }
            "list_programs" => {
                arity::<0>(function, args)?;
                Command::ListPrograms
            }
            "list_invoices" => {
                arity::<0>(function, args)?;
                Command::ListInvoices
            }
            "list_program_ids" => {
                arity::<0>(function, args)?;
                Command::ListProgramIds
            }
            "list_invoice_ids" => {
                arity::<0>(function, args)?;
                Command::ListInvoiceIds
            }
            "get_history" => {
                let [record_id] = arity::<1>(function, args)?;
                Command::GetHistory {
                    record_id: record_id.clone(),
                }
            }
            other => {
                return Err(LedgerError::Validation(format!("unknown function {other}")));
            }
        };
        Ok(command)
    }

    /// The function name this command was parsed from.
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateProgram { .. } => "create_program",
            Command::UpdateProgramTerms { .. } => "update_program_terms",
            Command::UpdateVendorTerms { .. } => "update_vendor_terms",
            Command::AdminToAnchor { .. } => "admin_to_anchor",
            Command::AnchorToAdminRev { .. } => "anchor_to_admin_rev",
            Command::UpdatePo { .. } => "update_po",
            Command::AnchorToVendor { .. } => "anchor_to_vendor",
            Command::VendorToAnchorRev { .. } => "vendor_to_anchor_rev",
            Command::AcknowledgePo { .. } => "acknowledge_po",
            Command::CloseProgram { .. } => "close_program",
            Command::CreateInvoice { .. } => "create_invoice",
            Command::UpdateInvoiceDetails { .. } => "update_invoice_details",
            Command::ApproveInvoiceAmount { .. } => "approve_invoice_amount",
            Command::TransferInvoice { edge, .. } => edge.name(),
            Command::ReviseInvoice { edge, .. } => edge.name(),
            Command::RecordPayment { .. } => "record_payment",
            Command::ApprovePayment { .. } => "approve_payment",
            Command::RevertPaymentApproval { .. } => "revert_payment_approval",
            Command::RecordPaymentResult { .. } => "record_payment_result",
            Command::RevertPaymentResult { .. } => "revert_payment_result",
            Command::SettleInvoice { .. } => "settle_invoice",
            Command::GetProgram { .. } => "get_program",
            Command::GetInvoice { .. } => "get_invoice",
            Command::ListPrograms => "list_programs",
            Command::ListInvoices => "list_invoices",
            Command::ListProgramIds => "list_program_ids",
            Command::ListInvoiceIds => "list_invoice_ids",
            Command::GetHistory { .. } => "get_history",
        }
    }

    pub fn is_query(&self) -> bool {
        matches!(
            self,
            Command::GetProgram { .. }
                | Command::GetInvoice { .. }
                | Command::ListPrograms
                | Command::ListInvoices
                | Command::ListProgramIds
                | Command::ListInvoiceIds
                | Command::GetHistory { .. }
        )
    }
}

fn split_first<'a>(
    function: &str,
    args: &'a [String],
) -> Result<(String, &'a [String]), LedgerError> {
    match args.split_first() {
        Some((program_id, rest)) => Ok((program_id.clone(), rest)),
        None => Err(LedgerError::Validation(format!(
            "{function} needs a program id"
        ))),
    }
}
