//! Property-based tests for ledger invariants
//!
//! These run whole operation sequences against the in-memory store and check
//! the invariants that must hold no matter which party calls what, in which
//! order, with which amounts:
//!
//! 1. Approved amounts under a program never exceed its purchase order
//! 2. A settled invoice refuses every further mutation
//! 3. A program's status only moves forward
//! 4. Program and invoice records survive persistence unchanged
//! 5. Amount parsing never yields a non-finite value
//!
//! Authorization of individual edges is covered by the unit tests next to
//! each record type and by the scenario tests.

use proptest::prelude::*;
use std::sync::Arc;
use supply_finance::{
    FinancingService, Identity, LedgerError, Role, ServiceConfig,
    command::{InvoiceRevision, InvoiceTransfer},
    invoice::{InvoiceLineItem, InvoiceStatus},
    program::{AnchorTerms, Program, ProgramStatus, VendorTerms},
    store::MemoryStore,
    types::TimeStamp,
    utils::parse_amount,
};

type Service = FinancingService<MemoryStore>;

struct Parties {
    admin: Identity,
    anchor: Identity,
    vendor: Identity,
    maker: Identity,
    checker: Identity,
}

fn parties() -> Parties {
    Parties {
        admin: Identity::new("acct_admin", Role::Admin),
        anchor: Identity::new("acct_anchor", Role::Anchor),
        vendor: Identity::new("acct_vendor", Role::Vendor),
        maker: Identity::new("acct_maker", Role::PaymentMaker),
        checker: Identity::new("acct_checker", Role::PaymentChecker),
    }
}

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// A bootstrapped ledger holding a fully termed template `P1`.
fn termed(p: &Parties) -> Service {
    let service = FinancingService::new(Arc::new(MemoryStore::new()), ServiceConfig::default());
    service.bootstrap().unwrap();
    service.create_program(&p.admin, "P1").unwrap();

    let anchor = AnchorTerms::from_args(&args(&[
        "Acme", "ANC-1", "IFSC1", "agr.pdf", "111", "50000", "2030-12-31", "9", "2", "30", "12",
        "auto",
    ]))
    .unwrap();
    let vendor = VendorTerms::from_args(&args(&[
        "VEN-1", "10000", "Vera", "Endor", "v@e.test", "555", "Main St", "PAN", "ven.pdf",
        "2030-12-31", "Bank", "Bank St", "222", "IFSC2",
    ]))
    .unwrap();
    service.update_program_terms(&p.admin, "P1", anchor).unwrap();
    service.update_vendor_terms(&p.admin, "P1", vendor).unwrap();
    service
}

/// `P1` placed with the Vendor for `po`.
fn placed(p: &Parties, po: f64) -> Service {
    let service = termed(p);
    service.admin_to_anchor(&p.admin, "P1", &p.anchor).unwrap();
    service.update_po(&p.anchor, "P1", po, "po.png", "PO1").unwrap();
    service.anchor_to_vendor(&p.anchor, "P1", &p.vendor).unwrap();
    service
}

/// `I1` under a placed `P1`, carried all the way to settlement.
fn settled(p: &Parties) -> Service {
    let service = placed(p, 1000.0);
    service.create_invoice(&p.vendor, "P1", "I1").unwrap();
    service
        .update_invoice_details(&p.vendor, "P1", "I1", 800.0, "INV-1", "inv.png")
        .unwrap();
    service
        .transfer_invoice(&p.vendor, InvoiceTransfer::VendorToAnchor, "P1", &p.anchor, "I1")
        .unwrap();
    service
        .approve_invoice_amount(&p.anchor, "P1", "I1", 800.0)
        .unwrap();
    service
        .transfer_invoice(&p.anchor, InvoiceTransfer::AnchorToVendor, "P1", &p.vendor, "I1")
        .unwrap();
    service
        .transfer_invoice(&p.vendor, InvoiceTransfer::VendorToAdmin, "P1", &p.admin, "I1")
        .unwrap();
    service
        .transfer_invoice(&p.admin, InvoiceTransfer::AdminToPaymentMaker, "P1", &p.maker, "I1")
        .unwrap();
    service.record_payment(&p.maker, "P1", "I1", 800.0, "NEFT").unwrap();
    service
        .transfer_invoice(
            &p.maker,
            InvoiceTransfer::PaymentMakerToPaymentChecker,
            "P1",
            &p.checker,
            "I1",
        )
        .unwrap();
    service.approve_payment(&p.checker, "P1", "I1").unwrap();
    service
        .record_payment_result(&p.checker, "P1", "I1", "SUCCESS", "UTR-1")
        .unwrap();
    service.settle_invoice(&p.checker, "P1", "I1", 800.0).unwrap();
    service
}

/// One attempted mutation of the settled invoice `I1`, by its natural caller.
fn mutate_settled(
    service: &Service,
    p: &Parties,
    op: usize,
    amount: f64,
) -> Result<(), LedgerError> {
    match op {
        0 => service.update_invoice_details(&p.vendor, "P1", "I1", amount, "INV-2", "img"),
        1 => service.approve_invoice_amount(&p.anchor, "P1", "I1", amount),
        2 => service.transfer_invoice(
            &p.vendor,
            InvoiceTransfer::VendorToAnchor,
            "P1",
            &p.anchor,
            "I1",
        ),
        3 => service.record_payment(&p.maker, "P1", "I1", amount, "RTGS"),
        4 => service.approve_payment(&p.checker, "P1", "I1"),
        5 => service.record_payment_result(&p.checker, "P1", "I1", "SUCCESS", "UTR-2"),
        6 => service.settle_invoice(&p.checker, "P1", "I1", amount),
        7 => service.revise_invoice(
            &p.anchor,
            InvoiceRevision::AnchorToVendor,
            "P1",
            &p.vendor,
            "I1",
            "reopen",
        ),
        8 => service.revert_payment_result(&p.checker, "P1", "I1", "reopen"),
        _ => service.revert_payment_approval(&p.checker, "P1", "I1", "reopen"),
    }
    .map(|_| ())
}

/// One attempted program operation by an arbitrary party.
fn program_step(service: &Service, p: &Parties, op: usize, who: usize, amount: f64) {
    let everyone = [&p.admin, &p.anchor, &p.vendor, &p.maker, &p.checker];
    let caller = everyone[who % everyone.len()];
    let recipient = everyone[(who + 1) % everyone.len()];
    // refusals are expected; only the resulting state matters here
    let _ = match op {
        0 => service.admin_to_anchor(caller, "P1", recipient),
        1 => service.update_po(caller, "P1", amount, "po.png", "PO1"),
        2 => service.anchor_to_vendor(caller, "P1", recipient),
        3 => service.acknowledge_po(caller, "P1"),
        4 => service.close_program(caller, "P1"),
        5 => service.anchor_to_admin_rev(caller, "P1", recipient, "rev"),
        _ => service.vendor_to_anchor_rev(caller, "P1", recipient, "rev"),
    };
}

fn program_strategy() -> impl Strategy<Value = Program> {
    (
        "[A-Z][0-9]{1,4}",
        prop_oneof![
            Just(ProgramStatus::Template),
            Just(ProgramStatus::Initiated),
            Just(ProgramStatus::POPlaced),
            Just(ProgramStatus::Closed),
        ],
        0.0f64..1e9,
        any::<bool>(),
        prop::collection::vec("I[0-9]{1,3}", 0..5),
        prop::option::of("[a-z ]{1,20}"),
    )
        .prop_map(|(id, status, po, placed, invoice_ids, remarks)| {
            let mut program = Program::new(id, "acct_admin");
            program.status = status;
            program.purchase_order.amount = po;
            program.purchase_order.placed_at = placed.then(TimeStamp::new);
            program.invoice_ids = invoice_ids;
            program.remarks = remarks;
            program
        })
}

fn invoice_strategy() -> impl Strategy<Value = InvoiceLineItem> {
    (
        "I[0-9]{1,4}",
        prop_oneof![
            Just(InvoiceStatus::Template),
            Just(InvoiceStatus::Raised),
            Just(InvoiceStatus::PendingApproval),
            Just(InvoiceStatus::Paid),
            Just(InvoiceStatus::Retired),
        ],
        (0.0f64..1e9, 0.0f64..1e9),
        prop::option::of("[A-Z]{4}-[0-9]{1,6}"),
        any::<bool>(),
        prop::collection::vec("I[0-9]{1,3}-RIN[1-5]", 0..3),
    )
        .prop_map(|(id, status, (claimed, approved), reference, raised, fork_ids)| {
            let mut program = Program::new("P1", "acct_vendor");
            program.status = ProgramStatus::POPlaced;
            let vendor = Identity::new("acct_vendor", Role::Vendor);
            let mut invoice = InvoiceLineItem::create(&program, &vendor, id).unwrap();
            invoice.status = status;
            invoice.claimed_amount = claimed;
            invoice.approved_amount = approved;
            invoice.reference = reference;
            invoice.raised_at = raised.then(TimeStamp::new);
            invoice.fork_ids = fork_ids;
            invoice
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Whatever the vendor claims and the anchor approves, the approved
    /// total of the program's items stays within the purchase order.
    #[test]
    fn prop_approvals_stay_within_purchase_order(
        po in 1u32..5000,
        attempts in prop::collection::vec((1u32..3000, 1u32..3000), 1..6),
    ) {
        let p = parties();
        let service = placed(&p, po as f64);

        for (i, (claim, approve)) in attempts.iter().enumerate() {
            let id = format!("I{i}");
            service.create_invoice(&p.vendor, "P1", &id).unwrap();
            service
                .update_invoice_details(&p.vendor, "P1", &id, *claim as f64, "INV", "img")
                .unwrap();
            // an unfilled claim cannot be raised
            if service
                .transfer_invoice(&p.vendor, InvoiceTransfer::VendorToAnchor, "P1", &p.anchor, &id)
                .is_ok()
            {
                service
                    .approve_invoice_amount(&p.anchor, "P1", &id, *approve as f64)
                    .unwrap();
            }
        }

        let approved: f64 = service
            .list_invoices(&p.admin)
            .unwrap()
            .iter()
            .filter(|i| i.status == InvoiceStatus::VendorApproved)
            .map(|i| i.approved_amount)
            .sum();
        prop_assert!(approved <= po as f64);
    }

    /// Settlement is terminal for the invoice.
    #[test]
    fn prop_settled_invoice_refuses_mutation(op in 0usize..10, amount in 0.0f64..10_000.0) {
        let p = parties();
        let service = settled(&p);
        let before = service.get_invoice(&p.admin, "I1").unwrap();

        let err = mutate_settled(&service, &p, op, amount).unwrap_err();

        prop_assert!(err.is_permission_denied());
        prop_assert_eq!(service.get_invoice(&p.admin, "I1").unwrap(), before);
    }

    /// A program's status never moves backwards, whoever attempts what.
    #[test]
    fn prop_program_status_is_monotonic(
        steps in prop::collection::vec((0usize..7, 0usize..5, 0.0f64..20_000.0), 1..25),
    ) {
        let p = parties();
        let service = termed(&p);
        let mut last = service.get_program(&p.admin, "P1").unwrap().status;

        for (op, who, amount) in steps {
            program_step(&service, &p, op, who, amount);
            let program = service.get_program(&p.admin, "P1").unwrap();
            prop_assert!(program.status >= last);
            prop_assert!(program.purchase_order.amount <= program.vendor.limit);
            last = program.status;
        }
    }

    #[test]
    fn prop_program_survives_encoding(program in program_strategy()) {
        let cbor = minicbor::to_vec(&program).unwrap();
        let decoded: Program = minicbor::decode(&cbor).unwrap();
        prop_assert_eq!(decoded, program);
    }

    #[test]
    fn prop_invoice_survives_encoding(invoice in invoice_strategy()) {
        let cbor = minicbor::to_vec(&invoice).unwrap();
        let decoded: InvoiceLineItem = minicbor::decode(&cbor).unwrap();
        prop_assert_eq!(decoded, invoice);
    }

    #[test]
    fn prop_parsed_amounts_are_finite(raw in ".*") {
        prop_assert!(parse_amount(&raw).is_finite());
    }
}
