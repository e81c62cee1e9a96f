#![allow(dead_code)]

use invoice_ledger::domain::invoice::{Invoice, InvoiceId, InvoiceType, Money, Payment};
use rust_decimal::Decimal;
use std::io::Write;
use tempfile::NamedTempFile;

pub const HEADER: &str = "command, reference, amount, type";

/// Writes a replay file with the standard header followed by `rows`.
pub fn commands_file(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(file, "{}", HEADER).unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file.flush().unwrap();
    file
}

/// An invoice as it might sit in storage, with `amount_paid` consistent
/// with `payments`.
pub fn stored_invoice(reference: &str, amount: Decimal, tax: Decimal, payments: &[Decimal]) -> Invoice {
    let payments: Vec<Payment> = payments
        .iter()
        .map(|p| Payment::new(Money::new(*p), reference))
        .collect();
    Invoice {
        id: InvoiceId::new_random(),
        reference: reference.to_string(),
        amount: Money::new(amount),
        tax_amount: Money::new(tax),
        amount_paid: payments.iter().map(|p| &p.amount).sum(),
        payments,
        kind: if tax > Decimal::ZERO {
            InvoiceType::Commercial
        } else {
            InvoiceType::Standard
        },
    }
}
