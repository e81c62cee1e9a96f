//! Static consistency rules for a stored invoice.
//!
//! Every rule is evaluated on every call and the violations are returned in a
//! fixed order, so a caller sees all problems with a record at once.

use super::invoice::{Invoice, Money};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    #[error("The amount is negative.")]
    NegativeAmount,
    #[error("The amount paid is negative.")]
    NegativeAmountPaid,
    #[error("The tax amount is negative.")]
    NegativeTaxAmount,
    #[error("The invoice is in an invalid state, it has an amount of 0 and it has payments.")]
    ZeroValueWithPayments,
    #[error("The sum of the payments is different from the amount paid.")]
    PaymentsSumMismatch,
    #[error("The amount paid is more than the amount{}.", tax_suffix(.taxed))]
    Overpaid { taxed: bool },
}

fn tax_suffix(taxed: &bool) -> &'static str {
    if *taxed { " + invoice.TaxAmount" } else { "" }
}

/// Checks an invoice snapshot against the ledger invariants.
///
/// An empty result means the invoice is consistent.
pub fn validate(invoice: &Invoice) -> Vec<Violation> {
    let mut violations = Vec::new();
    let total = invoice.checked_total();

    if invoice.amount.is_negative() {
        violations.push(Violation::NegativeAmount);
    }

    if invoice.amount_paid.is_negative() {
        violations.push(Violation::NegativeAmountPaid);
    }

    if invoice.tax_amount.is_negative() {
        violations.push(Violation::NegativeTaxAmount);
    }

    if total.is_some_and(|t| t.is_zero()) && !invoice.payments.is_empty() {
        violations.push(Violation::ZeroValueWithPayments);
    }

    if invoice.checked_payments_sum() != Some(invoice.amount_paid) {
        violations.push(Violation::PaymentsSumMismatch);
    }

    // An overflowing total lies outside the `Decimal` range on the side of its amount.
    let overpaid = match total {
        Some(total) => total < invoice.amount_paid,
        None => invoice.amount.is_negative(),
    };
    if overpaid {
        violations.push(Violation::Overpaid {
            taxed: invoice.tax_amount > Money::ZERO,
        });
    }

    violations
}

/// Same as [`validate`], rendered as the messages reported to callers.
pub fn violation_messages(invoice: &Invoice) -> Vec<String> {
    validate(invoice).iter().map(ToString::to_string).collect()
}
