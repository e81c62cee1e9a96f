use crate::config::{LedgerConfig, ZeroValuePolicy};
use crate::domain::invoice::{Invoice, Money, PaymentAmount};
use crate::domain::outcome::{FailureKind, Outcome};
use crate::domain::ports::InvoiceRepositoryRef;
use crate::domain::validation::violation_messages;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;

pub const MISSING_REFERENCE: &str = "Missing payment reference.";
pub const INVALID_AMOUNT: &str = "Invalid payment amount.";
pub const NO_MATCHING_INVOICE: &str = "There is no invoice matching this payment";
pub const NO_PAYMENT_NEEDED: &str = "No payment needed.";
pub const ALREADY_FULLY_PAID: &str = "The invoice is already fully paid.";
pub const OVER_PAYMENT: &str = "Over payment.";
pub const NOT_SAVED: &str = "The payment could not be saved.";

/// A payment submitted against the invoice identified by `reference`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub reference: String,
    pub amount: Decimal,
}

impl PaymentRequest {
    pub fn new(reference: impl Into<String>, amount: Decimal) -> Self {
        Self {
            reference: reference.into(),
            amount,
        }
    }
}

/// Where an invoice stands after a payment was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    PartiallyPaid,
    FullyPaid,
}

impl PaymentStatus {
    fn of(invoice: &Invoice) -> Self {
        if invoice.is_fully_paid() {
            PaymentStatus::FullyPaid
        } else {
            PaymentStatus::PartiallyPaid
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::PartiallyPaid => f.write_str("Invoice is now partially paid."),
            PaymentStatus::FullyPaid => f.write_str("Invoice is now fully paid."),
        }
    }
}

/// Applies payments to invoices.
///
/// Each call runs its stages strictly in order: request shape, invoice lookup,
/// invoice state, overpayment, then the append and the single persisting
/// update. A failing stage ends the call and nothing after it runs, so a
/// rejected payment never reaches the repository's `update`.
pub struct PaymentProcessor {
    repository: InvoiceRepositoryRef,
    config: LedgerConfig,
}

impl PaymentProcessor {
    /// Creates a new `PaymentProcessor`.
    ///
    /// # Arguments
    ///
    /// * `repository` - Where invoices are looked up and saved.
    /// * `config` - Tax and zero-value settings.
    pub fn new(repository: InvoiceRepositoryRef, config: LedgerConfig) -> Self {
        Self { repository, config }
    }

    pub async fn apply_payment(
        &self,
        request: PaymentRequest,
        cancel: &CancellationToken,
    ) -> Outcome<PaymentStatus> {
        let amount = match validate_request(&request) {
            Ok(amount) => amount,
            Err(messages) => {
                tracing::warn!(reference = %request.reference, "Rejected payment request: {}", messages.join("; "));
                return Outcome::failure(FailureKind::InvalidRequest, messages);
            }
        };
        tracing::debug!(reference = %request.reference, amount = %amount.value(), "Payment request accepted");

        if cancel.is_cancelled() {
            return Outcome::cancelled();
        }

        let mut invoice = match self.repository.get_by_reference(&request.reference).await {
            Ok(Some(invoice)) => invoice,
            Ok(None) => {
                tracing::warn!(reference = %request.reference, "No invoice for payment");
                return Outcome::failure_with(FailureKind::NotFound, NO_MATCHING_INVOICE);
            }
            Err(e) => {
                tracing::error!(reference = %request.reference, "Invoice lookup failed: {}", e);
                return Outcome::unexpected(e);
            }
        };
        tracing::debug!(invoice = %invoice.id, reference = %invoice.reference, "Invoice found");

        let problems = self.invoice_state_messages(&invoice);
        if !problems.is_empty() {
            tracing::warn!(invoice = %invoice.id, "Invoice cannot take a payment: {}", problems.join("; "));
            return Outcome::failure(FailureKind::InvalidInvoice, problems);
        }
        tracing::debug!(invoice = %invoice.id, state = %invoice.settlement_state(), "Invoice can take a payment");

        // Stage 3 rejected negative figures, so an overflow on either side is above `Decimal::MAX`.
        let new_paid = Money::from(amount).checked_add(invoice.amount_paid);
        let over_payment = match (new_paid, invoice.checked_total()) {
            (None, _) => true,
            (Some(paid), Some(total)) => paid > total,
            (Some(_), None) => false,
        };
        if over_payment {
            tracing::warn!(
                invoice = %invoice.id,
                amount = %amount.value(),
                outstanding = %invoice.outstanding(),
                "Payment exceeds the outstanding balance"
            );
            return Outcome::failure_with(FailureKind::Rejected, OVER_PAYMENT);
        }

        invoice.record_payment(amount, request.reference.as_str());
        let status = PaymentStatus::of(&invoice);
        let invoice_id = invoice.id;
        tracing::debug!(invoice = %invoice_id, amount_paid = %invoice.amount_paid, "Payment recorded");

        if cancel.is_cancelled() {
            return Outcome::cancelled();
        }

        match self.repository.update(invoice).await {
            Ok(true) => {
                tracing::info!(invoice = %invoice_id, amount = %amount.value(), "{}", status);
                Outcome::success(status.to_string(), status)
            }
            Ok(false) => {
                tracing::error!(invoice = %invoice_id, "Invoice disappeared before the payment was saved");
                Outcome::failure_with(FailureKind::NotPersisted, NOT_SAVED)
            }
            Err(e) => {
                tracing::error!(invoice = %invoice_id, "Saving the payment failed: {}", e);
                Outcome::failure(
                    FailureKind::NotPersisted,
                    vec![NOT_SAVED.to_string(), e.to_string()],
                )
            }
        }
    }

    /// Admissibility checks against the current totals followed by the
    /// consistency violations of the stored record.
    fn invoice_state_messages(&self, invoice: &Invoice) -> Vec<String> {
        let mut messages = Vec::new();

        if invoice.total().is_zero()
            && invoice.payments.is_empty()
            && self.config.zero_value_policy == ZeroValuePolicy::NoPaymentNeeded
        {
            messages.push(NO_PAYMENT_NEEDED.to_string());
        }

        if invoice.is_fully_paid() {
            messages.push(ALREADY_FULLY_PAID.to_string());
        }

        messages.extend(violation_messages(invoice));
        messages
    }
}

/// Checks the shape of a request before any lookup. Both rules are always
/// evaluated.
pub fn validate_request(request: &PaymentRequest) -> Result<PaymentAmount, Vec<String>> {
    let mut messages = Vec::new();

    if request.reference.trim().is_empty() {
        messages.push(MISSING_REFERENCE.to_string());
    }

    let amount = PaymentAmount::new(request.amount);
    if amount.is_err() {
        messages.push(INVALID_AMOUNT.to_string());
    }

    match amount {
        Ok(amount) if messages.is_empty() => Ok(amount),
        _ => Err(messages),
    }
}
