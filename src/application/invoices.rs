use crate::config::LedgerConfig;
use crate::domain::invoice::{Invoice, InvoiceId, InvoiceType, Money, Payment};
use crate::domain::outcome::{FailureKind, Outcome};
use crate::domain::ports::InvoiceRepositoryRef;
use crate::domain::validation::violation_messages;
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

pub const INVALID_AMOUNT: &str = "Invalid amount";
pub const MISSING_REFERENCE: &str = "Missing invoice reference.";
pub const DUPLICATE_REFERENCE: &str = "An invoice with this reference already exists.";
pub const NOT_FOUND: &str = "Invoice not found.";
pub const NOT_SAVED: &str = "The invoice could not be saved.";

/// New contents for an existing invoice. The tax and the amount paid are
/// derived from these, never taken from the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceChanges {
    pub amount: Decimal,
    pub kind: InvoiceType,
    pub payments: Vec<Payment>,
}

/// Create, read, update and delete for invoices.
pub struct InvoiceService {
    repository: InvoiceRepositoryRef,
    config: LedgerConfig,
}

impl InvoiceService {
    pub fn new(repository: InvoiceRepositoryRef, config: LedgerConfig) -> Self {
        Self { repository, config }
    }

    pub async fn create(
        &self,
        reference: &str,
        amount: Decimal,
        kind: InvoiceType,
        cancel: &CancellationToken,
    ) -> Outcome<Invoice> {
        let mut messages = Vec::new();
        if reference.trim().is_empty() {
            messages.push(MISSING_REFERENCE.to_string());
        }
        if amount <= Decimal::ZERO {
            messages.push(INVALID_AMOUNT.to_string());
        }
        if !messages.is_empty() {
            tracing::warn!(reference, "Rejected invoice: {}", messages.join("; "));
            return Outcome::failure(FailureKind::InvalidRequest, messages);
        }

        if cancel.is_cancelled() {
            return Outcome::cancelled();
        }

        match self.repository.get_by_reference(reference).await {
            Ok(Some(_)) => {
                return Outcome::failure_with(FailureKind::Rejected, DUPLICATE_REFERENCE);
            }
            Ok(None) => {}
            Err(e) => return Outcome::unexpected(e),
        }

        let invoice = Invoice::new(
            reference,
            Money::new(amount),
            kind,
            self.config.commercial_tax_rate,
        );

        let violations = violation_messages(&invoice);
        if !violations.is_empty() {
            tracing::warn!(reference, "Rejected new invoice: {}", violations.join("; "));
            return Outcome::failure(FailureKind::InvalidInvoice, violations);
        }

        if cancel.is_cancelled() {
            return Outcome::cancelled();
        }

        match self.repository.create(invoice.clone()).await {
            Ok(()) => {
                tracing::info!(invoice = %invoice.id, reference, total = %invoice.total(), "Invoice created");
                Outcome::success("Invoice created.", invoice)
            }
            Err(e) => {
                tracing::error!(reference, "Creating invoice failed: {}", e);
                Outcome::unexpected(e)
            }
        }
    }

    pub async fn get_by_id(&self, id: InvoiceId, cancel: &CancellationToken) -> Outcome<Invoice> {
        if cancel.is_cancelled() {
            return Outcome::cancelled();
        }

        match self.repository.get_by_id(id).await {
            Ok(Some(invoice)) => Outcome {
                failure: None,
                messages: Vec::new(),
                data: Some(invoice),
            },
            Ok(None) => Outcome::failure_with(FailureKind::NotFound, NOT_FOUND),
            Err(e) => Outcome::unexpected(e),
        }
    }

    /// Replaces amount, type and payments of an invoice after checking the
    /// resulting record against every consistency rule.
    pub async fn update(
        &self,
        id: InvoiceId,
        changes: InvoiceChanges,
        cancel: &CancellationToken,
    ) -> Outcome<Invoice> {
        if cancel.is_cancelled() {
            return Outcome::cancelled();
        }

        let current = match self.repository.get_by_id(id).await {
            Ok(Some(invoice)) => invoice,
            Ok(None) => return Outcome::failure_with(FailureKind::NotFound, NOT_FOUND),
            Err(e) => return Outcome::unexpected(e),
        };

        let amount = Money::new(changes.amount);
        let mut candidate = Invoice {
            amount,
            tax_amount: changes.kind.tax_for(amount, self.config.commercial_tax_rate),
            kind: changes.kind,
            payments: changes.payments,
            ..current
        };
        candidate.amount_paid = candidate.payments_sum();

        let violations = violation_messages(&candidate);
        if !violations.is_empty() {
            tracing::warn!(invoice = %id, "Rejected invoice update: {}", violations.join("; "));
            return Outcome::failure(FailureKind::InvalidInvoice, violations);
        }

        if cancel.is_cancelled() {
            return Outcome::cancelled();
        }

        match self.repository.update(candidate.clone()).await {
            Ok(true) => {
                tracing::info!(invoice = %id, "Invoice updated");
                Outcome::success("Invoice updated.", candidate)
            }
            Ok(false) => Outcome::failure_with(FailureKind::NotPersisted, NOT_SAVED),
            Err(e) => {
                tracing::error!(invoice = %id, "Updating invoice failed: {}", e);
                Outcome::failure(
                    FailureKind::NotPersisted,
                    vec![NOT_SAVED.to_string(), e.to_string()],
                )
            }
        }
    }

    pub async fn delete(&self, id: InvoiceId, cancel: &CancellationToken) -> Outcome<InvoiceId> {
        if cancel.is_cancelled() {
            return Outcome::cancelled();
        }

        match self.repository.get_by_id(id).await {
            Ok(Some(_)) => {}
            Ok(None) => return Outcome::failure_with(FailureKind::NotFound, NOT_FOUND),
            Err(e) => return Outcome::unexpected(e),
        }

        if cancel.is_cancelled() {
            return Outcome::cancelled();
        }

        match self.repository.delete(id).await {
            Ok(true) => {
                tracing::info!(invoice = %id, "Invoice deleted");
                Outcome::success("Invoice deleted.", id)
            }
            Ok(false) => Outcome::failure_with(FailureKind::NotFound, NOT_FOUND),
            Err(e) => {
                tracing::error!(invoice = %id, "Deleting invoice failed: {}", e);
                Outcome::unexpected(e)
            }
        }
    }
}
