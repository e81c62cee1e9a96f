use super::invoice::{Invoice, InvoiceId};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Storage boundary for invoices. Every call is atomic on its own; the
/// engine assumes a single writer per invoice between a read and its update.
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn get_by_id(&self, id: InvoiceId) -> Result<Option<Invoice>>;
    async fn get_by_reference(&self, reference: &str) -> Result<Option<Invoice>>;
    async fn create(&self, invoice: Invoice) -> Result<()>;
    /// Replaces the stored snapshot with the same id. Returns `false` when no
    /// such invoice exists.
    async fn update(&self, invoice: Invoice) -> Result<bool>;
    async fn delete(&self, id: InvoiceId) -> Result<bool>;
    async fn all(&self) -> Result<Vec<Invoice>>;
}

/// Handle shared by the payment processor and the invoice handlers.
pub type InvoiceRepositoryRef = Arc<dyn InvoiceRepository>;
