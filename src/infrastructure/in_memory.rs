use crate::domain::invoice::{Invoice, InvoiceId};
use crate::domain::ports::InvoiceRepository;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    invoices: HashMap<InvoiceId, Invoice>,
    references: HashMap<String, InvoiceId>,
}

/// A thread-safe in-memory invoice repository.
///
/// Invoices are keyed by id with a secondary index from reference to id.
/// Both maps sit behind one lock so every call sees them in agreement.
#[derive(Default, Clone)]
pub struct InMemoryInvoiceRepository {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryInvoiceRepository {
    /// Creates a new, empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
    async fn get_by_id(&self, id: InvoiceId) -> Result<Option<Invoice>> {
        let tables = self.tables.read().await;
        Ok(tables.invoices.get(&id).cloned())
    }

    async fn get_by_reference(&self, reference: &str) -> Result<Option<Invoice>> {
        let tables = self.tables.read().await;
        Ok(tables
            .references
            .get(reference)
            .and_then(|id| tables.invoices.get(id))
            .cloned())
    }

    async fn create(&self, invoice: Invoice) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.references.contains_key(&invoice.reference) {
            return Err(LedgerError::Validation(format!(
                "Reference {} is already in use",
                invoice.reference
            )));
        }
        tables.references.insert(invoice.reference.clone(), invoice.id);
        tables.invoices.insert(invoice.id, invoice);
        Ok(())
    }

    async fn update(&self, invoice: Invoice) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let Some(previous) = tables.invoices.get(&invoice.id) else {
            return Ok(false);
        };
        if previous.reference != invoice.reference {
            let old = previous.reference.clone();
            tables.references.remove(&old);
            tables.references.insert(invoice.reference.clone(), invoice.id);
        }
        tables.invoices.insert(invoice.id, invoice);
        Ok(true)
    }

    async fn delete(&self, id: InvoiceId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.invoices.remove(&id) {
            Some(invoice) => {
                tables.references.remove(&invoice.reference);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn all(&self) -> Result<Vec<Invoice>> {
        let tables = self.tables.read().await;
        Ok(tables.invoices.values().cloned().collect())
    }
}
