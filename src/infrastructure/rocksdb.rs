use crate::domain::invoice::{Invoice, InvoiceId};
use crate::domain::ports::InvoiceRepository;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;

/// Column Family for invoice snapshots, keyed by id.
pub const CF_INVOICES: &str = "invoices";
/// Column Family mapping a reference to the id of its invoice.
pub const CF_REFERENCES: &str = "references";

impl From<rocksdb::Error> for LedgerError {
    fn from(err: rocksdb::Error) -> Self {
        LedgerError::Storage(err.into_string())
    }
}

/// A persistent invoice repository using RocksDB.
///
/// Snapshots are stored as JSON. Writes that touch both column families go
/// through a single `WriteBatch` so the reference index never drifts from
/// the invoices it points at.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbInvoiceRepository {
    db: Arc<DB>,
}

impl RocksDbInvoiceRepository {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_invoices = ColumnFamilyDescriptor::new(CF_INVOICES, Options::default());
        let cf_references = ColumnFamilyDescriptor::new(CF_REFERENCES, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_invoices, cf_references])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            LedgerError::Internal(Box::new(std::io::Error::other(format!(
                "{} column family not found",
                name
            ))))
        })
    }

    fn read_invoice(&self, key: &[u8]) -> Result<Option<Invoice>> {
        let cf = self.cf(CF_INVOICES)?;
        match self.db.get_pinned_cf(cf, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl InvoiceRepository for RocksDbInvoiceRepository {
    async fn get_by_id(&self, id: InvoiceId) -> Result<Option<Invoice>> {
        self.read_invoice(id.0.as_bytes())
    }

    async fn get_by_reference(&self, reference: &str) -> Result<Option<Invoice>> {
        let cf = self.cf(CF_REFERENCES)?;
        match self.db.get_pinned_cf(cf, reference.as_bytes())? {
            Some(id) => self.read_invoice(&id),
            None => Ok(None),
        }
    }

    async fn create(&self, invoice: Invoice) -> Result<()> {
        let invoices = self.cf(CF_INVOICES)?;
        let references = self.cf(CF_REFERENCES)?;

        if self
            .db
            .get_pinned_cf(references, invoice.reference.as_bytes())?
            .is_some()
        {
            return Err(LedgerError::Validation(format!(
                "Reference {} is already in use",
                invoice.reference
            )));
        }

        let mut batch = WriteBatch::default();
        batch.put_cf(invoices, invoice.id.0.as_bytes(), serde_json::to_vec(&invoice)?);
        batch.put_cf(references, invoice.reference.as_bytes(), invoice.id.0.as_bytes());
        self.db.write(batch)?;
        Ok(())
    }

    async fn update(&self, invoice: Invoice) -> Result<bool> {
        let Some(previous) = self.read_invoice(invoice.id.0.as_bytes())? else {
            return Ok(false);
        };
        let invoices = self.cf(CF_INVOICES)?;
        let references = self.cf(CF_REFERENCES)?;

        let mut batch = WriteBatch::default();
        if previous.reference != invoice.reference {
            batch.delete_cf(references, previous.reference.as_bytes());
            batch.put_cf(references, invoice.reference.as_bytes(), invoice.id.0.as_bytes());
        }
        batch.put_cf(invoices, invoice.id.0.as_bytes(), serde_json::to_vec(&invoice)?);
        self.db.write(batch)?;
        Ok(true)
    }

    async fn delete(&self, id: InvoiceId) -> Result<bool> {
        let Some(previous) = self.read_invoice(id.0.as_bytes())? else {
            return Ok(false);
        };
        let invoices = self.cf(CF_INVOICES)?;
        let references = self.cf(CF_REFERENCES)?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(invoices, id.0.as_bytes());
        batch.delete_cf(references, previous.reference.as_bytes());
        self.db.write(batch)?;
        Ok(true)
    }

    async fn all(&self) -> Result<Vec<Invoice>> {
        let cf = self.cf(CF_INVOICES)?;
        let mut invoices = Vec::new();

        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            invoices.push(serde_json::from_slice(&value)?);
        }

        Ok(invoices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::invoice::{InvoiceType, Money, PaymentAmount};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let repo = RocksDbInvoiceRepository::open(dir.path()).expect("Failed to open RocksDB");

        assert!(repo.db.cf_handle(CF_INVOICES).is_some());
        assert!(repo.db.cf_handle(CF_REFERENCES).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_invoice_round_trip() {
        let dir = tempdir().unwrap();
        let repo = RocksDbInvoiceRepository::open(dir.path()).unwrap();

        let mut invoice = Invoice::new(
            "INV-1",
            Money::new(dec!(200)),
            InvoiceType::Commercial,
            dec!(0.1),
        );
        repo.create(invoice.clone()).await.unwrap();

        invoice.record_payment(PaymentAmount::new(dec!(20)).unwrap(), "INV-1");
        assert!(repo.update(invoice.clone()).await.unwrap());

        let by_ref = repo.get_by_reference("INV-1").await.unwrap().unwrap();
        assert_eq!(by_ref, invoice);
        assert_eq!(repo.all().await.unwrap(), vec![invoice.clone()]);

        assert!(repo.delete(invoice.id).await.unwrap());
        assert!(repo.get_by_reference("INV-1").await.unwrap().is_none());
        assert!(repo.get_by_id(invoice.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rocksdb_survives_reopen() {
        let dir = tempdir().unwrap();
        let invoice = Invoice::new(
            "INV-1",
            Money::new(dec!(50)),
            InvoiceType::Standard,
            dec!(0.1),
        );
        {
            let repo = RocksDbInvoiceRepository::open(dir.path()).unwrap();
            repo.create(invoice.clone()).await.unwrap();
        }

        let repo = RocksDbInvoiceRepository::open(dir.path()).unwrap();
        assert_eq!(repo.get_by_id(invoice.id).await.unwrap(), Some(invoice));
    }
}
