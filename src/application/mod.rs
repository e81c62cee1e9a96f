//! Application layer containing the orchestration of invoice use cases.
//!
//! `PaymentProcessor` applies payments; `InvoiceService` covers the rest of
//! an invoice's lifecycle. Both talk to storage only through the
//! `InvoiceRepository` port and report every result as an `Outcome`.

pub mod invoices;
pub mod payments;
