use crate::domain::invoice::Invoice;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct InvoiceRow {
    reference: String,
    #[serde(rename = "type")]
    kind: String,
    amount: String,
    tax_amount: String,
    amount_paid: String,
    payments: usize,
    status: String,
}

impl From<&Invoice> for InvoiceRow {
    fn from(invoice: &Invoice) -> Self {
        Self {
            reference: invoice.reference.clone(),
            kind: invoice.kind.to_string(),
            amount: invoice.amount.to_string(),
            tax_amount: invoice.tax_amount.to_string(),
            amount_paid: invoice.amount_paid.to_string(),
            payments: invoice.payments.len(),
            status: invoice.settlement_state().to_string(),
        }
    }
}

/// Writes the final invoice report as CSV, one row per invoice sorted by
/// reference.
pub struct InvoiceWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> InvoiceWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_invoices(&mut self, mut invoices: Vec<Invoice>) -> Result<()> {
        invoices.sort_by(|a, b| a.reference.cmp(&b.reference));
        if invoices.is_empty() {
            self.writer.write_record([
                "reference",
                "type",
                "amount",
                "tax_amount",
                "amount_paid",
                "payments",
                "status",
            ])?;
        }
        for invoice in &invoices {
            self.writer.serialize(InvoiceRow::from(invoice))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::invoice::{InvoiceType, Money, PaymentAmount};
    use rust_decimal_macros::dec;

    #[test]
    fn test_writer_output() {
        let mut b = Invoice::new("B", Money::new(dec!(200)), InvoiceType::Commercial, dec!(0.1));
        b.record_payment(PaymentAmount::new(dec!(100)).unwrap(), "B");
        let a = Invoice::new("A", Money::new(dec!(10.50)), InvoiceType::Standard, dec!(0.1));

        let mut out = Vec::new();
        InvoiceWriter::new(&mut out).write_invoices(vec![b, a]).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "reference,type,amount,tax_amount,amount_paid,payments,status",
                "A,standard,10.5,0,0,0,unpaid",
                "B,commercial,200,20,100,1,partially_paid",
            ]
        );
    }

    #[test]
    fn test_writer_header_without_invoices() {
        let mut out = Vec::new();
        InvoiceWriter::new(&mut out).write_invoices(Vec::new()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap().trim_end(),
            "reference,type,amount,tax_amount,amount_paid,payments,status"
        );
    }
}
