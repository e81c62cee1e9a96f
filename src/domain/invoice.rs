use crate::error::LedgerError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use uuid::Uuid;

/// A monetary value stored on an invoice.
///
/// Stored figures are allowed to be negative so that a corrupted record can be
/// loaded and reported on instead of failing to deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(pub Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// `None` when the sum does not fit in a `Decimal`.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.normalize(), f)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// A strictly positive amount submitted with a payment.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct PaymentAmount(Decimal);

impl PaymentAmount {
    pub fn new(value: Decimal) -> Result<Self, LedgerError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(LedgerError::Validation(
                "Payment amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for PaymentAmount {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PaymentAmount> for Money {
    fn from(amount: PaymentAmount) -> Self {
        Self(amount.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub Uuid);

impl InvoiceId {
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceType {
    #[default]
    Standard,
    Commercial,
}

impl InvoiceType {
    /// Tax rate applied to the pre-tax amount. Only commercial invoices are taxed.
    pub fn tax_rate(&self, commercial_rate: Decimal) -> Decimal {
        match self {
            InvoiceType::Standard => Decimal::ZERO,
            InvoiceType::Commercial => commercial_rate,
        }
    }

    pub fn tax_for(&self, amount: Money, commercial_rate: Decimal) -> Money {
        Money(amount.0.saturating_mul(self.tax_rate(commercial_rate)))
    }
}

impl fmt::Display for InvoiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvoiceType::Standard => f.write_str("standard"),
            InvoiceType::Commercial => f.write_str("commercial"),
        }
    }
}

/// A single settlement applied to an invoice.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Payment {
    pub amount: Money,
    pub reference: String,
}

impl Payment {
    pub fn new(amount: Money, reference: impl Into<String>) -> Self {
        Self {
            amount,
            reference: reference.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum SettlementState {
    Unpaid,
    PartiallyPaid,
    Paid,
}

impl fmt::Display for SettlementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementState::Unpaid => f.write_str("unpaid"),
            SettlementState::PartiallyPaid => f.write_str("partially_paid"),
            SettlementState::Paid => f.write_str("paid"),
        }
    }
}

/// The billing unit.
///
/// `amount_paid` mirrors the sum of `payments`; the only code that changes
/// either is [`Invoice::record_payment`] and the update handler, which
/// recompute the figure from the payment list.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Invoice {
    pub id: InvoiceId,
    /// External correlation string payments are matched against.
    pub reference: String,
    /// Pre-tax billable total.
    pub amount: Money,
    pub tax_amount: Money,
    pub amount_paid: Money,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(rename = "type")]
    pub kind: InvoiceType,
}

impl Invoice {
    /// Creates an unpaid invoice, deriving the tax from its type.
    pub fn new(
        reference: impl Into<String>,
        amount: Money,
        kind: InvoiceType,
        commercial_rate: Decimal,
    ) -> Self {
        Self {
            id: InvoiceId::new_random(),
            reference: reference.into(),
            amount,
            tax_amount: kind.tax_for(amount, commercial_rate),
            amount_paid: Money::ZERO,
            payments: Vec::new(),
            kind,
        }
    }

    /// Amount plus tax, clamped to the `Decimal` range.
    pub fn total(&self) -> Money {
        self.amount.saturating_add(self.tax_amount)
    }

    /// Amount plus tax, or `None` if that does not fit in a `Decimal`.
    pub fn checked_total(&self) -> Option<Money> {
        self.amount.checked_add(self.tax_amount)
    }

    pub fn outstanding(&self) -> Money {
        Money(self.total().0.saturating_sub(self.amount_paid.0))
    }

    /// Sum of the recorded payments, clamped to the `Decimal` range.
    pub fn payments_sum(&self) -> Money {
        self.payments.iter().map(|p| &p.amount).sum()
    }

    pub fn checked_payments_sum(&self) -> Option<Money> {
        self.payments
            .iter()
            .try_fold(Money::ZERO, |acc, p| acc.checked_add(p.amount))
    }

    pub fn is_fully_paid(&self) -> bool {
        self.checked_total() == Some(self.amount_paid)
    }

    pub fn settlement_state(&self) -> SettlementState {
        if self.is_fully_paid() {
            SettlementState::Paid
        } else if self.amount_paid > Money::ZERO {
            SettlementState::PartiallyPaid
        } else {
            SettlementState::Unpaid
        }
    }

    /// Appends a payment and recomputes `amount_paid` from the payment list.
    pub fn record_payment(&mut self, amount: PaymentAmount, reference: impl Into<String>) {
        self.payments.push(Payment::new(amount.into(), reference));
        self.amount_paid = self.payments_sum();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_arithmetic() {
        let m1 = Money::new(dec!(10.0));
        let m2 = Money::new(dec!(5.0));
        assert_eq!(m1 + m2, Money::new(dec!(15.0)));
        assert_eq!(m1 - m2, Money::new(dec!(5.0)));
        assert!((m2 - m1).is_negative());
    }

    #[test]
    fn test_money_checked_add_overflow() {
        assert_eq!(
            Money::new(dec!(1)).checked_add(Money::new(dec!(2))),
            Some(Money::new(dec!(3)))
        );
        assert_eq!(Money::new(Decimal::MAX).checked_add(Money::new(dec!(1))), None);
        assert_eq!(
            Money::new(Decimal::MAX).saturating_add(Money::new(dec!(1))),
            Money::new(Decimal::MAX)
        );
    }

    #[test]
    fn test_totals_near_decimal_max_do_not_panic() {
        let mut invoice = Invoice::new(
            "INV-1",
            Money::new(Decimal::MAX),
            InvoiceType::Standard,
            dec!(0.1),
        );
        invoice.tax_amount = Money::new(dec!(10));
        invoice.payments = vec![
            Payment::new(Money::new(Decimal::MAX), "INV-1"),
            Payment::new(Money::new(dec!(1)), "INV-1"),
        ];

        assert_eq!(invoice.checked_total(), None);
        assert_eq!(invoice.total(), Money::new(Decimal::MAX));
        assert_eq!(invoice.checked_payments_sum(), None);
        assert_eq!(invoice.payments_sum(), Money::new(Decimal::MAX));
        assert!(!invoice.is_fully_paid());
    }

    #[test]
    fn test_commercial_tax_on_huge_amount_saturates() {
        let invoice = Invoice::new(
            "INV-1",
            Money::new(Decimal::MAX),
            InvoiceType::Commercial,
            dec!(2),
        );
        assert_eq!(invoice.tax_amount, Money::new(Decimal::MAX));
    }

    #[test]
    fn test_money_display_is_normalized() {
        assert_eq!(Money::new(dec!(220.00)).to_string(), "220");
        assert_eq!(Money::new(dec!(0.50)).to_string(), "0.5");
    }

    #[test]
    fn test_payment_amount_validation() {
        assert!(PaymentAmount::new(dec!(1.0)).is_ok());
        assert!(matches!(
            PaymentAmount::new(dec!(0.0)),
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            PaymentAmount::new(dec!(-1.0)),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn test_commercial_invoice_derives_tax() {
        let invoice = Invoice::new(
            "INV-1",
            Money::new(dec!(100)),
            InvoiceType::Commercial,
            dec!(0.1),
        );
        assert_eq!(invoice.tax_amount, Money::new(dec!(10)));
        assert_eq!(invoice.total(), Money::new(dec!(110)));
        assert_eq!(invoice.amount_paid, Money::ZERO);
        assert!(invoice.payments.is_empty());
    }

    #[test]
    fn test_standard_invoice_has_no_tax() {
        let invoice = Invoice::new(
            "INV-1",
            Money::new(dec!(100)),
            InvoiceType::Standard,
            dec!(0.1),
        );
        assert_eq!(invoice.tax_amount, Money::ZERO);
    }

    #[test]
    fn test_record_payment_recomputes_amount_paid() {
        let mut invoice = Invoice::new(
            "INV-1",
            Money::new(dec!(100)),
            InvoiceType::Standard,
            dec!(0.1),
        );
        invoice.record_payment(PaymentAmount::new(dec!(40)).unwrap(), "INV-1");
        invoice.record_payment(PaymentAmount::new(dec!(10.5)).unwrap(), "INV-1");

        assert_eq!(invoice.payments.len(), 2);
        assert_eq!(invoice.amount_paid, Money::new(dec!(50.5)));
        assert_eq!(invoice.outstanding(), Money::new(dec!(49.5)));
        assert_eq!(invoice.settlement_state(), SettlementState::PartiallyPaid);
    }

    #[test]
    fn test_settlement_state() {
        let mut invoice = Invoice::new(
            "INV-1",
            Money::new(dec!(20)),
            InvoiceType::Standard,
            dec!(0.1),
        );
        assert_eq!(invoice.settlement_state(), SettlementState::Unpaid);
        invoice.record_payment(PaymentAmount::new(dec!(20)).unwrap(), "INV-1");
        assert_eq!(invoice.settlement_state(), SettlementState::Paid);
    }

    #[test]
    fn test_invoice_json_uses_type_key() {
        let invoice = Invoice::new(
            "INV-1",
            Money::new(dec!(100)),
            InvoiceType::Commercial,
            dec!(0.1),
        );
        let json = serde_json::to_value(&invoice).unwrap();
        assert_eq!(json["type"], "commercial");

        let back: Invoice = serde_json::from_value(json).unwrap();
        assert_eq!(back, invoice);
    }
}
