use crate::error::{LedgerError, Result};
use clap::ValueEnum;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// How a payment against an invoice whose amount plus tax is zero is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ZeroValuePolicy {
    /// Report "No payment needed." alongside the settled-invoice message.
    #[default]
    NoPaymentNeeded,
    /// Treat the invoice as settled and report only that.
    TreatAsSettled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerConfig {
    /// Rate applied to the amount of commercial invoices.
    pub commercial_tax_rate: Decimal,
    pub zero_value_policy: ZeroValuePolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            commercial_tax_rate: dec!(0.1),
            zero_value_policy: ZeroValuePolicy::default(),
        }
    }
}

impl LedgerConfig {
    pub fn with_zero_value_policy(mut self, policy: ZeroValuePolicy) -> Self {
        self.zero_value_policy = policy;
        self
    }

    /// Sets the commercial tax rate. A negative rate would derive a negative
    /// tax amount and is rejected.
    pub fn with_commercial_tax_rate(mut self, rate: Decimal) -> Result<Self> {
        self.commercial_tax_rate = parse_tax_rate(rate)?;
        Ok(self)
    }
}

pub fn parse_tax_rate(rate: Decimal) -> Result<Decimal> {
    if rate < Decimal::ZERO {
        return Err(LedgerError::Validation(format!(
            "Tax rate must not be negative, got {}",
            rate
        )));
    }
    Ok(rate)
}
