use crate::domain::invoice::InvoiceType;
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    Create,
    Pay,
}

/// One row of a replay file.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct LedgerCommand {
    pub command: CommandType,
    #[serde(default)]
    pub reference: String,
    pub amount: Decimal,
    /// Only meaningful for `create`; standard when omitted.
    #[serde(rename = "type", default)]
    pub kind: Option<InvoiceType>,
}

/// Reads ledger commands from a CSV source.
///
/// Wraps `csv::Reader`, trims whitespace and accepts rows with the trailing
/// `type` column left out.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a new `CommandReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads and deserializes commands, one `Result` per row.
    pub fn commands(self) -> impl Iterator<Item = Result<LedgerCommand>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }
}
