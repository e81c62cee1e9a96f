use clap::Parser;
use invoice_ledger::application::invoices::InvoiceService;
use invoice_ledger::application::payments::{PaymentProcessor, PaymentRequest};
use invoice_ledger::config::{LedgerConfig, ZeroValuePolicy, parse_tax_rate};
use invoice_ledger::domain::ports::InvoiceRepositoryRef;
use invoice_ledger::infrastructure::in_memory::InMemoryInvoiceRepository;
use invoice_ledger::interfaces::csv::command_reader::{CommandReader, CommandType, LedgerCommand};
use invoice_ledger::interfaces::csv::invoice_writer::InvoiceWriter;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input commands CSV file (columns: command, reference, amount, type)
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Tax rate applied to commercial invoices.
    #[arg(long, default_value = "0.1", value_parser = tax_rate_arg, allow_negative_numbers = true)]
    tax_rate: Decimal,

    /// How payments against invoices worth nothing are reported.
    #[arg(long, value_enum, default_value_t = ZeroValuePolicy::NoPaymentNeeded)]
    zero_value_policy: ZeroValuePolicy,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = LedgerConfig::default()
        .with_commercial_tax_rate(cli.tax_rate)
        .into_diagnostic()?
        .with_zero_value_policy(cli.zero_value_policy);

    let repository = open_repository(cli.db_path)?;
    let invoices = InvoiceService::new(repository.clone(), config.clone());
    let payments = PaymentProcessor::new(repository.clone(), config);

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let file = File::open(cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    for (line, command) in reader.commands().enumerate() {
        match command {
            Ok(command) => run_command(&invoices, &payments, command, &shutdown).await,
            Err(e) => tracing::error!(row = line + 1, "Error reading command: {}", e),
        }
        if shutdown.is_cancelled() {
            tracing::warn!("Interrupted, writing the invoices processed so far");
            break;
        }
    }

    let report = repository.all().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = InvoiceWriter::new(stdout.lock());
    writer.write_invoices(report).into_diagnostic()?;

    Ok(())
}

fn tax_rate_arg(value: &str) -> std::result::Result<Decimal, String> {
    let rate: Decimal = value.parse().map_err(|e: rust_decimal::Error| e.to_string())?;
    parse_tax_rate(rate).map_err(|e| e.to_string())
}

async fn run_command(
    invoices: &InvoiceService,
    payments: &PaymentProcessor,
    command: LedgerCommand,
    cancel: &CancellationToken,
) {
    let reference = command.reference.clone();
    let (success, summary) = match command.command {
        CommandType::Create => {
            let kind = command.kind.unwrap_or_default();
            let outcome = invoices
                .create(&command.reference, command.amount, kind, cancel)
                .await;
            (outcome.is_success(), outcome.summary())
        }
        CommandType::Pay => {
            let request = PaymentRequest::new(command.reference, command.amount);
            let outcome = payments.apply_payment(request, cancel).await;
            (outcome.is_success(), outcome.summary())
        }
    };

    if success {
        tracing::info!(reference = %reference, "{}", summary);
    } else {
        tracing::warn!(reference = %reference, "Command failed: {}", summary);
    }
}

#[cfg(feature = "storage-rocksdb")]
fn open_repository(db_path: Option<PathBuf>) -> Result<InvoiceRepositoryRef> {
    use invoice_ledger::infrastructure::rocksdb::RocksDbInvoiceRepository;

    match db_path {
        Some(path) => {
            let repository = RocksDbInvoiceRepository::open(path).into_diagnostic()?;
            Ok(Arc::new(repository))
        }
        None => Ok(Arc::new(InMemoryInvoiceRepository::new())),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_repository(db_path: Option<PathBuf>) -> Result<InvoiceRepositoryRef> {
    if db_path.is_some() {
        tracing::warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(Arc::new(InMemoryInvoiceRepository::new()))
}
