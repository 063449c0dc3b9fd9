use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use invoice_recon_lib::commands::{self, RunOptions};
use invoice_recon_lib::config::{self, DEFAULT_TOLERANCE};
use invoice_recon_lib::{AzureConfig, AzureInvoiceClient, ColumnBinding, ColumnMapping, Reconciliation, Tolerance};
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(name = "invoice-recon", version, about = "Reconcile a scanned invoice against its Excel sheet")]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compare the PDF invoice with the Excel sheet and export the report
    Run {
        #[arg(long)]
        pdf: PathBuf,
        #[arg(long)]
        excel: PathBuf,
        /// Maximum amount difference still counted as a match (0-50)
        #[arg(long, default_value_t = DEFAULT_TOLERANCE, value_parser = parse_tolerance)]
        tolerance: f64,
        /// Report path; defaults to a timestamped file in Downloads
        #[arg(long)]
        out: Option<PathBuf>,
        /// Print results only, do not write a report
        #[arg(long, conflicts_with = "out")]
        no_export: bool,
        /// Material code column: 0-based index or header text
        #[arg(long, default_value = "0")]
        code_column: ColumnBinding,
        #[arg(long, default_value = "4")]
        qty_column: ColumnBinding,
        #[arg(long, default_value = "10")]
        tax_column: ColumnBinding,
        #[arg(long, default_value = "11")]
        total_column: ColumnBinding,
    },
    /// Report whether AZURE_ENDPOINT and AZURE_KEY are configured
    Status,
}

fn parse_tolerance(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if !(0.0..=50.0).contains(&v) {
        return Err(format!("tolerance must be between 0 and 50, got {}", v));
    }
    Ok(v)
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn print_report(recon: &Reconciliation) {
    println!("Overall Accuracy: {}", recon.accuracy_label());
    println!();
    println!("Grand Totals Validation");
    println!("{:<16} {:>14} {:>14} {:>14}  {}", "Metric", "PDF Data", "Excel (Sum)", "Difference", "Status");
    for agg in recon.aggregates.rows() {
        println!(
            "{:<16} {:>14.2} {:>14.2} {:>14.2}  {}",
            agg.metric.to_string(),
            agg.from_document,
            agg.from_spreadsheet,
            agg.difference,
            agg.status
        );
    }
    println!();
    println!("Item-wise Comparison (tolerance {:.2})", recon.tolerance);
    println!("{:<20} {:>14} {:>14}  {}", "Material Code", "Total_PDF", "Total_EXCEL", "Status");
    for row in &recon.rows {
        println!(
            "{:<20} {:>14.2} {:>14.2}  {}",
            row.code, row.from_document, row.from_spreadsheet, row.status
        );
    }
}

fn run(cli: Cli) -> invoice_recon_lib::Result<()> {
    match cli.command {
        Command::Status => {
            println!("{}", config::credentials_status());
            Ok(())
        }
        Command::Run {
            pdf,
            excel,
            tolerance,
            out,
            no_export,
            code_column,
            qty_column,
            tax_column,
            total_column,
        } => {
            let azure = AzureConfig::from_env()?;
            let client = AzureInvoiceClient::new(azure)?;
            let options = RunOptions {
                pdf,
                excel,
                tolerance: Tolerance::new(tolerance)?,
                mapping: ColumnMapping {
                    code: code_column,
                    quantity: qty_column,
                    tax: tax_column,
                    total: total_column,
                },
            };
            let outcome = commands::run_reconciliation(&client, &options)?;
            print_report(&outcome.reconciliation);
            if !no_export {
                let path = invoice_recon_lib::export_report(&outcome.reconciliation, out.as_deref())?;
                println!();
                println!("Report saved to {}", path.display());
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
