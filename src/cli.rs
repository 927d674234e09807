use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Reconcile and aggregate sales CSV exports", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Aggregate quantity sold per (date, SKU) pair with reconciliation accounting
    Aggregate(AggregateArgs),
    /// Check that the required columns resolve after renaming, without producing output
    Verify(VerifyArgs),
}

#[derive(Debug, Args)]
pub struct AggregateArgs {
    /// Input sales CSV ('-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Grouped output CSV (stdout if omitted); comma-delimited UTF-8
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Destination CSV for excluded rows, written with the input delimiter and encoding
    #[arg(long = "excluded-output")]
    pub excluded_output: Option<PathBuf>,
    /// Destination JSON file for the reconciliation report
    #[arg(long = "report-output")]
    pub report_output: Option<PathBuf>,
    /// Keep otherwise-excluded rows as corrected (quantity 0, sentinel date)
    #[arg(long = "include-corrected")]
    pub include_corrected: bool,
    /// Recover missing sale dates from rows sharing the same order number
    #[arg(long = "recover-dates")]
    pub recover_dates: bool,
    /// Restrict the reconciliation report to one SKU (defaults to all)
    #[arg(long = "sku")]
    pub sku: Option<String>,
    /// Additional header renames of the form `Header=field`
    #[arg(long = "rename", action = clap::ArgAction::Append)]
    pub renames: Vec<String>,
    /// CSV delimiter character for reading input (defaults to ';')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Delimiter for the grouped export (defaults to ',')
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to latin-1)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// One or more sales CSV files to check
    #[arg(short = 'i', long = "input", required = true, action = clap::ArgAction::Append)]
    pub inputs: Vec<PathBuf>,
    /// Also require the order-number column used by date recovery
    #[arg(long = "recover-dates")]
    pub recover_dates: bool,
    /// Additional header renames of the form `Header=field`
    #[arg(long = "rename", action = clap::ArgAction::Append)]
    pub renames: Vec<String>,
    /// CSV delimiter character (defaults to ';')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to latin-1)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        ";" | "semicolon" => Ok(b';'),
        "|" | "pipe" => Ok(b'|'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
