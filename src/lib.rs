pub mod aggregate;
pub mod classify;
pub mod cli;
pub mod data;
pub mod error;
pub mod io_utils;
pub mod pipeline;
pub mod process;
pub mod recover;
pub mod report;
pub mod schema;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::cli::{Cli, Commands, VerifyArgs};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("sales_recon", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Aggregate(args) => process::execute(&args),
        Commands::Verify(args) => handle_verify(&args),
    }
}

fn handle_verify(args: &VerifyArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(
        args.input_encoding.as_deref(),
        io_utils::default_input_encoding(),
    )?;
    let renames = schema::RenameTable::with_overrides(&args.renames)?;
    for input in &args.inputs {
        let delimiter = args.delimiter.unwrap_or(io_utils::DEFAULT_INPUT_DELIMITER);
        let mut reader = io_utils::open_csv_reader_from_path(input, delimiter)?;
        let headers = io_utils::reader_headers(&mut reader, encoding)
            .with_context(|| format!("Reading headers from {input:?}"))?;
        schema::resolve_fields(&headers, &renames, args.recover_dates)
            .with_context(|| format!("Validating headers for {input:?}"))?;
        info!("✓ {input:?} resolves the required sales columns");
    }
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
