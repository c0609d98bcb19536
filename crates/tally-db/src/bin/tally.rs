//! # Tally CLI
//!
//! Runs the engine over JSON records and prints the result as JSON.
//!
//! ## Usage
//! ```bash
//! # Totals, VAT buckets and change for a transaction
//! cargo run -p tally-db --bin tally -- calc sale.json
//!
//! # Print-ready document (display discounts, size/colour table)
//! cargo run -p tally-db --bin tally -- document sale.json
//!
//! # Legacy-ERP events for a transaction or a closed EOS record
//! cargo run -p tally-db --bin tally -- events eos.json
//!
//! # Store a transaction in the configured database
//! cargo run -p tally-db --bin tally -- record sale.json --config ./tally.toml
//!
//! # Complete a shift
//! cargo run -p tally-db --bin tally -- close-shift <eos-id>
//! ```
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); stdout only carries JSON.

use chrono::Utc;
use serde::Serialize;
use std::env;
use std::path::PathBuf;
use tally_core::types::{EosRecord, Transaction};
use tally_core::{display, engine, erp};
use tally_db::{Database, DbError, EosService, TallyConfig, TransactionService};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Calc,
    Document,
    Events,
    Record,
    CloseShift,
}

impl Command {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "calc" => Some(Command::Calc),
            "document" => Some(Command::Document),
            "events" => Some(Command::Events),
            "record" => Some(Command::Record),
            "close-shift" => Some(Command::CloseShift),
            _ => None,
        }
    }
}

fn print_help() {
    println!("Tally - POS transaction and shift settlement engine");
    println!();
    println!("Usage: tally <COMMAND> <ARG> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  calc <FILE>          Compute totals for a transaction JSON file");
    println!("  document <FILE>      Compute display values for printing");
    println!("  events <FILE>        Legacy-ERP events for a transaction or EOS record");
    println!("  record <FILE>        Calculate and store a transaction");
    println!("  close-shift <ID>     Settle and complete a stored EOS record");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>  Config file (default: ./tally.toml)");
    println!("  -h, --help           Show this help message");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut positional: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    return Err("--config needs a path".into());
                }
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    let (command, arg) = match positional.as_slice() {
        [name, arg] => match Command::parse(name) {
            Some(command) => (command, arg.clone()),
            None => {
                print_help();
                return Err(format!("unknown command '{name}'").into());
            }
        },
        _ => {
            print_help();
            return Err("expected a command and one argument".into());
        }
    };

    init_tracing();

    let config = TallyConfig::load(config_path)?;
    let settings = config.engine_settings();
    debug!(tenant = config.tenant_id(), ?command, "Configuration loaded");

    match command {
        Command::Calc => {
            let tx: Transaction = read_json(&arg)?;
            print_json(&engine::calculated(tx, &settings))?;
        }
        Command::Document => {
            let tx: Transaction = read_json(&arg)?;
            print_json(&display::reconcile(engine::calculated(tx, &settings)))?;
        }
        Command::Events => {
            let value: serde_json::Value = read_json(&arg)?;
            let events = if value.get("cycleID").is_some() {
                let record: EosRecord = serde_json::from_value(value)?;
                erp::eos_events(&record)
            } else {
                let tx: Transaction = serde_json::from_value(value)?;
                erp::transaction_events(&engine::calculated(tx, &settings))
            };
            print_json(&events)?;
        }
        Command::Record => {
            let tx: Transaction = read_json(&arg)?;
            let db = Database::new(config.db_config()).await?;
            let service = TransactionService::new(&db, config.tenant_id(), settings);
            let stored = service.record(tx).await;
            db.close().await;
            print_json(&stored?)?;
        }
        Command::CloseShift => {
            let db = Database::new(config.db_config()).await?;
            let service = EosService::new(&db, config.tenant_id());
            let closed = service.close(&arg, Utc::now()).await;
            db.close().await;
            print_json(&closed?)?;
        }
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, DbError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| DbError::Internal(format!("cannot read {path}: {e}")))?;
    Ok(serde_json::from_str(&contents)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), DbError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
