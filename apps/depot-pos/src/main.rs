//! # Depot POS Entry Point
//!
//! Opens the store database and runs a maintenance command. The interactive
//! surface lives behind the transport that calls [`depot_pos::commands`].
//!
//! ## Usage
//! ```bash
//! depot-pos                       # status: store, database, counts
//! depot-pos cierre                # today's closing report as JSON
//! depot-pos cierre 2024-05-01     # one business day
//! depot-pos cierre 2024-05-01 2024-05-31
//! depot-pos cierre all            # every entry ever recorded
//! ```

use std::process::ExitCode;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::error;

use depot_pos::commands::invoice::list_invoices;
use depot_pos::commands::ledger::{summarize_ledger, SummarizeLedgerRequest};
use depot_pos::error::ApiError;
use depot_pos::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Status {
    store_name: String,
    database_ok: bool,
    products: i64,
    recent_invoices: usize,
}

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::validation(format!("invalid date '{}', expected YYYY-MM-DD", raw)))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ApiError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::internal(format!("could not encode output: {}", e)))?;
    println!("{}", json);
    Ok(())
}

async fn status(state: &AppState) -> Result<(), ApiError> {
    let status = Status {
        store_name: state.config.store_name.clone(),
        database_ok: state.db.health_check().await,
        products: state.db.products().count().await?,
        recent_invoices: list_invoices(state, Some(10)).await?.len(),
    };
    print_json(&status)
}

async fn cierre(state: &AppState, args: &[String]) -> Result<(), ApiError> {
    let request = if args.first().map(String::as_str) == Some("all") {
        SummarizeLedgerRequest {
            all: true,
            ..SummarizeLedgerRequest::default()
        }
    } else {
        SummarizeLedgerRequest {
            from: args.first().map(|s| parse_date(s)).transpose()?,
            to: args.get(1).map(|s| parse_date(s)).transpose()?,
            kind: None,
            all: false,
        }
    };
    let report = summarize_ledger(state, &request).await?;
    print_json(&report)
}

async fn run(args: Vec<String>) -> Result<(), ApiError> {
    if matches!(args.first().map(String::as_str), Some("--help") | Some("-h")) {
        println!("Usage: depot-pos [status | cierre [FROM] [TO] | cierre all]");
        return Ok(());
    }

    let state = depot_pos::startup().await?;

    let result = match args.first().map(String::as_str) {
        None | Some("status") => status(&state).await,
        Some("cierre") => cierre(&state, &args[1..]).await,
        Some(other) => Err(ApiError::validation(format!("unknown command '{}'", other))),
    };

    state.db.close().await;
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    depot_pos::init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(code = ?err.code, "{}", err.message);
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
