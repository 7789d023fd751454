pub mod dispatch;
pub mod ledger;
pub mod services;
pub mod transaction;

mod config;
mod error;
mod logging;
mod runtime;

use std::io::Write;

pub use error::AppError;

pub fn run_api() -> Result<(), AppError> {
    logging::init()?;

    let config = config::AppConfig::from_env()?;

    tracing::info!(
        db_path = %config.db_path,
        http_bind = %config.http_bind,
        cors_allowed_origin = ?config.cors_allowed_origin,
        history_key_mode = ?config.history_key_mode,
        "application bootstrap initialized"
    );

    runtime::serve(config)
}

/// `ledger_invoke <function> [args...]`: prints the payload on stdout.
pub fn run_invoke() -> Result<(), AppError> {
    let cli_args: Vec<String> = std::env::args().skip(1).collect();
    let Some((function, args)) = cli_args.split_first() else {
        print_invoke_help();
        return Err(AppError::config("missing function name"));
    };
    if function == "--help" || function == "-h" {
        print_invoke_help();
        return Ok(());
    }

    logging::init()?;
    let config = config::AppConfig::from_env()?;

    let payload = runtime::invoke(&config, function, args)?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&payload)
        .and_then(|()| stdout.write_all(b"\n"))
        .map_err(AppError::runtime)
}

fn print_invoke_help() {
    println!("ledger_invoke");
    println!();
    println!("Usage:");
    println!("  ledger_invoke <function> [args...]");
    println!();
    println!("Functions:");
    for name in dispatch::Operation::names() {
        println!("  {name}");
    }
    println!();
    println!("Set LEDGER_API_URL to invoke a running ledger_api instead of LEDGER_DB_PATH.");
}
