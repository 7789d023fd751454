use std::path::Path;
use std::sync::{Arc, Mutex};

use event_ledger::adapters::db::{count_states, open_connection, run_migrations, schema_version};
use event_ledger::app::dispatch::Dispatcher;
use event_ledger::app::ledger::EventLedgerService;
use event_ledger::app::services::SqliteLedgerStore;
use event_ledger::domain::timestamp::SystemClock;

const SEED_EVENTS: &[[&str; 5]] = &[
    ["Hallway Lamp", "dev-lamp", "home", "on", "2020-01-02T03:04:05"],
    ["Front Door", "dev-door", "home", "closed", "2020-01-02T03:05:00"],
    ["Hallway Lamp", "dev-lamp", "home", "off", "2020-01-02T23:10:00"],
];

fn main() {
    if let Err(error) = run() {
        eprintln!("failed to create ledger db: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut path = "./data/ledger_test.db".to_string();
    let mut force = false;
    let mut seed = false;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--path" => {
                let Some(value) = args.get(index + 1) else {
                    return Err("--path requires a value".to_string());
                };
                path = value.clone();
                index += 2;
            }
            "--force" => {
                force = true;
                index += 1;
            }
            "--seed" => {
                seed = true;
                index += 1;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => {
                return Err(format!("unknown argument: {other}"));
            }
        }
    }

    let path_ref = Path::new(&path);
    if let Some(parent) = path_ref.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(|error| format!("failed to create parent directory: {error}"))?;
    }

    if force && path_ref.exists() {
        std::fs::remove_file(path_ref)
            .map_err(|error| format!("failed to remove existing db file: {error}"))?;
    }

    let mut connection = open_connection(&path).map_err(|error| error.to_string())?;
    run_migrations(&mut connection).map_err(|error| error.to_string())?;
    let version = schema_version(&connection).map_err(|error| error.to_string())?;

    let connection = Arc::new(Mutex::new(connection));
    if seed {
        seed_ledger(SqliteLedgerStore::new(Arc::clone(&connection)))?;
    }

    let states = {
        let connection = connection
            .lock()
            .map_err(|_| "database lock poisoned".to_string())?;
        count_states(&connection).map_err(|error| error.to_string())?
    };

    println!("created/updated ledger db at: {path}");
    println!("schema version: {version}");
    println!("stored keys: {states}");
    Ok(())
}

fn seed_ledger(store: SqliteLedgerStore) -> Result<(), String> {
    let dispatcher = Dispatcher::new(store, SystemClock, EventLedgerService::default());

    for event in SEED_EVENTS {
        let args: Vec<String> = event.iter().map(ToString::to_string).collect();
        dispatcher
            .invoke("saveNewEvent", &args)
            .map_err(|error| error.to_string())?;
    }

    let device_list = ["home", "dev-lamp,dev-door", "Hallway Lamp,Front Door"]
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    dispatcher
        .invoke("saveDevice", &device_list)
        .map_err(|error| error.to_string())?;

    Ok(())
}

fn print_help() {
    println!("create_test_db");
    println!();
    println!("Usage:");
    println!("  cargo run --bin create_test_db -- [--path <file>] [--force] [--seed]");
    println!();
    println!("Options:");
    println!("  --path <file>   target sqlite file (default: ./data/ledger_test.db)");
    println!("  --force         delete existing file before creating");
    println!("  --seed          store a few sample events and a device list");
}
