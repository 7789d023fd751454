fn main() {
    if let Err(err) = event_ledger::app::run_api() {
        eprintln!("api startup failed: {err}");
        std::process::exit(1);
    }
}
