fn main() {
    if let Err(err) = event_ledger::app::run_invoke() {
        eprintln!("invoke failed: {err}");
        std::process::exit(1);
    }
}
