fn main() {
    if let Err(e) = utxo_dust_analyser::cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
