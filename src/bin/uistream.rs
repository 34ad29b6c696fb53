fn main() {
    if let Err(e) = uistream::cli::run() {
        eprintln!("uistream: {}", e);
        std::process::exit(1);
    }
}
