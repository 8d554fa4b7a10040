fn main() {
    if let Err(err) = ftpvault::cli::run() {
        eprintln!("{:#}", err);
        std::process::exit(2);
    }
}
