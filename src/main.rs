fn main() {
    if let Err(err) = metering_csv::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
