fn main() {
    if let Err(err) = sales_recon::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
