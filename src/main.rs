fn main() {
    if let Err(err) = causette::cli::main() {
        eprintln!("❌ Error: {err}");
        std::process::exit(1);
    }
}
