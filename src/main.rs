fn main() {
    if let Err(err) = sheet_entry::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
