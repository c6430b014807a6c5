fn main() {
    if let Err(err) = mindmap_rs::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
