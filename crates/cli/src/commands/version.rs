pub fn run() {
    println!("querydesk {}", env!("CARGO_PKG_VERSION"));
}
