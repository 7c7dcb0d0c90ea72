/// Display version information
pub fn execute() {
    println!("stakegov {}", env!("CARGO_PKG_VERSION"));
    println!("Operator CLI for the stakegov governance engine");
}
