//! Build script to track include_str! dependencies.
//! This ensures cargo rebuilds when the bundled demo data changes.

fn main() {
    println!("cargo:rerun-if-changed=demo/tickets.json");
}
