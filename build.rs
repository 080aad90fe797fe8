fn main() {
    // Rebuild when the lexer grammar changes
    println!("cargo:rerun-if-changed=src/lexer.pest");
}
