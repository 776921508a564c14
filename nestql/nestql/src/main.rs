#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    nestql::cli::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("nestql was built without the `cli` feature");
    std::process::exit(2);
}
