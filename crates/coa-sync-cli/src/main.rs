fn main() -> anyhow::Result<()> {
    coa_sync_cli::run(std::env::args())
}
