fn main() -> anyhow::Result<()> {
    statpower_cli::run()
}
