#[tokio::main]
async fn main() -> anyhow::Result<()> {
    relic_scanner_lib::run().await
}
