#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rcond_agent::run().await
}
