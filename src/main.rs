use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    rolecast::run().await
}
