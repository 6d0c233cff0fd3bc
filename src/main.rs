#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = invigilation_api::run().await {
        eprintln!("invigilation-api fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
