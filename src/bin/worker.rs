#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = invigilation_api::run_worker().await {
        eprintln!("invigilation-worker fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
