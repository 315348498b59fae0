use anyhow::Context;
use dispense_server::{Config, Server, print_banner, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. .env + logging
    setup_environment();

    print_banner();
    tracing::info!("Dispense server starting...");

    // 2. Configuration
    let config = Config::from_env();

    // 3. Open storage, load seeds, serve
    Server::new(config)
        .run()
        .await
        .context("dispense server terminated with an error")?;

    Ok(())
}
