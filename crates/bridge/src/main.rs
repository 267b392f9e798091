//! Attention Pipeline - Bridge Entry Point

use anyhow::Context;
use bridge::{init_logging, run_bridge, Bridge, BridgeConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== Argus Attention Pipeline v{} ===", env!("CARGO_PKG_VERSION"));

    let config_file = std::env::args().nth(1);
    let config = BridgeConfig::load(config_file.as_deref()).context("loading configuration")?;

    let (bridge, events) = Bridge::from_config(&config).context("initializing pipeline")?;

    run_bridge(bridge, events).await
}
