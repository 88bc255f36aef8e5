use std::sync::Arc;

use masterygate_core::{GradePublisher, TracingGradePublisher};
use masterygate_server::{AppState, ServerConfig, init_tracing, load_block_config, run};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    info!("starting {}", masterygate_core::version());

    let block = load_block_config()?;
    let config = ServerConfig::from_env()?;
    let publisher: Arc<dyn GradePublisher> = Arc::new(TracingGradePublisher);

    run(config, AppState::new(block, publisher)).await
}
