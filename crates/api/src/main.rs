use anyhow::Context;

use stockroom_infra::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockroom_observability::init();

    let config = AppConfig::from_env().context("failed to load configuration")?;

    stockroom_api::server::run(config).await
}
