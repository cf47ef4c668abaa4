//! Local server for the todo actions
//!
//! Serves the actions over plain HTTP. The store URL and public host can be
//! bound through configuration (`TODO_STORE__URL`, `TODO_STORE__PUBLIC_HOST`)
//! or passed per request as `cloudanturl` / `ibmcloudhost`.

use anyhow::Context;
use todo_actions::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    init_tracing(&config).context("failed to initialize tracing")?;

    if config.store.url.is_none() {
        tracing::warn!("No store url bound; every request must carry 'cloudanturl'");
    }

    let connector = CouchConnector::new(config.store.clone());
    let app = router(AppState::from_config(connector, &config));

    Server::new(config).serve(app).await?;

    Ok(())
}
