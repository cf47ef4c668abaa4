//! Delete every todo in one batch

use crate::error::Result;
use crate::params::Params;
use crate::request::{DeleteAllTodos, FromParams};
use crate::response::ActionResponse;
use crate::store::{Connector, DocumentStore};

use super::{connect, finish, Action};

/// Mark every document deleted and write them back in a single bulk call
///
/// The connector's bulk-write delay is slept before the write. Documents the
/// store refuses inside the batch are only logged.
pub async fn handle<C: Connector>(
    connector: &C,
    request: DeleteAllTodos,
) -> Result<ActionResponse> {
    let db = connect(connector, &request.store).await?;

    let mut docs = db.all_docs().await?;
    for doc in &mut docs {
        doc.deleted = true;
    }

    let delay = connector.bulk_write_delay();
    tracing::debug!(count = docs.len(), delay_ms = delay.as_millis() as u64, "Waiting before bulk delete");
    tokio::time::sleep(delay).await;

    let results = db.bulk_docs(&docs).await?;
    let failed = results.iter().filter(|result| !result.is_ok()).count();
    if failed > 0 {
        tracing::warn!(failed, total = docs.len(), "Some todos were not deleted");
    } else {
        tracing::info!(count = docs.len(), "All todos deleted");
    }

    Ok(ActionResponse::no_content())
}

pub async fn run<C: Connector>(connector: &C, params: &Params) -> ActionResponse {
    let result = match DeleteAllTodos::from_params(params) {
        Ok(request) => handle(connector, request).await,
        Err(e) => Err(e),
    };
    finish(Action::DeleteAll, result)
}
