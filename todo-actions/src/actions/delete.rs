//! Delete one todo

use crate::error::Result;
use crate::params::Params;
use crate::request::{DeleteTodo, FromParams};
use crate::response::ActionResponse;
use crate::store::{Connector, DocumentStore};

use super::{connect, finish, Action};

/// Delete the todo at its current revision; answers 204 without a body
pub async fn handle<C: Connector>(connector: &C, request: DeleteTodo) -> Result<ActionResponse> {
    let db = connect(connector, &request.store).await?;

    let rev = db.rev(&request.id).await?;
    db.delete(&request.id, &rev).await?;
    tracing::info!(doc_id = %request.id, "Todo deleted");

    Ok(ActionResponse::no_content())
}

pub async fn run<C: Connector>(connector: &C, params: &Params) -> ActionResponse {
    let result = match DeleteTodo::from_params(params) {
        Ok(request) => handle(connector, request).await,
        Err(e) => Err(e),
    };
    finish(Action::Delete, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::testing::*;
    use crate::store::{StoreCall, StoreOperation};
    use crate::todo::TodoDocument;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_delete_is_204_without_body() {
        let (connector, store) = connector();
        let seeded = store.seed(TodoDocument::new("milk", false, 0)).await;
        let p = params(json!({
            "cloudanturl": STORE_URL,
            "__ow_path": format!("/todos/{}", seeded.id)
        }));

        let response = run(&connector, &p).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.body().is_none());
        assert!(store.is_deleted(&seeded.id).await);
        assert_eq!(
            store.calls().await,
            vec![
                StoreCall::Connect,
                StoreCall::Rev(seeded.id.clone()),
                StoreCall::Delete(seeded.id.clone()),
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_twice_fails_second_time() {
        let (connector, store) = connector();
        let seeded = store.seed(TodoDocument::new("milk", false, 0)).await;
        let p = params(json!({
            "cloudanturl": STORE_URL,
            "__ow_path": format!("/todos/{}", seeded.id)
        }));

        assert_eq!(run(&connector, &p).await.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            run(&connector, &p).await.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_delete_failure_is_500() {
        let (connector, store) = connector();
        let seeded = store.seed(TodoDocument::new("milk", false, 0)).await;
        store.fail_on(StoreOperation::Delete).await;
        let p = params(json!({
            "cloudanturl": STORE_URL,
            "__ow_path": format!("/todos/{}", seeded.id)
        }));

        let response = run(&connector, &p).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(store.document(&seeded.id).await.is_some());
    }
}
