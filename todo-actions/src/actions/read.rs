//! Read one todo

use crate::error::Result;
use crate::params::Params;
use crate::request::{FromParams, ReadTodo};
use crate::response::ActionResponse;
use crate::store::{Connector, DocumentStore};

use super::{connect, finish, Action};

/// Fetch the todo named by the request path
///
/// A missing document is reported as a plain failure.
pub async fn handle<C: Connector>(connector: &C, request: ReadTodo) -> Result<ActionResponse> {
    let db = connect(connector, &request.store).await?;
    let doc = db.get(&request.id).await?;
    ActionResponse::ok(&doc.to_todo(request.location.url()))
}

pub async fn run<C: Connector>(connector: &C, params: &Params) -> ActionResponse {
    let result = match ReadTodo::from_params(params) {
        Ok(request) => handle(connector, request).await,
        Err(e) => Err(e),
    };
    finish(Action::Read, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::testing::*;
    use crate::todo::TodoDocument;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_read_returns_todo_with_request_url() {
        let (connector, store) = connector();
        let seeded = store.seed(TodoDocument::new("milk", true, 2)).await;
        let path = format!("/todos/{}", seeded.id);
        let p = params(json!({
            "cloudanturl": STORE_URL,
            "ibmcloudhost": HOST,
            "__ow_path": &path
        }));

        let response = run(&connector, &p).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.body().unwrap(),
            &json!({
                "title": "milk",
                "completed": true,
                "order": 2,
                "url": format!("{}{}", HOST, path)
            })
        );
    }

    #[tokio::test]
    async fn test_read_missing_document_is_500() {
        let (connector, _store) = connector();
        let p = params(json!({
            "cloudanturl": STORE_URL,
            "ibmcloudhost": HOST,
            "__ow_path": "/todos/nope"
        }));

        let response = run(&connector, &p).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.body().unwrap()["error"]
            .as_str()
            .unwrap()
            .contains("nope"));
    }

    #[tokio::test]
    async fn test_read_requires_path() {
        let (connector, store) = connector();
        let p = params(json!({"cloudanturl": STORE_URL, "ibmcloudhost": HOST}));

        let response = run(&connector, &p).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(store.calls().await.is_empty());
    }
}
