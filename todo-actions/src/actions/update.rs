//! Replace a todo

use crate::error::Result;
use crate::params::Params;
use crate::request::{FromParams, UpdateTodo};
use crate::response::ActionResponse;
use crate::store::{Connector, DocumentStore};
use crate::todo::TodoDocument;

use super::{connect, finish, Action};

/// Overwrite the todo at the current revision
///
/// The revision is read right before the write; if another writer gets in
/// between, the store rejects the write and the caller sees a 409.
pub async fn handle<C: Connector>(connector: &C, request: UpdateTodo) -> Result<ActionResponse> {
    let db = connect(connector, &request.store).await?;

    let rev = db.rev(&request.id).await?;
    let doc = TodoDocument::new(request.title, request.completed, request.order)
        .at_revision(request.id.as_str(), rev);
    let written = db.put(&request.id, &doc).await?;
    tracing::info!(doc_id = %written.id, "Todo updated");

    ActionResponse::ok(&doc.to_todo(request.location.url()))
}

pub async fn run<C: Connector>(connector: &C, params: &Params) -> ActionResponse {
    let result = match UpdateTodo::from_params(params) {
        Ok(request) => handle(connector, request).await,
        Err(e) => Err(e),
    };
    finish(Action::Update, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{read, testing::*};
    use crate::store::{
        BulkResult, DocRevision, MemoryStore, StoreCall, StoreResult, StoreUrl,
    };
    use crate::todo::FALLBACK_TITLE;
    use axum::http::StatusCode;
    use serde_json::json;
    use std::time::Duration;

    fn update_params(id: &str, fields: serde_json::Value) -> Params {
        let mut p = params(json!({
            "cloudanturl": STORE_URL,
            "ibmcloudhost": HOST,
            "__ow_path": format!("/todos/{}", id)
        }));
        p.extend(params(fields));
        p
    }

    #[tokio::test]
    async fn test_update_then_read_returns_submitted_fields() {
        let (connector, store) = connector();
        let seeded = store.seed(TodoDocument::new("milk", false, 1)).await;
        let p = update_params(
            &seeded.id,
            json!({"title": "oat milk", "completed": true, "order": 7}),
        );

        let response = run(&connector, &p).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().unwrap()["title"], "oat milk");
        assert_eq!(
            store.calls().await,
            vec![
                StoreCall::Connect,
                StoreCall::Rev(seeded.id.clone()),
                StoreCall::Put(seeded.id.clone()),
            ]
        );

        let read = read::run(&connector, &p).await;
        assert_eq!(
            read.body().unwrap(),
            &json!({
                "title": "oat milk",
                "completed": true,
                "order": 7,
                "url": format!("{}/todos/{}", HOST, seeded.id)
            })
        );
    }

    #[tokio::test]
    async fn test_partial_update_resets_title() {
        let (connector, store) = connector();
        let seeded = store.seed(TodoDocument::new("milk", false, 5)).await;
        let p = update_params(&seeded.id, json!({"completed": true}));

        let response = run(&connector, &p).await;
        assert_eq!(response.status(), StatusCode::OK);

        let stored = store.document(&seeded.id).await.unwrap();
        assert_eq!(stored.title, FALLBACK_TITLE);
        assert!(stored.completed);
        assert_eq!(stored.order, Some(0));
    }

    #[tokio::test]
    async fn test_update_missing_document_is_500() {
        let (connector, store) = connector();
        let p = update_params("ghost", json!({"title": "x"}));

        let response = run(&connector, &p).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!store
            .calls()
            .await
            .contains(&StoreCall::Put("ghost".to_string())));
    }

    /// Store that lets another writer in between `rev` and `put`
    #[derive(Clone)]
    struct RacingStore(MemoryStore);

    impl DocumentStore for RacingStore {
        async fn create(&self, doc: &TodoDocument) -> StoreResult<DocRevision> {
            self.0.create(doc).await
        }

        async fn get(&self, id: &str) -> StoreResult<TodoDocument> {
            self.0.get(id).await
        }

        async fn rev(&self, id: &str) -> StoreResult<String> {
            let rev = self.0.rev(id).await?;
            let rival = TodoDocument::new("rival", false, 0).at_revision(id, rev.as_str());
            self.0.put(id, &rival).await?;
            Ok(rev)
        }

        async fn put(&self, id: &str, doc: &TodoDocument) -> StoreResult<DocRevision> {
            self.0.put(id, doc).await
        }

        async fn delete(&self, id: &str, rev: &str) -> StoreResult<DocRevision> {
            self.0.delete(id, rev).await
        }

        async fn all_docs(&self) -> StoreResult<Vec<TodoDocument>> {
            self.0.all_docs().await
        }

        async fn bulk_docs(&self, docs: &[TodoDocument]) -> StoreResult<Vec<BulkResult>> {
            self.0.bulk_docs(docs).await
        }
    }

    struct RacingConnector(MemoryStore);

    impl Connector for RacingConnector {
        type Store = RacingStore;

        async fn connect(&self, _url: &StoreUrl) -> StoreResult<RacingStore> {
            Ok(RacingStore(self.0.clone()))
        }

        fn bulk_write_delay(&self) -> Duration {
            Duration::ZERO
        }
    }

    #[tokio::test]
    async fn test_stale_revision_is_409() {
        let store = MemoryStore::new();
        let seeded = store.seed(TodoDocument::new("milk", false, 0)).await;
        let connector = RacingConnector(store.clone());
        let p = update_params(&seeded.id, json!({"title": "mine"}));

        let response = run(&connector, &p).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(response.body().unwrap().get("error").is_some());
        assert_eq!(store.document(&seeded.id).await.unwrap().title, "rival");
    }
}
