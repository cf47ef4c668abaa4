//! Create a todo

use crate::error::Result;
use crate::params::Params;
use crate::request::{CreateTodo, FromParams};
use crate::response::ActionResponse;
use crate::store::{Connector, DocumentStore};
use crate::todo::TodoDocument;

use super::{connect, finish, Action};

/// Store a new, uncompleted todo and echo it with its url
pub async fn handle<C: Connector>(connector: &C, request: CreateTodo) -> Result<ActionResponse> {
    let db = connect(connector, &request.store).await?;

    let doc = TodoDocument::new(request.title, false, request.order);
    let created = db.create(&doc).await?;
    tracing::info!(doc_id = %created.id, "Todo created");

    ActionResponse::ok(&doc.to_todo(request.location.member_url(&created.id)))
}

pub async fn run<C: Connector>(connector: &C, params: &Params) -> ActionResponse {
    let result = match CreateTodo::from_params(params) {
        Ok(request) => handle(connector, request).await,
        Err(e) => Err(e),
    };
    finish(Action::Create, result)
}
