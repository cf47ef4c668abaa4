//! List every todo

use crate::error::Result;
use crate::params::Params;
use crate::request::{FromParams, ListTodos};
use crate::response::ActionResponse;
use crate::store::{Connector, DocumentStore};
use crate::todo::Todo;

use super::{connect, finish, Action};

/// Fetch all todos; an empty collection is an empty array
pub async fn handle<C: Connector>(connector: &C, request: ListTodos) -> Result<ActionResponse> {
    let db = connect(connector, &request.store).await?;
    let docs = db.all_docs().await?;

    let todos: Vec<Todo> = docs
        .iter()
        .map(|doc| {
            let id = doc.id.as_deref().unwrap_or_default();
            doc.to_todo(request.location.member_url(id))
        })
        .collect();
    tracing::debug!(count = todos.len(), "Listed todos");

    ActionResponse::ok(&todos)
}

pub async fn run<C: Connector>(connector: &C, params: &Params) -> ActionResponse {
    let result = match ListTodos::from_params(params) {
        Ok(request) => handle(connector, request).await,
        Err(e) => Err(e),
    };
    finish(Action::ReadAll, result)
}
