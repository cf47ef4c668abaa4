//! # todo-actions
//!
//! Serverless CRUD actions for a todo collection kept in a CouchDB-compatible
//! document database such as Cloudant.
//!
//! Six independent actions (`create`, `read`, `read-all`, `update`, `delete`,
//! `delete-all`) each take a JSON parameter map and answer with a
//! `{statusCode, headers, body}` response. Each one opens its own store
//! connection through an explicit [`store::Connector`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use todo_actions::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Load configuration
//!     let config = Config::load()?;
//!
//!     // Initialize tracing
//!     init_tracing(&config)?;
//!
//!     // Serve the actions locally
//!     let connector = CouchConnector::new(config.store.clone());
//!     let app = router(AppState::from_config(connector, &config));
//!     Server::new(config).serve(app).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod config;
pub mod error;
pub mod observability;
pub mod params;
pub mod request;
pub mod response;
pub mod server;
pub mod store;
pub mod todo;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::actions::{Action, UnknownAction};
    pub use crate::config::{Config, ServiceConfig, StoreConfig};
    pub use crate::error::{Error, ErrorResponse, Result};
    pub use crate::observability::init_tracing;
    pub use crate::params::{keys, Params};
    pub use crate::request::{
        CreateTodo, DeleteAllTodos, DeleteTodo, FromParams, ListTodos, ReadTodo, ResourceLocation,
        UpdateTodo,
    };
    pub use crate::response::ActionResponse;
    pub use crate::server::{router, AppState, Server};
    pub use crate::store::{
        Connector, CouchConnector, DocumentStore, StoreError, StoreErrorKind, StoreOperation,
        StoreUrl,
    };
    #[cfg(any(test, feature = "testing"))]
    pub use crate::store::{MemoryConnector, MemoryStore};
    pub use crate::todo::{Todo, TodoDocument};
}
