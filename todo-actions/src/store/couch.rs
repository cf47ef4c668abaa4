//! CouchDB HTTP API client
//!
//! Talks to any CouchDB-compatible server (Apache CouchDB, IBM Cloudant).
//! Credentials embedded in the store URL are moved into a basic auth header so
//! they never appear in request URLs, logs or error messages.

use std::time::Duration;

use percent_encoding::percent_decode_str;
use reqwest::{header, Client, Method, RequestBuilder, Response, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{
    BulkResult, Connector, DocRevision, DocumentStore, StoreError, StoreOperation, StoreResult,
    StoreUrl,
};
use crate::config::StoreConfig;
use crate::todo::TodoDocument;

const DESIGN_PREFIX: &str = "_design/";

/// Connector for CouchDB-compatible stores
#[derive(Debug, Clone)]
pub struct CouchConnector {
    config: StoreConfig,
}

impl CouchConnector {
    /// Create a connector using the given store options
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }
}

impl Connector for CouchConnector {
    type Store = CouchDatabase;

    async fn connect(&self, url: &StoreUrl) -> StoreResult<CouchDatabase> {
        let db = CouchDatabase::open(url, &self.config.database, self.config.timeout())?;
        db.ensure_exists().await?;
        tracing::debug!(store = %url, database = %self.config.database, "Connected to document store");
        Ok(db)
    }

    fn bulk_write_delay(&self) -> Duration {
        self.config.bulk_write_delay()
    }
}

/// Handle on one CouchDB database
#[derive(Debug, Clone)]
pub struct CouchDatabase {
    client: Client,
    db_url: Url,
    credentials: Option<(String, Option<String>)>,
    name: String,
}

#[derive(Debug, Deserialize)]
struct CouchFailure {
    error: String,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct AllDocs {
    rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
struct AllDocsRow {
    id: String,
    #[serde(default)]
    doc: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct BulkDocsRequest<'a> {
    docs: &'a [TodoDocument],
}

impl CouchDatabase {
    /// Build a handle for `database` on the server at `url` without touching the network
    pub fn open(url: &StoreUrl, database: &str, timeout: Duration) -> StoreResult<Self> {
        let mut db_url = url.as_url().clone();

        let credentials = if db_url.username().is_empty() {
            None
        } else {
            Some((
                decode_userinfo(db_url.username())?,
                db_url.password().map(decode_userinfo).transpose()?,
            ))
        };
        db_url
            .set_username("")
            .and_then(|_| db_url.set_password(None))
            .map_err(|_| StoreError::connection_failed("store url does not accept credentials"))?;
        db_url.set_query(None);
        db_url.set_fragment(None);
        db_url
            .path_segments_mut()
            .map_err(|_| StoreError::connection_failed("store url cannot be a base url"))?
            .pop_if_empty()
            .push(database);

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::from_transport(StoreOperation::Connect, e))?;

        Ok(Self {
            client,
            db_url,
            credentials,
            name: database.to_string(),
        })
    }

    /// Database name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Database URL, credentials stripped
    pub fn url(&self) -> &Url {
        &self.db_url
    }

    fn doc_url(&self, id: &str) -> Url {
        let mut url = self.db_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(id);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(header::ACCEPT, "application/json");
        match &self.credentials {
            Some((user, password)) => builder.basic_auth(user, password.as_ref()),
            None => builder,
        }
    }

    async fn send(&self, operation: StoreOperation, builder: RequestBuilder) -> StoreResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| StoreError::from_transport(operation, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // HEAD responses and proxies in front of the store may not send a JSON body
        let reason = match response.json::<CouchFailure>().await {
            Ok(failure) if failure.reason.is_empty() => failure.error,
            Ok(failure) => format!("{}: {}", failure.error, failure.reason),
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
        };
        Err(StoreError::from_status(operation, status, reason))
    }

    async fn decode<T: DeserializeOwned>(operation: StoreOperation, response: Response) -> StoreResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::serialization_error(operation, e.to_string()))
    }

    /// Fail unless the database exists and the credentials are accepted
    pub async fn ensure_exists(&self) -> StoreResult<()> {
        let builder = self.request(Method::GET, self.db_url.clone());
        match self.send(StoreOperation::Connect, builder).await {
            Ok(_) => Ok(()),
            Err(mut e) => {
                e.message = format!("database '{}': {}", self.name, e.message);
                Err(e)
            }
        }
    }
}

/// Url userinfo arrives percent-encoded; basic auth wants the raw value
fn decode_userinfo(raw: &str) -> StoreResult<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| StoreError::connection_failed("store credentials are not valid UTF-8"))
}

impl DocumentStore for CouchDatabase {
    async fn create(&self, doc: &TodoDocument) -> StoreResult<DocRevision> {
        let builder = self.request(Method::POST, self.db_url.clone()).json(doc);
        let response = self.send(StoreOperation::Create, builder).await?;
        Self::decode(StoreOperation::Create, response).await
    }

    async fn get(&self, id: &str) -> StoreResult<TodoDocument> {
        let builder = self.request(Method::GET, self.doc_url(id));
        let response = self
            .send(StoreOperation::Get, builder)
            .await
            .map_err(|e| e.with_doc(id))?;
        Self::decode(StoreOperation::Get, response)
            .await
            .map_err(|e| e.with_doc(id))
    }

    async fn rev(&self, id: &str) -> StoreResult<String> {
        let builder = self.request(Method::HEAD, self.doc_url(id));
        let response = self
            .send(StoreOperation::Rev, builder)
            .await
            .map_err(|e| e.with_doc(id))?;

        response
            .headers()
            .get(header::ETAG)
            .and_then(|value| value.to_str().ok())
            .map(|etag| etag.trim_matches('"').to_string())
            .filter(|rev| !rev.is_empty())
            .ok_or_else(|| {
                StoreError::database_error(StoreOperation::Rev, "response carried no ETag")
                    .with_doc(id)
            })
    }

    async fn put(&self, id: &str, doc: &TodoDocument) -> StoreResult<DocRevision> {
        let builder = self.request(Method::PUT, self.doc_url(id)).json(doc);
        let response = self
            .send(StoreOperation::Put, builder)
            .await
            .map_err(|e| e.with_doc(id))?;
        Self::decode(StoreOperation::Put, response)
            .await
            .map_err(|e| e.with_doc(id))
    }

    async fn delete(&self, id: &str, rev: &str) -> StoreResult<DocRevision> {
        let mut url = self.doc_url(id);
        url.query_pairs_mut().append_pair("rev", rev);
        let builder = self.request(Method::DELETE, url);
        let response = self
            .send(StoreOperation::Delete, builder)
            .await
            .map_err(|e| e.with_doc(id))?;
        Self::decode(StoreOperation::Delete, response)
            .await
            .map_err(|e| e.with_doc(id))
    }

    async fn all_docs(&self) -> StoreResult<Vec<TodoDocument>> {
        let mut url = self.doc_url("_all_docs");
        url.query_pairs_mut().append_pair("include_docs", "true");
        let builder = self.request(Method::GET, url);
        let response = self.send(StoreOperation::AllDocs, builder).await?;
        let listing: AllDocs = Self::decode(StoreOperation::AllDocs, response).await?;

        listing
            .rows
            .into_iter()
            .filter(|row| !row.id.starts_with(DESIGN_PREFIX))
            .filter_map(|row| row.doc.map(|doc| (row.id, doc)))
            .map(|(id, doc)| {
                serde_json::from_value(doc).map_err(|e| {
                    StoreError::serialization_error(StoreOperation::AllDocs, e.to_string())
                        .with_doc(id)
                })
            })
            .collect()
    }

    async fn bulk_docs(&self, docs: &[TodoDocument]) -> StoreResult<Vec<BulkResult>> {
        let builder = self
            .request(Method::POST, self.doc_url("_bulk_docs"))
            .json(&BulkDocsRequest { docs });
        let response = self.send(StoreOperation::BulkDocs, builder).await?;
        Self::decode(StoreOperation::BulkDocs, response).await
    }
}
