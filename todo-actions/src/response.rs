//! Action responses
//!
//! An action answers with a status code, a fixed JSON content type and an
//! optional JSON body. [`ActionResponse::into_value`] renders the
//! `{statusCode, headers, body}` map a serverless platform expects;
//! the [`IntoResponse`] impl renders the same thing as a plain HTTP response
//! for the local server.
//!
//! - **200 OK** - todo or list of todos
//! - **204 No Content** - successful delete, no body
//! - **409 Conflict** - stale revision
//! - **500 Internal Server Error** - everything else, `{"error": ...}`

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{Error, ErrorResponse, Result};

/// Content type of every action response
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Response produced by an action
#[derive(Debug, Clone, PartialEq)]
pub struct ActionResponse {
    status: StatusCode,
    body: Option<Value>,
}

impl ActionResponse {
    /// 200 with `data` as the body
    ///
    /// Data serializing to `null` is sent as an empty array.
    pub fn ok<T: Serialize>(data: &T) -> Result<Self> {
        let body = match serde_json::to_value(data)? {
            Value::Null => Value::Array(Vec::new()),
            other => other,
        };
        Ok(Self {
            status: StatusCode::OK,
            body: Some(body),
        })
    }

    /// 204 without a body
    pub fn no_content() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            body: None,
        }
    }

    /// Error body with the status the error maps to
    pub fn from_error(err: &Error) -> Self {
        let body = ErrorResponse::from(err);
        Self {
            status: err.status_code(),
            body: Some(json!({ "error": body.error })),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Render as the `{statusCode, headers, body}` map
    pub fn into_value(self) -> Value {
        let mut value = json!({
            "statusCode": self.status.as_u16(),
            "headers": { "Content-Type": CONTENT_TYPE_JSON },
        });
        if let (Some(body), Value::Object(map)) = (self.body, &mut value) {
            map.insert("body".to_string(), body);
        }
        value
    }
}

impl IntoResponse for ActionResponse {
    fn into_response(self) -> Response {
        let mut response = match self.body {
            Some(body) => (self.status, Json(body)).into_response(),
            None => self.status.into_response(),
        };
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(CONTENT_TYPE_JSON),
        );
        response
    }
}
