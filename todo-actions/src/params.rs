//! Invocation parameters
//!
//! Actions receive a loosely typed JSON object. The helpers here pull typed
//! values out of it; the per-action request structs in [`crate::request`] are
//! built on top of them.

use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::store::StoreUrl;

/// Parameter map handed to every action
pub type Params = Map<String, Value>;

/// Well-known parameter names
pub mod keys {
    /// Document store URL, credentials included
    pub const STORE_URL: &str = "cloudanturl";
    pub const TITLE: &str = "title";
    pub const COMPLETED: &str = "completed";
    pub const ORDER: &str = "order";
    /// Public host prefix for todo urls
    pub const HOST: &str = "ibmcloudhost";
    /// Request path below the action's mount point
    pub const PATH: &str = "__ow_path";
    pub const METHOD: &str = "__ow_method";
    /// Request headers, lower-cased names
    pub const HEADERS: &str = "__ow_headers";
}

const FORWARDED_HOST: &str = "x-forwarded-host";
const FORWARDED_PROTO: &str = "x-forwarded-proto";
const HOST_HEADER: &str = "host";

/// A string parameter; `null` counts as absent
pub fn optional_str<'a>(params: &'a Params, key: &'static str) -> Result<Option<&'a str>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(Error::invalid(
            key,
            format!("expected a string, got {}", type_name(other)),
        )),
    }
}

/// A string parameter that must be present and non-blank
pub fn required_str<'a>(params: &'a Params, key: &'static str) -> Result<&'a str> {
    match optional_str(params, key)? {
        Some(s) if !s.trim().is_empty() => Ok(s),
        Some(_) => Err(Error::invalid(key, "must not be empty")),
        None => Err(Error::MissingParameter(key)),
    }
}

/// An integer parameter
///
/// Fractional numbers are truncated; numeric strings are accepted since query
/// string values always arrive as strings. Values an `i64` cannot hold are
/// rejected rather than clamped.
pub fn optional_i64(params: &Params, key: &'static str) -> Result<Option<i64>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(Some(i)),
            (None, Some(f)) => truncate(key, f).map(Some),
            (None, None) => Err(Error::invalid(key, "number out of range")),
        },
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(Some(i));
            }
            let f = trimmed
                .parse::<f64>()
                .map_err(|_| Error::invalid(key, format!("'{}' is not a number", s)))?;
            truncate(key, f).map(Some)
        }
        Some(other) => Err(Error::invalid(
            key,
            format!("expected a number, got {}", type_name(other)),
        )),
    }
}

fn truncate(key: &'static str, f: f64) -> Result<i64> {
    // i64::MAX rounds up to 2^63 as an f64, so the upper bound is exclusive
    if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Ok(f as i64)
    } else {
        Err(Error::invalid(key, "number out of range"))
    }
}

/// A boolean parameter; `"true"`/`"false"` strings are accepted
pub fn optional_bool(params: &Params, key: &'static str) -> Result<Option<bool>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::String(s)) => match s.trim() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(Error::invalid(key, format!("'{}' is not a boolean", s))),
        },
        Some(other) => Err(Error::invalid(
            key,
            format!("expected a boolean, got {}", type_name(other)),
        )),
    }
}

/// The store URL, validated
pub fn store_url(params: &Params) -> Result<StoreUrl> {
    let raw = required_str(params, keys::STORE_URL)?;
    StoreUrl::parse(raw).map_err(|reason| Error::invalid(keys::STORE_URL, reason))
}

/// Id at the end of a request path, percent-decoded
pub fn id_from_path(path: &str) -> Result<String> {
    let raw = path
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::invalid(keys::PATH, "path does not end in an id"))?;
    percent_decode_str(raw)
        .decode_utf8()
        .map(|id| id.into_owned())
        .map_err(|_| Error::invalid(keys::PATH, format!("'{}' is not a valid id", raw)))
}

/// Public host prefix for todo urls
///
/// `ibmcloudhost` wins; otherwise the forwarded or plain `host` header is
/// used with the forwarded protocol (https when absent).
pub fn resolve_host(params: &Params) -> Result<String> {
    if let Some(host) = optional_str(params, keys::HOST)? {
        if !host.trim().is_empty() {
            return Ok(host.trim().trim_end_matches('/').to_string());
        }
    }

    let headers = match params.get(keys::HEADERS) {
        Some(Value::Object(headers)) => headers,
        _ => return Err(Error::MissingParameter(keys::HOST)),
    };
    let host = header(headers, FORWARDED_HOST)
        .or_else(|| header(headers, HOST_HEADER))
        .ok_or(Error::MissingParameter(keys::HOST))?;
    // first entry when proxies chained the header
    let host = host.split(',').next().unwrap_or(host).trim();
    let proto = header(headers, FORWARDED_PROTO)
        .and_then(|proto| proto.split(',').next())
        .map(str::trim)
        .unwrap_or("https");

    Ok(format!("{}://{}", proto, host.trim_end_matches('/')))
}

fn header<'a>(headers: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, value)| value.as_str())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
