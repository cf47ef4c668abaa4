//! Todo representations
//!
//! [`Todo`] is what callers see; [`TodoDocument`] is what the store persists.
//! The two are never interchangeable: the url only exists on the way out, and
//! the id/revision/deleted fields are managed by the store.

use serde::{Deserialize, Serialize};

/// Title written by Update when the request does not carry one
pub const FALLBACK_TITLE: &str = "Foo";

/// Todo as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub title: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    pub url: String,
}

/// Todo as persisted in the `todos` collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Concurrency token; opaque to this crate
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,

    #[serde(rename = "_deleted", default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub completed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl TodoDocument {
    /// A fresh document with no id or revision yet
    pub fn new(title: impl Into<String>, completed: bool, order: i64) -> Self {
        Self {
            title: title.into(),
            completed,
            order: Some(order),
            ..Self::default()
        }
    }

    /// Pin the document to an id and the revision it replaces
    #[must_use]
    pub fn at_revision(mut self, id: impl Into<String>, rev: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self.rev = Some(rev.into());
        self
    }

    /// Build the external representation with the given resource url
    pub fn to_todo(&self, url: impl Into<String>) -> Todo {
        Todo {
            title: self.title.clone(),
            completed: self.completed,
            order: self.order,
            url: url.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_document_has_no_system_fields() {
        let doc = TodoDocument::new("milk", false, 3);
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            value,
            json!({"title": "milk", "completed": false, "order": 3})
        );
    }

    #[test]
    fn test_deleted_flag_serialized_only_when_set() {
        let mut doc = TodoDocument::new("milk", true, 0).at_revision("a1", "2-x");
        doc.deleted = true;
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["_id"], "a1");
        assert_eq!(value["_rev"], "2-x");
        assert_eq!(value["_deleted"], true);
    }

    #[test]
    fn test_document_tolerates_missing_fields() {
        let doc: TodoDocument =
            serde_json::from_value(json!({"_id": "a1", "_rev": "1-a", "title": "eggs"})).unwrap();
        assert_eq!(doc.title, "eggs");
        assert!(!doc.completed);
        assert_eq!(doc.order, None);
        assert!(!doc.deleted);
    }

    #[test]
    fn test_to_todo_omits_missing_order() {
        let doc: TodoDocument = serde_json::from_value(json!({"title": "eggs"})).unwrap();
        let value = serde_json::to_value(doc.to_todo("https://h/todos/a1")).unwrap();
        assert_eq!(
            value,
            json!({"title": "eggs", "completed": false, "url": "https://h/todos/a1"})
        );
    }
}
