use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A todo item, as stored and as carried in `{"data": ...}`.
///
/// `id` and `created_at` are assigned by the server; values sent by clients
/// are ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,
}

impl Todo {
    pub fn new(text: impl Into<String>) -> Self {
        Self { id: None, text: text.into(), completed: false, created_at: None }
    }
}
