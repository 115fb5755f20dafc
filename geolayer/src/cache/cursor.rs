//! Pagination cursor state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque server-issued token marking where the next page begins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageToken(Value);

impl PageToken {
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Load progress of a paginated resource.
///
/// The server uses one `nextPageStart` field for both "more pages follow" and
/// "done"; this type keeps the two apart and adds the never-fetched state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PageCursor {
    /// No page has been fetched yet.
    #[default]
    NotStarted,
    /// More data is available starting at this token.
    Next(PageToken),
    /// The server reported no further pages.
    Exhausted,
}

impl PageCursor {
    /// Interpret a `nextPageStart` value from a response.
    ///
    /// Null, missing, `false`, `0` and the empty string all mean the server
    /// has nothing more to send.
    pub fn from_server(value: Option<Value>) -> Self {
        match value {
            None | Some(Value::Null) | Some(Value::Bool(false)) => PageCursor::Exhausted,
            Some(Value::String(s)) if s.is_empty() => PageCursor::Exhausted,
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => PageCursor::Exhausted,
            Some(other) => PageCursor::Next(PageToken(other)),
        }
    }

    /// Token to send with the next request, if any.
    pub fn token(&self) -> Option<&PageToken> {
        match self {
            PageCursor::Next(token) => Some(token),
            _ => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, PageCursor::Exhausted)
    }

    pub fn has_more(&self) -> bool {
        !self.is_exhausted()
    }
}
