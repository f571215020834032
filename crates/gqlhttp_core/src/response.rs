//! GraphQL response envelope.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A location in the GraphQL document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

/// A GraphQL error as it appears in `errors`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

impl GraphQlError {
    /// Creates an error carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: None,
            extensions: None,
        }
    }
}

impl From<&crate::ProtocolError> for GraphQlError {
    fn from(error: &crate::ProtocolError) -> Self {
        Self::new(error.message.clone())
    }
}

/// The outcome of a GraphQL request.
///
/// Serialized as `{errors?, extensions?, data?}`. A `data` of `Some(Value::Null)`
/// is written as `"data":null`, `None` omits the key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<GraphQlError>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub data: Option<Value>,
}

impl GraphQlResponse {
    /// Creates a response holding only errors.
    pub fn from_errors(errors: Vec<GraphQlError>) -> Self {
        Self {
            errors: Some(errors),
            ..Default::default()
        }
    }

    /// Creates a response holding a single error message.
    pub fn from_message(message: impl Into<String>) -> Self {
        Self::from_errors(vec![GraphQlError::new(message)])
    }

    /// Returns true if the response carries a `data` entry, even a null one.
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// Returns the errors, empty when there are none.
    pub fn errors(&self) -> &[GraphQlError] {
        self.errors.as_deref().unwrap_or_default()
    }
}

// Keeps `"data": null` distinct from an absent key.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}
