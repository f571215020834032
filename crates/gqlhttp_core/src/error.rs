//! Protocol errors raised before a request reaches GraphQL execution.
//!
//! Every error carries the HTTP status the response should use unless the
//! caller decides otherwise, and a message that is sent to the client verbatim.

use http::StatusCode;
use std::fmt;
use thiserror::Error;

use crate::media::{APPLICATION_GRAPHQL_RESPONSE_JSON, APPLICATION_JSON};

/// Kind of a protocol error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolErrorKind {
    /// A required URL parameter is missing.
    MissingParameter,
    /// The request body is required but empty.
    MissingBody,
    /// A required header is missing.
    MissingHeader,
    /// A URL parameter is malformed.
    InvalidParameter,
    /// The HTTP method is neither `GET` nor `POST`.
    InvalidHttpMethod,
    /// A header is malformed or unsupported.
    InvalidHeader,
    /// The request body is malformed.
    InvalidBody,
}

impl ProtocolErrorKind {
    /// Returns the string representation of the kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MissingParameter => "MISSING_PARAMETER",
            Self::MissingBody => "MISSING_BODY",
            Self::MissingHeader => "MISSING_HEADER",
            Self::InvalidParameter => "INVALID_PARAMETER",
            Self::InvalidHttpMethod => "INVALID_HTTP_METHOD",
            Self::InvalidHeader => "INVALID_HEADER",
            Self::InvalidBody => "INVALID_BODY",
        }
    }
}

impl fmt::Display for ProtocolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transport level error. Terminal for the request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ProtocolError {
    /// Kind of the error.
    pub kind: ProtocolErrorKind,
    /// Message surfaced in `errors[].message`.
    pub message: String,
    /// Status to respond with.
    pub status_hint: StatusCode,
}

impl ProtocolError {
    /// Creates a new protocol error.
    pub fn new(kind: ProtocolErrorKind, message: impl Into<String>, status_hint: StatusCode) -> Self {
        Self {
            kind,
            message: message.into(),
            status_hint,
        }
    }

    /// `GET` request without a `query` parameter.
    pub fn missing_query_parameter() -> Self {
        Self::new(
            ProtocolErrorKind::MissingParameter,
            r#"The parameter is required. "query""#,
            StatusCode::BAD_REQUEST,
        )
    }

    /// URL parameter that is not valid JSON.
    pub fn invalid_json_parameter(name: &str) -> Self {
        Self::new(
            ProtocolErrorKind::InvalidParameter,
            format!(r#"The parameter is invalid. "{name}" are invalid JSON."#),
            StatusCode::BAD_REQUEST,
        )
    }

    /// URL parameter that is valid JSON but not an object.
    pub fn non_object_parameter(name: &str) -> Self {
        Self::new(
            ProtocolErrorKind::InvalidParameter,
            format!(r#"The parameter is invalid. "{name}" must be JSON object format"#),
            StatusCode::BAD_REQUEST,
        )
    }

    /// `POST` request without `Content-Type`.
    pub fn missing_content_type() -> Self {
        Self::new(
            ProtocolErrorKind::MissingHeader,
            r#"The header is required. "Content-Type""#,
            StatusCode::BAD_REQUEST,
        )
    }

    /// `Content-Type` with a charset other than UTF-8.
    pub fn unsupported_charset() -> Self {
        Self::new(
            ProtocolErrorKind::InvalidHeader,
            r#"The header is invalid. Supported media type charset is "UTF-8"."#,
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
        )
    }

    /// `Content-Type` naming a media type the server cannot read.
    pub fn unsupported_media_type() -> Self {
        Self::new(
            ProtocolErrorKind::InvalidHeader,
            format!(
                r#"The header is invalid. "Content-Type" must be "{APPLICATION_JSON}" or "{APPLICATION_GRAPHQL_RESPONSE_JSON}""#
            ),
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
        )
    }

    /// `Accept` header that excludes every supported media type.
    pub fn not_acceptable() -> Self {
        Self::new(
            ProtocolErrorKind::InvalidHeader,
            format!(
                r#"The header is invalid. "Accept" must include "{APPLICATION_GRAPHQL_RESPONSE_JSON}" or "{APPLICATION_JSON}""#
            ),
            StatusCode::NOT_ACCEPTABLE,
        )
    }

    /// Method other than `GET` and `POST`.
    pub fn invalid_http_method() -> Self {
        Self::new(
            ProtocolErrorKind::InvalidHttpMethod,
            "Invalid HTTP method. GraphQL only supports GET and POST requests.",
            StatusCode::METHOD_NOT_ALLOWED,
        )
    }

    /// Raw GraphQL body that is empty, with no `query` URL fallback either.
    pub fn missing_body() -> Self {
        Self::new(
            ProtocolErrorKind::MissingBody,
            r#"The message body is required. "GraphQL query""#,
            StatusCode::BAD_REQUEST,
        )
    }

    /// Body error with a custom message.
    pub fn invalid_body(message: impl Into<String>) -> Self {
        Self::new(ProtocolErrorKind::InvalidBody, message, StatusCode::BAD_REQUEST)
    }

    /// Body that is not valid JSON.
    pub fn invalid_json_body() -> Self {
        Self::invalid_body("The message body is invalid. Invalid JSON format.")
    }

    /// Returns true if the error rejects the HTTP method itself.
    pub fn is_method_not_allowed(&self) -> bool {
        self.kind == ProtocolErrorKind::InvalidHttpMethod
    }
}

/// Type alias for protocol results.
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;
