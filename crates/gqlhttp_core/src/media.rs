//! Media types spoken by the GraphQL-over-HTTP binding.

use std::fmt;

/// `application/json`
pub const APPLICATION_JSON: &str = "application/json";

/// `application/graphql-response+json`
pub const APPLICATION_GRAPHQL_RESPONSE_JSON: &str = "application/graphql-response+json";

/// `text/html`
pub const TEXT_HTML: &str = "text/html";

/// `text/html; charset=UTF-8`
pub const TEXT_HTML_CONTENT_TYPE: &str = "text/html; charset=UTF-8";

/// The only charset accepted in request bodies and emitted in responses.
pub const CHARSET: &str = "UTF-8";

/// `Accept` header sent by clients built with this crate.
pub const ACCEPT: &str = "application/graphql-response+json, application/json";

/// A response media type the server can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// `application/json`, the legacy type. Request errors are reported with `200`.
    ApplicationJson,
    /// `application/graphql-response+json`. Request errors are reported with `4xx`.
    ApplicationGraphQlResponseJson,
}

impl MediaType {
    /// Media types in server preference order.
    pub const SUPPORTED: [MediaType; 2] = [
        MediaType::ApplicationGraphQlResponseJson,
        MediaType::ApplicationJson,
    ];

    /// Returns the essence (`type/subtype`) of the media type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ApplicationJson => APPLICATION_JSON,
            Self::ApplicationGraphQlResponseJson => APPLICATION_GRAPHQL_RESPONSE_JSON,
        }
    }

    /// Returns the `Content-Type` header value, charset included.
    pub const fn content_type(&self) -> &'static str {
        match self {
            Self::ApplicationJson => "application/json; charset=UTF-8",
            Self::ApplicationGraphQlResponseJson => {
                "application/graphql-response+json; charset=UTF-8"
            }
        }
    }

    /// Looks up a supported media type by essence, ignoring ASCII case.
    pub fn from_essence(essence: &str) -> Option<Self> {
        Self::SUPPORTED
            .into_iter()
            .find(|media| media.as_str().eq_ignore_ascii_case(essence))
    }

    /// Status used for request errors (parse or validation failures).
    pub const fn request_error_status(&self) -> http::StatusCode {
        match self {
            Self::ApplicationJson => http::StatusCode::OK,
            Self::ApplicationGraphQlResponseJson => http::StatusCode::BAD_REQUEST,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
