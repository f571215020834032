//! Errors of the client helpers and the server.

use std::io;

use gqlhttp_core::GraphQlError;
use http::StatusCode;
use thiserror::Error;

/// Error building a GraphQL request.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to serialize request body: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to build request: {0}")]
    Http(#[from] http::Error),
}

/// Error reading a GraphQL response.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error(r#""Content-Type" header is required"#)]
    MissingContentType,

    #[error(r#"Valid "Content-Type" is application/graphql-response+json or application/json, got "{0}""#)]
    InvalidContentType(String),

    #[error("Invalid JSON response: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Non-2xx response carrying GraphQL errors.
    #[error("GraphQL request error has occurred")]
    GraphQl {
        status: StatusCode,
        errors: Vec<GraphQlError>,
    },

    /// Non-2xx response without GraphQL errors.
    #[error("Unknown error has occurred")]
    Unknown(StatusCode),
}

impl ResolveError {
    /// Returns the GraphQL errors of a failed response, empty for other errors.
    pub fn graphql_errors(&self) -> &[GraphQlError] {
        match self {
            Self::GraphQl { errors, .. } => errors,
            _ => &[],
        }
    }
}

/// Error sending a GraphQL request and reading its response.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Error running the HTTP server.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to accept connection: {0}")]
    Accept(#[source] io::Error),
}
