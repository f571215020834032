//! Request validation: method, content negotiation, then parameter extraction.

use std::fmt::Display;

use gqlhttp_core::{GraphQlParameters, MediaType, ProtocolError};
use http::request::Parts;
use http::Method;
use http_body::Body;

use crate::extract::extract;
use crate::negotiate::negotiate;

/// A request rejected before GraphQL execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Media type to render the error with.
    pub media_type: MediaType,
    pub error: ProtocolError,
}

/// Outcome of [`validate_request`].
pub type ValidationResult = Result<(MediaType, GraphQlParameters), Rejection>;

/// Validates a request and extracts its GraphQL parameters.
///
/// Methods other than `GET` and `POST` fail before anything else is read. A
/// failed negotiation is rendered as `application/json`; later failures use
/// the negotiated media type.
pub async fn validate_request<B>(parts: &Parts, body: B) -> ValidationResult
where
    B: Body,
    B::Error: Display,
{
    if parts.method != Method::GET && parts.method != Method::POST {
        return Err(Rejection {
            media_type: MediaType::ApplicationJson,
            error: ProtocolError::invalid_http_method(),
        });
    }

    let media_type = negotiate(&parts.headers).map_err(|error| Rejection {
        media_type: MediaType::ApplicationJson,
        error,
    })?;
    tracing::debug!(media_type = %media_type, "negotiated response media type");

    let params = extract(parts, body)
        .await
        .map_err(|error| Rejection { media_type, error })?;
    Ok((media_type, params))
}
