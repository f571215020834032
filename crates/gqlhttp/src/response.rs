//! Response construction: parse, validate, execute and map the outcome onto
//! an HTTP status and content type.

use std::panic::{self, AssertUnwindSafe};

use bytes::Bytes;
use gqlhttp_core::{GraphQlParameters, GraphQlResponse, MediaType, ProtocolError};
use gqlhttp_runtime::engine;
use gqlhttp_runtime::{ExecutionOptions, OperationKind, Schema};
use http::header::{ALLOW, CONTENT_TYPE};
use http::{HeaderValue, Method, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, error};

/// Message of the error reported when execution panics.
pub const UNEXPECTED_ERROR_MESSAGE: &str =
    "Unexpected error has occurred while executing the operation.";

/// Body sent when a response cannot be serialized.
pub const UNKNOWN_ERROR_BODY: &str = r#"{"errors":[{"message":"Unknown error has occurred."}]}"#;

/// Runs a GraphQL request and builds its HTTP response.
///
/// Parse and validation failures are request errors: `400` for
/// `application/graphql-response+json`, `200` for `application/json`. A
/// non-query operation over `GET` is answered with `405` and `Allow: POST`.
/// A panic during processing becomes a `500`.
pub fn create_response(
    schema: &Schema,
    params: &GraphQlParameters,
    media_type: MediaType,
    method: &Method,
    options: &ExecutionOptions,
) -> Response<Bytes> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        run(schema, params, media_type, method, options)
    }));

    result.unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_default();
        error!(reason = %reason, "panic while executing the operation");
        json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            media_type,
            &GraphQlResponse::from_message(UNEXPECTED_ERROR_MESSAGE),
        )
    })
}

fn run(
    schema: &Schema,
    params: &GraphQlParameters,
    media_type: MediaType,
    method: &Method,
    options: &ExecutionOptions,
) -> Response<Bytes> {
    let request_error_status = media_type.request_error_status();

    let parsed = match engine::parse(&params.query) {
        Ok(parsed) => parsed,
        Err(errors) => {
            debug!(count = errors.len(), "syntax error");
            return json_response(
                request_error_status,
                media_type,
                &GraphQlResponse::from_errors(errors),
            );
        }
    };

    if *method == Method::GET {
        if let Some(kind) = parsed
            .operation_kind(params.operation_name.as_deref())
            .filter(|kind| *kind != OperationKind::Query)
        {
            let mut response = json_response(
                StatusCode::METHOD_NOT_ALLOWED,
                media_type,
                &GraphQlResponse::from_message(format!(
                    "Invalid GraphQL operation. Can only perform a {kind} operation from a POST request."
                )),
            );
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("POST"));
            return response;
        }
    }

    let validated = match engine::validate(schema, &params.query) {
        Ok(validated) => validated,
        Err(errors) => {
            debug!(count = errors.len(), "validation error");
            return json_response(
                request_error_status,
                media_type,
                &GraphQlResponse::from_errors(errors),
            );
        }
    };

    match engine::execute(schema, &validated, params, options) {
        Ok(outcome) => {
            let status = match media_type {
                MediaType::ApplicationJson => StatusCode::OK,
                MediaType::ApplicationGraphQlResponseJson if outcome.has_data() => StatusCode::OK,
                MediaType::ApplicationGraphQlResponseJson => StatusCode::BAD_REQUEST,
            };
            json_response(status, media_type, &outcome)
        }
        Err(errors) => json_response(
            request_error_status,
            media_type,
            &GraphQlResponse::from_errors(errors),
        ),
    }
}

/// Serializes `body` as the response of `status` with the media type's content type.
///
/// A body that fails to serialize degrades to a fixed `500` body.
pub fn json_response<T: Serialize>(
    status: StatusCode,
    media_type: MediaType,
    body: &T,
) -> Response<Bytes> {
    let (status, body) = match serde_json::to_vec(body) {
        Ok(body) => (status, Bytes::from(body)),
        Err(e) => {
            error!(error = %e, "failed to serialize response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Bytes::from_static(UNKNOWN_ERROR_BODY.as_bytes()),
            )
        }
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static(media_type.content_type()),
    );
    response
}

/// Renders a protocol error as `{"errors":[{"message":...}]}` with its status hint.
///
/// A rejected HTTP method also gets `Allow: GET,POST`.
pub fn protocol_error_response(error: &ProtocolError, media_type: MediaType) -> Response<Bytes> {
    let mut response = json_response(
        error.status_hint,
        media_type,
        &GraphQlResponse::from_message(error.message.clone()),
    );
    if error.is_method_not_allowed() {
        response
            .headers_mut()
            .insert(ALLOW, HeaderValue::from_static("GET,POST"));
    }
    response
}
