//! Client helpers: build GraphQL-over-HTTP requests and read their responses.
//!
//! ```ignore
//! use gqlhttp::client::{fetch, RequestOptions, RequestParams};
//!
//! let params = RequestParams::new("http://localhost:4000/graphql", "{ hello }");
//! let response = fetch(&params, &RequestOptions::default(), HeaderMap::new()).await?;
//! ```

use bytes::Bytes;
use gqlhttp_core::media::ACCEPT as ACCEPT_VALUE;
use gqlhttp_core::{GraphQlResponse, MediaType};
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, Method, Request, Response};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

use crate::error::{FetchError, RequestError, ResolveError};
use crate::extract::essence;

/// Where and how to send a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParams {
    /// GraphQL endpoint.
    pub url: String,
    pub query: String,
    /// Defaults to `POST`, which every GraphQL server accepts.
    pub method: Method,
}

impl RequestParams {
    /// Creates `POST` request parameters.
    pub fn new(url: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: query.into(),
            method: Method::POST,
        }
    }

    /// Sets the method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }
}

/// Optional request values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub variables: Option<Map<String, Value>>,
    pub operation_name: Option<String>,
}

impl RequestOptions {
    /// Sets the variables.
    #[must_use]
    pub fn variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = Some(variables);
        self
    }

    /// Sets the operation name.
    #[must_use]
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PostBody<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<&'a Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    operation_name: Option<&'a str>,
}

/// Builds a GraphQL request.
///
/// `GET` carries the parameters in the URL, `POST` in a JSON body. Other
/// methods produce a bare request to the URL.
pub fn create_request(
    params: &RequestParams,
    options: &RequestOptions,
) -> Result<Request<Bytes>, RequestError> {
    let mut url = Url::parse(&params.url)?;
    let operation_name = options
        .operation_name
        .as_deref()
        .filter(|name| !name.is_empty());

    match params.method {
        Method::GET => {
            let variables = options
                .variables
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            set_query_pairs(
                &mut url,
                &[
                    ("query", Some(params.query.as_str())),
                    ("variables", variables.as_deref()),
                    ("operationName", operation_name),
                ],
            );
            Ok(Request::builder()
                .method(Method::GET)
                .uri(url.as_str())
                .header(ACCEPT, ACCEPT_VALUE)
                .body(Bytes::new())?)
        }
        Method::POST => {
            let body = serde_json::to_vec(&PostBody {
                query: &params.query,
                variables: options.variables.as_ref(),
                operation_name,
            })?;
            Ok(Request::builder()
                .method(Method::POST)
                .uri(url.as_str())
                .header(ACCEPT, ACCEPT_VALUE)
                .header(CONTENT_TYPE, MediaType::ApplicationJson.content_type())
                .body(Bytes::from(body))?)
        }
        _ => Ok(Request::builder()
            .method(params.method.clone())
            .uri(url.as_str())
            .body(Bytes::new())?),
    }
}

/// Sets URL parameters, replacing existing ones of the same name. `None` values are skipped.
fn set_query_pairs(url: &mut Url, pairs: &[(&str, Option<&str>)]) {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !pairs.iter().any(|(name, _)| key == name))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut query = url.query_pairs_mut();
    query.clear();
    for (key, value) in &kept {
        query.append_pair(key, value);
    }
    for (name, value) in pairs {
        if let Some(value) = value {
            query.append_pair(name, value);
        }
    }
}

/// Reads a GraphQL response.
///
/// The content type must be `application/graphql-response+json` or
/// `application/json` and the body valid JSON. A non-2xx response is an error
/// carrying its GraphQL errors, if any.
pub fn resolve_response(response: Response<Bytes>) -> Result<GraphQlResponse, ResolveError> {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .ok_or(ResolveError::MissingContentType)?;
    let content_type_str = content_type.to_str().unwrap_or_default();
    if !is_graphql_content_type(content_type_str) {
        return Err(ResolveError::InvalidContentType(content_type_str.to_string()));
    }

    let status = response.status();
    let body: GraphQlResponse = serde_json::from_slice(response.body())?;
    if status.is_success() {
        return Ok(body);
    }
    match body.errors {
        Some(errors) => Err(ResolveError::GraphQl { status, errors }),
        None => Err(ResolveError::Unknown(status)),
    }
}

fn is_graphql_content_type(value: &str) -> bool {
    let Ok(mime) = mediatype::MediaType::parse(value) else {
        return false;
    };
    MediaType::from_essence(&essence(&mime)).is_some()
}

/// Sends a GraphQL request over HTTP/1 and reads the response.
///
/// `headers` are added to the request, replacing defaults of the same name.
/// Only `http` URLs are supported.
pub async fn fetch(
    params: &RequestParams,
    options: &RequestOptions,
    headers: HeaderMap,
) -> Result<GraphQlResponse, FetchError> {
    let mut request = create_request(params, options)?;
    for name in headers.keys() {
        request.headers_mut().remove(name);
    }
    for (name, value) in &headers {
        request.headers_mut().append(name.clone(), value.clone());
    }

    let client = Client::builder(TokioExecutor::new()).build_http::<Full<Bytes>>();
    let response = client
        .request(request.map(Full::new))
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    let (parts, body) = response.into_parts();
    let body = body
        .collect()
        .await
        .map_err(|e| FetchError::Body(e.to_string()))?
        .to_bytes();
    Ok(resolve_response(Response::from_parts(parts, body))?)
}
