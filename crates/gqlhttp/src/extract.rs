//! Extraction of GraphQL parameters from HTTP requests.
//!
//! | Method | Content-Type | Query source |
//! |---|---|---|
//! | GET | n/a | URL `query` |
//! | POST | `application/json` | body `query`, falling back to URL `query` |
//! | POST | `application/graphql-response+json` | raw body, falling back to URL `query` |

use std::fmt::Display;

use bytes::Bytes;
use gqlhttp_core::media::{APPLICATION_GRAPHQL_RESPONSE_JSON, APPLICATION_JSON, CHARSET};
use gqlhttp_core::{parse_parameters, GraphQlParameters, ProtocolError, ProtocolResult};
use http::header::CONTENT_TYPE;
use http::request::Parts;
use http::{Method, Uri};
use http_body::Body;
use http_body_util::BodyExt;
use serde_json::{Map, Value};

/// GraphQL parameters carried in a URL query string.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UrlParameters {
    pub query: Option<String>,
    pub variables: Option<String>,
    pub operation_name: Option<String>,
    pub extensions: Option<String>,
}

impl UrlParameters {
    /// Reads the parameters of a URI. The first occurrence of a key wins.
    pub fn from_uri(uri: &Uri) -> Self {
        let mut params = Self::default();
        let Some(query) = uri.query() else {
            return params;
        };

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                "query" => &mut params.query,
                "variables" => &mut params.variables,
                "operationName" => &mut params.operation_name,
                "extensions" => &mut params.extensions,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }

    /// The `query` parameter, if present and non-empty.
    fn non_empty_query(&self) -> Option<String> {
        self.query.clone().filter(|query| !query.is_empty())
    }
}

/// Extracts the parameters of a `GET` or `POST` request.
///
/// The body is only read for `POST`.
pub async fn extract<B>(parts: &Parts, body: B) -> ProtocolResult<GraphQlParameters>
where
    B: Body,
    B::Error: Display,
{
    match parts.method {
        Method::GET => extract_get(&parts.uri),
        Method::POST => extract_post(parts, body).await,
        _ => Err(ProtocolError::invalid_http_method()),
    }
}

/// Extracts the parameters of a `GET` request from its URL.
pub fn extract_get(uri: &Uri) -> ProtocolResult<GraphQlParameters> {
    let url = UrlParameters::from_uri(uri);
    let query = url
        .non_empty_query()
        .ok_or_else(ProtocolError::missing_query_parameter)?;

    Ok(GraphQlParameters {
        query,
        variables: json_object_parameter("variables", url.variables.as_deref())?,
        operation_name: url.operation_name.filter(|name| !name.is_empty()),
        extensions: json_object_parameter("extensions", url.extensions.as_deref())?,
    })
}

fn json_object_parameter(
    name: &str,
    value: Option<&str>,
) -> ProtocolResult<Option<Map<String, Value>>> {
    let Some(value) = value.filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    match serde_json::from_str::<Value>(value) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(_) => Err(ProtocolError::non_object_parameter(name)),
        Err(_) => Err(ProtocolError::invalid_json_parameter(name)),
    }
}

/// Request body media types the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    RawQuery,
}

fn body_kind(parts: &Parts) -> ProtocolResult<BodyKind> {
    let header = parts
        .headers
        .get(CONTENT_TYPE)
        .ok_or_else(ProtocolError::missing_content_type)?;
    let mime = header
        .to_str()
        .ok()
        .and_then(|value| mediatype::MediaType::parse(value).ok())
        .ok_or_else(ProtocolError::unsupported_media_type)?;

    let charset = mime
        .params
        .iter()
        .find(|(name, _)| name.as_str().eq_ignore_ascii_case("charset"))
        .map(|(_, value)| value.unquoted_str());
    if charset.is_some_and(|charset| !charset.eq_ignore_ascii_case(CHARSET)) {
        return Err(ProtocolError::unsupported_charset());
    }

    let essence = essence(&mime);
    if essence.eq_ignore_ascii_case(APPLICATION_JSON) {
        Ok(BodyKind::Json)
    } else if essence.eq_ignore_ascii_case(APPLICATION_GRAPHQL_RESPONSE_JSON) {
        Ok(BodyKind::RawQuery)
    } else {
        Err(ProtocolError::unsupported_media_type())
    }
}

/// `type/subtype[+suffix]` of a media type, without parameters.
pub(crate) fn essence(mime: &mediatype::MediaType<'_>) -> String {
    match &mime.suffix {
        Some(suffix) => format!("{}/{}+{}", mime.ty.as_str(), mime.subty.as_str(), suffix.as_str()),
        None => format!("{}/{}", mime.ty.as_str(), mime.subty.as_str()),
    }
}

async fn read_body<B>(body: B) -> ProtocolResult<Bytes>
where
    B: Body,
    B::Error: Display,
{
    body.collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| ProtocolError::invalid_body(format!("The message body is invalid. {e}")))
}

/// Extracts the parameters of a `POST` request.
pub async fn extract_post<B>(parts: &Parts, body: B) -> ProtocolResult<GraphQlParameters>
where
    B: Body,
    B::Error: Display,
{
    let kind = body_kind(parts)?;
    let bytes = read_body(body).await?;
    let url = UrlParameters::from_uri(&parts.uri);

    match kind {
        BodyKind::Json => parameters_from_json(&bytes, &url),
        BodyKind::RawQuery => {
            let text = std::str::from_utf8(&bytes).map_err(|_| {
                ProtocolError::invalid_body("The message body is invalid. Must be UTF-8 text.")
            })?;
            let query = if text.is_empty() {
                url.non_empty_query()
            } else {
                Some(text.to_string())
            };
            query
                .map(GraphQlParameters::new)
                .ok_or_else(ProtocolError::missing_body)
        }
    }
}

/// Decodes a JSON body. A body `query` that is absent or null falls back to the URL.
fn parameters_from_json(bytes: &[u8], url: &UrlParameters) -> ProtocolResult<GraphQlParameters> {
    let mut json: Value =
        serde_json::from_slice(bytes).map_err(|_| ProtocolError::invalid_json_body())?;
    if let (Value::Object(object), Some(query)) = (&mut json, &url.query) {
        if object.get("query").map_or(true, Value::is_null) {
            object.insert("query".to_string(), Value::String(query.clone()));
        }
    }

    parse_parameters(&json).map_err(|e| ProtocolError::invalid_body(e.to_string()))
}
