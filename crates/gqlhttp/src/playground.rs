//! GraphQL Playground page.

use bytes::Bytes;
use gqlhttp_core::media::TEXT_HTML_CONTENT_TYPE;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Response, StatusCode};

/// Default version of the `graphql-playground-react` bundle.
pub const DEFAULT_VERSION: &str = "1.7.28";

/// Playground rendering options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaygroundOptions {
    /// GraphQL endpoint the page talks to. Defaults to the request path.
    pub endpoint: Option<String>,
    /// Page title.
    pub title: String,
    /// Version of the `graphql-playground-react` bundle loaded from the CDN.
    pub version: String,
}

impl Default for PlaygroundOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaygroundOptions {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self {
            endpoint: None,
            title: "GraphQL Playground".to_string(),
            version: DEFAULT_VERSION.to_string(),
        }
    }

    /// Sets the endpoint.
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Escapes text for use inside HTML content and double-quoted attributes.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Renders the playground page for `endpoint`.
pub fn playground_html(endpoint: &str, options: &PlaygroundOptions) -> String {
    // `<` is escaped so the JSON literal cannot close the script element.
    let endpoint_json = serde_json::Value::from(endpoint)
        .to_string()
        .replace('<', "\\u003c");
    let cdn = format!(
        "https://cdn.jsdelivr.net/npm/graphql-playground-react@{}/build",
        escape_html(&options.version)
    );

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8" />
    <meta name="viewport" content="user-scalable=no, initial-scale=1.0, minimum-scale=1.0, maximum-scale=1.0, minimal-ui" />
    <title>{title}</title>
    <link rel="stylesheet" href="{cdn}/static/css/index.css" />
    <link rel="shortcut icon" href="{cdn}/favicon.png" />
    <script src="{cdn}/static/js/middleware.js"></script>
    <style>
        body {{ margin: 0; overflow: hidden; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #172a3a; }}
        #loading {{ color: rgba(255, 255, 255, 0.6); text-align: center; padding-top: 40vh; }}
    </style>
</head>
<body>
    <div id="root"><div id="loading">Loading {title}</div></div>
    <script>
        window.addEventListener("load", function () {{
            GraphQLPlayground.init(document.getElementById("root"), {{
                endpoint: {endpoint_json}
            }});
        }});
    </script>
</body>
</html>"#,
        title = escape_html(&options.title),
        cdn = cdn,
        endpoint_json = endpoint_json,
    )
}

/// Builds the `200 text/html` playground response.
pub fn playground_response(endpoint: &str, options: &PlaygroundOptions) -> Response<Bytes> {
    let endpoint = options.endpoint.as_deref().unwrap_or(endpoint);
    let mut response = Response::new(Bytes::from(playground_html(endpoint, options)));
    *response.status_mut() = StatusCode::OK;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static(TEXT_HTML_CONTENT_TYPE),
    );
    response
}
