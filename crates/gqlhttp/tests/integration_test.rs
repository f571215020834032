//! Integration tests for gqlhttp

use bytes::Bytes;
use gqlhttp::client::{create_request, fetch, RequestOptions, RequestParams};
use gqlhttp::extract::extract_get;
use gqlhttp::server::serve;
use gqlhttp::{
    create_handler, Handler, HandlerOptions, MediaType, PlaygroundOptions, ResolverError,
    ResolverMap,
};
use http::header::{ACCEPT, ALLOW, CONTENT_TYPE};
use http::{HeaderMap, Method, Request, Response, StatusCode};
use http_body_util::Full;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

const SCHEMA: &str = r#"
    type Query {
        hello: String
        greet(name: String!): String!
        user(id: ID!): User
    }

    type User {
        id: ID!
        name: String
        displayName: String
    }

    type Mutation {
        bump: Int
    }
"#;

fn resolvers() -> ResolverMap {
    ResolverMap::new()
        .with_fn("Query", "hello", |_parent, _args, _ctx, _info| Ok(json!("world")))
        .with_fn("Query", "greet", |_parent, args, _ctx, _info| {
            let name: String = args.require("name")?;
            if name.is_empty() {
                return Err(ResolverError::custom("name must not be empty"));
            }
            Ok(json!(format!("Hello, {name}!")))
        })
        .with_fn("Query", "user", |_parent, args, _ctx, _info| {
            let id: String = args.require("id")?;
            Ok(json!({ "id": id, "name": "Alice", "display_name": "alice" }))
        })
}

fn handler(options: HandlerOptions) -> Handler {
    Handler::from_sdl(SCHEMA, options.resolvers(resolvers())).unwrap()
}

fn get(uri: &str, accept: Option<&str>) -> Request<Full<Bytes>> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(accept) = accept {
        builder = builder.header(ACCEPT, accept);
    }
    builder.body(Full::new(Bytes::new())).unwrap()
}

fn post(body: &str, content_type: &str, accept: Option<&str>) -> Request<Full<Bytes>> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/graphql")
        .header(CONTENT_TYPE, content_type);
    if let Some(accept) = accept {
        builder = builder.header(ACCEPT, accept);
    }
    builder.body(Full::new(Bytes::from(body.to_string()))).unwrap()
}

fn text(response: &Response<Bytes>) -> &str {
    std::str::from_utf8(response.body()).unwrap()
}

/// GET without a query is a protocol error
#[tokio::test]
async fn test_get_without_query() {
    let response = handler(HandlerOptions::new()).handle(get("/graphql", None)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/json; charset=UTF-8");
    insta::assert_snapshot!(text(&response), @r#"{"errors":[{"message":"The parameter is required. \"query\""}]}"#);
}

/// GET query negotiated as application/graphql-response+json
#[tokio::test]
async fn test_get_query() {
    let response = handler(HandlerOptions::new())
        .handle(get(
            "/graphql?query=%7Bhello%7D",
            Some("application/graphql-response+json"),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[CONTENT_TYPE],
        "application/graphql-response+json; charset=UTF-8"
    );
    insta::assert_snapshot!(text(&response), @r#"{"data":{"hello":"world"}}"#);
}

/// POST JSON body with variables and the default property resolver
#[tokio::test]
async fn test_post_json() {
    let body = json!({
        "query": "query User($id: ID!) { user(id: $id) { id name displayName } }",
        "variables": { "id": "1" },
        "operationName": "User"
    })
    .to_string();
    let response = handler(HandlerOptions::new())
        .handle(post(&body, "application/json", Some("application/json")))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/json; charset=UTF-8");
    insta::assert_snapshot!(text(&response), @r#"{"data":{"user":{"id":"1","name":"Alice","displayName":"alice"}}}"#);
}

/// POST raw query body
#[tokio::test]
async fn test_post_raw_query() {
    let response = handler(HandlerOptions::new())
        .handle(post(
            "{ hello }",
            "application/graphql-response+json",
            Some("application/graphql-response+json"),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    insta::assert_snapshot!(text(&response), @r#"{"data":{"hello":"world"}}"#);
}

/// Unacceptable media type without the playground
#[tokio::test]
async fn test_not_acceptable() {
    let handler = handler(HandlerOptions::new());

    let response = handler
        .handle(get("/graphql?query=%7Bhello%7D", Some("text/plain")))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);

    let response = handler.handle(get("/graphql", Some("text/html"))).await;
    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
}

/// Browsers get the playground when enabled
#[tokio::test]
async fn test_playground() {
    let options = HandlerOptions::new()
        .playground(true)
        .playground_options(PlaygroundOptions::new().title("My API"));
    let response = handler(options)
        .handle(get("/graphql", Some("text/html,application/xhtml+xml,*/*;q=0.8")))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "text/html; charset=UTF-8");
    assert!(text(&response).contains("<title>My API</title>"));
    assert!(text(&response).contains(r#"endpoint: "/graphql""#));
}

/// A query in the URL still wins over the playground
#[tokio::test]
async fn test_playground_does_not_shadow_queries() {
    let response = handler(HandlerOptions::new().playground(true))
        .handle(get("/graphql?query=%7Bhello%7D", Some("text/html, */*")))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[CONTENT_TYPE],
        "application/graphql-response+json; charset=UTF-8"
    );
}

/// operationName selects the operation of a multi-operation document
#[tokio::test]
async fn test_get_operation_selection() {
    let handler = handler(HandlerOptions::new());
    let document = "query%20A%20%7B%20hello%20%7D%20mutation%20B%20%7B%20bump%20%7D";

    let response = handler
        .handle(get(&format!("/graphql?query={document}&operationName=A"), None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    insta::assert_snapshot!(text(&response), @r#"{"data":{"hello":"world"}}"#);

    let response = handler
        .handle(get(&format!("/graphql?query={document}&operationName=B"), None))
        .await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[ALLOW], "POST");
    insta::assert_snapshot!(text(&response), @r#"{"errors":[{"message":"Invalid GraphQL operation. Can only perform a mutation operation from a POST request."}]}"#);
}

/// Unsupported methods are rejected with Allow
#[tokio::test]
async fn test_invalid_method() {
    let request = Request::builder()
        .method(Method::PUT)
        .uri("/graphql")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let response = handler(HandlerOptions::new()).handle(request).await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[ALLOW], "GET,POST");
}

/// Resolver errors are field errors, not server errors
#[tokio::test]
async fn test_resolver_error_on_non_null_field() {
    let body = json!({ "query": r#"{ greet(name: "") }"# }).to_string();
    let response = handler(HandlerOptions::new())
        .handle(post(&body, "application/json", None))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let value: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(value["data"], serde_json::Value::Null);
    assert_eq!(value["errors"][0]["message"], "name must not be empty");
    assert_eq!(value["errors"][0]["path"], json!(["greet"]));
}

/// Request errors depend on the negotiated media type
#[tokio::test]
async fn test_request_error_status() {
    let handler = handler(HandlerOptions::new());
    let body = json!({ "query": "{ missing }" }).to_string();

    let response = handler
        .handle(post(&body, "application/json", Some("application/json")))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = handler
        .handle(post(&body, "application/json", Some("application/graphql-response+json")))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let value: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert!(value.get("data").is_none());
}

/// Malformed POST bodies
#[tokio::test]
async fn test_invalid_post_bodies() {
    let handler = handler(HandlerOptions::new());

    let response = handler.handle(post("{", "application/json", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    insta::assert_snapshot!(text(&response), @r#"{"errors":[{"message":"The message body is invalid. Invalid JSON format."}]}"#);

    let response = handler.handle(post("{}", "text/plain", None)).await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let response = handler
        .handle(post("{}", "application/json; charset=latin1", None))
        .await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

/// The response hook sees every response once
#[tokio::test]
async fn test_response_hook() {
    let options = HandlerOptions::new().on_response(|mut response, ctx| {
        response
            .headers_mut()
            .insert("x-method", ctx.method.as_str().parse().unwrap());
        response
    });
    let response = handler(options).handle(get("/graphql", None)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()["x-method"], "GET");
}

/// The hook runs once per response and knows playground renders apart
#[tokio::test]
async fn test_response_hook_context() {
    let seen: Arc<Mutex<Vec<bool>>> = Arc::default();
    let recorded = Arc::clone(&seen);
    let options = HandlerOptions::new()
        .playground(true)
        .on_response(move |response, ctx| {
            recorded.lock().unwrap().push(ctx.playground);
            response
        });
    let handler = handler(options);

    let response = handler.handle(get("/graphql", Some("text/html"))).await;
    assert_eq!(response.headers()[CONTENT_TYPE], "text/html; charset=UTF-8");
    assert_eq!(*seen.lock().unwrap(), vec![true]);

    let response = handler
        .handle(get("/graphql?query=%7Bhello%7D", Some("application/json")))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(*seen.lock().unwrap(), vec![true, false]);
}

/// The hook is not called twice for a single request
#[tokio::test]
async fn test_response_hook_called_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let options = HandlerOptions::new().on_response(move |response, _ctx| {
        counter.fetch_add(1, Ordering::SeqCst);
        response
    });
    let handler = handler(options);

    let body = json!({ "query": "{ hello }" }).to_string();
    handler.handle(post(&body, "application/json", None)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    handler.handle(post("{", "application/json", None)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// Execution request errors are 400 under application/graphql-response+json
#[tokio::test]
async fn test_execution_request_error_status() {
    let handler = handler(HandlerOptions::new());
    let accept = Some("application/graphql-response+json");

    let body = json!({ "query": "query ($id: ID!) { user(id: $id) { id } }" }).to_string();
    let response = handler.handle(post(&body, "application/json", accept)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers()[CONTENT_TYPE],
        "application/graphql-response+json; charset=UTF-8"
    );
    let value: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert!(value.get("data").is_none());
    assert!(!value["errors"].as_array().unwrap().is_empty());

    let body = json!({ "query": "query A { hello }", "operationName": "B" }).to_string();
    let response = handler.handle(post(&body, "application/json", accept)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let value: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert!(value.get("data").is_none());
}

/// Root and context values reach the resolvers
#[tokio::test]
async fn test_root_and_context_values() {
    let schema = apollo_compiler::Schema::parse(
        "type Query { hello: String tenant: String }",
        "schema.graphql",
    )
    .unwrap();
    let resolvers = ResolverMap::new().with_fn("Query", "tenant", |_parent, _args, ctx, _info| {
        Ok(ctx.get("tenant").cloned().unwrap_or_default())
    });
    let handler = create_handler(
        schema,
        HandlerOptions::new()
            .root_value(json!({ "hello": "from root" }))
            .context_value(json!({ "tenant": "acme" }))
            .resolvers(resolvers),
    )
    .unwrap();

    let response = handler
        .handle(get("/graphql?query=%7Bhello%20tenant%7D", None))
        .await;
    insta::assert_snapshot!(text(&response), @r#"{"data":{"hello":"from root","tenant":"acme"}}"#);
}

/// Invalid schemas fail construction
#[test]
fn test_invalid_schema() {
    let result = Handler::from_sdl("type Query { a: Missing }", HandlerOptions::new());
    assert!(matches!(result, Err(gqlhttp::SchemaError::Invalid(_))));
}

/// A GET request built by the client is understood by the extractor
#[test]
fn test_client_request_round_trip() {
    let mut variables = serde_json::Map::new();
    variables.insert("id".into(), json!("1"));
    let params = RequestParams::new(
        "http://localhost:4000/graphql",
        "query User($id: ID!) { user(id: $id) { name } }",
    )
    .method(Method::GET);
    let options = RequestOptions::default()
        .variables(variables.clone())
        .operation_name("User");

    let request = create_request(&params, &options).unwrap();
    let extracted = extract_get(request.uri()).unwrap();

    assert_eq!(extracted.query, params.query);
    assert_eq!(extracted.variables, Some(variables));
    assert_eq!(extracted.operation_name.as_deref(), Some("User"));
}

/// Server and client against each other
#[tokio::test]
async fn test_server_and_fetch() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(serve(listener, handler(HandlerOptions::new()), "/graphql"));

    let url = format!("http://{addr}/graphql");
    let response = fetch(
        &RequestParams::new(&url, "{ hello }"),
        &RequestOptions::default(),
        HeaderMap::new(),
    )
    .await
    .unwrap();
    assert_eq!(response.data, Some(json!({ "hello": "world" })));

    let response = fetch(
        &RequestParams::new(&url, "{ hello }").method(Method::GET),
        &RequestOptions::default(),
        HeaderMap::new(),
    )
    .await
    .unwrap();
    assert_eq!(response.data, Some(json!({ "hello": "world" })));

    let err = fetch(
        &RequestParams::new(&url, "{ missing }"),
        &RequestOptions::default(),
        HeaderMap::new(),
    )
    .await
    .unwrap_err();
    match err {
        gqlhttp::FetchError::Resolve(err) => assert!(!err.graphql_errors().is_empty()),
        other => panic!("unexpected error: {other}"),
    }

    server.abort();
}

/// Negotiation picks the server preference for wildcards
#[tokio::test]
async fn test_wildcard_accept() {
    let response = handler(HandlerOptions::new())
        .handle(get("/graphql?query=%7Bhello%7D", Some("*/*")))
        .await;

    assert_eq!(
        response.headers()[CONTENT_TYPE],
        MediaType::ApplicationGraphQlResponseJson.content_type()
    );
}
