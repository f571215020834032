//! GraphQL-over-HTTP for Rust.
//!
//! This crate turns `http` requests into GraphQL responses and back.
//!
//! # Handler
//!
//! ```ignore
//! use gqlhttp::{create_handler, HandlerOptions};
//!
//! let schema = apollo_compiler::Schema::parse("type Query { hello: String }", "schema.graphql")?;
//! let handler = create_handler(
//!     schema,
//!     HandlerOptions::new()
//!         .root_value(serde_json::json!({ "hello": "world" }))
//!         .playground(true),
//! )?;
//!
//! let response = handler.handle(request).await;
//! ```
//!
//! # Server
//!
//! ```ignore
//! use gqlhttp::server::{run, ServerConfig};
//!
//! run(&ServerConfig::new().port(4000), handler, std::future::pending()).await?;
//! ```
//!
//! # Client
//!
//! ```ignore
//! use gqlhttp::client::{fetch, RequestOptions, RequestParams};
//!
//! let params = RequestParams::new("http://localhost:4000/graphql", "{ hello }");
//! let response = fetch(&params, &RequestOptions::default(), HeaderMap::new()).await?;
//! ```

pub mod client;
pub mod error;
pub mod extract;
pub mod handler;
pub mod negotiate;
pub mod playground;
pub mod response;
pub mod server;
pub mod validate;

pub use client::{create_request, fetch, resolve_response, RequestOptions, RequestParams};
pub use error::{FetchError, RequestError, ResolveError, ServerError};
pub use handler::{create_handler, Handler, HandlerOptions, ResponseContext, ResponseHook};
pub use playground::PlaygroundOptions;
pub use server::ServerConfig;
pub use validate::validate_request;

// Re-export the protocol vocabulary and the runtime
pub use gqlhttp_core::{
    parse_parameters, GraphQlError, GraphQlParameters, GraphQlResponse, Location, MediaType,
    ProtocolError, ProtocolErrorKind,
};
pub use gqlhttp_runtime::{
    Context, ExecutionOptions, ResolverArgs, ResolverError, ResolverInfo, ResolverMap,
    ResolverResult, Schema, SchemaError,
};
