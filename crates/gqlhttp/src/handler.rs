//! GraphQL-over-HTTP request handler.
//!
//! A [`Handler`] turns an `http::Request` into an `http::Response`:
//! validation, execution, optional playground, then the response hook.

use std::fmt;
use std::fmt::Display;
use std::sync::Arc;

use bytes::Bytes;
use gqlhttp_runtime::{ExecutionOptions, ResolverMap, Schema, SchemaError};
use http::{HeaderMap, Method, Request, Response, Uri};
use http_body::Body;
use serde_json::Value;
use tracing::warn;

use crate::negotiate::is_playground_request;
use crate::playground::{playground_response, PlaygroundOptions};
use crate::response::{create_response, protocol_error_response};
use crate::validate::validate_request;

/// What a response hook can see of the request it answers.
#[derive(Debug, Clone)]
pub struct ResponseContext {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    /// True if the response is the playground page.
    pub playground: bool,
}

/// Post-processes every response. Called exactly once per request.
pub type ResponseHook =
    Arc<dyn Fn(Response<Bytes>, &ResponseContext) -> Response<Bytes> + Send + Sync>;

/// Handler configuration.
#[derive(Clone, Default)]
pub struct HandlerOptions {
    /// Root value, context value and resolvers.
    pub execution: ExecutionOptions,
    /// Serve the playground to browsers.
    pub playground: bool,
    pub playground_options: PlaygroundOptions,
    pub response: Option<ResponseHook>,
}

impl HandlerOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root value.
    #[must_use]
    pub fn root_value(mut self, value: Value) -> Self {
        self.execution.root_value = Some(value);
        self
    }

    /// Sets the context value.
    #[must_use]
    pub fn context_value(mut self, value: Value) -> Self {
        self.execution.context_value = Some(value);
        self
    }

    /// Sets the resolvers.
    #[must_use]
    pub fn resolvers(mut self, resolvers: ResolverMap) -> Self {
        self.execution.resolvers = Arc::new(resolvers);
        self
    }

    /// Enables or disables the playground.
    #[must_use]
    pub fn playground(mut self, enabled: bool) -> Self {
        self.playground = enabled;
        self
    }

    /// Sets the playground options.
    #[must_use]
    pub fn playground_options(mut self, options: PlaygroundOptions) -> Self {
        self.playground_options = options;
        self
    }

    /// Sets the response hook.
    #[must_use]
    pub fn on_response<F>(mut self, hook: F) -> Self
    where
        F: Fn(Response<Bytes>, &ResponseContext) -> Response<Bytes> + Send + Sync + 'static,
    {
        self.response = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for HandlerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerOptions")
            .field("execution", &self.execution)
            .field("playground", &self.playground)
            .field("playground_options", &self.playground_options)
            .field("has_response_hook", &self.response.is_some())
            .finish()
    }
}

struct HandlerInner {
    schema: Schema,
    options: HandlerOptions,
}

/// A GraphQL-over-HTTP handler. Cheap to clone and safe to share between tasks.
#[derive(Clone)]
pub struct Handler {
    inner: Arc<HandlerInner>,
}

impl Handler {
    /// Creates a handler, validating the schema first.
    pub fn new(schema: apollo_compiler::Schema, options: HandlerOptions) -> Result<Self, SchemaError> {
        Ok(Self::from_schema(Schema::new(schema)?, options))
    }

    /// Creates a handler from schema definition language.
    pub fn from_sdl(sdl: &str, options: HandlerOptions) -> Result<Self, SchemaError> {
        Ok(Self::from_schema(Schema::parse(sdl)?, options))
    }

    /// Creates a handler from a validated schema.
    pub fn from_schema(schema: Schema, options: HandlerOptions) -> Self {
        Self {
            inner: Arc::new(HandlerInner { schema, options }),
        }
    }

    /// Returns the schema.
    pub fn schema(&self) -> &Schema {
        &self.inner.schema
    }

    /// Returns the options.
    pub fn options(&self) -> &HandlerOptions {
        &self.inner.options
    }

    /// Handles one request.
    pub async fn handle<B>(&self, request: Request<B>) -> Response<Bytes>
    where
        B: Body,
        B::Error: Display,
    {
        let options = &self.inner.options;
        let (parts, body) = request.into_parts();

        let (response, playground) = match validate_request(&parts, body).await {
            Ok((media_type, params)) => {
                let response = create_response(
                    &self.inner.schema,
                    &params,
                    media_type,
                    &parts.method,
                    &options.execution,
                );
                (response, false)
            }
            Err(_) if options.playground && is_playground_request(&parts.method, &parts.headers) => {
                let response = playground_response(parts.uri.path(), &options.playground_options);
                (response, true)
            }
            Err(rejection) => {
                warn!(
                    method = %parts.method,
                    uri = %parts.uri,
                    kind = %rejection.error.kind,
                    status = rejection.error.status_hint.as_u16(),
                    "rejected GraphQL request"
                );
                (
                    protocol_error_response(&rejection.error, rejection.media_type),
                    false,
                )
            }
        };

        match &options.response {
            Some(hook) => {
                let ctx = ResponseContext {
                    method: parts.method,
                    uri: parts.uri,
                    headers: parts.headers,
                    playground,
                };
                hook(response, &ctx)
            }
            None => response,
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

/// Creates a handler, validating the schema first.
pub fn create_handler(
    schema: apollo_compiler::Schema,
    options: HandlerOptions,
) -> Result<Handler, SchemaError> {
    Handler::new(schema, options)
}
