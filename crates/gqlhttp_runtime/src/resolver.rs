//! Resolver system for gqlhttp.
//!
//! Field resolvers are plain synchronous functions over JSON values. A
//! [`ResolverMap`] stores them by `Type.field`, falls back to a default field
//! resolver, and decides concrete object types for abstract fields.

use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

/// Arguments passed to a resolver, after variable substitution and coercion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolverArgs {
    args: Map<String, Value>,
}

impl ResolverArgs {
    /// Creates new resolver args.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates resolver args from a JSON object.
    pub fn from_map(args: Map<String, Value>) -> Self {
        Self { args }
    }

    /// Gets an argument by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Gets an argument as a specific type.
    pub fn get_as<T: serde::de::DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.args
            .get(name)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Gets a required argument, returning an error if not found.
    pub fn require<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<T, ResolverError> {
        let value = self
            .args
            .get(name)
            .ok_or_else(|| ResolverError::MissingArgument(name.to_string()))?;
        serde_json::from_value(value.clone())
            .map_err(|e| ResolverError::ArgumentParse(name.to_string(), e.to_string()))
    }

    /// Returns all arguments.
    pub fn all(&self) -> &Map<String, Value> {
        &self.args
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Sets an argument.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.args.insert(name.into(), value);
    }
}

/// Info about the field being resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverInfo {
    /// The field name being resolved.
    pub field_name: String,

    /// The parent type name.
    pub parent_type: String,

    /// The named return type, list and non-null wrappers removed.
    pub return_type: String,
}

impl ResolverInfo {
    /// Creates new resolver info.
    pub fn new(field_name: impl Into<String>, parent_type: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            parent_type: parent_type.into(),
            return_type: String::new(),
        }
    }

    /// Sets the return type.
    pub fn with_return_type(mut self, ty: impl Into<String>) -> Self {
        self.return_type = ty.into();
        self
    }
}

/// Request-scoped values shared by every resolver.
#[derive(Debug, Clone, Default)]
pub struct Context {
    value: Arc<Value>,
}

impl Context {
    /// Creates a context around a JSON value.
    pub fn new(value: Value) -> Self {
        Self {
            value: Arc::new(value),
        }
    }

    /// Returns the whole context value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Gets a property of an object context value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.value.get(key)
    }

    /// Gets a property as a specific type.
    pub fn get_as<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Result type for resolvers.
pub type ResolverResult = Result<Value, ResolverError>;

/// Error from a resolver. Surfaces as a field error in the response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    #[error("Failed to parse argument '{0}': {1}")]
    ArgumentParse(String, String),

    #[error("{0}")]
    Custom(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResolverError {
    /// Creates an error whose message is sent to the client as is.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}

/// Trait for field resolvers.
pub trait Resolver: Send + Sync {
    /// Resolves a field value.
    fn resolve(
        &self,
        parent: &Value,
        args: &ResolverArgs,
        ctx: &Context,
        info: &ResolverInfo,
    ) -> ResolverResult;
}

type BoxedResolver = Box<dyn Resolver>;

/// A sync resolver function.
pub type ResolverFn =
    Arc<dyn Fn(&Value, &ResolverArgs, &Context, &ResolverInfo) -> ResolverResult + Send + Sync>;

/// A wrapper for resolver functions.
pub struct FnResolver {
    func: ResolverFn,
}

impl FnResolver {
    /// Creates a new function resolver.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &ResolverArgs, &Context, &ResolverInfo) -> ResolverResult
            + Send
            + Sync
            + 'static,
    {
        Self { func: Arc::new(f) }
    }
}

impl Resolver for FnResolver {
    fn resolve(
        &self,
        parent: &Value,
        args: &ResolverArgs,
        ctx: &Context,
        info: &ResolverInfo,
    ) -> ResolverResult {
        (self.func)(parent, args, ctx, info)
    }
}

/// Default resolver that reads properties from the parent object.
pub struct DefaultResolver;

impl Resolver for DefaultResolver {
    fn resolve(
        &self,
        parent: &Value,
        _args: &ResolverArgs,
        _ctx: &Context,
        info: &ResolverInfo,
    ) -> ResolverResult {
        let field_name = &info.field_name;
        match parent {
            Value::Object(map) => Ok(map
                .get(field_name)
                .or_else(|| map.get(&to_snake_case(field_name)))
                .cloned()
                .unwrap_or(Value::Null)),
            Value::Null => Ok(Value::Null),
            _ => Err(ResolverError::FieldNotFound(field_name.clone())),
        }
    }
}

/// Converts camelCase to snake_case.
fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

/// Decides the concrete object type of a value returned for an abstract field.
pub type TypeResolverFn = Arc<dyn Fn(&Value, &Context, &ResolverInfo) -> Option<String> + Send + Sync>;

/// Reads `__typename` from an object value.
pub fn default_type_resolver(value: &Value, _ctx: &Context, _info: &ResolverInfo) -> Option<String> {
    value
        .get("__typename")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Storage for resolvers organized by type and field.
pub struct ResolverMap {
    /// Resolvers indexed by "TypeName.fieldName".
    resolvers: FxHashMap<String, BoxedResolver>,

    /// Default resolver for unregistered fields.
    default_resolver: Option<BoxedResolver>,

    type_resolver: TypeResolverFn,
}

impl Default for ResolverMap {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverMap {
    /// Creates a new resolver map using [`DefaultResolver`] for unregistered fields.
    pub fn new() -> Self {
        Self {
            resolvers: FxHashMap::default(),
            default_resolver: Some(Box::new(DefaultResolver)),
            type_resolver: Arc::new(default_type_resolver),
        }
    }

    /// Registers a resolver for a specific type and field.
    pub fn register<R: Resolver + 'static>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        resolver: R,
    ) {
        let key = format!("{}.{}", type_name.into(), field_name.into());
        self.resolvers.insert(key, Box::new(resolver));
    }

    /// Registers a function as a resolver.
    pub fn register_fn<F>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        f: F,
    ) where
        F: Fn(&Value, &ResolverArgs, &Context, &ResolverInfo) -> ResolverResult
            + Send
            + Sync
            + 'static,
    {
        self.register(type_name, field_name, FnResolver::new(f));
    }

    /// Builder form of [`ResolverMap::register_fn`].
    #[must_use]
    pub fn with_fn<F>(
        mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        f: F,
    ) -> Self
    where
        F: Fn(&Value, &ResolverArgs, &Context, &ResolverInfo) -> ResolverResult
            + Send
            + Sync
            + 'static,
    {
        self.register_fn(type_name, field_name, f);
        self
    }

    /// Gets a resolver for a type and field.
    pub fn get(&self, type_name: &str, field_name: &str) -> Option<&dyn Resolver> {
        let key = format!("{type_name}.{field_name}");
        self.resolvers
            .get(&key)
            .or(self.default_resolver.as_ref())
            .map(|r| r.as_ref())
    }

    /// Resolves a field. Without a matching resolver the field is null.
    pub fn resolve(
        &self,
        parent: &Value,
        args: &ResolverArgs,
        ctx: &Context,
        info: &ResolverInfo,
    ) -> ResolverResult {
        match self.get(&info.parent_type, &info.field_name) {
            Some(resolver) => resolver.resolve(parent, args, ctx, info),
            None => Ok(Value::Null),
        }
    }

    /// Sets the default resolver.
    pub fn set_default<R: Resolver + 'static>(&mut self, resolver: R) {
        self.default_resolver = Some(Box::new(resolver));
    }

    /// Removes the default resolver.
    pub fn remove_default(&mut self) {
        self.default_resolver = None;
    }

    /// Sets the type resolver used for interface and union fields.
    pub fn set_type_resolver<F>(&mut self, f: F)
    where
        F: Fn(&Value, &Context, &ResolverInfo) -> Option<String> + Send + Sync + 'static,
    {
        self.type_resolver = Arc::new(f);
    }

    /// Runs the type resolver on a value.
    pub fn resolve_type(&self, value: &Value, ctx: &Context, info: &ResolverInfo) -> Option<String> {
        (self.type_resolver)(value, ctx, info)
    }

    /// Returns the number of registered field resolvers.
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Returns true if no field resolver is registered.
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl Debug for ResolverMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverMap")
            .field("resolver_count", &self.resolvers.len())
            .field("has_default", &self.default_resolver.is_some())
            .finish_non_exhaustive()
    }
}
