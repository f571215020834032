//! GraphQL engine.
//!
//! Thin layer over `apollo-compiler` that splits request processing into the
//! stages the HTTP binding needs to tell apart:
//! - [`parse`]: syntax only, no schema involved
//! - [`validate`]: the document against the schema
//! - [`execute`]: operation selection, variable coercion and resolution
//!
//! Every stage reports failures as [`GraphQlError`]s.

use std::fmt;
use std::sync::Arc;

use apollo_compiler::ast;
use apollo_compiler::resolvers::{Execution, FieldError, ObjectValue, ResolveInfo, ResolvedValue};
use apollo_compiler::response::{GraphQLError, JsonMap, JsonValue, ResponseDataPathSegment};
use apollo_compiler::validation::Valid;
use apollo_compiler::ExecutableDocument;
use gqlhttp_core::{GraphQlError, GraphQlParameters, GraphQlResponse, Location};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::resolver::{Context, ResolverArgs, ResolverError, ResolverInfo, ResolverMap};

const SCHEMA_PATH: &str = "schema.graphql";
const REQUEST_PATH: &str = "request.graphql";

/// Error raised when a schema fails to build or validate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Invalid schema:\n{0}")]
    Invalid(String),
}

/// A validated GraphQL schema. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Schema {
    inner: Arc<Valid<apollo_compiler::Schema>>,
}

impl Schema {
    /// Parses and validates schema definition language.
    pub fn parse(sdl: &str) -> Result<Self, SchemaError> {
        apollo_compiler::Schema::parse_and_validate(sdl, SCHEMA_PATH)
            .map(Self::from_valid)
            .map_err(|e| SchemaError::Invalid(e.errors.to_string()))
    }

    /// Validates an already built schema.
    pub fn new(schema: apollo_compiler::Schema) -> Result<Self, SchemaError> {
        schema
            .validate()
            .map(Self::from_valid)
            .map_err(|e| SchemaError::Invalid(e.errors.to_string()))
    }

    /// Wraps a schema that is known to be valid.
    pub fn from_valid(schema: Valid<apollo_compiler::Schema>) -> Self {
        Self {
            inner: Arc::new(schema),
        }
    }

    /// Returns the underlying schema.
    pub fn inner(&self) -> &Valid<apollo_compiler::Schema> {
        &self.inner
    }

    /// Returns the root type name for an operation kind.
    pub fn root_type(&self, kind: OperationKind) -> Option<&str> {
        self.inner
            .root_operation(kind.into())
            .map(|name| name.as_str())
    }
}

/// Kind of a GraphQL operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    /// Returns the keyword of the operation kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ast::OperationType> for OperationKind {
    fn from(ty: ast::OperationType) -> Self {
        match ty {
            ast::OperationType::Query => Self::Query,
            ast::OperationType::Mutation => Self::Mutation,
            ast::OperationType::Subscription => Self::Subscription,
        }
    }
}

impl From<OperationKind> for ast::OperationType {
    fn from(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Query => Self::Query,
            OperationKind::Mutation => Self::Mutation,
            OperationKind::Subscription => Self::Subscription,
        }
    }
}

/// A syntactically valid document, not yet checked against a schema.
#[derive(Debug)]
pub struct ParsedQuery {
    document: ast::Document,
}

impl ParsedQuery {
    /// Returns the kind of the operation a request would run.
    ///
    /// With a name, the operation of that name. Without one, the only
    /// operation of the document. `None` if no operation matches, which the
    /// validation stage reports.
    pub fn operation_kind(&self, operation_name: Option<&str>) -> Option<OperationKind> {
        let mut operations = self.document.definitions.iter().filter_map(|definition| {
            match definition {
                ast::Definition::OperationDefinition(operation) => Some(operation),
                _ => None,
            }
        });

        let operation = match operation_name {
            Some(name) => operations
                .find(|operation| operation.name.as_ref().is_some_and(|n| n.as_str() == name)),
            None => {
                let first = operations.next();
                if operations.next().is_some() {
                    return None;
                }
                first
            }
        };
        operation.map(|operation| operation.operation_type.into())
    }
}

/// Parses a document. Syntax errors only.
pub fn parse(query: &str) -> Result<ParsedQuery, Vec<GraphQlError>> {
    ast::Document::parse(query, REQUEST_PATH)
        .map(|document| ParsedQuery { document })
        .map_err(|e| e.errors.iter().map(|d| convert_error(d.to_json())).collect())
}

/// A document validated against a schema.
#[derive(Debug)]
pub struct ValidatedQuery {
    document: Valid<ExecutableDocument>,
}

/// Validates a document against a schema with the standard rules.
pub fn validate(schema: &Schema, query: &str) -> Result<ValidatedQuery, Vec<GraphQlError>> {
    ExecutableDocument::parse_and_validate(schema.inner(), query, REQUEST_PATH)
        .map(|document| ValidatedQuery { document })
        .map_err(|e| e.errors.iter().map(|d| convert_error(d.to_json())).collect())
}

/// Values and resolvers used when executing an operation.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Initial value of the root object. Defaults to an empty object.
    pub root_value: Option<Value>,
    /// Value handed to every resolver through [`Context`].
    pub context_value: Option<Value>,
    /// Field resolvers, default field resolver and type resolver.
    pub resolvers: Arc<ResolverMap>,
}

impl ExecutionOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root value.
    #[must_use]
    pub fn root_value(mut self, value: Value) -> Self {
        self.root_value = Some(value);
        self
    }

    /// Sets the context value.
    #[must_use]
    pub fn context_value(mut self, value: Value) -> Self {
        self.context_value = Some(value);
        self
    }

    /// Sets the resolvers.
    #[must_use]
    pub fn resolvers(mut self, resolvers: ResolverMap) -> Self {
        self.resolvers = Arc::new(resolvers);
        self
    }
}

/// Executes a validated document.
///
/// `Err` holds request errors: operation selection and variable coercion
/// failures. Field errors are part of the `Ok` response, whose `data` is
/// always present and null when the root was nullified.
pub fn execute(
    schema: &Schema,
    query: &ValidatedQuery,
    params: &GraphQlParameters,
    options: &ExecutionOptions,
) -> Result<GraphQlResponse, Vec<GraphQlError>> {
    let document = &query.document;
    let operation = document
        .operations
        .get(params.operation_name.as_deref())
        .map_err(|e| vec![convert_error(e.to_graphql_error(&document.sources))])?;

    let kind = OperationKind::from(operation.operation_type);
    let root_type = schema.root_type(kind).ok_or_else(|| {
        vec![GraphQlError::new(format!(
            "Schema is not configured to execute {kind} operation."
        ))]
    })?;
    tracing::debug!(
        operation = ?params.operation_name,
        kind = %kind,
        "executing operation"
    );

    let variables = match params.variables.clone() {
        Some(variables) => match JsonValue::from(Value::Object(variables)) {
            JsonValue::Object(map) => map,
            _ => JsonMap::new(),
        },
        None => JsonMap::new(),
    };

    let env = Environment {
        schema: schema.inner(),
        resolvers: &options.resolvers,
        context: Context::new(options.context_value.clone().unwrap_or_default()),
    };
    let root = ResolverObject {
        env: &env,
        type_name: root_type.to_string(),
        value: options
            .root_value
            .clone()
            .unwrap_or_else(|| Value::Object(Map::new())),
    };

    let result = Execution::new(schema.inner(), document)
        .operation(operation)
        .raw_variable_values(&variables)
        .execute_sync(&root);

    match result {
        Ok(response) => {
            let data = serde_json::to_value(JsonValue::from(response.data))
                .map_err(|e| vec![GraphQlError::new(e.to_string())])?;
            let errors: Vec<GraphQlError> = response.errors.into_iter().map(convert_error).collect();
            Ok(GraphQlResponse {
                errors: (!errors.is_empty()).then_some(errors),
                extensions: None,
                data: Some(data),
            })
        }
        Err(request_error) => Err(vec![convert_error(
            request_error.to_graphql_error(&document.sources),
        )]),
    }
}

fn convert_error(error: GraphQLError) -> GraphQlError {
    let GraphQLError {
        message,
        locations,
        path,
        extensions,
    } = error;
    let locations = locations
        .into_iter()
        .map(|location| Location {
            line: location.line,
            column: location.column,
        })
        .collect();
    let path = (!path.is_empty()).then(|| {
        path.into_iter()
            .map(|segment| match segment {
                ResponseDataPathSegment::Field(name) => Value::String(name.as_str().to_owned()),
                ResponseDataPathSegment::ListIndex(i) => Value::from(i),
            })
            .collect()
    });
    let extensions = match serde_json::to_value(&extensions) {
        Ok(Value::Object(map)) if !map.is_empty() => Some(map),
        _ => None,
    };
    GraphQlError {
        message,
        locations,
        path,
        extensions,
    }
}

/// Shared state of one execution.
struct Environment<'a> {
    schema: &'a apollo_compiler::Schema,
    resolvers: &'a ResolverMap,
    context: Context,
}

impl Environment<'_> {
    fn is_leaf_type(&self, name: &str) -> bool {
        self.schema.get_scalar(name).is_some() || self.schema.get_enum(name).is_some()
    }

    fn object_type_name(&self, value: &Value, info: &ResolverInfo) -> String {
        if self.schema.get_object(&info.return_type).is_some() {
            return info.return_type.clone();
        }
        self.resolvers
            .resolve_type(value, &self.context, info)
            .unwrap_or_else(|| info.return_type.clone())
    }
}

/// A JSON value seen by the executor as an object of a given type.
struct ResolverObject<'a> {
    env: &'a Environment<'a>,
    type_name: String,
    value: Value,
}

impl ObjectValue for ResolverObject<'_> {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn resolve_field<'a>(
        &'a self,
        info: &'a ResolveInfo<'a>,
    ) -> Result<ResolvedValue<'a>, FieldError> {
        let args = match serde_json::to_value(info.arguments()) {
            Ok(Value::Object(args)) => ResolverArgs::from_map(args),
            Ok(_) => ResolverArgs::new(),
            Err(e) => {
                return Err(FieldError {
                    message: ResolverError::Internal(e.to_string()).to_string(),
                })
            }
        };
        let ty = &info.field_definition().ty;
        let field = ResolverInfo::new(info.field_name(), self.type_name.as_str())
            .with_return_type(ty.inner_named_type().as_str());

        let value = self
            .env
            .resolvers
            .resolve(&self.value, &args, &self.env.context, &field)
            .map_err(|e| FieldError {
                message: e.to_string(),
            })?;
        Ok(resolved(self.env, value, ty.clone(), &field))
    }
}

/// Maps a resolver value onto the declared type `ty`.
///
/// Arrays become lists only where `ty` is a list, so list-shaped values of
/// custom scalars stay leaves.
fn resolved<'a>(
    env: &'a Environment<'a>,
    value: Value,
    ty: ast::Type,
    info: &ResolverInfo,
) -> ResolvedValue<'a> {
    match value {
        Value::Array(items) if ty.is_list() || !env.is_leaf_type(&info.return_type) => {
            let item_type = ty.item_type().clone();
            let info = info.clone();
            ResolvedValue::List(Box::new(items.into_iter().map(move |item| {
                Ok::<_, FieldError>(resolved(env, item, item_type.clone(), &info))
            })))
        }
        Value::Object(_) if !env.is_leaf_type(&info.return_type) => {
            let type_name = env.object_type_name(&value, info);
            ResolvedValue::object(ResolverObject {
                env,
                type_name,
                value,
            })
        }
        leaf => ResolvedValue::leaf(JsonValue::from(leaf)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SDL: &str = r#"
        type Query {
            hello(name: String): String
            user(id: ID!): User
            users: [User!]!
            node: Node
            strict: String!
        }
        type Mutation { rename(name: String!): String }
        interface Node { id: ID! }
        type User implements Node { id: ID! firstName: String }
        type Post implements Node { id: ID! title: String }
    "#;

    fn schema() -> Schema {
        Schema::parse(SDL).unwrap()
    }

    fn run(query: &str, params: GraphQlParameters, options: &ExecutionOptions) -> GraphQlResponse {
        let schema = schema();
        let validated = validate(&schema, query).unwrap();
        execute(&schema, &validated, &params, options).unwrap()
    }

    #[test]
    fn test_invalid_schema() {
        let err = Schema::parse("type Query { user: Missing }").unwrap_err();
        assert!(matches!(err, SchemaError::Invalid(_)));
    }

    #[test]
    fn test_root_type() {
        let schema = schema();
        assert_eq!(schema.root_type(OperationKind::Query), Some("Query"));
        assert_eq!(schema.root_type(OperationKind::Mutation), Some("Mutation"));
        assert_eq!(schema.root_type(OperationKind::Subscription), None);
    }

    #[test]
    fn test_parse_errors() {
        let errors = parse("{ hello").unwrap_err();
        assert!(!errors.is_empty());
        assert!(!errors[0].locations.is_empty());
        assert!(parse("{ doesNotExist }").is_ok());
    }

    #[test]
    fn test_operation_kind() {
        let doc = parse("query A { hello } mutation B { rename(name: \"x\") }").unwrap();
        assert_eq!(doc.operation_kind(Some("A")), Some(OperationKind::Query));
        assert_eq!(doc.operation_kind(Some("B")), Some(OperationKind::Mutation));
        assert_eq!(doc.operation_kind(Some("C")), None);
        assert_eq!(doc.operation_kind(None), None);

        let doc = parse("mutation { rename(name: \"x\") }").unwrap();
        assert_eq!(doc.operation_kind(None), Some(OperationKind::Mutation));
    }

    #[test]
    fn test_validation_errors() {
        let errors = validate(&schema(), "{ doesNotExist }").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("doesNotExist"));
    }

    #[test]
    fn test_execute_root_value() {
        let options = ExecutionOptions::new().root_value(json!({"hello": "world"}));
        let response = run("{ hello }", GraphQlParameters::new("{ hello }"), &options);
        assert_eq!(response.data, Some(json!({"hello": "world"})));
        assert!(response.errors.is_none());
    }

    #[test]
    fn test_execute_resolvers_and_context() {
        let resolvers = ResolverMap::new()
            .with_fn("Query", "hello", |_parent, args, ctx, _info| {
                let name: String = args.get_as("name").unwrap_or_else(|| "world".into());
                let greeting = ctx.get_as::<String>("greeting").unwrap_or_default();
                Ok(json!(format!("{greeting} {name}")))
            })
            .with_fn("Query", "users", |_parent, _args, _ctx, _info| {
                Ok(json!([{"id": "1", "first_name": "Ada"}, {"id": "2", "firstName": "Alan"}]))
            });
        let options = ExecutionOptions::new()
            .context_value(json!({"greeting": "Hi"}))
            .resolvers(resolvers);

        let query = r#"query Q($n: String) { hello(name: $n) users { id firstName } }"#;
        let mut variables = Map::new();
        variables.insert("n".into(), json!("Bob"));
        let params = GraphQlParameters::new(query).variables(variables);

        let response = run(query, params, &options);
        assert_eq!(
            response.data,
            Some(json!({
                "hello": "Hi Bob",
                "users": [{"id": "1", "firstName": "Ada"}, {"id": "2", "firstName": "Alan"}]
            }))
        );
    }

    #[test]
    fn test_execute_type_resolver() {
        let resolvers = ResolverMap::new().with_fn("Query", "node", |_parent, _args, _ctx, _info| {
            Ok(json!({"__typename": "Post", "id": "p1", "title": "Hello"}))
        });
        let options = ExecutionOptions::new().resolvers(resolvers);
        let query = "{ node { id ... on Post { title } } }";

        let response = run(query, GraphQlParameters::new(query), &options);
        assert_eq!(
            response.data,
            Some(json!({"node": {"id": "p1", "title": "Hello"}}))
        );
    }

    #[test]
    fn test_execute_field_error_nullifies_root() {
        let resolvers = ResolverMap::new().with_fn("Query", "strict", |_parent, _args, _ctx, _info| {
            Err(ResolverError::custom("no strict value"))
        });
        let options = ExecutionOptions::new().resolvers(resolvers);

        let response = run("{ strict }", GraphQlParameters::new("{ strict }"), &options);
        assert_eq!(response.data, Some(Value::Null));
        assert_eq!(response.errors()[0].message, "no strict value");
    }

    #[test]
    fn test_execute_custom_scalar_arrays() {
        let schema = Schema::parse("scalar JSON type Query { tags: JSON blob: JSON list: [JSON] }")
            .unwrap();
        let resolvers = ResolverMap::new()
            .with_fn("Query", "tags", |_parent, _args, _ctx, _info| Ok(json!(["a", "b"])))
            .with_fn("Query", "blob", |_parent, _args, _ctx, _info| Ok(json!({"k": [1, 2]})))
            .with_fn("Query", "list", |_parent, _args, _ctx, _info| {
                Ok(json!([[1], {"k": 2}]))
            });
        let options = ExecutionOptions::new().resolvers(resolvers);
        let query = "{ tags blob list }";
        let validated = validate(&schema, query).unwrap();

        let response = execute(&schema, &validated, &GraphQlParameters::new(query), &options).unwrap();
        assert!(response.errors.is_none());
        assert_eq!(
            response.data,
            Some(json!({"tags": ["a", "b"], "blob": {"k": [1, 2]}, "list": [[1], {"k": 2}]}))
        );
    }

    #[test]
    fn test_execute_unknown_operation() {
        let schema = schema();
        let query = "query A { hello }";
        let validated = validate(&schema, query).unwrap();
        let params = GraphQlParameters::new(query).operation_name("B");

        let errors = execute(&schema, &validated, &params, &ExecutionOptions::new()).unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_execute_variable_coercion_error() {
        let schema = schema();
        let query = "query ($id: ID!) { user(id: $id) { id } }";
        let validated = validate(&schema, query).unwrap();

        let errors = execute(
            &schema,
            &validated,
            &GraphQlParameters::new(query),
            &ExecutionOptions::new(),
        )
        .unwrap_err();
        assert_eq!(errors.len(), 1);
    }
}
