//! GraphQL request parameters.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Parameters of a single GraphQL request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlParameters {
    /// Source text of the GraphQL document.
    pub query: String,
    /// Variable values keyed by variable name.
    #[serde(default)]
    pub variables: Option<Map<String, Value>>,
    /// Operation to execute when the document holds several.
    #[serde(default)]
    pub operation_name: Option<String>,
    /// Protocol extensions. Carried through untouched.
    #[serde(default)]
    pub extensions: Option<Map<String, Value>>,
}

impl GraphQlParameters {
    /// Creates parameters holding only a query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Sets the variables.
    pub fn variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = Some(variables);
        self
    }

    /// Sets the operation name.
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Sets the extensions.
    pub fn extensions(mut self, extensions: Map<String, Value>) -> Self {
        self.extensions = Some(extensions);
        self
    }
}

/// Why a JSON value could not be decoded as [`GraphQlParameters`].
///
/// Messages are the protocol's own and are sent to clients verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParameterError {
    #[error("The message body is invalid. Must be JSON object format.")]
    NotAnObject,
    #[error(r#"The parameter is required. "query""#)]
    MissingQuery,
    #[error(r#"The parameter is invalid. "query" must be string."#)]
    QueryNotString,
    #[error(r#"The parameter is invalid. "variables" must be JSON object format"#)]
    VariablesNotObject,
    #[error(r#"The parameter is invalid. "operationName" must be string or null."#)]
    OperationNameNotString,
    #[error(r#"The parameter is invalid. "extensions" must be JSON object format"#)]
    ExtensionsNotObject,
}

/// Decodes an untrusted JSON value as [`GraphQlParameters`].
///
/// The value must be an object with a non-empty string `query`; a null
/// `query` counts as missing. `variables` and `extensions` must be objects or
/// null, `operationName` a string or null. Absent optional fields decode to `None`.
pub fn parse_parameters(value: &Value) -> Result<GraphQlParameters, ParameterError> {
    let object = value.as_object().ok_or(ParameterError::NotAnObject)?;

    let query = match object.get("query") {
        Some(Value::String(query)) if !query.is_empty() => query.clone(),
        None | Some(Value::Null) | Some(Value::String(_)) => {
            return Err(ParameterError::MissingQuery)
        }
        Some(_) => return Err(ParameterError::QueryNotString),
    };

    let variables = optional_object(object.get("variables"))
        .map_err(|ShapeMismatch| ParameterError::VariablesNotObject)?;
    let operation_name = optional_string(object.get("operationName"))
        .map_err(|ShapeMismatch| ParameterError::OperationNameNotString)?;
    let extensions = optional_object(object.get("extensions"))
        .map_err(|ShapeMismatch| ParameterError::ExtensionsNotObject)?;

    Ok(GraphQlParameters {
        query,
        variables,
        operation_name,
        extensions,
    })
}

/// A JSON value of the wrong shape for its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ShapeMismatch;

/// `null` or absent decodes to `None`, an object to `Some`, anything else fails.
fn optional_object(value: Option<&Value>) -> Result<Option<Map<String, Value>>, ShapeMismatch> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map.clone())),
        Some(_) => Err(ShapeMismatch),
    }
}

fn optional_string(value: Option<&Value>) -> Result<Option<String>, ShapeMismatch> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ShapeMismatch),
    }
}
