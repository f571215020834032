//! Runtime for gqlhttp.
//!
//! This crate provides the GraphQL side of a request:
//! - `engine`: Schema construction, parsing, validation and execution
//! - `resolver`: Field resolvers, default resolver and type resolution

pub mod engine;
pub mod resolver;

pub use engine::{
    execute, parse, validate, ExecutionOptions, OperationKind, ParsedQuery, Schema, SchemaError,
    ValidatedQuery,
};
pub use resolver::{
    default_type_resolver, Context, DefaultResolver, FnResolver, Resolver, ResolverArgs,
    ResolverError, ResolverInfo, ResolverMap, ResolverResult,
};
