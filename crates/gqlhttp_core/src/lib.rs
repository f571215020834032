//! Core types for gqlhttp.
//!
//! This crate provides the protocol vocabulary shared by the handler and the client:
//! - `media`: Supported media types and their canonical strings
//! - `error`: Protocol errors with HTTP status hints
//! - `params`: GraphQL request parameters and their typed decoding
//! - `response`: The GraphQL response envelope

pub mod error;
pub mod media;
pub mod params;
pub mod response;

pub use error::{ProtocolError, ProtocolErrorKind, ProtocolResult};
pub use media::MediaType;
pub use params::{parse_parameters, GraphQlParameters, ParameterError};
pub use response::{GraphQlError, GraphQlResponse, Location};
