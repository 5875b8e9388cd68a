//! Unified error type for resource addressing and collection queries
//!
//! Every client-facing failure is a distinct variant so the transport layer
//! can produce protocol-accurate diagnostics. Parse failures carry the
//! offending cursor position. "This handler does not own this segment" is
//! *not* an error: the resolution chain models it as
//! [`Outcome::NotApplicable`](crate::path::Outcome).

use crate::value::PrimitiveKind;

/// Unified error type for all addressing and query operations.
///
/// ## HTTP mapping
///
/// These errors map to RFC 9457 Problem responses via `problem_mapping`:
/// syntax, key, and query-option errors → 400; unresolved segments and
/// missing entities → 404; unsupported query options → 501.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Tokenizer failures
    #[error("syntax error at position {pos}: {message}")]
    Syntax { pos: usize, message: String },

    #[error("type mismatch at position {pos}: expected {expected} literal")]
    TypeMismatch { pos: usize, expected: PrimitiveKind },

    // Key resolution failures
    #[error("key expression is empty")]
    MissingKey,

    #[error("'{0}' is not an alternative key")]
    NotAnAlternateKey(String),

    #[error("invalid value for key property '{property}': expected {expected}")]
    InvalidKeyValue {
        property: String,
        expected: PrimitiveKind,
    },

    #[error("unknown alias '@{0}'")]
    UnknownAlias(String),

    // $orderby failures
    #[error("invalid $orderby expression: {0}")]
    OrderBySyntax(String),

    #[error("invalid sort direction '{0}', expected 'asc' or 'desc'")]
    InvalidSortDirection(String),

    // Query option failures
    #[error("invalid {option} value: {message}")]
    InvalidQueryOption {
        option: &'static str,
        message: String,
    },

    // Path resolution failures
    #[error("entity set '{segment}' does not support composition from this type")]
    UnsupportedComposition { segment: String },

    #[error("resource segment '{0}' could not be resolved")]
    SegmentNotFound(String),

    #[error("no entity in '{set}' matches key {key}")]
    KeyNotFound { set: String, key: String },

    #[error("{0} is not supported by this collection")]
    NotImplemented(&'static str),

    // Registration and collaborator faults
    #[error("invalid resource model: {0}")]
    InvalidModel(String),

    #[error("data source error: {0}")]
    Source(String),
}
