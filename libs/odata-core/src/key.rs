//! Key-expression resolution
//!
//! Given the text between a path segment's parentheses, decides whether it
//! denotes the default key, an alternate key, or a referenced-value
//! indirection (`Name=@alias`), and produces a typed key value bound to
//! exactly one property.
//!
//! The tentative `name=` parse commits only when the name exists on the
//! collection; an unknown name unwinds the tokenizer and the whole text
//! re-parses as the default key's value, so a `=` inside a bare literal does
//! not misfire. A known property that is not flagged as an alternate key is
//! a hard error, never a fallback.

use std::fmt;

use crate::context::RequestContext;
use crate::error::Error;
use crate::model::{CollectionDefinition, KeyKind, Property};
use crate::tokenizer::Tokenizer;
use crate::value::PrimitiveValue;

/// A typed key literal bound to exactly one property.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyValue {
    pub property: Property,
    pub value: PrimitiveValue,
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.property.name, self.value)
    }
}

/// Resolve a parenthesized key expression against a collection definition.
///
/// # Errors
/// - `Error::MissingKey` when the expression is empty.
/// - `Error::NotAnAlternateKey` when `name=` names a property that is not an
///   alternate key.
/// - `Error::UnknownAlias` when `name=@alias` references a value the request
///   never bound.
/// - `Error::InvalidKeyValue` when the literal does not parse as the bound
///   property's type.
pub fn resolve_key(
    expr: &str,
    definition: &CollectionDefinition,
    ctx: &RequestContext,
) -> Result<KeyValue, Error> {
    if expr.is_empty() {
        return Err(Error::MissingKey);
    }

    let mut tok = Tokenizer::new(expr);
    let mark = tok.pos();

    // Tentative alternate-key match: `name=` followed by a literal or an
    // `@alias` indirection.
    if let Some(name) = tok.maybe_identifier() {
        if tok.maybe_char('=') {
            if let Some(property) = definition.property(name) {
                if property.key != KeyKind::Alternate {
                    return Err(Error::NotAnAlternateKey(name.to_owned()));
                }
                let property = property.clone();
                if tok.maybe_char('@') {
                    let alias = tok.match_identifier()?;
                    if !tok.finished() {
                        return Err(Error::Syntax {
                            pos: tok.pos(),
                            message: "unexpected input after alias reference".to_owned(),
                        });
                    }
                    let bound = ctx
                        .alias(alias)
                        .ok_or_else(|| Error::UnknownAlias(alias.to_owned()))?;
                    return bind(property, &mut Tokenizer::new(bound));
                }
                return bind(property, &mut tok);
            }
            // The name is not a property of this collection: the `=` was
            // part of the value literal. Unwind and retry as default key.
        }
        tok.seek(mark);
    }

    let property = definition
        .default_key()
        .ok_or_else(|| {
            Error::InvalidModel(format!(
                "collection '{}' declares no default key",
                definition.name()
            ))
        })?
        .clone();
    bind(property, &mut tok)
}

fn bind(property: Property, tok: &mut Tokenizer<'_>) -> Result<KeyValue, Error> {
    let value = tok.typed_value(property.kind).map_err(|err| match err {
        Error::Syntax { .. } | Error::TypeMismatch { .. } => Error::InvalidKeyValue {
            property: property.name.clone(),
            expected: property.kind,
        },
        other => other,
    })?;
    if !tok.finished() {
        return Err(Error::InvalidKeyValue {
            property: property.name,
            expected: value.kind(),
        });
    }
    Ok(KeyValue { property, value })
}
