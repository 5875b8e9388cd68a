//! `$orderby` grammar parser
//!
//! Comma-separated list of `field` or `field asc|desc` expressions. The
//! direction keyword is case-insensitive and defaults to ascending.

use crate::error::Error;
use crate::{OrderBy, OrderKey, SortDir};

/// Parse the raw value of the `$orderby` query option.
///
/// Key order defines sort precedence. Duplicate fields are not deduplicated
/// here; that is the data source's concern.
///
/// # Errors
/// `Error::OrderBySyntax` when an expression has more than two
/// whitespace-separated tokens or is empty; `Error::InvalidSortDirection`
/// when the second token is not `asc` or `desc`.
pub fn parse_orderby(raw: &str) -> Result<OrderBy, Error> {
    let mut keys = Vec::new();
    for expr in raw.split(',') {
        let mut tokens = expr.split_whitespace();
        let Some(field) = tokens.next() else {
            return Err(Error::OrderBySyntax(format!(
                "empty expression in '{raw}'"
            )));
        };
        let dir = match tokens.next() {
            None => SortDir::Asc,
            Some(word) => match word.to_ascii_lowercase().as_str() {
                "asc" => SortDir::Asc,
                "desc" => SortDir::Desc,
                _ => return Err(Error::InvalidSortDirection(word.to_owned())),
            },
        };
        if tokens.next().is_some() {
            return Err(Error::OrderBySyntax(format!(
                "too many tokens in '{}'",
                expr.trim()
            )));
        }
        keys.push(OrderKey {
            field: field.to_owned(),
            dir,
        });
    }
    Ok(OrderBy(keys))
}
