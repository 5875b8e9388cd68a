//! Per-request state: parsed query options and alias bindings
//!
//! A [`RequestContext`] is owned exclusively by the request that created it
//! and never shared. It carries the parsed system query options, the `@name`
//! alias bindings used by referenced-value key lookups, and the helpers that
//! build continuation URLs.

use std::collections::HashMap;

use crate::OrderBy;
use crate::error::Error;
use crate::model::{Capability, CollectionDefinition};
use crate::orderby::parse_orderby;

/// Recognized system query options, parsed once per request. The original
/// parameter list is retained verbatim so continuation URLs can copy it.
#[derive(Clone, Debug, Default)]
pub struct QueryOptions {
    params: Vec<(String, String)>,
    pub count: Option<String>,
    pub filter: Option<String>,
    pub orderby: Option<OrderBy>,
    pub search: Option<String>,
    pub skip: Option<u64>,
    pub top: Option<u64>,
    pub expand: Option<String>,
}

impl QueryOptions {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a raw query string (without the leading `?`).
    ///
    /// # Errors
    /// `Error::InvalidQueryOption` on a malformed query string or a
    /// non-numeric `$top`/`$skip`; `$orderby` errors propagate from the
    /// sort-order parser.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let params: Vec<(String, String)> =
            serde_urlencoded::from_str(raw).map_err(|e| Error::InvalidQueryOption {
                option: "query string",
                message: e.to_string(),
            })?;

        let mut options = Self::default();
        for (name, value) in &params {
            match name.as_str() {
                "$count" => options.count = Some(value.clone()),
                "$filter" => options.filter = Some(value.clone()),
                "$orderby" if !value.is_empty() => {
                    options.orderby = Some(parse_orderby(value)?);
                }
                "$search" => options.search = Some(value.clone()),
                "$skip" => options.skip = Some(parse_unsigned("$skip", value)?),
                "$top" => options.top = Some(parse_unsigned("$top", value)?),
                "$expand" => options.expand = Some(value.clone()),
                _ => {}
            }
        }
        options.params = params;
        Ok(options)
    }

    /// Original query parameters in request order.
    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Capability gate: every recognized option present with a value must be
    /// declared supported by the target collection.
    ///
    /// # Errors
    /// `Error::NotImplemented` naming the first unsupported option.
    pub fn validate_against(&self, definition: &CollectionDefinition) -> Result<(), Error> {
        let caps = definition.capabilities();
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());

        if present(&self.count) && !caps.supports(Capability::Count) {
            return Err(Error::NotImplemented("$count"));
        }
        if present(&self.filter) && !caps.supports(Capability::Filter) {
            return Err(Error::NotImplemented("$filter"));
        }
        if self.orderby.as_ref().is_some_and(|o| !o.is_empty())
            && !caps.supports(Capability::OrderBy)
        {
            return Err(Error::NotImplemented("$orderby"));
        }
        if present(&self.search) && !caps.supports(Capability::Search) {
            return Err(Error::NotImplemented("$search"));
        }
        if self.skip.is_some() && !caps.supports(Capability::Skip) {
            return Err(Error::NotImplemented("$skip"));
        }
        if self.top.is_some() && !caps.supports(Capability::Top) {
            return Err(Error::NotImplemented("$top"));
        }
        if present(&self.expand) && !caps.supports(Capability::Expand) {
            return Err(Error::NotImplemented("$expand"));
        }
        Ok(())
    }
}

fn parse_unsigned(option: &'static str, value: &str) -> Result<u64, Error> {
    value.parse::<u64>().map_err(|_| Error::InvalidQueryOption {
        option,
        message: format!("'{value}' is not a non-negative integer"),
    })
}

/// Per-request context: the request path, its parsed query options, and the
/// `@name` values bound by the request.
#[derive(Clone, Debug)]
pub struct RequestContext {
    path: String,
    options: QueryOptions,
    aliases: HashMap<String, String>,
}

impl RequestContext {
    /// Bind a context for one request. Query parameters whose name starts
    /// with `@` become alias bindings for referenced-value key lookups.
    #[must_use]
    pub fn new(path: impl Into<String>, options: QueryOptions) -> Self {
        let aliases = options
            .params
            .iter()
            .filter_map(|(name, value)| {
                name.strip_prefix('@')
                    .map(|alias| (alias.to_owned(), value.clone()))
            })
            .collect();
        Self {
            path: path.into(),
            options,
            aliases,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Resolve a previously bound `@name` value.
    #[must_use]
    pub fn alias(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    /// Build the continuation URL for the page after the current window.
    ///
    /// Emitted iff `top + skip < total`: the current query parameters are
    /// copied and `$skip` is replaced with `top + skip`.
    #[must_use]
    pub fn next_link(&self, total: u64) -> Option<String> {
        let top = self.options.top?;
        let skip = self.options.skip.unwrap_or(0);
        // A window too large to represent covers everything.
        let end = top.checked_add(skip)?;
        if end >= total {
            return None;
        }
        let next_skip = end.to_string();

        let mut params = self.options.params.clone();
        let mut replaced = false;
        for (name, value) in &mut params {
            if name == "$skip" {
                *value = next_skip.clone();
                replaced = true;
            }
        }
        if !replaced {
            params.push(("$skip".to_owned(), next_skip));
        }
        let query = serde_urlencoded::to_string(&params).ok()?;
        Some(format!("{}?{}", self.path, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CapabilitySet, CollectionDefinition};
    use crate::{SortDir, value::PrimitiveKind};

    fn gadgets(caps: CapabilitySet) -> CollectionDefinition {
        CollectionDefinition::builder("Gadgets", "Gadget")
            .property(crate::model::Property::default_key(
                "Id",
                PrimitiveKind::Int32,
            ))
            .capabilities(caps)
            .build()
            .unwrap()
    }

    #[test]
    fn options_parse_window_and_order() {
        let opts = QueryOptions::parse("$top=5&$skip=10&$orderby=name%20desc").unwrap();
        assert_eq!(opts.top, Some(5));
        assert_eq!(opts.skip, Some(10));
        let order = opts.orderby.unwrap();
        assert_eq!(order.0[0].field, "name");
        assert_eq!(order.0[0].dir, SortDir::Desc);
    }

    #[test]
    fn non_numeric_top_is_rejected() {
        let err = QueryOptions::parse("$top=abc").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidQueryOption { option: "$top", .. }
        ));
    }

    #[test]
    fn unrecognized_parameters_are_ignored() {
        let opts = QueryOptions::parse("foo=bar&$top=1").unwrap();
        assert_eq!(opts.top, Some(1));
        assert_eq!(opts.params().len(), 2);
    }

    #[test]
    fn gate_rejects_undeclared_option_by_name() {
        let def = gadgets(CapabilitySet::standard());
        let opts = QueryOptions::parse("$search=widgets").unwrap();
        assert_eq!(
            opts.validate_against(&def),
            Err(Error::NotImplemented("$search"))
        );
    }

    #[test]
    fn gate_accepts_declared_options() {
        let def = gadgets(CapabilitySet::standard());
        let opts = QueryOptions::parse("$top=5&$skip=1&$count=true").unwrap();
        assert!(opts.validate_against(&def).is_ok());
    }

    #[test]
    fn gate_ignores_options_without_a_value() {
        let def = gadgets(CapabilitySet::empty());
        let opts = QueryOptions::parse("$search=").unwrap();
        assert!(opts.validate_against(&def).is_ok());
    }

    #[test]
    fn alias_parameters_are_bound() {
        let opts = QueryOptions::parse("%40code=ABC").unwrap();
        let ctx = RequestContext::new("/Widgets", opts);
        assert_eq!(ctx.alias("code"), Some("ABC"));
        assert_eq!(ctx.alias("other"), None);
    }

    #[test]
    fn next_link_replaces_skip() {
        let opts = QueryOptions::parse("$top=5&$skip=10").unwrap();
        let ctx = RequestContext::new("/Widgets", opts);
        let link = ctx.next_link(100).unwrap();
        assert_eq!(link, "/Widgets?%24top=5&%24skip=15");
    }

    #[test]
    fn next_link_appends_skip_when_absent() {
        let opts = QueryOptions::parse("$top=5").unwrap();
        let ctx = RequestContext::new("/Widgets", opts);
        let link = ctx.next_link(100).unwrap();
        assert!(link.ends_with("%24skip=5"));
    }

    #[test]
    fn next_link_is_omitted_when_window_covers_total() {
        let opts = QueryOptions::parse("$top=5&$skip=10").unwrap();
        let ctx = RequestContext::new("/Widgets", opts);
        assert!(ctx.next_link(15).is_none());
        assert!(ctx.next_link(12).is_none());
        assert!(ctx.next_link(16).is_some());
    }

    #[test]
    fn next_link_treats_an_overflowing_window_as_exhausted() {
        let opts = QueryOptions::parse("$top=18446744073709551615&$skip=1").unwrap();
        let ctx = RequestContext::new("/Widgets", opts);
        assert!(ctx.next_link(u64::MAX).is_none());
        assert!(ctx.next_link(100).is_none());
    }

    #[test]
    fn next_link_requires_a_top() {
        let opts = QueryOptions::parse("$skip=10").unwrap();
        let ctx = RequestContext::new("/Widgets", opts);
        assert!(ctx.next_link(100).is_none());
    }
}
