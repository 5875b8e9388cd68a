//! OData v4 resource addressing and collection query core
//!
//! Translates a URL path into a chain of resolved resources (collections,
//! entities, keyed lookups) and serves paginated views over an abstract data
//! source. HTTP transport, concrete data-source adapters, and the full
//! `$filter` grammar live outside this crate.

pub mod collection;
pub mod context;
pub mod error;
pub mod key;
pub mod model;
pub mod orderby;
pub mod pagination;
pub mod path;
pub mod problem_mapping;
pub mod tokenizer;
pub mod value;

pub use collection::CollectionInstance;
pub use context::{QueryOptions, RequestContext};
pub use error::Error;
pub use key::{KeyValue, resolve_key};
pub use model::{
    Capability, CapabilitySet, CollectionDefinition, Entity, Identifier, KeyKind,
    NavigationBinding, Property, ReferentialConstraint, ResourceModel,
};
pub use orderby::parse_orderby;
pub use pagination::{DataSource, PageReader};
pub use path::{Outcome, PathResolver, SegmentHandler, SegmentStep, Target};
pub use tokenizer::Tokenizer;
pub use value::{PrimitiveKind, PrimitiveValue};

// Ordering primitives
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SortDir {
    #[serde(rename = "asc")]
    Asc,
    #[serde(rename = "desc")]
    Desc,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderKey {
    pub field: String,
    pub dir: SortDir,
}

/// Ordered list of sort keys parsed from `$orderby`. Order defines sort
/// precedence; duplicates are deliberately preserved for the data source to
/// interpret.
#[derive(Clone, Debug, Default, PartialEq)]
#[must_use]
pub struct OrderBy(pub Vec<OrderKey>);

impl OrderBy {
    pub fn empty() -> Self {
        Self(vec![])
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl std::fmt::Display for OrderBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return write!(f, "(none)");
        }

        let formatted: Vec<String> = self
            .0
            .iter()
            .map(|key| {
                let dir_str = match key.dir {
                    SortDir::Asc => "asc",
                    SortDir::Desc => "desc",
                };
                format!("{} {}", key.field, dir_str)
            })
            .collect();

        write!(f, "{}", formatted.join(", "))
    }
}
