//! Per-request collection instances
//!
//! A [`CollectionInstance`] binds one registered [`CollectionDefinition`] to
//! the active request. It is always constructed fresh — the shared
//! registered definition is never mutated — so concurrent requests cannot
//! interfere through pagination state.

use std::sync::Arc;

use tracing::debug;

use crate::context::RequestContext;
use crate::error::Error;
use crate::key::KeyValue;
use crate::model::{Capability, CollectionDefinition, Entity};
use crate::pagination::{DataSource, PageReader};

/// A stateful, request-scoped handle over one collection.
///
/// `Debug` elides the data source, which is an opaque trait object.
pub struct CollectionInstance {
    definition: Arc<CollectionDefinition>,
    source: Arc<dyn DataSource>,
    skip: Option<u64>,
    top: Option<u64>,
    reader_taken: bool,
}

impl std::fmt::Debug for CollectionInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionInstance")
            .field("definition", &self.definition)
            .field("skip", &self.skip)
            .field("top", &self.top)
            .field("reader_taken", &self.reader_taken)
            .finish_non_exhaustive()
    }
}

impl CollectionInstance {
    /// Bind a fresh instance for the given request, running the query-option
    /// capability gate against the definition.
    ///
    /// # Errors
    /// `Error::NotImplemented` when the request carries a query option the
    /// collection does not declare.
    pub fn bind(
        definition: Arc<CollectionDefinition>,
        source: Arc<dyn DataSource>,
        ctx: &RequestContext,
    ) -> Result<Self, Error> {
        ctx.options().validate_against(&definition)?;
        debug!(collection = %definition.name(), "bound collection instance");
        Ok(Self {
            definition,
            source,
            skip: ctx.options().skip,
            top: ctx.options().top,
            reader_taken: false,
        })
    }

    #[must_use]
    pub fn definition(&self) -> &CollectionDefinition {
        &self.definition
    }

    /// Take the pagination cursor for this instance.
    ///
    /// # Panics
    /// Panics when called twice: an instance's cursor is forward-only and
    /// single-use. Re-entering a consumed instance is a programming error,
    /// not a request error — bind a fresh instance instead.
    pub fn reader(&mut self) -> PageReader {
        assert!(
            !self.reader_taken,
            "collection instance already consumed; bind a fresh instance per request"
        );
        self.reader_taken = true;
        PageReader::new(
            Arc::clone(&self.source),
            self.definition
                .capabilities()
                .supports(Capability::ServerDrivenPaging),
            self.skip,
            self.top,
            self.definition.max_page_size(),
        )
    }

    /// Fetch the single entity matching a resolved key.
    ///
    /// # Errors
    /// Propagates `Error::Source` from the data source.
    pub fn read_by_key(&self, key: &KeyValue) -> Result<Option<Entity>, Error> {
        self.source.read_by_key(key)
    }

    /// Exact total count, when the data source supports it.
    ///
    /// # Errors
    /// Propagates `Error::Source` from the data source.
    pub fn total_count(&self) -> Result<Option<u64>, Error> {
        self.source.total_count()
    }
}
