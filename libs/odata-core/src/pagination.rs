//! Collection pagination engine
//!
//! A [`PageReader`] is a forward-only cursor over an abstract data source.
//! It reconciles two windows: the server-side maximum page size declared on
//! the collection definition, and the client-requested `$top`/`$skip`. A
//! client may ask for more entities than the source returns per fetch; the
//! reader transparently issues further fetches as the current page is
//! exhausted, never surfacing more than the client's `$top` in total.
//!
//! There is no rewind operation: the cursor state only advances, matching
//! streaming emission. Fetching is the only blocking point and happens only
//! when the current page is exhausted and more entities are both wanted and
//! permitted.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::Error;
use crate::key::KeyValue;
use crate::model::Entity;

/// Abstract source of entity pages. Implementations are external
/// collaborators (database adapters, remote services); `fetch_page` may
/// block on I/O.
pub trait DataSource: Send + Sync {
    /// Fetch up to `top` entities, skipping the first `skip`, in the
    /// source's stable order. `None` means the source's default page size.
    ///
    /// # Errors
    /// `Error::Source` on an adapter failure.
    fn fetch_page(&self, skip: u64, top: Option<u64>) -> Result<Vec<Entity>, Error>;

    /// Fetch the single entity matching `key`, if any.
    ///
    /// # Errors
    /// `Error::Source` on an adapter failure.
    fn read_by_key(&self, key: &KeyValue) -> Result<Option<Entity>, Error>;

    /// Exact total count, when the source supports it.
    ///
    /// # Errors
    /// `Error::Source` on an adapter failure.
    fn total_count(&self) -> Result<Option<u64>, Error> {
        Ok(None)
    }
}

/// Stateful, forward-only iterator over one collection. The cursor state
/// (`skip`, `top`, `top_limit`, `fetched`) is monotonically advanced and
/// never shared across requests.
pub struct PageReader {
    source: Arc<dyn DataSource>,
    /// Whether the source can be asked for further pages past a short page.
    server_paging: bool,
    skip: u64,
    /// Requested size of the next fetch; `None` is unbounded.
    top: Option<u64>,
    /// Absolute cap on entities ever surfaced; `None` is unbounded.
    top_limit: Option<u64>,
    fetched: u64,
    page: Option<Vec<Entity>>,
    cursor: usize,
}

impl PageReader {
    pub(crate) fn new(
        source: Arc<dyn DataSource>,
        server_paging: bool,
        client_skip: Option<u64>,
        client_top: Option<u64>,
        max_page_size: Option<u64>,
    ) -> Self {
        let top = match (client_top, max_page_size) {
            (Some(t), Some(m)) => Some(t.min(m)),
            (Some(t), None) => Some(t),
            (None, m) => m,
        };
        Self {
            source,
            server_paging,
            skip: client_skip.unwrap_or(0),
            top,
            top_limit: client_top,
            fetched: 0,
            page: None,
            cursor: 0,
        }
    }

    /// True iff the cursor points at an entity, fetching lazily as needed.
    ///
    /// Idempotent: repeated calls without [`advance`](Self::advance) never
    /// trigger additional fetches.
    ///
    /// # Errors
    /// Propagates `Error::Source` from the data source.
    pub fn has_current(&mut self) -> Result<bool, Error> {
        if self.top == Some(0) {
            return Ok(false);
        }
        if self.page.is_none() {
            self.fetch()?;
        }
        loop {
            let page_len = self.page.as_ref().map_or(0, Vec::len);
            if self.cursor < page_len {
                return Ok(true);
            }
            // Cursor is past the end of the current page.
            if !self.server_paging || page_len == 0 {
                // A short or empty page is the end of the source when it
                // cannot be asked for more.
                return Ok(false);
            }
            if let Some(limit) = self.top_limit {
                if self.fetched >= limit {
                    trace!(fetched = self.fetched, limit, "top limit reached");
                    return Ok(false);
                }
                let remaining = limit - self.fetched;
                self.top = Some(self.top.map_or(remaining, |t| t.min(remaining)));
            }
            self.skip += page_len as u64;
            self.fetch()?;
        }
    }

    /// The entity under the cursor, if [`has_current`](Self::has_current)
    /// last returned true.
    #[must_use]
    pub fn current(&self) -> Option<&Entity> {
        self.page.as_ref().and_then(|p| p.get(self.cursor))
    }

    /// Move the cursor one entity forward. Crossing the page boundary defers
    /// the next fetch to the following `has_current` call.
    pub fn advance(&mut self) {
        self.cursor += 1;
    }

    /// Size of the page currently held, forcing at least one fetch. `None`
    /// when no fetch has occurred (zero-size request). This is a best-effort
    /// page-local count, not the full collection size.
    ///
    /// # Errors
    /// Propagates `Error::Source` from the data source.
    pub fn count(&mut self) -> Result<Option<usize>, Error> {
        let _ = self.has_current()?;
        Ok(self.page.as_ref().map(Vec::len))
    }

    /// Running total of entities fetched so far.
    #[must_use]
    pub fn fetched(&self) -> u64 {
        self.fetched
    }

    /// Read the remainder of the window into a vector.
    ///
    /// # Errors
    /// Propagates `Error::Source` from the data source.
    pub fn drain(mut self) -> Result<Vec<Entity>, Error> {
        let mut out = Vec::new();
        while self.has_current()? {
            if let Some(entity) = self.current() {
                out.push(entity.clone());
            }
            self.advance();
        }
        Ok(out)
    }

    fn fetch(&mut self) -> Result<(), Error> {
        debug!(skip = self.skip, top = ?self.top, "fetching page from data source");
        let mut page = self.source.fetch_page(self.skip, self.top)?;
        if let Some(top) = self.top {
            // A misbehaving source must not push the reader past its window.
            page.truncate(usize::try_from(top).unwrap_or(usize::MAX));
        }
        self.fetched += page.len() as u64;
        trace!(page_len = page.len(), fetched = self.fetched, "page fetched");
        self.page = Some(page);
        self.cursor = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::value::PrimitiveValue;

    fn entity(id: i32) -> Entity {
        Entity::new([("Id", PrimitiveValue::Int32(id))])
    }

    /// In-memory source with a fixed per-fetch page cap, logging every fetch.
    struct CappedSource {
        rows: Vec<Entity>,
        page_cap: u64,
        log: Mutex<Vec<(u64, Option<u64>)>>,
    }

    impl CappedSource {
        fn of(count: i32, page_cap: u64) -> Self {
            Self {
                rows: (0..count).map(entity).collect(),
                page_cap,
                log: Mutex::new(Vec::new()),
            }
        }

        fn fetches(&self) -> Vec<(u64, Option<u64>)> {
            self.log.lock().unwrap().clone()
        }
    }

    impl DataSource for CappedSource {
        fn fetch_page(&self, skip: u64, top: Option<u64>) -> Result<Vec<Entity>, Error> {
            self.log.lock().unwrap().push((skip, top));
            let want = top.unwrap_or(self.page_cap).min(self.page_cap);
            let start = usize::try_from(skip).unwrap().min(self.rows.len());
            let end = (start + usize::try_from(want).unwrap()).min(self.rows.len());
            Ok(self.rows[start..end].to_vec())
        }

        fn read_by_key(&self, key: &KeyValue) -> Result<Option<Entity>, Error> {
            Ok(self
                .rows
                .iter()
                .find(|e| e.get(&key.property.name) == Some(&key.value))
                .cloned())
        }
    }

    fn reader(source: &Arc<CappedSource>, skip: Option<u64>, top: Option<u64>) -> PageReader {
        PageReader::new(
            Arc::clone(source) as Arc<dyn DataSource>,
            true,
            skip,
            top,
            None,
        )
    }

    #[test]
    fn large_top_spans_multiple_fetches() {
        let source = Arc::new(CappedSource::of(100, 10));
        let r = reader(&source, None, Some(25));
        let rows = r.drain().unwrap();

        assert_eq!(rows.len(), 25);
        assert_eq!(rows[0], entity(0));
        assert_eq!(rows[24], entity(24));
        let fetches = source.fetches();
        assert!(fetches.len() <= 3, "expected at most 3 fetches: {fetches:?}");
        assert_eq!(fetches[0], (0, Some(25)));
        assert_eq!(fetches[1], (10, Some(15)));
        assert_eq!(fetches[2], (20, Some(5)));
    }

    #[test]
    fn fetched_never_exceeds_the_top_limit() {
        let source = Arc::new(CappedSource::of(100, 10));
        let mut r = reader(&source, None, Some(25));
        while r.has_current().unwrap() {
            assert!(r.fetched() <= 25);
            r.advance();
        }
        assert_eq!(r.fetched(), 25);
    }

    #[test]
    fn skip_is_forwarded_and_advanced() {
        let source = Arc::new(CappedSource::of(13, 3));
        let r = reader(&source, Some(10), Some(5));
        let rows = r.drain().unwrap();

        // Only 3 rows exist past skip=10; the source is then exhausted via
        // an empty page.
        assert_eq!(rows.len(), 3);
        let fetches = source.fetches();
        assert_eq!(fetches[0], (10, Some(5)));
        assert_eq!(fetches[1], (13, Some(2)));
    }

    #[test]
    fn short_page_without_server_paging_is_exhaustion() {
        let source = Arc::new(CappedSource::of(100, 10));
        let mut r = PageReader::new(
            Arc::clone(&source) as Arc<dyn DataSource>,
            false,
            None,
            Some(25),
            None,
        );
        let mut n = 0;
        while r.has_current().unwrap() {
            n += 1;
            r.advance();
        }
        assert_eq!(n, 10);
        assert_eq!(source.fetches().len(), 1);
    }

    #[test]
    fn has_current_is_idempotent() {
        let source = Arc::new(CappedSource::of(5, 10));
        let mut r = reader(&source, None, Some(3));
        assert!(r.has_current().unwrap());
        assert!(r.has_current().unwrap());
        assert!(r.has_current().unwrap());
        assert_eq!(source.fetches().len(), 1);
        assert_eq!(r.current(), Some(&entity(0)));
    }

    #[test]
    fn zero_top_never_fetches() {
        let source = Arc::new(CappedSource::of(5, 10));
        let mut r = reader(&source, None, Some(0));
        assert!(!r.has_current().unwrap());
        assert!(source.fetches().is_empty());
        assert_eq!(r.count().unwrap(), None);
    }

    #[test]
    fn count_is_page_local() {
        let source = Arc::new(CappedSource::of(30, 10));
        let mut r = reader(&source, None, None);
        assert_eq!(r.count().unwrap(), Some(10));
        // Counting again does not fetch more.
        assert_eq!(r.count().unwrap(), Some(10));
        assert_eq!(source.fetches().len(), 1);
    }

    #[test]
    fn max_page_size_caps_the_first_fetch() {
        let source = Arc::new(CappedSource::of(100, 50));
        let r = PageReader::new(
            Arc::clone(&source) as Arc<dyn DataSource>,
            true,
            None,
            Some(25),
            Some(10),
        );
        let rows = r.drain().unwrap();
        assert_eq!(rows.len(), 25);
        assert_eq!(source.fetches()[0], (0, Some(10)));
    }

    #[test]
    fn exhausted_source_yields_fewer_than_requested() {
        let source = Arc::new(CappedSource::of(7, 10));
        let r = reader(&source, None, Some(25));
        assert_eq!(r.drain().unwrap().len(), 7);
    }
}
