//! Pagination types for list operations.
//!
//! A [`Pagination`] travels with a request: the caller fills the parameter
//! bag with filter criteria, initialises the window from a total count, and
//! attaches the result list once the backend query has run.

use crate::{PageSource, StrataError, StrataResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU32;

/// The default number of items per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// The page a fresh pagination starts on (1-indexed).
pub const DEFAULT_CURRENT_PAGE: u64 = 1;

/// Parameter-bag key under which a front controller passes a preferred page size.
pub const DEFAULT_PAGE_SIZE_ATTR: &str = "defaultPageSize";

/// The derived window of a paginated result set.
///
/// Only [`PageWindow::compute`] produces a window, deserialization included,
/// so every instance satisfies `total_pages == ceil(total_count / page_size)`
/// and `1 <= current_page <= max(total_pages, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RequestedWindow")]
pub struct PageWindow {
    page_size: u32,
    current_page: u64,
    total_pages: u64,
    total_count: u64,
}

impl PageWindow {
    /// Computes a window for `total_count` items split into pages of `page_size`.
    ///
    /// The requested page is clamped into `[1, max(total_pages, 1)]` rather
    /// than rejected.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidArgument`] when `page_size` is zero.
    pub fn compute(total_count: u64, page_size: u32, requested_page: i64) -> StrataResult<Self> {
        if page_size == 0 {
            return Err(StrataError::invalid_argument("page size must be positive"));
        }

        let total_pages = total_count.div_ceil(u64::from(page_size));
        let current_page = if requested_page < 1 {
            1
        } else {
            (requested_page as u64).min(total_pages.max(1))
        };

        Ok(Self {
            page_size,
            current_page,
            total_pages,
            total_count,
        })
    }

    /// Returns the number of items per page.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Returns the current page (1-indexed).
    #[must_use]
    pub const fn current_page(&self) -> u64 {
        self.current_page
    }

    /// Returns the total number of pages.
    #[must_use]
    pub const fn total_pages(&self) -> u64 {
        self.total_pages
    }

    /// Returns the total number of items across all pages.
    #[must_use]
    pub const fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Returns the offset for backend queries.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.current_page
            .saturating_sub(1)
            .saturating_mul(self.page_size as u64)
    }

    /// Returns the limit for backend queries.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.page_size
    }

    /// Returns true if there is a page after the current one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Returns true if there is a page before the current one.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.current_page > 1
    }
}

/// Wire form of a window; `totalPages` is always recomputed.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestedWindow {
    #[serde(default = "default_page_size")]
    page_size: u32,
    #[serde(default = "default_current_page")]
    current_page: u64,
    #[serde(default)]
    total_count: u64,
}

const fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

const fn default_current_page() -> u64 {
    DEFAULT_CURRENT_PAGE
}

impl TryFrom<RequestedWindow> for PageWindow {
    type Error = StrataError;

    fn try_from(raw: RequestedWindow) -> StrataResult<Self> {
        let requested = i64::try_from(raw.current_page).unwrap_or(i64::MAX);
        Self::compute(raw.total_count, raw.page_size, requested)
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            current_page: DEFAULT_CURRENT_PAGE,
            total_pages: 0,
            total_count: 0,
        }
    }
}

/// Extra filter and sort criteria passed alongside a pagination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageParams(HashMap<String, Value>);

impl PageParams {
    /// Creates an empty parameter bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a parameter, replacing any previous value under the key.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Returns the parameter stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Removes and returns the parameter stored under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Removes every parameter.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over all parameters in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Returns the page size passed under [`DEFAULT_PAGE_SIZE_ATTR`], if it is a positive integer.
    #[must_use]
    pub fn page_size_hint(&self) -> Option<u32> {
        self.get(DEFAULT_PAGE_SIZE_ATTR)
            .and_then(Value::as_u64)
            .and_then(|size| u32::try_from(size).ok())
            .filter(|size| *size > 0)
    }
}

/// A page of results together with its window and query parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination<T> {
    #[serde(flatten)]
    window: PageWindow,
    /// The items on this page; `None` until the backend query has run.
    #[serde(rename = "list", default = "Option::default")]
    items: Option<Vec<T>>,
    #[serde(default)]
    params: PageParams,
}

impl<T> Pagination<T> {
    /// Creates an empty pagination with the default page size on page 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            window: PageWindow::default(),
            items: None,
            params: PageParams::new(),
        }
    }

    /// Creates an empty pagination on page 1 with the given page size.
    #[must_use]
    pub fn with_page_size(page_size: NonZeroU32) -> Self {
        let mut pagination = Self::new();
        pagination.window.page_size = page_size.get();
        pagination
    }

    /// Creates a pagination already initialised from a total count.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidArgument`] when `page_size` is zero.
    pub fn with_counts(total_count: u64, page_size: u32) -> StrataResult<Self> {
        let mut pagination = Self::new();
        pagination.init(total_count, page_size)?;
        Ok(pagination)
    }

    /// Recomputes the window from a total count, keeping the current page
    /// as the requested page and clamping it into range.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidArgument`] when `page_size` is zero.
    pub fn init(&mut self, total_count: u64, page_size: u32) -> StrataResult<()> {
        let requested = i64::try_from(self.window.current_page).unwrap_or(i64::MAX);
        self.window = PageWindow::compute(total_count, page_size, requested)?;
        Ok(())
    }

    /// Requests `current_page` and recomputes the window.
    ///
    /// An out-of-range page is clamped, never rejected.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidArgument`] when `page_size` is zero.
    pub fn init_at(&mut self, total_count: u64, page_size: u32, current_page: i64) -> StrataResult<()> {
        self.window = PageWindow::compute(total_count, page_size, current_page)?;
        Ok(())
    }

    /// Attaches the result list. The length is not checked against the page size.
    pub fn attach(&mut self, items: Vec<T>) {
        self.items = Some(items);
    }

    /// Sets the requested page; it is clamped to the last page on the next `init`.
    pub fn set_current_page(&mut self, current_page: u64) {
        self.window.current_page = current_page.max(1);
    }

    #[must_use]
    pub const fn window(&self) -> &PageWindow {
        &self.window
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.window.page_size
    }

    #[must_use]
    pub const fn current_page(&self) -> u64 {
        self.window.current_page
    }

    #[must_use]
    pub const fn total_pages(&self) -> u64 {
        self.window.total_pages
    }

    #[must_use]
    pub const fn total_count(&self) -> u64 {
        self.window.total_count
    }

    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.window.offset()
    }

    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.window.limit()
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.window.has_next()
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.window.has_previous()
    }

    /// Returns the attached items, if the query has run.
    #[must_use]
    pub fn items(&self) -> Option<&[T]> {
        self.items.as_deref()
    }

    /// Consumes the pagination and returns its items (empty if none were attached).
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items.unwrap_or_default()
    }

    #[must_use]
    pub const fn params(&self) -> &PageParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut PageParams {
        &mut self.params
    }

    /// Passes a parameter to the backend query.
    pub fn put_param(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.params.put(key, value);
    }

    #[must_use]
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// Clears every query parameter.
    pub fn clear_params(&mut self) {
        self.params.clear();
    }

    /// Maps the attached items to a different type.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Pagination<U> {
        Pagination {
            window: self.window,
            items: self.items.map(|items| items.into_iter().map(f).collect()),
            params: self.params,
        }
    }
}

impl<T: Send> Pagination<T> {
    /// Counts, re-initialises and fetches the current page from `source`.
    ///
    /// The page size comes from the [`DEFAULT_PAGE_SIZE_ATTR`] parameter when
    /// present, otherwise from the current window. A zero count skips the fetch.
    pub async fn load<S>(&mut self, source: &S) -> StrataResult<()>
    where
        S: PageSource<T> + ?Sized,
    {
        let total_count = source.count(&self.params).await?;
        let page_size = self.params.page_size_hint().unwrap_or(self.window.page_size);
        self.init(total_count, page_size)?;

        let items = if total_count == 0 {
            Vec::new()
        } else {
            source.fetch(&self.params, &self.window).await?
        };
        tracing::debug!(
            total_count,
            current_page = self.window.current_page,
            fetched = items.len(),
            "Loaded page"
        );
        self.attach(items);
        Ok(())
    }
}

impl<T> Default for Pagination<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Display for Pagination<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pagination{{pageSize={}, currentPage={}, totalPages={}, totalCount={}, list={}, params={}}}",
            self.window.page_size,
            self.window.current_page,
            self.window.total_pages,
            self.window.total_count,
            self.items.as_ref().map_or(0, Vec::len),
            self.params.len(),
        )
    }
}
