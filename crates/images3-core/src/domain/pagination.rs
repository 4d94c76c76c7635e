//! Pull-based pagination.
//!
//! A [`Paginated`] sequence fetches one [`Page`] per call. Sources that can
//! return everything at once advertise it with [`Paginated::with_fetch_all`];
//! callers check [`Paginated::supports_fetch_all`] instead of guessing.

use std::{fmt, sync::Arc};

use crate::{
    application::ApplicationError,
    error::{Images3Error, Images3Result},
};

/// Opaque position of the next page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageCursor(String);

impl PageCursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<PageCursor>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<PageCursor>) -> Self {
        Self { items, next_cursor }
    }

    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}

type PageFn<T> = dyn Fn(Option<&PageCursor>) -> Images3Result<Page<T>> + Send + Sync;
type AllFn<T> = dyn Fn() -> Images3Result<Vec<T>> + Send + Sync;

pub struct Paginated<T> {
    fetch_page: Arc<PageFn<T>>,
    fetch_all: Option<Arc<AllFn<T>>>,
}

impl<T> Clone for Paginated<T> {
    fn clone(&self) -> Self {
        Self {
            fetch_page: Arc::clone(&self.fetch_page),
            fetch_all: self.fetch_all.clone(),
        }
    }
}

impl<T> Paginated<T> {
    pub fn supports_fetch_all(&self) -> bool {
        self.fetch_all.is_some()
    }
}

impl<T> fmt::Debug for Paginated<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paginated")
            .field("supports_fetch_all", &self.supports_fetch_all())
            .finish_non_exhaustive()
    }
}

impl<T: 'static> Paginated<T> {
    /// A sequence backed by a page-fetch function. `None` asks for the first page.
    pub fn new<F>(fetch_page: F) -> Self
    where
        F: Fn(Option<&PageCursor>) -> Images3Result<Page<T>> + Send + Sync + 'static,
    {
        Self {
            fetch_page: Arc::new(fetch_page),
            fetch_all: None,
        }
    }

    /// Advertise that the whole sequence can be fetched in one call.
    pub fn with_fetch_all<F>(mut self, fetch_all: F) -> Self
    where
        F: Fn() -> Images3Result<Vec<T>> + Send + Sync + 'static,
    {
        self.fetch_all = Some(Arc::new(fetch_all));
        self
    }

    /// Pages over an in-memory snapshot. Cursors are item offsets.
    pub fn from_vec(items: Vec<T>, page_size: usize) -> Self
    where
        T: Clone + Send + Sync,
    {
        let items: Arc<Vec<T>> = Arc::new(items);
        let page_size = page_size.max(1);
        let all = Arc::clone(&items);

        Self::new(move |cursor| {
            let start = match cursor {
                None => 0,
                Some(c) => c
                    .as_str()
                    .parse::<usize>()
                    .ok()
                    .filter(|offset| *offset <= items.len())
                    .ok_or_else(|| ApplicationError::InvalidPageCursor {
                        cursor: c.to_string(),
                    })?,
            };
            let end = start.saturating_add(page_size).min(items.len());
            let next_cursor = (end < items.len()).then(|| PageCursor::new(end.to_string()));
            Ok(Page::new(items[start..end].to_vec(), next_cursor))
        })
        .with_fetch_all(move || Ok(all.as_ref().clone()))
    }

    pub fn empty() -> Self
    where
        T: Clone + Send + Sync,
    {
        Self::from_vec(Vec::new(), 1)
    }

    pub fn first_page(&self) -> Images3Result<Page<T>> {
        (self.fetch_page)(None)
    }

    pub fn page(&self, cursor: &PageCursor) -> Images3Result<Page<T>> {
        (self.fetch_page)(Some(cursor))
    }

    /// Iterates page by page until the last one. Stops after the first error.
    pub fn pages(&self) -> Pages<'_, T> {
        Pages {
            source: self,
            next: Some(None),
        }
    }

    pub fn fetch_all(&self) -> Images3Result<Vec<T>> {
        match &self.fetch_all {
            Some(fetch_all) => fetch_all(),
            None => Err(ApplicationError::FetchAllUnsupported.into()),
        }
    }

    /// Every item, through `fetch_all` when supported, else page by page.
    pub fn collect_all(&self) -> Images3Result<Vec<T>> {
        if self.supports_fetch_all() {
            return self.fetch_all();
        }
        let mut items = Vec::new();
        for page in self.pages() {
            items.extend(page?.items);
        }
        Ok(items)
    }

    pub fn map<U, F>(self, f: F) -> Paginated<U>
    where
        U: 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let fetch_page = self.fetch_page;
        let page_f = Arc::clone(&f);
        let mut mapped = Paginated::new(move |cursor| {
            fetch_page(cursor).map(|page| page.map(|item| page_f(item)))
        });
        if let Some(fetch_all) = self.fetch_all {
            mapped.fetch_all = Some(Arc::new(move || {
                fetch_all().map(|items| items.into_iter().map(|item| f(item)).collect())
            }));
        }
        mapped
    }
}

pub struct Pages<'a, T> {
    source: &'a Paginated<T>,
    next: Option<Option<PageCursor>>,
}

impl<T: 'static> Iterator for Pages<'_, T> {
    type Item = Result<Page<T>, Images3Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.next.take()?;
        let result = (self.source.fetch_page)(cursor.as_ref());
        if let Ok(page) = &result {
            self.next = page.next_cursor.clone().map(Some);
        }
        Some(result)
    }
}
