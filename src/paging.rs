//! Aggregation of cursor-based remote listings.
//!
//! Spotify hands out listings in pages of at most ~50 items. This module
//! turns a page-loading callback into a bounded in-memory list, following
//! next-page cursors only as far as actually needed.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::requests::RequestError;

/// Default page size, in line with most Spotify listing endpoints.
pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// What to do with null placeholders found inside a page.
///
/// Track listings contain nulls where a track was deleted upstream. `Deny`
/// treats a placeholder as fatal so a caller never silently operates on a
/// list of the wrong length; `Allow` filters them out and continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullPolicy {
    Deny,
    Allow,
}

/// One loaded page of a listing.
///
/// `total` is the size of the whole logical listing and must be consistent
/// across all pages of it. Items are optional because some listings carry
/// null placeholders; loaders without that concept wrap everything in
/// `Some`.
pub struct Page<T> {
    pub items: Vec<Option<T>>,
    pub total: u32,
    pub offset: u32,
    pub limit: u32,
    pub has_next: bool,
}

/// Callback that loads the page starting at `offset` containing at most
/// `limit` items.
pub type PageLoader<T> =
    Arc<dyn Fn(u32, u32) -> BoxFuture<'static, Result<Page<T>, RequestError>> + Send + Sync>;

/// A page that has not been loaded yet.
pub struct PageCursor<T> {
    loader: PageLoader<T>,
    offset: u32,
    limit: u32,
}

impl<T> PageCursor<T> {
    /// Cursor for the first page of a listing, with the default page size.
    pub fn new(loader: PageLoader<T>) -> Self {
        Self::at(loader, 0, DEFAULT_PAGE_LIMIT)
    }

    pub fn at(loader: PageLoader<T>, offset: u32, limit: u32) -> Self {
        Self {
            loader,
            offset,
            limit,
        }
    }

    /// Load this page. The returned value knows how to reach the next page.
    pub async fn load(&self) -> Result<LoadedPage<T>, RequestError> {
        let page = (self.loader)(self.offset, self.limit).await?;
        Ok(LoadedPage::new(page, Arc::clone(&self.loader)))
    }
}

/// A loaded page together with the cursor of its successor, if any.
pub struct LoadedPage<T> {
    page: Page<T>,
    next: Option<PageCursor<T>>,
}

impl<T> LoadedPage<T> {
    fn new(page: Page<T>, loader: PageLoader<T>) -> Self {
        let next = if page.has_next {
            Some(PageCursor::at(
                loader,
                page.offset + page.items.len() as u32,
                page.limit,
            ))
        } else {
            None
        };
        Self { page, next }
    }

    pub fn items(&self) -> &[Option<T>] {
        &self.page.items
    }

    pub fn total(&self) -> u32 {
        self.page.total
    }
}

/// Aggregate the initial page's items and all subsequent pages' items into a
/// single list of at most `hard_limit` items.
///
/// The limit is clamped to the total reported by the remote listing, and no
/// page beyond the ones needed to satisfy it is requested. Null placeholders
/// are handled according to `nulls`; filtered placeholders do not count
/// against the limit.
pub async fn aggregate<T>(
    initial: PageCursor<T>,
    hard_limit: usize,
    nulls: NullPolicy,
) -> Result<Vec<T>, RequestError> {
    let mut loaded = initial.load().await?;
    let hard_limit = hard_limit.min(loaded.total() as usize);

    let mut result = Vec::with_capacity(hard_limit);
    take_some(&mut result, loaded.page, hard_limit, nulls)?;

    let mut next = loaded.next;
    while let Some(cursor) = next {
        if result.len() >= hard_limit {
            break;
        }
        loaded = cursor.load().await?;
        let remaining = hard_limit - result.len();
        take_some(&mut result, loaded.page, remaining, nulls)?;
        next = loaded.next;
    }

    Ok(result)
}

fn take_some<T>(
    target: &mut Vec<T>,
    page: Page<T>,
    count: usize,
    nulls: NullPolicy,
) -> Result<(), RequestError> {
    let mut taken = 0;
    for (position, item) in page.items.into_iter().enumerate() {
        if taken >= count {
            break;
        }
        match item {
            Some(item) => {
                target.push(item);
                taken += 1;
            }
            None => match nulls {
                NullPolicy::Allow => continue,
                NullPolicy::Deny => {
                    return Err(RequestError::Fatal(format!(
                        "listing page at offset {} contains a null placeholder at position {}",
                        page.offset, position
                    )));
                }
            },
        }
    }
    Ok(())
}
