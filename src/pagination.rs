//! Cursor-following loop shared by every paginated upstream listing.
//!
//! Each upstream encodes "no more pages" differently (a zero token, a missing
//! `Link: rel="next"`, an absent `nextPageToken`); callers translate that into
//! `Page::next` being `None`.

use std::future::Future;

/// One page of a listing and the cursor of the page after it, if any.
#[derive(Debug)]
pub struct Page<T, C> {
    pub items: Vec<T>,
    pub next: Option<C>,
}

#[derive(Debug, thiserror::Error)]
pub enum PaginationError<E> {
    #[error("Listing still had more pages after {pages} pages were fetched")]
    Exhausted { pages: usize },
    #[error("Failed to fetch a page of the listing")]
    Page(#[source] E),
}

impl<E> PaginationError<E> {
    /// Collapse into the caller's error type, building the exhaustion case
    /// from the number of pages fetched.
    pub fn flatten_with(self, exhausted: impl FnOnce(usize) -> E) -> E {
        match self {
            Self::Exhausted { pages } => exhausted(pages),
            Self::Page(err) => err,
        }
    }
}

/// Fetch pages starting at `start` until the listing reports no next page,
/// giving up after `max_pages` pages.
pub async fn fetch_all<T, C, E, F, Fut>(
    start: C,
    max_pages: usize,
    mut fetch_page: F,
) -> Result<Vec<T>, PaginationError<E>>
where
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Result<Page<T, C>, E>>,
{
    let mut items = Vec::new();
    let mut cursor = start;

    for _ in 0..max_pages {
        let page = fetch_page(cursor).await.map_err(PaginationError::Page)?;
        items.extend(page.items);
        match page.next {
            Some(next) => cursor = next,
            None => return Ok(items),
        }
    }

    tracing::warn!(max_pages, "Listing did not run out of pages, giving up");
    Err(PaginationError::Exhausted { pages: max_pages })
}
