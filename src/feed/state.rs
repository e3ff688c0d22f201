use tracing::{debug, info, warn};

use crate::catalog::{Movie, MoviePage};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Loading { page: u32 },
    Exhausted,
    Failed(String),
}

/// What the list view renders from.
#[derive(Debug, Clone, Copy)]
pub struct FeedView<'a> {
    pub items: &'a [Movie],
    pub is_loading: bool,
    pub has_more: bool,
    pub error: Option<&'a str>,
}

/// Accumulated results of one paginated listing.
///
/// Items only ever grow. The cursor moves forward only on a successful page,
/// so a failed page is requested again on the next attempt.
#[derive(Debug, Clone)]
pub struct FeedState {
    items: Vec<Movie>,
    cursor: u32,
    phase: Phase,
}

impl Default for FeedState {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedState {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            cursor: 1,
            phase: Phase::Idle,
        }
    }

    pub fn items(&self) -> &[Movie] {
        &self.items
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading { .. })
    }

    pub fn is_exhausted(&self) -> bool {
        self.phase == Phase::Exhausted
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            Phase::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn view(&self) -> FeedView<'_> {
        FeedView {
            items: &self.items,
            is_loading: self.is_loading(),
            has_more: !self.is_exhausted(),
            error: self.error(),
        }
    }

    /// Claim the next page to fetch, or `None` if a fetch is already
    /// outstanding or the listing is finished.
    pub fn begin(&mut self) -> Option<u32> {
        match self.phase {
            Phase::Idle | Phase::Failed(_) => {
                let page = self.cursor;
                self.phase = Phase::Loading { page };
                Some(page)
            }
            Phase::Loading { .. } | Phase::Exhausted => None,
        }
    }

    /// Apply the outcome of the fetch started by [`FeedState::begin`].
    ///
    /// Returns false when the outcome does not belong to the outstanding
    /// fetch and was dropped.
    pub fn complete(&mut self, page: u32, result: Result<MoviePage>) -> bool {
        if self.phase != (Phase::Loading { page }) {
            debug!(page, phase = ?self.phase, "Dropping stale page result");
            return false;
        }

        match result {
            Ok(batch) => {
                let total_pages = batch.total_pages;
                self.items.extend(batch.results);
                self.cursor = page + 1;

                if page >= total_pages {
                    info!(page, total_pages, items = self.items.len(), "Listing exhausted");
                    self.phase = Phase::Exhausted;
                } else {
                    self.phase = Phase::Idle;
                }
            }
            Err(e) => {
                warn!(page, error = %e, "Page fetch failed");
                self.phase = Phase::Failed(e.user_message());
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn movie(id: u64) -> Movie {
        Movie {
            id,
            title: format!("Movie {}", id),
            original_title: format!("Movie {}", id),
            overview: String::new(),
            poster_path: None,
            backdrop_path: None,
            vote_average: 7.0,
            vote_count: 10,
            release_date: "2020-05-01".to_string(),
            popularity: 1.0,
            genre_ids: Vec::new(),
            original_language: "en".to_string(),
            adult: false,
        }
    }

    fn page(n: u32, ids: &[u64], total_pages: u32) -> MoviePage {
        MoviePage {
            page: n,
            results: ids.iter().copied().map(movie).collect(),
            total_pages,
            total_results: u64::from(total_pages) * ids.len() as u64,
        }
    }

    #[test]
    fn test_begin_is_guarded_while_loading() {
        let mut state = FeedState::new();
        assert_eq!(state.begin(), Some(1));
        assert_eq!(state.begin(), None);
        assert!(state.view().is_loading);
    }

    #[test]
    fn test_success_advances_cursor() {
        let mut state = FeedState::new();
        let p = state.begin().unwrap();
        assert!(state.complete(p, Ok(page(1, &[1, 2], 3))));
        assert_eq!(state.cursor(), 2);
        assert_eq!(state.phase(), &Phase::Idle);
        assert_eq!(state.begin(), Some(2));
    }

    #[test]
    fn test_last_page_exhausts() {
        let mut state = FeedState::new();
        state.begin();
        state.complete(1, Ok(page(1, &[1, 2], 2)));
        state.begin();
        state.complete(2, Ok(page(2, &[3, 4], 2)));

        assert!(state.is_exhausted());
        assert_eq!(state.items().len(), 4);
        assert!(!state.view().has_more);
        assert_eq!(state.begin(), None);
    }

    #[test]
    fn test_empty_listing_exhausts_immediately() {
        let mut state = FeedState::new();
        state.begin();
        state.complete(1, Ok(page(1, &[], 0)));
        assert!(state.is_exhausted());
        assert!(state.items().is_empty());
    }

    #[test]
    fn test_failure_keeps_items_and_cursor() {
        let mut state = FeedState::new();
        state.begin();
        state.complete(1, Ok(page(1, &[1, 2], 5)));
        state.begin();
        state.complete(
            2,
            Err(Error::Upstream {
                status: 502,
                status_text: "Bad Gateway".to_string(),
            }),
        );

        let view = state.view();
        assert_eq!(view.items.len(), 2);
        assert!(view.error.unwrap().contains("502"));
        assert!(view.has_more);
        assert_eq!(state.cursor(), 2);

        // Retry asks for the same page
        assert_eq!(state.begin(), Some(2));
        assert_eq!(state.error(), None);
    }

    #[test]
    fn test_stale_completion_is_dropped() {
        let mut state = FeedState::new();
        state.begin();
        assert!(!state.complete(7, Ok(page(7, &[1], 9))));
        assert!(state.items().is_empty());
        assert_eq!(state.phase(), &Phase::Loading { page: 1 });
    }
}
