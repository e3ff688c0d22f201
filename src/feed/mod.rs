//! Infinite-scroll loading of a catalog listing.
//!
//! [`FeedState`] is the pure state machine. [`Feed`] drives it: it turns
//! sentinel hits into background page fetches and folds the replies back in
//! on the UI loop, one outstanding fetch at a time.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::catalog::{CatalogProvider, Listing, MoviePage};
use crate::error::Result;

mod sentinel;
mod state;

pub use sentinel::Sentinel;
pub use state::{FeedState, FeedView, Phase};

/// Reply from a background page fetch.
#[derive(Debug)]
pub struct FeedEvent {
    session: u64,
    page: u32,
    result: Result<MoviePage>,
}

pub struct Feed {
    provider: Arc<dyn CatalogProvider + Send + Sync>,
    listing: Listing,
    state: FeedState,
    sentinel: Sentinel,
    session: u64,
    torn_down: bool,
    event_tx: mpsc::UnboundedSender<FeedEvent>,
    event_rx: mpsc::UnboundedReceiver<FeedEvent>,
}

impl Feed {
    pub fn new(
        provider: Arc<dyn CatalogProvider + Send + Sync>,
        listing: Listing,
        scroll_threshold: usize,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            provider,
            listing,
            state: FeedState::new(),
            sentinel: Sentinel::new(scroll_threshold),
            session: 0,
            torn_down: false,
            event_tx,
            event_rx,
        }
    }

    pub fn listing(&self) -> Listing {
        self.listing
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn view(&self) -> FeedView<'_> {
        self.state.view()
    }

    #[cfg(test)]
    pub fn sentinel(&self) -> &Sentinel {
        &self.sentinel
    }

    /// Initial load when the list is first shown.
    pub fn start(&mut self) -> bool {
        info!(listing = %self.listing, "Starting feed");
        self.load_more()
    }

    /// Selection moved: fetch the next page if the sentinel came into view.
    pub fn on_scroll(&mut self, selected: Option<usize>) -> bool {
        if self.sentinel.observe(selected, self.state.items().len()) {
            self.load_more()
        } else {
            false
        }
    }

    /// Explicit retry after a failed page.
    pub fn retry(&mut self) -> bool {
        if self.state.error().is_some() {
            self.load_more()
        } else {
            false
        }
    }

    /// Spawn a fetch for the next page unless one is outstanding, the listing
    /// is finished, or the feed was torn down.
    fn load_more(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        let Some(page) = self.state.begin() else {
            return false;
        };

        debug!(listing = %self.listing, page, "Fetching page");

        let provider = self.provider.clone();
        let listing = self.listing;
        let session = self.session;
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = provider.fetch_page(listing, page).await;
            if tx.send(FeedEvent { session, page, result }).is_err() {
                debug!(page, "Feed dropped before page arrived");
            }
        });
        true
    }

    /// Fold one fetch reply into the state. Returns whether it was applied.
    pub fn apply(&mut self, event: FeedEvent) -> bool {
        if self.torn_down || event.session != self.session {
            debug!(page = event.page, "Discarding page for a torn down feed");
            return false;
        }

        let applied = self.state.complete(event.page, event.result);
        if self.state.is_exhausted() && self.sentinel.is_registered() {
            debug!(listing = %self.listing, "Removing scroll sentinel");
            self.sentinel.unregister();
        }
        applied
    }

    /// Apply every reply that has already arrived.
    pub fn process_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.event_rx.try_recv() {
            if self.apply(event) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for the next reply.
    #[cfg(test)]
    pub async fn next_event(&mut self) -> Option<FeedEvent> {
        self.event_rx.recv().await
    }

    /// Stop reacting to scrolling. Replies still in flight are discarded when
    /// they arrive.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        info!(
            listing = %self.listing,
            items = self.state.items().len(),
            next_page = self.state.cursor(),
            "Tearing down feed"
        );
        self.sentinel.unregister();
        self.session += 1;
        self.torn_down = true;
    }
}

impl Drop for Feed {
    fn drop(&mut self) {
        self.teardown();
    }
}
