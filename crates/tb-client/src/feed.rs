//! # Ticket Feed
//!
//! Drives a [`ListState`] against a [`TicketSource`]: one call per user
//! action (scroll to the sentinel, edit the search box, hide a row).

use crate::sentinel::Sentinel;
use crate::source::TicketSource;
use crate::state::ListState;

pub struct TicketFeed<S> {
    source: S,
    state: ListState,
    sentinel: Sentinel,
}

impl<S: TicketSource> TicketFeed<S> {
    pub fn new(source: S, state: ListState) -> Self {
        Self {
            source,
            state,
            sentinel: Sentinel::default(),
        }
    }

    /// Fetches the next page unless one is in flight or the last page is
    /// already loaded. Returns whether new data was merged.
    pub async fn load_more(&mut self) -> bool {
        let Some(request) = self.state.begin_load_more() else {
            return false;
        };
        let outcome = self.source.fetch(&request).await;
        self.state.complete(&request, outcome)
    }

    /// Re-parses the search box and reloads from page 1.
    pub async fn handle_search(&mut self, value: &str) -> bool {
        let request = self.state.begin_search(value);
        let outcome = self.source.fetch(&request).await;
        self.state.complete(&request, outcome)
    }

    /// Feeds one visibility observation of the sentinel.
    pub async fn on_sentinel(&mut self, visible: bool) -> bool {
        let enabled = self.state.has_more_pages() && !self.state.is_loading();
        if self.sentinel.observe(visible, enabled) {
            self.load_more().await
        } else {
            false
        }
    }

    /// The end of the list came into view and then scrolled away again, as
    /// when the reader reaches the bottom once. The sentinel is always
    /// released afterwards, so a failed or empty load can be retried by the
    /// next scroll.
    pub async fn reach_end(&mut self) -> bool {
        let merged = self.on_sentinel(true).await;
        self.on_sentinel(false).await;
        merged
    }

    pub fn hide(&mut self, id: &str) -> bool {
        self.state.hide(id)
    }

    pub fn unhide_all(&mut self) {
        self.state.unhide_all();
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::source::MockTicketSource;
    use crate::state::tests::props;

    #[tokio::test]
    async fn test_load_more_on_last_page_issues_no_request() {
        let mut source = MockTicketSource::new();
        source.expect_fetch().never();

        let state = ListState::from_initial("", props(1, 20, 4));
        let mut feed = TicketFeed::new(source, state.clone());

        assert!(!feed.load_more().await);
        assert_eq!(feed.state(), &state);
    }

    #[tokio::test]
    async fn test_load_more_requests_next_page_with_filters() {
        let mut source = MockTicketSource::new();
        source
            .expect_fetch()
            .withf(|req| req.page == 2 && req.search.after.as_deref() == Some("27/09/2019") && req.search.text == "xss")
            .times(1)
            .returning(|req| Ok(props(req.page, 2, 5)));

        let mut feed = TicketFeed::new(source, ListState::from_initial("after:27/09/2019 xss", props(1, 2, 5)));

        assert!(feed.load_more().await);
        assert_eq!(feed.state().tickets().len(), 4);
        assert!(!feed.state().is_loading());
    }

    #[tokio::test]
    async fn test_handle_search_seeds_from_first_page() {
        let mut source = MockTicketSource::new();
        source
            .expect_fetch()
            .withf(|req| req.page == 1 && req.search.reporter.as_deref() == Some("a@b.io"))
            .times(1)
            .returning(|_| Ok(props(1, 2, 2)));

        let mut feed = TicketFeed::new(source, ListState::from_initial("", props(1, 2, 9)));
        feed.hide("t0");

        assert!(feed.handle_search("reporter:a@b.io").await);
        assert_eq!(feed.state().meta().total, 2);
        assert!(!feed.state().has_more_pages());
        assert_eq!(feed.state().visible().count(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_leaves_list_untouched() {
        let mut source = MockTicketSource::new();
        source
            .expect_fetch()
            .times(1)
            .returning(|_| Err(ClientError::Status(500)));

        let state = ListState::from_initial("", props(1, 2, 5));
        let mut feed = TicketFeed::new(source, state.clone());

        assert!(!feed.load_more().await);
        assert!(!feed.state().is_loading());
        assert_eq!(feed.state().tickets(), state.tickets());
    }

    #[tokio::test]
    async fn test_reach_end_retries_after_failed_fetch() {
        let mut source = MockTicketSource::new();
        let mut seq = mockall::Sequence::new();
        source
            .expect_fetch()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(ClientError::Status(503)));
        source
            .expect_fetch()
            .withf(|req| req.page == 2)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|req| Ok(props(req.page, 2, 6)));

        let mut feed = TicketFeed::new(source, ListState::from_initial("", props(1, 2, 6)));

        assert!(!feed.reach_end().await);
        assert_eq!(feed.state().tickets().len(), 2);
        assert!(feed.reach_end().await);
        assert_eq!(feed.state().tickets().len(), 4);
        assert_eq!(feed.state().meta().current_page, 2);
    }

    #[tokio::test]
    async fn test_sentinel_loads_once_per_appearance() {
        let mut source = MockTicketSource::new();
        source
            .expect_fetch()
            .times(2)
            .returning(|req| Ok(props(req.page, 2, 6)));

        let mut feed = TicketFeed::new(source, ListState::from_initial("", props(1, 2, 6)));

        assert!(feed.on_sentinel(true).await);
        assert!(!feed.on_sentinel(true).await);
        assert!(!feed.on_sentinel(false).await);
        assert!(feed.on_sentinel(true).await);
        assert_eq!(feed.state().meta().current_page, 3);
        // last page reached: sentinel stays quiet
        assert!(!feed.on_sentinel(false).await);
        assert!(!feed.on_sentinel(true).await);
    }
}
