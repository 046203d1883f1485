//! # List State
//!
//! Everything the incremental list knows, kept in one value so the fetch
//! lifecycle (`begin_*` → fetch → [`ListState::complete`]) can be driven and
//! tested without any I/O.

use std::collections::{BTreeMap, HashSet};

use tb_core::filter::FilterField;
use tb_core::models::{IndexProps, PaginationMeta, Ticket};
use tb_core::pagination::DEFAULT_PAGE_SIZE;
use tb_core::search::ParsedSearch;

use crate::error::ClientError;

/// One page request. `generation` ties the response back to the search it
/// was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub page: u32,
    pub page_size: u32,
    pub search: ParsedSearch,
    pub generation: u64,
}

impl FetchRequest {
    /// Filter parameters followed by `page` and `pageSize`.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = self.search.to_query_pairs();
        pairs.push(("page", self.page.to_string()));
        pairs.push(("pageSize", self.page_size.to_string()));
        pairs
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListState {
    search: String,
    parsed: ParsedSearch,
    page_size: u32,
    /// Page number → tickets returned for that page
    pages: BTreeMap<u32, Vec<Ticket>>,
    /// De-duplicated by id, first-seen order
    tickets: Vec<Ticket>,
    seen: HashSet<String>,
    hidden: HashSet<String>,
    meta: PaginationMeta,
    errors: BTreeMap<FilterField, String>,
    loading: bool,
    generation: u64,
}

impl Default for ListState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ListState {
    /// Nothing fetched yet; the first `begin_load_more` asks for page 1.
    pub fn new(page_size: u32) -> Self {
        let page_size = page_size.max(1);
        Self {
            search: String::new(),
            parsed: ParsedSearch::default(),
            page_size,
            pages: BTreeMap::new(),
            tickets: Vec::new(),
            seen: HashSet::new(),
            hidden: HashSet::new(),
            meta: PaginationMeta::new(0, page_size, 0),
            errors: BTreeMap::new(),
            loading: false,
            generation: 0,
        }
    }

    /// Seeds the state from a server-rendered first response.
    pub fn from_initial(search: &str, props: IndexProps) -> Self {
        let mut state = Self::new(props.page_size);
        state.search = search.to_string();
        state.parsed = ParsedSearch::parse(search);
        state.apply(props.tickets.meta.current_page, props);
        state
    }

    /// `None` while a fetch is in flight or when the last page is reached.
    pub fn begin_load_more(&mut self) -> Option<FetchRequest> {
        if self.loading || !self.meta.has_more_pages() {
            return None;
        }
        self.loading = true;
        Some(self.request(self.meta.current_page + 1))
    }

    /// Starts over with a new search box value. Always proceeds, superseding
    /// whatever is in flight.
    pub fn begin_search(&mut self, value: &str) -> FetchRequest {
        self.search = value.to_string();
        self.parsed = ParsedSearch::parse(value);
        self.generation += 1;
        self.pages.clear();
        self.tickets.clear();
        self.seen.clear();
        self.errors.clear();
        self.meta = PaginationMeta::new(0, self.page_size, 0);
        self.loading = true;
        self.request(1)
    }

    /// Applies a finished fetch. Responses for a superseded search are
    /// dropped without touching the state. Returns whether data was merged.
    pub fn complete(&mut self, request: &FetchRequest, outcome: Result<IndexProps, ClientError>) -> bool {
        if request.generation != self.generation {
            log::debug!(
                "dropping page {} of superseded search (generation {} < {})",
                request.page,
                request.generation,
                self.generation
            );
            return false;
        }
        self.loading = false;

        match outcome {
            Ok(props) => {
                self.apply(request.page, props);
                true
            }
            Err(err) => {
                log::warn!("failed to load page {}: {err}", request.page);
                false
            }
        }
    }

    fn apply(&mut self, page: u32, props: IndexProps) {
        let data = props.tickets.data;
        for ticket in &data {
            if self.seen.insert(ticket.id.clone()) {
                self.tickets.push(ticket.clone());
            }
        }
        self.pages.insert(page, data);
        self.meta = props.tickets.meta;
        self.errors = props.errors;
    }

    fn request(&self, page: u32) -> FetchRequest {
        FetchRequest {
            page,
            page_size: self.page_size,
            search: self.parsed.clone(),
            generation: self.generation,
        }
    }

    /// Hides a ticket from [`ListState::visible`] for this session only.
    pub fn hide(&mut self, id: &str) -> bool {
        self.hidden.insert(id.to_string())
    }

    pub fn unhide_all(&mut self) {
        self.hidden.clear();
    }

    pub fn visible(&self) -> impl Iterator<Item = &Ticket> + '_ {
        self.tickets
            .iter()
            .filter(|ticket| !self.hidden.contains(&ticket.id))
    }

    pub fn is_hidden(&self, id: &str) -> bool {
        self.hidden.contains(id)
    }

    pub fn hidden_count(&self) -> usize {
        self.hidden.len()
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn page(&self, page: u32) -> Option<&[Ticket]> {
        self.pages.get(&page).map(Vec::as_slice)
    }

    pub fn meta(&self) -> &PaginationMeta {
        &self.meta
    }

    pub fn errors(&self) -> &BTreeMap<FilterField, String> {
        &self.errors
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_more_pages(&self) -> bool {
        self.meta.has_more_pages()
    }
}
