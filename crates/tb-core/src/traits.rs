//! # Core Traits (Ports)
//!
//! Storage plugins implement these traits to be used by the binaries.

use async_trait::async_trait;

use crate::filter::TicketFilter;
use crate::models::{NewTicket, TicketPage};
use crate::pagination::PageRequest;

/// Data persistence contract for tickets.
#[async_trait]
pub trait TicketRepo: Send + Sync {
    /// Counts the filtered set, then returns the requested window ordered by
    /// `creation_time` descending.
    async fn search(&self, filter: &TicketFilter, page: &PageRequest) -> anyhow::Result<TicketPage>;

    /// Inserts tickets; `created_at`/`updated_at` are stamped by the store.
    async fn insert_many(&self, tickets: Vec<NewTicket>) -> anyhow::Result<u64>;

    /// Deletes every ticket and loads `tickets` in one transaction.
    async fn replace_all(&self, tickets: Vec<NewTicket>) -> anyhow::Result<u64>;
}
