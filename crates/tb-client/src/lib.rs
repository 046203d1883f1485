//! # tb-client
//!
//! Incremental ticket list: keeps the search box as the single source of
//! truth for filters, fetches further pages when the sentinel after the last
//! row comes into view, merges them without duplicates, and lets the user
//! hide rows for the session.

pub mod error;
pub mod feed;
pub mod sentinel;
pub mod source;
pub mod state;

pub use error::ClientError;
pub use feed::TicketFeed;
pub use sentinel::Sentinel;
pub use source::{HttpTicketSource, TicketSource};
pub use state::{FetchRequest, ListState};
