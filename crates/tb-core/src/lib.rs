//! tb-core
//!
//! Domain models, the ticket filter builder, the search box parser and the
//! storage port shared by the server, the seeder and the client.

pub mod error;
pub mod filter;
pub mod models;
pub mod pagination;
pub mod search;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use filter::{FilterClause, FilterField, FilterParams, TicketFilter};
pub use models::*;
pub use pagination::{PageRequest, PaginationMode, PagingDefaults};
pub use search::ParsedSearch;
pub use traits::*;
