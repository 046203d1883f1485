//! # Domain Models
//!
//! The ticket entity and the page/props shapes that travel between the
//! repository, the HTTP layer and the client.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::filter::FilterField;

/// A security issue as stored in the `tickets` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Reporter email
    pub user_email: String,
    /// When the issue was filed, milliseconds since the Unix epoch
    pub creation_time: i64,
    pub labels: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert shape used by the seeder. Matches the records of the static dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTicket {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub user_email: String,
    pub creation_time: i64,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub total: i64,
    pub per_page: u32,
    pub current_page: u32,
    pub last_page: u32,
}

impl PaginationMeta {
    /// `last_page` is `ceil(total / per_page)` and never below 1.
    pub fn new(total: i64, per_page: u32, current_page: u32) -> Self {
        let per_page = per_page.max(1);
        let pages = (total.max(0) as u64).div_ceil(u64::from(per_page));
        Self {
            total,
            per_page,
            current_page,
            last_page: pages.clamp(1, u64::from(u32::MAX)) as u32,
        }
    }

    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page
    }
}

/// One response worth of tickets plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketPage {
    pub data: Vec<Ticket>,
    pub meta: PaginationMeta,
}

/// The payload rendered for `GET /`, either as JSON or as the HTML page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexProps {
    pub tickets: TicketPage,
    pub search: String,
    pub after: String,
    pub before: String,
    pub reporter: String,
    pub labels: String,
    pub page: u32,
    pub page_size: u32,
    pub errors: BTreeMap<FilterField, String>,
}
