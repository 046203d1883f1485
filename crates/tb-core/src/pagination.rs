//! # Pagination
//!
//! `page`/`pageSize` normalisation and the row window handed to the storage
//! layer.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// How a page number maps to a row window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginationMode {
    /// `LIMIT page * pageSize`: page N returns the first N pages in one go.
    #[default]
    Cumulative,
    /// `LIMIT pageSize OFFSET (page - 1) * pageSize`
    Sliced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingDefaults {
    pub page_size: u32,
    pub max_page_size: u32,
    pub mode: PaginationMode,
}

impl Default for PagingDefaults {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            mode: PaginationMode::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
    pub mode: PaginationMode,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32, mode: PaginationMode) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
            mode,
        }
    }

    /// Lenient parse of the raw query values. Anything unparsable falls back
    /// to the defaults; `pageSize` is clamped to `[1, max_page_size]`.
    pub fn from_raw(page: Option<&str>, page_size: Option<&str>, defaults: &PagingDefaults) -> Self {
        let page = page
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|page| *page >= 1)
            .map(|page| page.min(i64::from(u32::MAX)) as u32)
            .unwrap_or(1);

        let max = defaults.max_page_size.max(1);
        let page_size = page_size
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .map(|size| size.clamp(1, i64::from(max)) as u32)
            .unwrap_or_else(|| defaults.page_size.clamp(1, max));

        Self::new(page, page_size, defaults.mode)
    }

    pub fn limit(&self) -> i64 {
        match self.mode {
            PaginationMode::Cumulative => i64::from(self.page) * i64::from(self.page_size),
            PaginationMode::Sliced => i64::from(self.page_size),
        }
    }

    pub fn offset(&self) -> i64 {
        match self.mode {
            PaginationMode::Cumulative => 0,
            PaginationMode::Sliced => i64::from(self.page - 1) * i64::from(self.page_size),
        }
    }
}
