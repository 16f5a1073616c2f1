//! Pagination math shared by the public page and the load-more endpoint.

use chrono::{FixedOffset, NaiveDate, Utc};
use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: u32 = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ListingError {
    #[error("page must be a positive integer")]
    InvalidPage,
    #[error("page size must be a positive integer")]
    InvalidPageSize,
}

/// A validated page request: both values are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    page: u32,
    page_size: u32,
}

impl Paging {
    pub fn new(page: u32, page_size: u32) -> Result<Self, ListingError> {
        if page == 0 {
            return Err(ListingError::InvalidPage);
        }
        if page_size == 0 {
            return Err(ListingError::InvalidPageSize);
        }
        Ok(Paging { page, page_size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.page_size as u64
    }

    pub fn limit(&self) -> u64 {
        self.page_size as u64
    }
}

pub fn max_pages(total_matching: usize, page_size: u32) -> u32 {
    total_matching.div_ceil(page_size as usize) as u32
}

/// Calendar date "today" in the configured UTC offset, date-only.
/// An out-of-range offset falls back to UTC; config validation rejects such
/// offsets before they get here.
pub fn today_with_offset(utc_offset_minutes: i32) -> NaiveDate {
    match FixedOffset::east_opt(utc_offset_minutes * 60) {
        Some(offset) => Utc::now().with_timezone(&offset).date_naive(),
        None => Utc::now().date_naive(),
    }
}
