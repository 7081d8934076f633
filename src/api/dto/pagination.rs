//! Pagination query parameters.

use serde::Deserialize;
use serde_with::{DefaultOnError, DisplayFromStr, serde_as};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// `?page=&size=` for list endpoints.
///
/// Parsing is lenient: values that are missing or not numbers decode as
/// `None` instead of rejecting the request, and [`resolve`](Self::resolve)
/// substitutes the defaults.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde_as(as = "DefaultOnError<Option<DisplayFromStr>>")]
    #[serde(default)]
    pub page: Option<i64>,

    #[serde_as(as = "DefaultOnError<Option<DisplayFromStr>>")]
    #[serde(default)]
    pub size: Option<i64>,
}

impl PageQuery {
    /// Returns `(page, size)` clamped to usable values.
    ///
    /// - `page < 1` or missing becomes 1
    /// - `size` outside `1..=100` or missing becomes 10
    pub fn resolve(&self) -> (u32, u32) {
        let page = self
            .page
            .filter(|p| *p >= 1)
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(DEFAULT_PAGE);

        let size = self
            .size
            .filter(|s| (1..=i64::from(MAX_PAGE_SIZE)).contains(s))
            .and_then(|s| u32::try_from(s).ok())
            .unwrap_or(DEFAULT_PAGE_SIZE);

        (page, size)
    }
}
