//! Offset pagination: page requests and page results.
//!
//! A page request selects page `N` of a result set by skipping `(N-1)*limit`
//! rows and taking at most `limit` rows. The result carries a separately
//! computed total so callers can render page navigation.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Page requested when none is given.
pub const DEFAULT_PAGE: u32 = 1;

/// Page size used when none is given.
pub const DEFAULT_LIMIT: u32 = 10;

/// Validated offset pagination request (`page >= 1`, `limit >= 1`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Build a page request from optional, caller-supplied values.
    ///
    /// Missing values fall back to [`DEFAULT_PAGE`] / [`DEFAULT_LIMIT`]; present
    /// values must be positive and fit in a `u32`.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> DomainResult<Self> {
        let page = positive("page", page, DEFAULT_PAGE)?;
        let limit = positive("limit", limit, DEFAULT_LIMIT)?;
        Ok(Self { page, limit })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of rows to skip before the first row of this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

fn positive(field: &str, value: Option<i64>, default: u32) -> DomainResult<u32> {
    match value {
        None => Ok(default),
        Some(v) if v >= 1 => u32::try_from(v)
            .map_err(|_| DomainError::validation(format!("{field} must be at most {}", u32::MAX))),
        Some(v) => Err(DomainError::validation(format!(
            "{field} must be a positive number (got {v})"
        ))),
    }
}

/// Page metadata returned next to the page data.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u32,
    pub total: u64,
    pub last_page: u64,
}

impl PageMeta {
    /// `last_page = ceil(total / limit)`, which is `0` for an empty result set.
    pub fn new(request: PageRequest, total: u64) -> Self {
        Self {
            page: request.page,
            total,
            last_page: total.div_ceil(u64::from(request.limit)),
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            data,
            meta: PageMeta::new(request, total),
        }
    }
}
