//! Page/limit pagination for item listings.

use serde::{Deserialize, Serialize};

use stockroom_core::ValueObject;

/// 1-based page request.
///
/// A request with `page < 1` or `limit < 1` is not an error: stores treat it
/// as "no pagination" and return every row. Callers that want to reject such
/// values must do so before building the request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

/// Concrete `LIMIT`/`OFFSET` pair derived from a [`PageRequest`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Self {
        Self { page, limit }
    }

    /// Request every row.
    pub fn all() -> Self {
        Self { page: 0, limit: 0 }
    }

    /// Window to apply, or `None` when every row should be returned.
    pub fn window(&self) -> Option<PageWindow> {
        if self.page < 1 || self.limit < 1 {
            return None;
        }
        Some(PageWindow {
            offset: (self.page - 1).saturating_mul(self.limit),
            limit: self.limit,
        })
    }
}

impl ValueObject for PageRequest {}

impl PageWindow {
    /// Slice bounds for an in-memory collection of `len` rows.
    pub fn bounds(&self, len: usize) -> (usize, usize) {
        let start = usize::try_from(self.offset).unwrap_or(usize::MAX).min(len);
        let take = usize::try_from(self.limit).unwrap_or(usize::MAX);
        (start, start.saturating_add(take).min(len))
    }
}
