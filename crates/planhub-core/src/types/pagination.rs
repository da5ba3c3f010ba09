//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Default page size.
pub const DEFAULT_PAGE_SIZE: u64 = 25;

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-based).
    pub page: u64,
    /// Number of items per page.
    pub page_size: u64,
}

impl PageRequest {
    /// Create a validated page request.
    ///
    /// Both values must be positive; `page_size` is clamped to `max_page_size`.
    pub fn try_new(page: u64, page_size: u64, max_page_size: u64) -> Result<Self, AppError> {
        if page == 0 {
            return Err(AppError::validation("page must be a positive integer"));
        }
        if page_size == 0 {
            return Err(AppError::validation("page size must be a positive integer"));
        }
        Ok(Self {
            page,
            page_size: page_size.min(max_page_size.max(1)),
        })
    }

    /// Number of items skipped before this page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }

    /// Maximum number of items on this page.
    pub fn limit(&self) -> u64 {
        self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_rejects_zero_values() {
        let err = PageRequest::try_new(0, 10, 100).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        let err = PageRequest::try_new(1, 0, 100).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_clamps_page_size_and_computes_offset() {
        let page = PageRequest::try_new(3, 500, 100).expect("valid");
        assert_eq!(page.limit(), 100);
        assert_eq!(page.offset(), 200);
    }
}
