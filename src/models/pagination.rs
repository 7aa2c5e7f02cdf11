use serde::{Deserialize, Serialize};

use super::{ValidationError, ValidationResult};

pub const DEFAULT_PAGE_SIZE: u32 = 6;
pub const MAX_PAGE_SIZE: u32 = 100;

/// 1-based page window over an ordered result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> ValidationResult<Self> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);

        if page == 0 {
            return Err(ValidationError::OutOfRange {
                field: "page".to_string(),
                min: "1".to_string(),
                max: u32::MAX.to_string(),
                value: page.to_string(),
            });
        }

        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(ValidationError::OutOfRange {
                field: "limit".to_string(),
                min: "1".to_string(),
                max: MAX_PAGE_SIZE.to_string(),
                value: limit.to_string(),
            });
        }

        Ok(Self { page, limit })
    }

    /// Returns the items on this page; pages past the end are empty
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = (self.page as usize - 1).saturating_mul(self.limit as usize);
        items
            .into_iter()
            .skip(offset)
            .take(self.limit as usize)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let pagination = Pagination::new(None, None).unwrap();
        assert_eq!(pagination, Pagination::default());
        assert_eq!(pagination.limit, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        assert!(Pagination::new(Some(0), None).is_err());
        assert!(Pagination::new(None, Some(0)).is_err());
        assert!(Pagination::new(None, Some(MAX_PAGE_SIZE + 1)).is_err());
        assert!(Pagination::new(Some(3), Some(MAX_PAGE_SIZE)).is_ok());
    }

    #[test]
    fn test_apply_windows_items() {
        let items: Vec<u32> = (1..=10).collect();

        let first = Pagination { page: 1, limit: 4 };
        let last = Pagination { page: 3, limit: 4 };
        let beyond = Pagination { page: 4, limit: 4 };

        assert_eq!(first.apply(items.clone()), vec![1, 2, 3, 4]);
        assert_eq!(last.apply(items.clone()), vec![9, 10]);
        assert!(beyond.apply(items).is_empty());
    }
}
