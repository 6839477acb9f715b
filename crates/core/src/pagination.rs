//! Pagination and sort options shared across read operations.

use serde::{Deserialize, Serialize};

const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 1000;

/// Paging window over an ordered result set.
///
/// Invalid combinations (limit outside `[1, 1000]`) are silently replaced by
/// the defaults rather than rejected, per the read-path contract.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }.normalized()
    }

    /// Replace an out-of-range limit with the default; offset is always accepted.
    pub fn normalized(self) -> Self {
        if self.limit == 0 || self.limit > MAX_LIMIT {
            Self {
                limit: DEFAULT_LIMIT,
                offset: self.offset,
            }
        } else {
            self
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Name,
    CreatedAt,
    UpdatedAt,
    Size,
    Type,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOptions {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            direction: SortDirection::Asc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_limit_falls_back_to_default() {
        let p = Pagination::new(0, 10);
        assert_eq!(p.limit, DEFAULT_LIMIT);
        assert_eq!(p.offset, 10);
    }

    #[test]
    fn oversized_limit_falls_back_to_default() {
        let p = Pagination::new(5000, 0);
        assert_eq!(p.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn in_range_limit_is_preserved() {
        let p = Pagination::new(10, 5);
        assert_eq!(p.limit, 10);
        assert_eq!(p.offset, 5);
    }

    proptest::proptest! {
        /// Normalization never produces a limit outside `[1, MAX_LIMIT]`, and
        /// never rewrites the offset.
        #[test]
        fn normalized_limit_always_in_range(limit: u32, offset: u32) {
            let p = Pagination::new(limit, offset);
            proptest::prop_assert!(p.limit >= 1 && p.limit <= MAX_LIMIT);
            proptest::prop_assert_eq!(p.offset, offset);
        }

        /// Normalizing an already-normalized value is a no-op (idempotent).
        #[test]
        fn normalization_is_idempotent(limit: u32, offset: u32) {
            let once = Pagination::new(limit, offset);
            let twice = once.normalized();
            proptest::prop_assert_eq!(once, twice);
        }
    }
}
