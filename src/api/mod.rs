pub mod attendance;
pub mod intern;
pub mod leave_request;
pub mod scanner;
pub mod supervisor;
pub mod user;

use chrono::NaiveDate;

// Helper enum for typed SQLx binding of dynamic WHERE clauses
pub(crate) enum FilterValue {
    U64(u64),
    Str(String),
    Date(NaiveDate),
}

/// `(page, per_page, offset)` from optional query values.
pub(crate) fn paginate(page: Option<u64>, per_page: Option<u64>) -> (u64, u64, u64) {
    let per_page = per_page.unwrap_or(10).clamp(1, 100);
    let page = page.unwrap_or(1).max(1);
    (page, per_page, (page - 1) * per_page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_is_one_based_and_capped() {
        assert_eq!(paginate(None, None), (1, 10, 0));
        assert_eq!(paginate(Some(3), Some(20)), (3, 20, 40));
        assert_eq!(paginate(Some(0), Some(500)), (1, 100, 0));
        assert_eq!(paginate(Some(2), Some(0)), (2, 1, 1));
    }
}
