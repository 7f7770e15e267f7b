//! Pagination arithmetic for list responses.

// == Page Info ==
/// Page position derived from a total row count and a limit/offset window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub current_page: u64,
    pub next_page: Option<u64>,
    pub prev_page: Option<u64>,
    pub total_pages: u64,
}

impl PageInfo {
    /// Computes page metadata.
    ///
    /// Returns `None` for `limit == 0`, where the page count is undefined.
    pub fn compute(total_count: u64, limit: u32, offset: u64) -> Option<Self> {
        if limit == 0 {
            return None;
        }
        let limit = u64::from(limit);
        let total_pages = total_count.div_ceil(limit);
        let current_page = offset / limit + 1;

        Some(Self {
            current_page,
            next_page: (current_page < total_pages).then_some(current_page + 1),
            prev_page: (current_page > 1).then_some(current_page - 1),
            total_pages,
        })
    }
}
