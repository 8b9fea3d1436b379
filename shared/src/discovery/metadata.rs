//! Pagination metadata derived from a window total

use crate::types::PaginationMeta;

/// Build the metadata for a page.
///
/// A zero total yields all-zero metadata. Otherwise the requested page and
/// size are echoed back unclamped, so a page past `last_page` is detectable by
/// comparing the two.
pub fn calculate_metadata(total_records: u64, page: u32, page_size: u32) -> PaginationMeta {
    if total_records == 0 || page_size == 0 {
        return PaginationMeta::default();
    }

    let last_page = total_records.div_ceil(u64::from(page_size));

    PaginationMeta {
        current_page: page,
        page_size,
        last_page: u32::try_from(last_page).unwrap_or(u32::MAX),
        total_records,
    }
}
