//! 1-indexed page slicing shared by every listing surface.

use std::num::NonZeroUsize;

use serde::Serialize;

/// One page of a larger result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total_pages: u32,
    /// Size of the full (pre-pagination) result set.
    pub total: usize,
}

/// `ceil(count / page_size)`.
pub fn total_pages(count: usize, page_size: NonZeroUsize) -> u32 {
    u32::try_from(count.div_ceil(page_size.get())).unwrap_or(u32::MAX)
}

/// Slices `items` to the requested 1-indexed page.
///
/// Page `0` is read as page `1`. A page past the end yields an empty `data`, not an error.
pub fn paginate<T>(items: Vec<T>, page: u32, page_size: NonZeroUsize) -> Page<T> {
    let total = items.len();
    let size = page_size.get();
    let index = (page.max(1) - 1) as usize;
    let start = index.saturating_mul(size);

    let data = if start >= total {
        Vec::new()
    } else {
        items.into_iter().skip(start).take(size).collect()
    };

    Page {
        data,
        total_pages: total_pages(total, page_size),
        total,
    }
}
