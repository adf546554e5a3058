//! Page-number pagination.

/// Bounds of one page of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based page number
    pub page: usize,
    pub skip: usize,
    pub end: usize,
}

impl PageWindow {
    /// Window for `page` (1-based; 0 is treated as 1) of `page_size` items.
    pub fn new(page: usize, page_size: usize) -> Self {
        let page = page.max(1);
        let skip = (page - 1).saturating_mul(page_size);
        Self {
            page,
            skip,
            end: skip.saturating_add(page_size),
        }
    }

    /// `end` as a signed bound for registry listings, where -1 means "all".
    pub fn end_bound(&self) -> isize {
        isize::try_from(self.end).unwrap_or(isize::MAX)
    }

    /// The items of this page, clamped to what exists.
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let end = self.end.min(items.len());
        let skip = self.skip.min(end);
        items[skip..end].to_vec()
    }
}
