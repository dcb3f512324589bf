//! Fixed-size paging over filtered record lists

use serde::{Deserialize, Serialize};

/// Default rows per page in the drill-down table
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// One page of a list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based
    pub page_index: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// `ceil(len / page_size)`, never below 1
pub fn total_pages(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1)).max(1)
}

/// Slice `list` to the 1-based `page_index`
///
/// Out-of-range indexes are clamped into `1..=total_pages`; a zero page size
/// is treated as 1.
pub fn paginate<T>(list: &[T], page_index: usize, page_size: usize) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let total_pages = total_pages(list.len(), page_size);
    let page_index = page_index.clamp(1, total_pages);

    let start = ((page_index - 1) * page_size).min(list.len());
    let end = (start + page_size).min(list.len());

    Page {
        items: &list[start..end],
        page_index,
        total_pages,
        total_items: list.len(),
    }
}

/// Cursor state for a paged view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginator {
    page_index: usize,
    page_size: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Paginator {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_index: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Back to page 1
    pub fn reset(&mut self) {
        self.page_index = 1;
    }

    /// Changing the page size always returns to page 1
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.reset();
    }

    /// Advance unless already on the last page
    pub fn next_page(&mut self, len: usize) -> bool {
        if self.page_index < total_pages(len, self.page_size) {
            self.page_index += 1;
            true
        } else {
            false
        }
    }

    /// Step back unless already on page 1
    pub fn prev_page(&mut self) -> bool {
        if self.page_index > 1 {
            self.page_index -= 1;
            true
        } else {
            false
        }
    }

    /// Jump to a page, clamped into range
    pub fn goto_page(&mut self, page_index: usize, len: usize) {
        self.page_index = page_index.clamp(1, total_pages(len, self.page_size));
    }

    pub fn page<'a, T>(&self, list: &'a [T]) -> Page<'a, T> {
        paginate(list, self.page_index, self.page_size)
    }
}
