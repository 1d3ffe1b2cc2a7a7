//! Zero-indexed pagination

use serde::{Deserialize, Serialize};

/// A requested page after clamping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
}

impl PageRequest {
    /// Clamp `size` into `[1, max_size]`; `None` falls back to `default_size`
    pub fn clamped(page: Option<usize>, size: Option<usize>, default_size: usize, max_size: usize) -> Self {
        let size = size.unwrap_or(default_size).clamp(1, max_size.max(1));
        Self {
            page: page.unwrap_or(0),
            size,
        }
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub content: Vec<T>,
    pub total_elements: usize,
    pub total_pages: usize,
    pub size: usize,
    pub number: usize,
    pub first: bool,
    pub last: bool,
    pub number_of_elements: usize,
}

impl<T> PaginatedResponse<T> {
    /// Slice `items` for `request`. A page past the end is empty, not an error.
    pub fn from_items(items: Vec<T>, request: PageRequest) -> Self {
        let total_elements = items.len();
        let total_pages = total_elements.div_ceil(request.size);
        let content: Vec<T> = items
            .into_iter()
            .skip(request.offset())
            .take(request.size)
            .collect();
        Self {
            number_of_elements: content.len(),
            content,
            total_elements,
            total_pages,
            size: request.size,
            number: request.page,
            first: request.page == 0,
            last: request.page.saturating_add(1) >= total_pages,
        }
    }
}
