use serde::Serialize;

/// Number of listings shown per results page.
pub const PAGE_SIZE: u32 = 6;

/// Offset/limit window requested from a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub size: u32,
}

impl PageWindow {
    /// Results-page window; page numbers start at 1.
    pub fn for_page(page: u32) -> Self {
        Self::new(page, PAGE_SIZE)
    }

    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: page.max(1),
            size: size.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.size)
    }
}

/// One page of results plus the figures needed to render pagination controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: u64, window: PageWindow) -> Self {
        Self {
            items,
            total,
            page: window.page,
            page_size: window.size,
            total_pages: total_pages(total, window.size),
        }
    }

    pub fn empty(window: PageWindow) -> Self {
        Self::new(Vec::new(), 0, window)
    }
}

pub fn total_pages(total: u64, page_size: u32) -> u32 {
    let pages = total.div_ceil(u64::from(page_size.max(1)));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        let expected = [(0, 0), (1, 1), (5, 1), (6, 1), (7, 2), (12, 2), (13, 3), (600, 100)];
        for (total, pages) in expected {
            assert_eq!(total_pages(total, PAGE_SIZE), pages, "total {total}");
        }
    }

    #[test]
    fn window_offsets_follow_page_number() {
        assert_eq!(PageWindow::for_page(1).offset(), 0);
        assert_eq!(PageWindow::for_page(3).offset(), 12);
        assert_eq!(PageWindow::for_page(0).page, 1, "page zero clamps to one");
        assert_eq!(PageWindow::for_page(2).limit(), 6);
    }

    #[test]
    fn empty_result_keeps_the_requested_page() {
        let result: PaginatedResult<u32> = PaginatedResult::empty(PageWindow::for_page(4));
        assert!(result.items.is_empty());
        assert_eq!(result.total, 0);
        assert_eq!(result.total_pages, 0);
        assert_eq!(result.page, 4);
        assert_eq!(result.page_size, PAGE_SIZE);
    }
}
