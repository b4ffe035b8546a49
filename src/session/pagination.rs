//! Page arithmetic shared by the controller and the view boundary.

/// `ceil(total_count / page_size)`; zero when there is nothing to show.
pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total_count.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Clamp a requested page into `[1, max(total_pages, 1)]`.
pub fn clamp_page(page: u32, total_pages: u32) -> u32 {
    page.clamp(1, total_pages.max(1))
}

/// Zero-based row offset of `page`.
pub fn offset_for(page: u32, page_size: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(page_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(12, 5), 3);
        assert_eq!(total_pages(10, 5), 2);
        assert_eq!(total_pages(0, 5), 0);
        assert_eq!(total_pages(1, 5), 1);
        assert_eq!(total_pages(23, 5), 5);
    }

    #[test]
    fn test_clamp_page_bounds() {
        let pages = total_pages(12, 5);
        assert_eq!(clamp_page(0, pages), 1);
        assert_eq!(clamp_page(4, pages), 3);
        assert_eq!(clamp_page(2, pages), 2);
        // Empty result sets still have a first page.
        assert_eq!(clamp_page(3, 0), 1);
    }

    #[test]
    fn test_offset() {
        for page in 1..50u32 {
            assert_eq!(offset_for(page, 5), u64::from(page - 1) * 5);
        }
        assert_eq!(offset_for(1, 5), 0);
        assert_eq!(offset_for(2, 5), 5);
    }
}
