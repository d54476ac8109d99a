/// Posts per feed page.
pub(crate) const PAGE_SIZE: u32 = 10;

/// A slice of a listing resolved against its total size.
///
/// Out-of-range requests never fail: a non-numeric page falls back to the
/// first page, anything below 1 or past the end clamps to the last page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PageWindow {
    pub(crate) number: u32,
    pub(crate) num_pages: u32,
    pub(crate) page_size: u32,
    pub(crate) count: u64,
}

/// Integers too large for `i64` still count as past the end.
fn parse_page_number(raw: &str) -> i64 {
    match raw.parse::<i64>() {
        Ok(number) => number,
        Err(_) if is_integer_literal(raw) => {
            if raw.starts_with('-') {
                i64::MIN
            } else {
                i64::MAX
            }
        }
        Err(_) => 1,
    }
}

fn is_integer_literal(raw: &str) -> bool {
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit())
}

impl PageWindow {
    pub(crate) fn resolve(raw_page: Option<&str>, count: u64, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        // an empty listing still has one (empty) page
        let num_pages = count.max(1).div_ceil(u64::from(page_size));
        let num_pages = u32::try_from(num_pages).unwrap_or(u32::MAX);

        let requested = raw_page.map(str::trim).map_or(1, parse_page_number);
        let number = if requested < 1 || requested > i64::from(num_pages) {
            num_pages
        } else {
            requested as u32
        };

        Self {
            number,
            num_pages,
            page_size,
            count,
        }
    }

    pub(crate) fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub(crate) fn has_previous(&self) -> bool {
        self.number > 1
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Page<T> {
    pub(crate) items: Vec<T>,
    pub(crate) window: PageWindow,
}

impl<T> Page<T> {
    pub(crate) fn object_count(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            window: self.window,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PAGE_SIZE, PageWindow};

    #[test]
    fn missing_page_defaults_to_first() {
        let window = PageWindow::resolve(None, 13, PAGE_SIZE);
        assert_eq!(window.number, 1);
        assert_eq!(window.num_pages, 2);
        assert_eq!(window.page_size, 10);
        assert!(window.has_next());
        assert!(!window.has_previous());
    }

    #[test]
    fn second_page_of_thirteen_is_last() {
        let window = PageWindow::resolve(Some("2"), 13, PAGE_SIZE);
        assert_eq!(window.number, 2);
        assert!(!window.has_next());
        assert!(window.has_previous());
    }

    #[test]
    fn page_past_the_end_clamps_to_last() {
        let window = PageWindow::resolve(Some("99"), 13, PAGE_SIZE);
        assert_eq!(window.number, 2);
    }

    #[test]
    fn overflowing_page_clamps_to_last() {
        assert_eq!(
            PageWindow::resolve(Some("99999999999999999999"), 13, PAGE_SIZE).number,
            2
        );
        assert_eq!(
            PageWindow::resolve(Some("-99999999999999999999"), 25, PAGE_SIZE).number,
            3
        );
    }

    #[test]
    fn non_positive_page_clamps_to_last() {
        assert_eq!(PageWindow::resolve(Some("0"), 25, PAGE_SIZE).number, 3);
        assert_eq!(PageWindow::resolve(Some("-4"), 25, PAGE_SIZE).number, 3);
    }

    #[test]
    fn non_numeric_page_falls_back_to_first() {
        for raw in ["abc", "", "2.5", "1e3"] {
            let window = PageWindow::resolve(Some(raw), 25, PAGE_SIZE);
            assert_eq!(window.number, 1, "page {raw:?}");
        }
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(PageWindow::resolve(Some(" 2 "), 25, PAGE_SIZE).number, 2);
    }

    #[test]
    fn empty_listing_has_single_empty_page() {
        let window = PageWindow::resolve(Some("3"), 0, PAGE_SIZE);
        assert_eq!(window.number, 1);
        assert_eq!(window.num_pages, 1);
        assert!(!window.has_next());
    }

    #[test]
    fn exact_multiple_has_no_trailing_page() {
        let window = PageWindow::resolve(Some("3"), 20, PAGE_SIZE);
        assert_eq!(window.num_pages, 2);
        assert_eq!(window.number, 2);
    }
}
