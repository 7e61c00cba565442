//! Fixed-size page slicing for post listings.
//!
//! A listing always has at least one page, possibly empty. Requested page
//! numbers that cannot be parsed fall back to the first page, numbers outside
//! `1..=num_pages` clamp to the nearest valid page.

use serde::Serialize;

pub const POSTS_PER_PAGE: u64 = 10;

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: u64,
    count: u64,
}

impl Paginator {
    pub fn new(count: u64, per_page: u64) -> Self {
        Self {
            per_page: per_page.max(1),
            count,
        }
    }

    pub fn num_pages(&self) -> u64 {
        if self.count == 0 {
            1
        } else {
            self.count.div_ceil(self.per_page)
        }
    }

    pub fn resolve(&self, raw: Option<&str>) -> u64 {
        let requested = raw.and_then(|value| value.trim().parse::<i64>().ok());
        match requested {
            None => 1,
            Some(n) if n < 1 => 1,
            Some(n) => (n as u64).min(self.num_pages()),
        }
    }

    pub fn limit(&self) -> u64 {
        self.per_page
    }

    pub fn offset(&self, number: u64) -> u64 {
        (number.saturating_sub(1)) * self.per_page
    }

    pub fn page<T>(&self, object_list: Vec<T>, number: u64) -> Page<T> {
        let num_pages = self.num_pages();
        let has_next = number < num_pages;
        let has_previous = number > 1;
        Page {
            object_list,
            number,
            num_pages,
            count: self.count,
            has_next,
            has_previous,
            next_page_number: has_next.then_some(number + 1),
            previous_page_number: has_previous.then(|| number - 1),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub object_list: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<u64>,
    pub previous_page_number: Option<u64>,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.object_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_list.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.object_list.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_listing_has_one_page() {
        let paginator = Paginator::new(0, POSTS_PER_PAGE);
        assert_eq!(paginator.num_pages(), 1);
        assert_eq!(paginator.resolve(Some("3")), 1);
    }

    #[test]
    fn exactly_one_full_page() {
        let paginator = Paginator::new(10, POSTS_PER_PAGE);
        assert_eq!(paginator.num_pages(), 1);
        assert_eq!(paginator.resolve(Some("2")), 1);
    }

    #[test]
    fn partial_last_page_counts() {
        let paginator = Paginator::new(21, POSTS_PER_PAGE);
        assert_eq!(paginator.num_pages(), 3);
        assert_eq!(paginator.offset(3), 20);
    }

    #[test]
    fn page_number_fallbacks() {
        let paginator = Paginator::new(35, POSTS_PER_PAGE);
        assert_eq!(paginator.resolve(None), 1);
        assert_eq!(paginator.resolve(Some("abc")), 1);
        assert_eq!(paginator.resolve(Some("0")), 1);
        assert_eq!(paginator.resolve(Some("-4")), 1);
        assert_eq!(paginator.resolve(Some("2")), 2);
        assert_eq!(paginator.resolve(Some("99")), 4);
    }

    #[test]
    fn navigation_metadata() {
        let paginator = Paginator::new(25, POSTS_PER_PAGE);

        let first = paginator.page(vec![(); 10], 1);
        assert!(first.has_next);
        assert!(!first.has_previous);
        assert_eq!(first.next_page_number, Some(2));
        assert_eq!(first.previous_page_number, None);

        let last = paginator.page(vec![(); 5], 3);
        assert!(!last.has_next);
        assert!(last.has_previous);
        assert_eq!(last.previous_page_number, Some(2));
        assert_eq!(last.len(), 5);
    }
}
