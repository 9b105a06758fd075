// Copyright 2023 Remi Bernotavicius

use crate::error::{AppError, AppResult};
use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> AppResult<Self> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(default_limit);
        if page < 1 {
            return Err(AppError::validation("page must be a positive number"));
        }
        if limit < 1 {
            return Err(AppError::validation("limit must be a positive number"));
        }
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    /// Fails for pages past the end. The first page always exists, even with nothing on it.
    pub fn check(&self, count: i64) -> AppResult<()> {
        if self.page > 1 && self.offset() >= count {
            return Err(AppError::not_found(format!("invalid page {}", self.page)));
        }
        Ok(())
    }

    pub fn into_page<T>(self, count: i64, results: Vec<T>) -> Page<T> {
        Page {
            count,
            next: (self.offset() + self.limit < count).then_some(self.page + 1),
            previous: (self.page > 1).then_some(self.page - 1),
            results,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<i64>,
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn try_map<U>(self, f: impl FnMut(T) -> AppResult<U>) -> AppResult<Page<U>> {
        Ok(Page {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect::<AppResult<_>>()?,
        })
    }
}

#[test]
fn page_links() {
    let request = PageRequest::new(Some(2), Some(10), 6).unwrap();
    assert_eq!(request.offset(), 10);
    let page = request.into_page(25, vec![0; 10]);
    assert_eq!(page.next, Some(3));
    assert_eq!(page.previous, Some(1));

    let request = PageRequest::new(None, None, 10).unwrap();
    let page = request.into_page::<u8>(0, vec![]);
    assert_eq!(page.next, None);
    assert_eq!(page.previous, None);
    assert_eq!(page.count, 0);
}

#[test]
fn page_bounds() {
    assert!(matches!(
        PageRequest::new(Some(0), None, 10),
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        PageRequest::new(None, Some(0), 10),
        Err(AppError::Validation(_))
    ));

    let first = PageRequest::new(Some(1), Some(10), 10).unwrap();
    assert!(first.check(0).is_ok());

    let past_end = PageRequest::new(Some(3), Some(10), 10).unwrap();
    assert!(matches!(past_end.check(20), Err(AppError::NotFound(_))));
    assert!(past_end.check(21).is_ok());
}
