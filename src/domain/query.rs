use serde::{Deserialize, Serialize};

use super::ValidationError;

/// 一覧取得の既定ページサイズ
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// ページ指定
///
/// 不変条件：page_size > 0（型とコンストラクタで保証）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page_index: u32,
    page_size: u32,
}

impl PageRequest {
    pub fn new(page_index: u32, page_size: u32) -> Result<Self, ValidationError> {
        if page_size == 0 {
            return Err(ValidationError::InvalidPageSize);
        }
        Ok(Self {
            page_index,
            page_size,
        })
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// 先頭からのスキップ件数
    pub fn offset(&self) -> u64 {
        u64::from(self.page_index) * u64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// ページ単位の検索結果
///
/// `total_elements`はページングを適用する前の該当件数。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_elements: u64,
    pub page_index: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_elements: u64, request: PageRequest) -> Self {
        Self {
            items,
            total_elements,
            page_index: request.page_index(),
            page_size: request.page_size(),
        }
    }

    /// 整列済みの全該当データからページを切り出す
    ///
    /// インメモリアダプターで使用される。
    pub fn slice(all: Vec<T>, request: PageRequest) -> Self {
        let total_elements = all.len() as u64;
        let items = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.page_size() as usize)
            .collect();
        Self::new(items, total_elements, request)
    }

    pub fn total_pages(&self) -> u64 {
        self.total_elements.div_ceil(u64::from(self.page_size))
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            page_index: self.page_index,
            page_size: self.page_size,
        }
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 書籍検索条件
///
/// 指定された項目すべてに一致する書籍を返す（AND）。
/// 一致判定は大文字小文字を区別しない部分一致。
/// 空文字列は未指定として扱う。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub title: Option<String>,
    pub author: Option<String>,
}

impl BookFilter {
    pub fn new(title: Option<String>, author: Option<String>) -> Self {
        Self {
            title: normalize(title),
            author: normalize(author),
        }
    }

    pub fn matches(&self, title: &str, author: &str) -> bool {
        fn contains(haystack: &str, needle: &Option<String>) -> bool {
            needle
                .as_ref()
                .is_none_or(|n| haystack.to_lowercase().contains(&n.to_lowercase()))
        }
        contains(title, &self.title) && contains(author, &self.author)
    }
}

/// 貸出検索条件
///
/// ISBN一致 OR 顧客名一致（いずれも完全一致）。
/// 両方未指定の場合は全件が対象。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoanFilter {
    pub isbn: Option<String>,
    pub customer: Option<String>,
}

impl LoanFilter {
    pub fn new(isbn: Option<String>, customer: Option<String>) -> Self {
        Self {
            isbn: normalize(isbn),
            customer: normalize(customer),
        }
    }

    pub fn is_unfiltered(&self) -> bool {
        self.isbn.is_none() && self.customer.is_none()
    }

    pub fn matches(&self, isbn: &str, customer: &str) -> bool {
        if self.is_unfiltered() {
            return true;
        }
        self.isbn.as_deref() == Some(isbn) || self.customer.as_deref() == Some(customer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_rejects_zero_size() {
        assert_eq!(PageRequest::new(0, 0), Err(ValidationError::InvalidPageSize));
    }

    #[test]
    fn test_page_request_offset() {
        let request = PageRequest::new(3, 20).unwrap();
        assert_eq!(request.offset(), 60);
    }

    #[test]
    fn test_page_slice() {
        let all: Vec<u32> = (1..=25).collect();

        let page = Page::slice(all.clone(), PageRequest::new(1, 10).unwrap());
        assert_eq!(page.items, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.total_elements, 25);
        assert_eq!(page.total_pages(), 3);

        let past_end = Page::slice(all, PageRequest::new(5, 10).unwrap());
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total_elements, 25);
    }

    #[test]
    fn test_book_filter_blank_is_absent() {
        let filter = BookFilter::new(Some("  ".to_string()), None);
        assert_eq!(filter, BookFilter::default());
        assert!(filter.matches("anything", "anyone"));
    }

    #[test]
    fn test_book_filter_matches_all_fields_case_insensitive() {
        let filter = BookFilter::new(Some("rust".to_string()), Some("klabnik".to_string()));
        assert!(filter.matches("The Rust Programming Language", "Steve Klabnik"));
        assert!(!filter.matches("The Rust Programming Language", "Jim Blandy"));
        assert!(!filter.matches("Dune", "Steve Klabnik"));
    }

    #[test]
    fn test_loan_filter_is_or() {
        let filter = LoanFilter::new(Some("123".to_string()), Some("Costa".to_string()));
        assert!(filter.matches("123", "Silva"));
        assert!(filter.matches("999", "Costa"));
        assert!(!filter.matches("999", "Silva"));
    }

    #[test]
    fn test_loan_filter_single_field_does_not_match_everything() {
        let filter = LoanFilter::new(Some("123".to_string()), None);
        assert!(filter.matches("123", "Silva"));
        assert!(!filter.matches("999", "Silva"));
    }

    #[test]
    fn test_loan_filter_unfiltered_matches_all() {
        let filter = LoanFilter::new(None, Some(String::new()));
        assert!(filter.is_unfiltered());
        assert!(filter.matches("999", "Silva"));
    }
}
