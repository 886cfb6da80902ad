use serde::{Deserialize, Serialize};

use super::value_objects::require_text;
use super::{BookId, Isbn, ValidationError};

/// Book集約 - 貸出可能な1冊の書籍
///
/// 1レコード = 1冊（複本管理はしない）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: Isbn,
}

/// 純粋関数：書籍を登録する
///
/// ビジネスルール：
/// - タイトル・著者は空不可
/// - IDは登録時に採番される
///
/// ISBNの一意性はカタログストアの責務であり、ここでは検証しない。
pub fn register_book(title: &str, author: &str, isbn: Isbn) -> Result<Book, ValidationError> {
    Ok(Book {
        book_id: BookId::new(),
        title: require_text("title", title)?,
        author: require_text("author", author)?,
        isbn,
    })
}

/// 純粋関数：書籍の書誌情報を更新する
///
/// 変更できるのはタイトルと著者のみ。ISBNとIDは常に元の値を引き継ぐ。
pub fn update_details(book: &Book, title: &str, author: &str) -> Result<Book, ValidationError> {
    Ok(Book {
        title: require_text("title", title)?,
        author: require_text("author", author)?,
        ..book.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn isbn(value: &str) -> Isbn {
        Isbn::parse(value).unwrap()
    }

    #[test]
    fn test_register_book_assigns_identity() {
        let a = register_book("T", "A", isbn("123")).unwrap();
        let b = register_book("T", "A", isbn("124")).unwrap();
        assert_ne!(a.book_id, b.book_id);
        assert_eq!(a.title, "T");
        assert_eq!(a.author, "A");
        assert_eq!(a.isbn.as_str(), "123");
    }

    #[test]
    fn test_register_book_rejects_blank_title() {
        let result = register_book("  ", "A", isbn("123"));
        assert_eq!(result.unwrap_err(), ValidationError::Blank("title"));
    }

    #[test]
    fn test_register_book_rejects_blank_author() {
        let result = register_book("T", "", isbn("123"));
        assert_eq!(result.unwrap_err(), ValidationError::Blank("author"));
    }

    #[test]
    fn test_update_details_keeps_isbn_and_id() {
        let book = register_book("T", "A", isbn("123")).unwrap();
        let updated = update_details(&book, "New title", "New author").unwrap();

        assert_eq!(updated.book_id, book.book_id);
        assert_eq!(updated.isbn, book.isbn);
        assert_eq!(updated.title, "New title");
        assert_eq!(updated.author, "New author");
    }

    #[test]
    fn test_update_details_validates_fields() {
        let book = register_book("T", "A", isbn("123")).unwrap();
        assert!(update_details(&book, "", "A").is_err());
    }
}
