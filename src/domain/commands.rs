use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{BookId, LoanId};

/// コマンド：書籍を登録する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
}

/// コマンド：書籍の書誌情報を更新する
///
/// ISBNは更新対象外のため、フィールド自体を持たない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBook {
    pub book_id: BookId,
    pub title: String,
    pub author: String,
}

/// コマンド：書籍を貸し出す
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLoan {
    pub isbn: String,
    pub customer: String,
    pub customer_email: Option<String>,
    pub loan_date: NaiveDate,
}

/// コマンド：返却判断を記録する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnLoan {
    pub loan_id: LoanId,
    pub returned: bool,
}
