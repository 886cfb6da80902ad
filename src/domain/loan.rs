use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::value_objects::require_text;
use super::{BookId, LoanId, ValidationError};

/// 延滞とみなすまでの日数（既定値）
pub const OVERDUE_THRESHOLD_DAYS: i64 = 4;

/// 貸出ステータス
///
/// 「貸出中」かどうかは`returned`フラグではなくこのステータスで判定する。
/// 返却操作で`returned = false`が記録された場合もClosedになる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    /// 貸出中（返却判断がまだない）
    Open,
    /// 返却判断済み
    Closed,
}

impl LoanStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, LoanStatus::Open)
    }

    /// 文字列表現を取得する
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Open => "open",
            LoanStatus::Closed => "closed",
        }
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(LoanStatus::Open),
            "closed" => Ok(LoanStatus::Closed),
            _ => Err(format!("Invalid loan status: {}", s)),
        }
    }
}

/// Loan集約 - 1冊の書籍の1回の貸出
///
/// 不変条件：同じ書籍に対してOpenのLoanは高々1件。
/// この不変条件はLoanStoreへの保存時に原子的に保証される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    // 識別子
    pub loan_id: LoanId,

    // 他の集約への参照（IDのみ、所有しない）
    pub book_id: BookId,

    // 借り手
    pub customer: String,
    pub customer_email: Option<String>,

    // 貸出管理の責務
    pub loan_date: NaiveDate,
    pub returned: Option<bool>,
    pub status: LoanStatus,
}

impl Loan {
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }
}

/// 純粋関数：書籍を貸し出す
///
/// ビジネスルール：
/// - 顧客名は空不可
/// - 貸出日は作成日（以後不変）
/// - 返却判断は未設定、状態はOpen
///
/// 「書籍が既に貸出中でないか」はアプリケーション層とストアで検証する。
pub fn lend_book(
    book_id: BookId,
    customer: &str,
    customer_email: Option<&str>,
    loan_date: NaiveDate,
) -> Result<Loan, ValidationError> {
    let customer = require_text("customer", customer)?;
    let customer_email = customer_email
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(str::to_string);

    Ok(Loan {
        loan_id: LoanId::new(),
        book_id,
        customer,
        customer_email,
        loan_date,
        returned: None,
        status: LoanStatus::Open,
    })
}

/// 純粋関数：返却判断を記録する
///
/// 既にClosedの貸出に対しても受け付ける（冪等）。
/// `returned`の値に関わらず状態はClosedになる。
pub fn return_loan(loan: &Loan, returned: bool) -> Loan {
    Loan {
        returned: Some(returned),
        status: LoanStatus::Closed,
        ..loan.clone()
    }
}

/// 延滞判定の基準日を計算する
///
/// `loan_date <= today - threshold_days` の貸出が延滞となる。
pub fn overdue_cutoff(today: NaiveDate, threshold_days: i64) -> Result<NaiveDate, ValidationError> {
    if threshold_days < 0 {
        return Err(ValidationError::NegativeThreshold(threshold_days));
    }
    Ok(today - Duration::days(threshold_days))
}

/// 純粋関数：延滞判定
pub fn is_overdue(loan: &Loan, cutoff: NaiveDate) -> bool {
    loan.is_open() && loan.loan_date <= cutoff
}
