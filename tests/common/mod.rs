#![allow(dead_code)]

use chrono::{Duration, NaiveDate, Utc};
use library_lending::adapters::memory::{InMemoryBookStore, InMemoryLoanStore};
use library_lending::application::catalog::{CatalogDependencies, create_book};
use library_lending::domain::book::Book;
use library_lending::domain::commands::{CreateBook, CreateLoan};
use sqlx::PgPool;
use std::sync::Arc;

use library_lending::application::loan::LendingDependencies;

/// テスト用データベースプールを作成し、マイグレーションを実行
///
/// DATABASE_URLが未設定の場合は`None`を返し、呼び出し側のテストはスキップする。
/// 本番と同じマイグレーションファイルを使用する。
pub async fn create_test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping PostgreSQL test");
        return None;
    };

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}

/// テーブルを空にする
pub async fn cleanup_database(pool: &PgPool) {
    sqlx::query("TRUNCATE TABLE loans, books")
        .execute(pool)
        .await
        .expect("Failed to truncate tables");
}

/// インメモリアダプターで組み立てた依存関係
pub struct TestContext {
    pub catalog: CatalogDependencies,
    pub lending: LendingDependencies,
}

pub fn in_memory_context() -> TestContext {
    let books = Arc::new(InMemoryBookStore::new());
    let loans = Arc::new(InMemoryLoanStore::new(books.clone()));

    TestContext {
        catalog: CatalogDependencies {
            book_store: books.clone(),
        },
        lending: LendingDependencies {
            book_store: books,
            loan_store: loans,
        },
    }
}

pub fn create_book_cmd(title: &str, author: &str, isbn: &str) -> CreateBook {
    CreateBook {
        title: title.to_string(),
        author: author.to_string(),
        isbn: isbn.to_string(),
    }
}

pub fn create_loan_cmd(isbn: &str, customer: &str, loan_date: NaiveDate) -> CreateLoan {
    CreateLoan {
        isbn: isbn.to_string(),
        customer: customer.to_string(),
        customer_email: Some(format!("{}@example.com", customer.to_lowercase())),
        loan_date,
    }
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn days_ago(days: i64) -> NaiveDate {
    today() - Duration::days(days)
}

pub async fn register(ctx: &TestContext, title: &str, author: &str, isbn: &str) -> Book {
    create_book(&ctx.catalog, create_book_cmd(title, author, isbn))
        .await
        .expect("Failed to register book")
}
