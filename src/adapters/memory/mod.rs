pub mod book_store;
pub mod loan_store;

pub use book_store::BookStore as InMemoryBookStore;
pub use loan_store::LoanStore as InMemoryLoanStore;

use crate::ports::StoreError;
use std::sync::{Mutex, MutexGuard};

/// Mutexを取得する（ポイズン時はストアの障害として扱う）
fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Backend("in-memory store mutex poisoned".into()))
}
