pub mod book_store;
pub mod error;
pub mod loan_store;
pub mod notification_service;

pub use book_store::BookStore;
pub use error::StoreError;
pub use loan_store::LoanStore;
pub use notification_service::NotificationService;
