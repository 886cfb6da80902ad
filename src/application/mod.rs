pub mod catalog;
pub mod errors;
pub mod loan;

pub use errors::{ApplicationError, Result};
