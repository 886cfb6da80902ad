mod loan_service;
mod overdue_notification;

pub use loan_service::{
    BOOK_ALREADY_ON_LOAN, BOOK_NOT_FOUND_FOR_ISBN, LendingDependencies, LoanDetails, create_loan,
    find_loans, get_loan, get_loans_for_book, get_overdue_loans, get_overdue_loans_as_of,
    return_loan,
};
pub use overdue_notification::{
    DEFAULT_MESSAGE, DEFAULT_SUBJECT, OverdueNotice, notify_overdue_loans,
};
