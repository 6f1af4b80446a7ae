pub mod quote_repo;
pub mod session_repo;

pub use quote_repo::{QuoteRepository, QuoteSummary};
pub use session_repo::{
    SessionRepository, KEY_COMPARE_PLANS, KEY_COMPARE_SELECTION, KEY_QUOTE_CODE, KEY_QUOTE_FORM,
};
