pub mod quote_record;
pub mod session_entry;

pub use quote_record::Entity as QuoteRecord;
pub use session_entry::Entity as SessionEntry;
