pub mod app_command;
pub mod export;
pub mod quote;

pub use app_command::{AppCommand, USAGE};
pub use quote::QuoteContext;
