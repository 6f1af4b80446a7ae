pub mod attributes;
pub mod clinics;
pub mod render;
pub mod set;
pub mod store;

pub use attributes::{value_for, AttributeCatalog, MatrixRow, NOT_APPLICABLE};
pub use clinics::{plan_includes_clinic, ClinicRoster};
pub use render::{format_price, ComparisonRenderer};
pub use set::{ComparisonSet, MAX_COMPARE};
pub use store::{ComparisonStore, MemoryComparisonStore, SessionComparisonStore};
