pub mod filter;
pub mod model;
pub mod normalize;
pub mod sort;

pub use filter::{apply_filters, price_bounds, providers, FilterState};
pub use model::{Clinica, Contacto, GrupoFamiliar, Plan, PlanAttribute, QuoteRequest, Ubicacion};
pub use normalize::normalize_plans;
pub use sort::{sort_plans, SortKey};
