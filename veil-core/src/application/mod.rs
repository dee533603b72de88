// veil-core/src/application/mod.rs

pub mod design;
pub mod plan;

// --- RE-EXPORTS ---
// `use veil_core::application::{load_design, plan_query};`

pub use design::{canonical_precomputed, load_design, merge_designs, with_global_names};
pub use plan::{PlanReport, plan_query};
