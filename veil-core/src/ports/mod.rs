// veil-core/src/ports/mod.rs

pub mod design_store;

pub use design_store::DesignStore;
