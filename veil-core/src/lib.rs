// veil-core/src/lib.rs

#![allow(missing_docs)]
// Memory safety
#![deny(unsafe_code)]
// Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::perf)]

// --- MODULES ---

// 0. Ports: storage contracts for designs, schemas, statistics and queries.
pub mod ports;

// 1. Domain: onion vocabulary, policy container, expression keys, plan search.
// Depends on nothing else in the crate.
pub mod domain;

// 2. Infrastructure: YAML loaders for project config, schema, designs,
// statistics and query requirements. SQL text -> expression AST.
pub mod infrastructure;

// 3. Application: use cases wiring loaders and the optimizer.
pub mod application;

pub mod error;

// --- RE-EXPORTS ---
pub use domain::onion::{Onion, OnionBinding, OnionMask, OnionSet};
pub use domain::planner::RuntimeOptimizer;
pub use error::VeilError;
