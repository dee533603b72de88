pub mod error;
pub mod expr;
pub mod onion;
pub mod planner;
pub mod schema;

pub use error::DomainError;
