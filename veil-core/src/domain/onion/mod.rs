// veil-core/src/domain/onion/mod.rs

pub mod binding;
pub mod bits;
pub mod naming;
pub mod policy;
pub mod security_level;

pub use binding::{OnionBinding, RegularOnion};
pub use bits::{Onion, OnionMask};
pub use naming::VirtualColumnNamer;
pub use policy::{HomGroups, OnionSet, PolicyEntry, PolicyKey, PolicyTarget};
pub use security_level::{RuntimeEncoding, SecLevel};
