pub mod design;
pub mod project;
pub mod query;
pub mod store;

pub use design::{DesignEntry, DesignFile};
pub use project::{NamingConfig, ProjectConfig, load_project_config};
pub use query::{QueryFile, RequirementSpec};
pub use store::YamlDesignStore;
