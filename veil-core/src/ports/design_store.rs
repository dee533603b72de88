// veil-core/src/ports/design_store.rs

// What the use cases need to read and persist, without knowing the file format.

use std::path::Path;

use crate::domain::onion::OnionSet;
use crate::domain::planner::{QueryRequirements, TableStatistics};
use crate::domain::schema::Definitions;
use crate::error::VeilError;

pub trait DesignStore: Send + Sync {
    fn load_definitions(&self, path: &Path) -> Result<Definitions, VeilError>;

    fn load_design(&self, path: &Path) -> Result<OnionSet, VeilError>;

    fn save_design(&self, path: &Path, design: &OnionSet) -> Result<(), VeilError>;

    fn load_statistics(&self, path: &Path) -> Result<TableStatistics, VeilError>;

    fn load_query(&self, path: &Path) -> Result<QueryRequirements, VeilError>;
}
