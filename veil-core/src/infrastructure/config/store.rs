// veil-core/src/infrastructure/config/store.rs

use serde::{Serialize, de::DeserializeOwned};
use std::fs;
use std::path::Path;
use tracing::{info, instrument};

use super::design::DesignFile;
use super::query::QueryFile;
use crate::domain::onion::{OnionSet, VirtualColumnNamer};
use crate::domain::planner::{QueryRequirements, TableStatistics};
use crate::domain::schema::Definitions;
use crate::error::VeilError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::DesignStore;

/// YAML files on the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct YamlDesignStore {
    /// Template for the namer of every loaded design.
    namer: VirtualColumnNamer,
}

impl YamlDesignStore {
    pub fn new(namer: VirtualColumnNamer) -> Self {
        Self { namer }
    }
}

/// Reads and deserializes one YAML file.
fn load_fragment<T: DeserializeOwned>(path: &Path) -> Result<T, InfrastructureError> {
    let content = fs::read_to_string(path).map_err(|e| {
        InfrastructureError::ConfigError(format!("Failed to read {:?}: {}", path, e))
    })?;
    serde_yaml::from_str(&content).map_err(Into::into)
}

fn save_fragment<T: Serialize>(path: &Path, value: &T) -> Result<(), InfrastructureError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let content = serde_yaml::to_string(value)?;
    fs::write(path, content)?;
    Ok(())
}

impl DesignStore for YamlDesignStore {
    #[instrument(skip(self))]
    fn load_definitions(&self, path: &Path) -> Result<Definitions, VeilError> {
        let definitions: Definitions = load_fragment(path)?;
        info!(relations = definitions.relations.len(), "Schema loaded");
        Ok(definitions)
    }

    #[instrument(skip(self))]
    fn load_design(&self, path: &Path) -> Result<OnionSet, VeilError> {
        let file: DesignFile = load_fragment(path)?;
        let design = file.into_onion_set(self.namer.clone())?;
        info!(entries = design.len(), "Design loaded");
        Ok(design)
    }

    #[instrument(skip(self, design))]
    fn save_design(&self, path: &Path, design: &OnionSet) -> Result<(), VeilError> {
        save_fragment(path, &DesignFile::from_onion_set(design))?;
        info!(entries = design.len(), "Design written");
        Ok(())
    }

    #[instrument(skip(self))]
    fn load_statistics(&self, path: &Path) -> Result<TableStatistics, VeilError> {
        Ok(load_fragment(path)?)
    }

    #[instrument(skip(self))]
    fn load_query(&self, path: &Path) -> Result<QueryRequirements, VeilError> {
        let file: QueryFile = load_fragment(path)?;
        Ok(file.into_requirements()?)
    }
}
