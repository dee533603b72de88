// veil-core/src/infrastructure/config/project.rs

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::domain::onion::naming::{
    DEFAULT_GLOBAL_PREFIX, DEFAULT_LOCAL_PREFIX, VirtualColumnNamer,
};
use crate::domain::planner::PlannerConfig;
use crate::infrastructure::error::InfrastructureError;

pub const DESIGN_PATH_ENV: &str = "VEIL_DESIGN_PATH";
pub const MAX_PERMUTATIONS_ENV: &str = "VEIL_MAX_PERMUTATIONS";

#[derive(Debug, Deserialize, Serialize, Validate, Clone)]
pub struct ProjectConfig {
    #[validate(length(min = 1, message = "project name cannot be empty"))]
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,

    #[serde(rename = "schema-path", default = "default_schema_path")]
    pub schema_path: String,

    #[serde(rename = "design-path", default = "default_design_path")]
    pub design_path: String,

    /// Row counts for the cost model. Absent means every relation uses the
    /// default row count.
    #[serde(rename = "statistics-path", default, skip_serializing_if = "Option::is_none")]
    pub statistics_path: Option<String>,

    #[serde(default)]
    pub naming: NamingConfig,

    #[serde(default)]
    #[validate(nested)]
    pub planner: PlannerConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct NamingConfig {
    pub local_prefix: String,
    pub global_prefix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            local_prefix: DEFAULT_LOCAL_PREFIX.to_string(),
            global_prefix: DEFAULT_GLOBAL_PREFIX.to_string(),
        }
    }
}

impl NamingConfig {
    pub fn namer(&self) -> VirtualColumnNamer {
        VirtualColumnNamer::with_prefixes(&self.local_prefix, &self.global_prefix)
    }
}

fn default_version() -> String {
    "1.0".to_string()
}
fn default_schema_path() -> String {
    "schema.yaml".to_string()
}
fn default_design_path() -> String {
    "design.yaml".to_string()
}

impl ProjectConfig {
    pub fn schema_file(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.schema_path)
    }

    pub fn design_file(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.design_path)
    }

    pub fn statistics_file(&self, project_dir: &Path) -> Option<PathBuf> {
        self.statistics_path.as_ref().map(|p| project_dir.join(p))
    }
}

#[instrument(skip(project_dir))]
pub fn load_project_config(project_dir: &Path) -> Result<ProjectConfig, InfrastructureError> {
    let config_path = find_main_config(project_dir)?;
    info!(path = ?config_path, "Loading project manifest");

    let content = fs::read_to_string(&config_path)?;
    let mut config: ProjectConfig = serde_yaml::from_str(&content)?;

    // VEIL_DESIGN_PATH=alt.yaml veil plan ...
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    config.validate()?;
    Ok(config)
}

fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    let candidates = ["veil.yaml", "veil_project.yaml"];
    for filename in candidates {
        let p = root.join(filename);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(InfrastructureError::ConfigNotFound(format!(
        "No configuration file found in {:?}. Checked: {:?}",
        root, candidates
    )))
}

fn apply_env_overrides(config: &mut ProjectConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup(DESIGN_PATH_ENV) {
        info!(old = ?config.design_path, new = ?val, "Overriding design path via ENV");
        config.design_path = val;
    }
    if let Some(val) = lookup(MAX_PERMUTATIONS_ENV) {
        match val.parse::<usize>() {
            Ok(limit) => {
                info!(
                    old = config.planner.max_permutations,
                    new = limit,
                    "Overriding permutation limit via ENV"
                );
                config.planner.max_permutations = limit;
            }
            Err(_) => warn!(value = ?val, "Ignoring non-numeric {}", MAX_PERMUTATIONS_ENV),
        }
    }
}
