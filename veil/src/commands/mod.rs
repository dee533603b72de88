// veil/src/commands/mod.rs

pub mod complete;
pub mod inspect;
pub mod merge;
pub mod plan;

use std::path::{Path, PathBuf};

use veil_core::infrastructure::config::{ProjectConfig, YamlDesignStore, load_project_config};

/// A loaded `veil.yaml` and the store configured from it.
pub struct Project {
    pub dir: PathBuf,
    pub config: ProjectConfig,
    pub store: YamlDesignStore,
}

impl Project {
    pub fn open(dir: PathBuf) -> anyhow::Result<Self> {
        let config = load_project_config(&dir)?;
        let store = YamlDesignStore::new(config.naming.namer());
        Ok(Self { dir, config, store })
    }

    /// `explicit` when given, the project's design file otherwise.
    pub fn design_path(&self, explicit: Option<PathBuf>) -> PathBuf {
        explicit.unwrap_or_else(|| self.config.design_file(&self.dir))
    }

    pub fn schema_path(&self) -> PathBuf {
        self.config.schema_file(&self.dir)
    }

    pub fn statistics_path(&self) -> Option<PathBuf> {
        self.config.statistics_file(&self.dir)
    }

    pub fn describe(&self, path: &Path) -> String {
        format!("{} ({})", self.config.name, path.display())
    }
}
