// veil-core/src/domain/planner/configuration.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::onion::Onion;

#[derive(Debug, Deserialize, Serialize, Validate, Clone, PartialEq)]
pub struct PlannerConfig {
    /// Upper bound on enumerated onion permutations per query.
    #[serde(default = "default_max_permutations")]
    #[validate(range(min = 1, message = "max_permutations must be at least 1"))]
    pub max_permutations: usize,

    /// Multiplier applied to steps evaluated on the client after decryption.
    #[serde(default = "default_client_side_penalty")]
    #[validate(range(min = 1.0, message = "client_side_penalty cannot reward client work"))]
    pub client_side_penalty: f64,

    #[serde(default)]
    #[validate(nested)]
    pub weights: CostWeights,
}

fn default_max_permutations() -> usize {
    4096
}

fn default_client_side_penalty() -> f64 {
    10.0
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_permutations: default_max_permutations(),
            client_side_penalty: default_client_side_penalty(),
            weights: CostWeights::default(),
        }
    }
}

/// Per-row cost of reading one value under each onion.
#[derive(Debug, Deserialize, Serialize, Validate, Clone, PartialEq)]
#[serde(default)]
pub struct CostWeights {
    #[validate(range(min = 0.0))]
    pub plain: f64,
    #[validate(range(min = 0.0))]
    pub det: f64,
    #[validate(range(min = 0.0))]
    pub ope: f64,
    #[validate(range(min = 0.0))]
    pub swp: f64,
    #[validate(range(min = 0.0))]
    pub hom_agg: f64,
    #[validate(range(min = 0.0))]
    pub hom_row_desc: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            plain: 1.0,
            det: 1.2,
            ope: 2.0,
            swp: 4.0,
            hom_agg: 8.0,
            hom_row_desc: 1.0,
        }
    }
}

impl CostWeights {
    pub fn weight(&self, onion: Onion) -> f64 {
        match onion {
            Onion::Plain => self.plain,
            Onion::Det => self.det,
            Onion::Ope => self.ope,
            Onion::Swp => self.swp,
            Onion::HomAgg | Onion::Hom => self.hom_agg,
            Onion::HomRowDesc => self.hom_row_desc,
        }
    }
}
