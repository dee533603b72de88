// veil-core/src/domain/planner/cost.rs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::configuration::{CostWeights, PlannerConfig};
use super::enumerate::{AccessPlan, PlanContext};
use super::{CostModel, Estimate};
use crate::domain::onion::OnionBinding;

/// Row counts per relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStatistics {
    #[serde(default)]
    pub rows: BTreeMap<String, u64>,
    /// Used for relations without a recorded count.
    #[serde(default = "default_rows")]
    pub default_rows: u64,
}

fn default_rows() -> u64 {
    1000
}

impl Default for TableStatistics {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            default_rows: default_rows(),
        }
    }
}

impl TableStatistics {
    pub fn rows(&self, relation: &str) -> u64 {
        self.rows.get(relation).copied().unwrap_or(self.default_rows)
    }
}

/// Rows scanned times the per-onion weight, summed over steps. Client-side
/// steps are multiplied by the penalty; a packed homomorphic group is paid
/// for once however many of its expressions the plan reads.
#[derive(Debug, Clone)]
pub struct WeightedCostModel {
    weights: CostWeights,
    client_side_penalty: f64,
}

impl WeightedCostModel {
    pub fn new(weights: CostWeights, client_side_penalty: f64) -> Self {
        Self {
            weights,
            client_side_penalty,
        }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(config.weights.clone(), config.client_side_penalty)
    }
}

impl CostModel<AccessPlan, PlanContext> for WeightedCostModel {
    type Statistics = TableStatistics;

    fn estimate(
        &self,
        plan: &AccessPlan,
        context: &PlanContext,
        statistics: &TableStatistics,
    ) -> Estimate {
        let mut paid_groups: BTreeSet<(&str, usize)> = BTreeSet::new();
        let mut cost = 0.0;

        for step in &plan.steps {
            if let OnionBinding::HomGroup { relation, group } = &step.binding {
                if !paid_groups.insert((relation.as_str(), *group)) {
                    continue;
                }
            }
            let mut step_cost =
                statistics.rows(&step.relation) as f64 * self.weights.weight(step.binding.onion());
            if step.client_side {
                step_cost *= self.client_side_penalty;
            }
            cost += step_cost;
        }

        let rows = context
            .relations
            .iter()
            .map(|r| statistics.rows(r))
            .max()
            .unwrap_or(0);
        Estimate { cost, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::onion::{Onion, OnionBinding};
    use crate::domain::planner::enumerate::AccessStep;
    use crate::domain::planner::query::Capability;

    fn step(relation: &str, binding: OnionBinding, client_side: bool) -> AccessStep {
        AccessStep {
            relation: relation.to_string(),
            column: "c".to_string(),
            expr: "c".to_string(),
            capability: Capability::Project,
            binding,
            client_side,
        }
    }

    fn stats() -> TableStatistics {
        TableStatistics {
            rows: [("emp".to_string(), 100), ("sales".to_string(), 10)]
                .into_iter()
                .collect(),
            default_rows: 1,
        }
    }

    #[test]
    fn test_weighted_cost() -> anyhow::Result<()> {
        let model = WeightedCostModel::new(CostWeights::default(), 10.0);
        let plan = AccessPlan {
            steps: vec![
                step("emp", OnionBinding::regular(Onion::Det)?, false),
                step("emp", OnionBinding::regular(Onion::Ope)?, true),
                step("unknown", OnionBinding::Plain, false),
            ],
        };
        let context = PlanContext {
            relations: ["emp".to_string(), "unknown".to_string()].into_iter().collect(),
            client_side_steps: 1,
        };

        let estimate = model.estimate(&plan, &context, &stats());
        // 100 * 1.2 + 100 * 2.0 * 10 + 1 * 1.0
        assert!((estimate.cost - 2121.0).abs() < 1e-9);
        assert_eq!(estimate.rows, 100);
        Ok(())
    }

    #[test]
    fn test_packed_group_paid_once() {
        let model = WeightedCostModel::from_config(&PlannerConfig::default());
        let plan = AccessPlan {
            steps: vec![
                step("sales", OnionBinding::hom_group("sales", 0), false),
                step("sales", OnionBinding::hom_group("sales", 0), false),
                step("sales", OnionBinding::hom_group("sales", 1), false),
            ],
        };
        let estimate = model.estimate(&plan, &PlanContext::default(), &stats());
        assert!((estimate.cost - 160.0).abs() < 1e-9);
        assert_eq!(estimate.rows, 0);
    }

    #[test]
    fn test_statistics_defaults() -> anyhow::Result<()> {
        let stats: TableStatistics = serde_yaml::from_str("rows: { emp: 5 }")?;
        assert_eq!(stats.rows("emp"), 5);
        assert_eq!(stats.rows("dept"), 1000);
        Ok(())
    }
}
