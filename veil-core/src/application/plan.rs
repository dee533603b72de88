// veil-core/src/application/plan.rs

use serde::Serialize;
use tracing::{info, instrument};

use crate::domain::onion::OnionSet;
use crate::domain::planner::{
    AccessPlan, AccessStep, OnionSubsetGenerator, Optimized, PlanContext, PlannerConfig,
    QueryRequirements, RuntimeOptimizer, TableStatistics, WeightedCostModel,
};
use crate::error::VeilError;

/// The selected plan, as printed by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub candidates: usize,
    pub cost: f64,
    pub rows: u64,
    pub client_side_steps: usize,
    pub steps: Vec<AccessStep>,
    #[serde(skip)]
    plan: AccessPlan,
}

impl PlanReport {
    fn new(query: &QueryRequirements, best: Optimized<AccessPlan, PlanContext>) -> Self {
        Self {
            query: query.name.clone(),
            candidates: best.candidates,
            cost: best.estimate.cost,
            rows: best.estimate.rows,
            client_side_steps: best.context.client_side_steps,
            steps: best.plan.steps.clone(),
            plan: best.plan,
        }
    }

    pub fn plan(&self) -> &AccessPlan {
        &self.plan
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Picks the cheapest plan `design` admits for `query`.
#[instrument(skip_all, fields(query = ?query.name))]
pub fn plan_query(
    config: &PlannerConfig,
    design: &OnionSet,
    statistics: &TableStatistics,
    query: &QueryRequirements,
) -> Result<PlanReport, VeilError> {
    let optimizer = RuntimeOptimizer::new(
        config.clone(),
        OnionSubsetGenerator,
        WeightedCostModel::from_config(config),
    );

    let best = optimizer.optimize(design, statistics, query)?;
    info!(
        candidates = best.candidates,
        cost = best.estimate.cost,
        "Plan selected"
    );
    Ok(PlanReport::new(query, best))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;
    use crate::domain::expr::SqlExpr;
    use crate::domain::onion::{Onion, OnionBinding};
    use crate::domain::planner::{Capability, Requirement};

    fn design() -> OnionSet {
        let mut set = OnionSet::new();
        let salary = SqlExpr::field("salary");
        set.add("emp", &salary, Onion::Det).unwrap();
        set.add("emp", &salary, Onion::Ope).unwrap();
        set.add("emp", &SqlExpr::field("name"), Onion::Det).unwrap();
        set
    }

    #[test]
    fn test_cheapest_onion_wins() -> anyhow::Result<()> {
        let query = QueryRequirements::new(vec![Requirement::new(
            "emp",
            SqlExpr::field("salary"),
            Capability::Project,
        )]);
        let report = plan_query(
            &PlannerConfig::default(),
            &design(),
            &TableStatistics::default(),
            &query,
        )?;
        assert_eq!(report.candidates, 2);
        assert_eq!(report.steps[0].binding, OnionBinding::regular(Onion::Det)?);
        assert!((report.cost - 1200.0).abs() < 1e-9);
        assert_eq!(report.rows, 1000);
        Ok(())
    }

    #[test]
    fn test_order_needs_ope() -> anyhow::Result<()> {
        let query = QueryRequirements {
            name: Some("top_earners".to_string()),
            requirements: vec![
                Requirement::new("emp", SqlExpr::field("salary"), Capability::Order),
                Requirement::new("emp", SqlExpr::field("name"), Capability::Project),
            ],
        };
        let report = plan_query(
            &PlannerConfig::default(),
            &design(),
            &TableStatistics::default(),
            &query,
        )?;
        insta::assert_snapshot!(report.plan().to_string(), @r"
        emp.salary [salary] order via OPE (oOPE, server)
        emp.name [name] project via DET (oDET, server)
        ");
        assert_eq!(report.client_side_steps, 0);

        let json: serde_json::Value = serde_json::from_str(&report.to_json()?)?;
        assert_eq!(json["query"], "top_earners");
        assert_eq!(json["steps"].as_array().map(Vec::len), Some(2));
        Ok(())
    }

    #[test]
    fn test_unknown_column_has_no_plan() {
        let query = QueryRequirements::new(vec![Requirement::new(
            "emp",
            SqlExpr::field("ssn"),
            Capability::Equality,
        )]);
        let err = plan_query(
            &PlannerConfig::default(),
            &design(),
            &TableStatistics::default(),
            &query,
        )
        .unwrap_err();
        assert!(matches!(err, VeilError::Domain(DomainError::NoAdmissiblePlan)));
    }
}
