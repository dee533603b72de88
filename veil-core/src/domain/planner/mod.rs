// veil-core/src/domain/planner/mod.rs
//
// Cost-based plan selection over onion-subset permutations of a design.
// Enumerating permutations, building plans and costing them are delegated
// to the CandidateGenerator / CostModel seams; this module only picks.

pub mod configuration;
pub mod cost;
pub mod enumerate;
pub mod query;

use serde::Serialize;
use std::cmp::Ordering;
use tracing::{debug, instrument};

use crate::domain::error::DomainError;
use crate::domain::onion::OnionSet;

pub use configuration::{CostWeights, PlannerConfig};
pub use cost::{TableStatistics, WeightedCostModel};
pub use enumerate::{AccessPlan, AccessStep, OnionSubsetGenerator, PlanContext};
pub use query::{Capability, QueryRequirements, Requirement};

/// Produces the plans a physical design admits for one query.
pub trait CandidateGenerator {
    type Config;
    type Query;
    type Plan;
    type Context;

    /// Onion-subset permutations of `design` that can answer `query`.
    fn onion_permutations(
        &self,
        config: &Self::Config,
        design: &OnionSet,
        query: &Self::Query,
    ) -> Vec<OnionSet>;

    /// Materializes the plan for one permutation.
    fn build_plan(
        &self,
        config: &Self::Config,
        permutation: &OnionSet,
        query: &Self::Query,
    ) -> Result<(Self::Plan, Self::Context), DomainError>;
}

pub trait CostModel<P, X> {
    type Statistics;

    fn estimate(&self, plan: &P, context: &X, statistics: &Self::Statistics) -> Estimate;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate {
    pub cost: f64,
    pub rows: u64,
}

impl Estimate {
    /// Total order on cost. NaN of either sign sorts after every number.
    pub fn cmp_cost(&self, other: &Estimate) -> Ordering {
        match (self.cost.is_nan(), other.cost.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.cost.total_cmp(&other.cost),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Optimized<P, X> {
    pub plan: P,
    pub context: X,
    pub estimate: Estimate,
    /// Number of candidates the plan was chosen from.
    pub candidates: usize,
}

pub struct RuntimeOptimizer<G: CandidateGenerator, M> {
    config: G::Config,
    generator: G,
    cost_model: M,
}

impl<G, M> RuntimeOptimizer<G, M>
where
    G: CandidateGenerator,
    M: CostModel<G::Plan, G::Context>,
{
    pub fn new(config: G::Config, generator: G, cost_model: M) -> Self {
        Self {
            config,
            generator,
            cost_model,
        }
    }

    pub fn config(&self) -> &G::Config {
        &self.config
    }

    /// Cheapest candidate; on ties the first one enumerated wins.
    #[instrument(skip_all)]
    pub fn optimize(
        &self,
        design: &OnionSet,
        statistics: &M::Statistics,
        query: &G::Query,
    ) -> Result<Optimized<G::Plan, G::Context>, DomainError> {
        let candidates = self.generate_candidate_plans(design, query)?;
        if candidates.is_empty() {
            return Err(DomainError::NoAdmissiblePlan);
        }
        let total = candidates.len();

        let mut best: Option<Optimized<G::Plan, G::Context>> = None;
        for (plan, context) in candidates {
            let estimate = self.cost_model.estimate(&plan, &context, statistics);
            let better = best
                .as_ref()
                .is_none_or(|b| estimate.cmp_cost(&b.estimate) == Ordering::Less);
            if better {
                best = Some(Optimized {
                    plan,
                    context,
                    estimate,
                    candidates: total,
                });
            }
        }

        let best = best.ok_or(DomainError::NoAdmissiblePlan)?;
        debug!(candidates = total, cost = best.estimate.cost, "Selected plan");
        Ok(best)
    }

    /// One `(plan, context)` per admissible permutation, in enumeration order.
    pub fn generate_candidate_plans(
        &self,
        design: &OnionSet,
        query: &G::Query,
    ) -> Result<Vec<(G::Plan, G::Context)>, DomainError> {
        let permutations = self
            .generator
            .onion_permutations(&self.config, design, query);
        debug!(permutations = permutations.len(), "Enumerated onion permutations");
        permutations
            .iter()
            .map(|p| self.generator.build_plan(&self.config, p, query))
            .collect()
    }
}
