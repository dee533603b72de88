// veil-core/src/domain/planner/enumerate.rs
//
// Reference candidate generator: every requirement of the query picks one
// admissible onion of its design entry; the cartesian product of those picks
// is the set of permutations. Requirements no onion can serve on the server
// fall back to a single-row onion decrypted and evaluated on the client.

use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use tracing::{debug, warn};

use super::configuration::PlannerConfig;
use super::query::{Capability, QueryRequirements, Requirement};
use super::CandidateGenerator;
use crate::domain::error::DomainError;
use crate::domain::onion::{Onion, OnionBinding, OnionMask, OnionSet, PolicyKey};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessStep {
    pub relation: String,
    /// Stored column the step reads (assigned name for precomputed expressions).
    pub column: String,
    pub expr: String,
    pub capability: Capability,
    pub binding: OnionBinding,
    pub client_side: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccessPlan {
    pub steps: Vec<AccessStep>,
}

impl AccessPlan {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for AccessPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(
                f,
                "{}.{} [{}] {} via {} ({}, {})",
                step.relation,
                step.column,
                step.expr,
                step.capability,
                step.binding,
                step.binding.runtime_encoding(),
                if step.client_side { "client" } else { "server" }
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlanContext {
    pub relations: BTreeSet<String>,
    pub client_side_steps: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OnionSubsetGenerator;

impl OnionSubsetGenerator {
    /// Onions that can serve `req`, in priority order.
    fn admissible_onions(design: &OnionSet, req: &Requirement) -> Vec<Onion> {
        let Some(entry) = design.lookup_key(&req.key()) else {
            return Vec::new();
        };
        let mut server = entry.mask & req.capability.mask();
        if server.contains(Onion::HomAgg)
            && design.lookup_packed_hom(&req.relation, &req.expr).is_empty()
        {
            server = server & !OnionMask::HOM_AGG;
        }
        if !server.is_empty() {
            return server.to_seq();
        }
        (entry.mask & OnionMask::SINGLE_ROW)
            .pick_one()
            .map(|o| vec![o])
            .unwrap_or_default()
    }

    fn bind(
        permutation: &OnionSet,
        req: &Requirement,
        onion: Onion,
    ) -> Result<OnionBinding, DomainError> {
        match onion {
            Onion::Plain => Ok(OnionBinding::Plain),
            Onion::HomAgg => permutation
                .lookup_packed_hom(&req.relation, &req.expr)
                .first()
                .map(|(group, _)| OnionBinding::hom_group(req.relation.clone(), *group))
                .ok_or_else(|| DomainError::UnsatisfiableSelection(onion.to_string())),
            Onion::HomRowDesc => Ok(OnionBinding::hom_row_desc(req.relation.clone())),
            other => OnionBinding::regular(other),
        }
    }
}

impl CandidateGenerator for OnionSubsetGenerator {
    type Config = PlannerConfig;
    type Query = QueryRequirements;
    type Plan = AccessPlan;
    type Context = PlanContext;

    fn onion_permutations(
        &self,
        config: &PlannerConfig,
        design: &OnionSet,
        query: &QueryRequirements,
    ) -> Vec<OnionSet> {
        let mut options: Vec<(PolicyKey, Vec<Onion>)> =
            Vec::with_capacity(query.requirements.len());
        for req in &query.requirements {
            let onions = Self::admissible_onions(design, req);
            if onions.is_empty() {
                debug!(relation = %req.relation, expr = %req.expr, "No admissible onion");
                return Vec::new();
            }
            options.push((req.key(), onions));
        }

        let mut picks: Vec<Vec<(PolicyKey, Onion)>> = vec![Vec::new()];
        let mut truncated = false;
        for (key, onions) in &options {
            let mut next = Vec::with_capacity(picks.len() * onions.len());
            'fill: for prefix in &picks {
                for onion in onions {
                    if next.len() >= config.max_permutations {
                        truncated = true;
                        break 'fill;
                    }
                    let mut pick = prefix.clone();
                    pick.push((key.clone(), *onion));
                    next.push(pick);
                }
            }
            picks = next;
        }
        if truncated {
            warn!(
                limit = config.max_permutations,
                "Onion permutation enumeration truncated"
            );
        }

        let mut seen = HashSet::new();
        picks
            .iter()
            .map(|p| design.subset(p))
            .filter(|p| seen.insert(p.clone()))
            .collect()
    }

    fn build_plan(
        &self,
        _config: &PlannerConfig,
        permutation: &OnionSet,
        query: &QueryRequirements,
    ) -> Result<(AccessPlan, PlanContext), DomainError> {
        let mut plan = AccessPlan::default();
        let mut context = PlanContext::default();

        for req in &query.requirements {
            let entry = permutation.lookup_key(&req.key());
            let mask = entry.map(|e| e.mask).unwrap_or_default();
            let (onion, client_side) = match (mask & req.capability.mask()).pick_one() {
                Ok(onion) => (onion, false),
                Err(_) => (mask.pick_one()?, true),
            };
            let binding = Self::bind(permutation, req, onion)?;

            context.relations.insert(req.relation.clone());
            if client_side {
                context.client_side_steps += 1;
            }
            plan.steps.push(AccessStep {
                relation: req.relation.clone(),
                column: entry
                    .map(|e| e.name.clone())
                    .unwrap_or_else(|| req.expr.to_string()),
                expr: req.expr.to_string(),
                capability: req.capability,
                binding,
                client_side,
            });
        }
        Ok((plan, context))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::expr::{BinaryOp, SqlExpr};

    fn revenue() -> SqlExpr {
        SqlExpr::binary(SqlExpr::field("price"), BinaryOp::Multiply, SqlExpr::field("qty"))
    }

    fn design() -> OnionSet {
        let mut set = OnionSet::new();
        let salary = SqlExpr::field("salary");
        set.add("emp", &salary, Onion::Det).unwrap();
        set.add("emp", &salary, Onion::Ope).unwrap();
        set.add("emp", &SqlExpr::field("bio"), Onion::Det).unwrap();
        set.add("emp", &SqlExpr::field("bio"), Onion::Swp).unwrap();
        set.add("sales", &revenue(), Onion::HomAgg).unwrap();
        set.add("sales", &revenue(), Onion::Det).unwrap();
        set.add_packed_hom_to_last_group("sales", &revenue());
        set
    }

    fn permutations(query: &QueryRequirements) -> Vec<OnionSet> {
        OnionSubsetGenerator.onion_permutations(&PlannerConfig::default(), &design(), query)
    }

    #[test]
    fn test_one_permutation_per_admissible_onion() {
        let query = QueryRequirements::new(vec![Requirement::new(
            "emp",
            SqlExpr::field("salary"),
            Capability::Project,
        )]);
        let perms = permutations(&query);
        assert_eq!(perms.len(), 2);
        assert_eq!(
            perms[0].lookup("emp", &SqlExpr::field("salary")),
            Some(("salary", OnionMask::DET))
        );
        assert_eq!(
            perms[1].lookup("emp", &SqlExpr::field("salary")),
            Some(("salary", OnionMask::OPE))
        );
    }

    #[test]
    fn test_cartesian_product_is_deduplicated() {
        let salary = SqlExpr::field("salary");
        let query = QueryRequirements::new(vec![
            Requirement::new("emp", salary.clone(), Capability::Project),
            Requirement::new("emp", salary, Capability::Project),
        ]);
        // {DET,DET} {DET,OPE} {OPE,DET} {OPE,OPE} -> DET, DET|OPE, OPE
        assert_eq!(permutations(&query).len(), 3);
    }

    #[test]
    fn test_enumeration_is_bounded() {
        let salary = SqlExpr::field("salary");
        let query = QueryRequirements::new(vec![
            Requirement::new("emp", salary.clone(), Capability::Project),
            Requirement::new("emp", SqlExpr::field("bio"), Capability::Project),
        ]);
        let config = PlannerConfig {
            max_permutations: 3,
            ..PlannerConfig::default()
        };
        let perms = OnionSubsetGenerator.onion_permutations(&config, &design(), &query);
        assert_eq!(perms.len(), 3);
    }

    #[test]
    fn test_unknown_entry_yields_no_permutation() {
        let query = QueryRequirements::new(vec![Requirement::new(
            "emp",
            SqlExpr::field("ssn"),
            Capability::Equality,
        )]);
        assert!(permutations(&query).is_empty());
    }

    #[test]
    fn test_client_side_fallback() {
        let query = QueryRequirements::new(vec![Requirement::new(
            "emp",
            SqlExpr::field("bio"),
            Capability::Order,
        )]);
        let perms = permutations(&query);
        assert_eq!(perms.len(), 1);

        let (plan, ctx) = OnionSubsetGenerator
            .build_plan(&PlannerConfig::default(), &perms[0], &query)
            .unwrap();
        assert_eq!(ctx.client_side_steps, 1);
        assert!(plan.steps[0].client_side);
        assert_eq!(plan.steps[0].binding, OnionBinding::regular(Onion::Det).unwrap());
    }

    #[test]
    fn test_aggregate_binds_packed_group() {
        let query = QueryRequirements::new(vec![Requirement::new(
            "sales",
            revenue(),
            Capability::Aggregate,
        )]);
        let perms = permutations(&query);
        assert_eq!(perms.len(), 1);

        let (plan, ctx) = OnionSubsetGenerator
            .build_plan(&PlannerConfig::default(), &perms[0], &query)
            .unwrap();
        assert_eq!(plan.steps[0].binding, OnionBinding::hom_group("sales", 0));
        assert_eq!(plan.steps[0].column, "_virtual_local_0");
        assert_eq!(ctx.client_side_steps, 0);
        assert_eq!(
            plan.to_string(),
            "sales._virtual_local_0 [price * qty] aggregate via HOM_AGG(sales#0) (oAGG, server)"
        );
    }

    #[test]
    fn test_unpacked_hom_agg_is_not_offered() {
        let mut set = design().without_groups();
        set.add("emp", &SqlExpr::field("salary"), Onion::HomAgg).unwrap();
        let query = QueryRequirements::new(vec![Requirement::new(
            "emp",
            SqlExpr::field("salary"),
            Capability::Aggregate,
        )]);
        let perms =
            OnionSubsetGenerator.onion_permutations(&PlannerConfig::default(), &set, &query);
        // Falls back to decrypting DET on the client.
        assert_eq!(perms.len(), 1);
        assert_eq!(
            perms[0].lookup("emp", &SqlExpr::field("salary")),
            Some(("salary", OnionMask::DET))
        );
    }
}
