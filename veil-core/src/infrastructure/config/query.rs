// veil-core/src/infrastructure/config/query.rs

use serde::{Deserialize, Serialize};

use super::design::parse_target;
use crate::domain::planner::{Capability, QueryRequirements, Requirement};
use crate::infrastructure::error::InfrastructureError;

/// What one query reads, and how.
///
/// ```yaml
/// name: q6
/// requirements:
///   - { relation: lineitem, column: l_shipdate, capability: order }
///   - { relation: lineitem, expr: "l_extendedprice * l_discount", capability: aggregate }
/// ```
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct QueryFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub requirements: Vec<RequirementSpec>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RequirementSpec {
    pub relation: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,

    pub capability: Capability,
}

impl QueryFile {
    pub fn into_requirements(self) -> Result<QueryRequirements, InfrastructureError> {
        let requirements = self
            .requirements
            .iter()
            .map(|spec| {
                let expr = parse_target(
                    &spec.relation,
                    spec.column.as_deref(),
                    spec.expr.as_deref(),
                )?;
                Ok(Requirement::new(spec.relation.clone(), expr, spec.capability))
            })
            .collect::<Result<Vec<_>, InfrastructureError>>()?;

        Ok(QueryRequirements {
            name: self.name,
            requirements,
        })
    }
}
