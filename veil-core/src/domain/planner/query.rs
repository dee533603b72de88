// veil-core/src/domain/planner/query.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::expr::SqlExpr;
use crate::domain::onion::{OnionMask, PolicyKey};

/// Server-side operation a query applies to a column or expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Fetched and decrypted by the client; any single-row onion will do.
    Project,
    Equality,
    Order,
    Search,
    Aggregate,
}

impl Capability {
    /// Onions able to evaluate the operation on the server.
    pub fn mask(self) -> OnionMask {
        match self {
            Self::Project => OnionMask::PLAIN | OnionMask::SINGLE_ROW,
            Self::Equality => OnionMask::EQUALITY,
            Self::Order => OnionMask::ORDER,
            Self::Search => OnionMask::SEARCH,
            Self::Aggregate => OnionMask::AGGREGATE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Equality => "equality",
            Self::Order => "order",
            Self::Search => "search",
            Self::Aggregate => "aggregate",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "project" => Ok(Self::Project),
            "equality" => Ok(Self::Equality),
            "order" => Ok(Self::Order),
            "search" => Ok(Self::Search),
            "aggregate" => Ok(Self::Aggregate),
            _ => Err(format!("Unknown capability: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Requirement {
    pub relation: String,
    pub expr: SqlExpr,
    pub capability: Capability,
}

impl Requirement {
    pub fn new(relation: impl Into<String>, expr: SqlExpr, capability: Capability) -> Self {
        Self {
            relation: relation.into(),
            expr,
            capability,
        }
    }

    pub fn key(&self) -> PolicyKey {
        PolicyKey::new(self.relation.clone(), &self.expr)
    }
}

/// What a query needs from the physical design, one requirement per
/// column or expression use.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRequirements {
    pub name: Option<String>,
    pub requirements: Vec<Requirement>,
}

impl QueryRequirements {
    pub fn new(requirements: Vec<Requirement>) -> Self {
        Self {
            name: None,
            requirements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::onion::Onion;

    #[test]
    fn test_capability_masks() {
        assert!(Capability::Equality.mask().contains(Onion::Det));
        assert!(!Capability::Equality.mask().contains(Onion::Ope));
        assert!(Capability::Order.mask().contains(Onion::Ope));
        assert!(Capability::Aggregate.mask().contains(Onion::HomAgg));
        assert!(!Capability::Project.mask().contains(Onion::HomAgg));
        assert!(Capability::Project.mask().contains(Onion::Swp));
    }

    #[test]
    fn test_capability_parsing() {
        assert_eq!("ORDER".parse::<Capability>(), Ok(Capability::Order));
        assert!("join".parse::<Capability>().is_err());
    }
}
