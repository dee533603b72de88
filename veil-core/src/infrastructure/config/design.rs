// veil-core/src/infrastructure/config/design.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::domain::expr::SqlExpr;
use crate::domain::onion::{Onion, OnionSet, PolicyTarget, VirtualColumnNamer};
use crate::error::VeilError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::sql::ExprParser;

// =============================================================================
//  1. DATA CONTRACT
// =============================================================================

/// On-disk physical design.
///
/// ```yaml
/// entries:
///   - relation: emp
///     column: salary
///     onions: [DET, OPE]
///   - relation: lineitem
///     expr: "l_extendedprice * (1 - l_discount)"
///     onions: [HOM_AGG]
/// hom_groups:
///   lineitem:
///     - ["l_extendedprice * (1 - l_discount)", "l_quantity"]
/// ```
///
/// Precomputed expressions keep the `name` they were saved with. Entries
/// without one get a fresh synthetic name at load time.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct DesignFile {
    #[serde(default)]
    pub entries: Vec<DesignEntry>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hom_groups: BTreeMap<String, Vec<Vec<String>>>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DesignEntry {
    pub relation: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,

    /// Assigned name of a precomputed expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub onions: Vec<Onion>,
}

/// Resolves the `column` / `expr` pair shared by design and query files.
/// Exactly one of them must be set.
pub fn parse_target(
    relation: &str,
    column: Option<&str>,
    expr: Option<&str>,
) -> Result<SqlExpr, InfrastructureError> {
    match (column, expr) {
        (Some(column), None) => Ok(SqlExpr::field(column)),
        (None, Some(text)) => ExprParser::parse(text),
        (Some(_), Some(_)) => Err(InfrastructureError::ConfigError(format!(
            "Entry of '{}' sets both 'column' and 'expr'",
            relation
        ))),
        (None, None) => Err(InfrastructureError::ConfigError(format!(
            "Entry of '{}' needs a 'column' or an 'expr'",
            relation
        ))),
    }
}

// =============================================================================
//  2. CONVERSION
// =============================================================================

impl DesignFile {
    pub fn into_onion_set(self, namer: VirtualColumnNamer) -> Result<OnionSet, VeilError> {
        let mut design = OnionSet::with_namer(namer);

        // Named entries first, so fresh names never collide with saved ones.
        let (named, unnamed): (Vec<_>, Vec<_>) =
            self.entries.iter().partition(|e| e.name.is_some());
        for entry in named.into_iter().chain(unnamed) {
            let target = parse_target(
                &entry.relation,
                entry.column.as_deref(),
                entry.expr.as_deref(),
            )?;
            if entry.onions.is_empty() {
                warn!(relation = %entry.relation, target = %target, "Design entry lists no onion");
            }
            for onion in &entry.onions {
                match &entry.name {
                    Some(name) => design.add_named(&entry.relation, &target, *onion, name)?,
                    None => design.add(&entry.relation, &target, *onion)?,
                }
            }
        }

        if self.hom_groups.is_empty() {
            return Ok(design);
        }
        let mut groups: BTreeMap<String, Vec<Vec<SqlExpr>>> = BTreeMap::new();
        for (relation, texts) in &self.hom_groups {
            let parsed = texts
                .iter()
                .map(|group| {
                    group
                        .iter()
                        .map(|text| ExprParser::parse(text))
                        .collect::<Result<Vec<_>, _>>()
                })
                .collect::<Result<Vec<_>, _>>()?;
            groups.insert(relation.clone(), parsed);
        }
        Ok(design.with_groups(&groups))
    }

    pub fn from_onion_set(design: &OnionSet) -> Self {
        let entries = design
            .entries()
            .map(|(key, entry)| {
                let (column, expr, name) = match &key.target {
                    PolicyTarget::Column(column) => (Some(column.clone()), None, None),
                    PolicyTarget::Expr(expr) => {
                        (None, Some(expr.to_string()), Some(entry.name.clone()))
                    }
                };
                DesignEntry {
                    relation: key.relation.clone(),
                    column,
                    expr,
                    name,
                    onions: entry.mask.to_seq(),
                }
            })
            .collect();

        let hom_groups = design
            .groups()
            .iter()
            .map(|(relation, groups)| {
                let texts = groups
                    .iter()
                    .map(|g| g.iter().map(ToString::to_string).collect())
                    .collect();
                (relation.clone(), texts)
            })
            .collect();

        Self {
            entries,
            hom_groups,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;
    use crate::domain::onion::OnionMask;

    const DESIGN: &str = r#"
entries:
  - relation: emp
    column: salary
    onions: [DET, OPE]
  - relation: sales
    expr: "PRICE * qty"
    onions: [HOM_AGG, DET]
  - relation: sales
    expr: "price * qty"
    onions: [OPE]
hom_groups:
  sales:
    - ["price * qty", "qty"]
"#;

    fn revenue() -> anyhow::Result<SqlExpr> {
        Ok(ExprParser::parse("price * qty")?)
    }

    #[test]
    fn test_load_design() -> anyhow::Result<()> {
        let file: DesignFile = serde_yaml::from_str(DESIGN)?;
        let design = file.into_onion_set(VirtualColumnNamer::default())?;

        assert_eq!(design.len(), 2);
        assert_eq!(
            design.lookup("emp", &SqlExpr::field("salary")),
            Some(("salary", OnionMask::DET | OnionMask::OPE))
        );
        // Both spellings key the same entry.
        assert_eq!(
            design.lookup("sales", &revenue()?),
            Some((
                "_virtual_local_0",
                OnionMask::HOM_AGG | OnionMask::DET | OnionMask::OPE
            ))
        );
        assert_eq!(design.lookup_packed_hom("sales", &revenue()?), vec![(0, 0)]);
        assert_eq!(
            design.lookup_packed_hom("sales", &SqlExpr::field("qty")),
            vec![(0, 1)]
        );
        Ok(())
    }

    #[test]
    fn test_plain_onion_is_rejected() -> anyhow::Result<()> {
        let file: DesignFile =
            serde_yaml::from_str("entries:\n  - { relation: emp, column: id, onions: [PLAIN] }\n")?;
        let err = file.into_onion_set(VirtualColumnNamer::default()).unwrap_err();
        assert!(matches!(
            err,
            VeilError::Domain(DomainError::PlainOnion { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_entry_needs_exactly_one_target() {
        assert!(parse_target("emp", None, None).is_err());
        assert!(parse_target("emp", Some("a"), Some("a + 1")).is_err());
        assert_eq!(
            parse_target("emp", Some("a"), None).unwrap(),
            SqlExpr::field("a")
        );
    }

    #[test]
    fn test_save_then_load_keeps_design() -> anyhow::Result<()> {
        let file: DesignFile = serde_yaml::from_str(DESIGN)?;
        let design = file.into_onion_set(VirtualColumnNamer::default())?;

        let saved = DesignFile::from_onion_set(&design);
        let text = serde_yaml::to_string(&saved)?;
        let reloaded: DesignFile = serde_yaml::from_str(&text)?;
        let reloaded = reloaded.into_onion_set(VirtualColumnNamer::default())?;

        assert_eq!(reloaded, design);
        assert_eq!(reloaded.groups(), design.groups());
        Ok(())
    }

    #[test]
    fn test_saved_layout() -> anyhow::Result<()> {
        let file: DesignFile = serde_yaml::from_str(DESIGN)?;
        let design = file.into_onion_set(VirtualColumnNamer::default())?;
        let saved = DesignFile::from_onion_set(&design);

        assert_eq!(
            saved.entries[1],
            DesignEntry {
                relation: "sales".to_string(),
                column: None,
                expr: Some("price * qty".to_string()),
                name: Some("_virtual_local_0".to_string()),
                onions: vec![Onion::Det, Onion::Ope, Onion::HomAgg],
            }
        );
        assert_eq!(
            saved.hom_groups["sales"],
            vec![vec!["price * qty".to_string(), "qty".to_string()]]
        );
        Ok(())
    }

    #[test]
    fn test_saved_names_survive_reload() -> anyhow::Result<()> {
        let mut design = OnionSet::new();
        // Issued in reverse of key order.
        design.add("t", &ExprParser::parse("x * 2")?, Onion::Det)?;
        design.add("t", &ExprParser::parse("x + 2")?, Onion::Det)?;

        let saved = DesignFile::from_onion_set(&design);
        let mut with_new = saved.clone();
        with_new.entries.push(DesignEntry {
            relation: "t".to_string(),
            column: None,
            expr: Some("x - 2".to_string()),
            name: None,
            onions: vec![Onion::Ope],
        });
        let reloaded = with_new.into_onion_set(VirtualColumnNamer::default())?;

        let name = |text: &str| -> anyhow::Result<String> {
            let expr = ExprParser::parse(text)?;
            Ok(reloaded.lookup("t", &expr).map(|(n, _)| n.to_string()).unwrap_or_default())
        };
        assert_eq!(name("x * 2")?, "_virtual_local_0");
        assert_eq!(name("x + 2")?, "_virtual_local_1");
        assert_eq!(name("x - 2")?, "_virtual_local_2");
        Ok(())
    }
}
