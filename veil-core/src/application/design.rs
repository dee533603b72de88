// veil-core/src/application/design.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::domain::expr::SqlExpr;
use crate::domain::onion::{OnionSet, PolicyTarget};
use crate::error::VeilError;
use crate::ports::DesignStore;

/// Loads a design, completing it against the schema when one is given.
#[instrument(skip(store))]
pub fn load_design(
    store: &dyn DesignStore,
    design_path: &Path,
    schema_path: Option<&Path>,
) -> Result<OnionSet, VeilError> {
    let design = store.load_design(design_path)?;
    let Some(schema_path) = schema_path else {
        return Ok(design);
    };
    let definitions = store.load_definitions(schema_path)?;
    let completed = design.complete(&definitions);
    info!(
        before = design.len(),
        after = completed.len(),
        "Design completed against schema"
    );
    Ok(completed)
}

/// Left fold of `merge` over the designs, in argument order.
#[instrument(skip(store))]
pub fn merge_designs(store: &dyn DesignStore, paths: &[PathBuf]) -> Result<OnionSet, VeilError> {
    let (first, rest) = paths
        .split_first()
        .ok_or_else(|| VeilError::InternalError("merge needs at least one design".to_string()))?;

    let mut merged = store.load_design(first)?;
    for path in rest {
        let other = store.load_design(path)?;
        merged = merged.merge(&other);
    }
    info!(designs = paths.len(), entries = merged.len(), "Designs merged");
    Ok(merged)
}

/// Per relation, the precomputed expressions of `design` in key order.
pub fn canonical_precomputed(design: &OnionSet) -> BTreeMap<String, Vec<SqlExpr>> {
    let mut canonical: BTreeMap<String, Vec<SqlExpr>> = BTreeMap::new();
    for (key, _) in design.entries() {
        if let PolicyTarget::Expr(expr) = &key.target {
            canonical
                .entry(key.relation.clone())
                .or_default()
                .push(expr.as_expr().clone());
        }
    }
    canonical
}

/// Renames every precomputed expression to its global name.
pub fn with_global_names(design: &OnionSet) -> Result<OnionSet, VeilError> {
    Ok(design.with_global_precomp_exprs(&canonical_precomputed(design))?)
}
