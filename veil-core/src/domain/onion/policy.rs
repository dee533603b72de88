// veil-core/src/domain/onion/policy.rs
//
// The physical design: which onions each column / precomputed expression may
// be stored under, plus the packed homomorphic aggregation groups.
//
// In-place mutators (`add`, `add_packed_hom_to_last_group`) take `&mut self`.
// Everything else derives a new, fully independent set.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::bits::{Onion, OnionMask};
use super::naming::VirtualColumnNamer;
use crate::domain::error::DomainError;
use crate::domain::expr::{NormalizedExpr, SqlExpr};
use crate::domain::schema::Definitions;

/// Second half of a policy key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PolicyTarget {
    /// Direct column reference, keyed by bare column name.
    Column(String),
    /// Precomputed expression.
    Expr(NormalizedExpr),
}

impl PolicyTarget {
    pub fn of(expr: &SqlExpr) -> Self {
        match expr.as_field() {
            Some(name) => Self::Column(name.to_string()),
            None => Self::Expr(expr.normalize()),
        }
    }

    fn renormalize(&self) -> Self {
        match self {
            Self::Column(name) => Self::Column(name.clone()),
            Self::Expr(expr) => Self::Expr(expr.renormalize()),
        }
    }
}

impl fmt::Display for PolicyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(name) => write!(f, "{name}"),
            Self::Expr(expr) => write!(f, "[{expr}]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolicyKey {
    pub relation: String,
    pub target: PolicyTarget,
}

impl PolicyKey {
    pub fn new(relation: impl Into<String>, expr: &SqlExpr) -> Self {
        Self {
            relation: relation.into(),
            target: PolicyTarget::of(expr),
        }
    }

    pub fn column(relation: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            target: PolicyTarget::Column(column.into()),
        }
    }

    pub fn is_precomputed(&self) -> bool {
        matches!(self.target, PolicyTarget::Expr(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PolicyEntry {
    /// Column name, or the synthetic name of a precomputed expression.
    pub name: String,
    pub mask: OnionMask,
}

/// Packed homomorphic groups of one relation, in group-index order.
pub type HomGroups = Vec<Vec<NormalizedExpr>>;

#[derive(Debug, Clone, Default)]
pub struct OnionSet {
    entries: BTreeMap<PolicyKey, PolicyEntry>,
    groups: BTreeMap<String, HomGroups>,
    namer: VirtualColumnNamer,
}

impl OnionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namer(namer: VirtualColumnNamer) -> Self {
        Self {
            namer,
            ..Self::default()
        }
    }

    pub fn namer(&self) -> &VirtualColumnNamer {
        &self.namer
    }

    // --- Mutation ---

    /// Permits `onion` for `expr` of `relation`.
    ///
    /// The first call fixes the assigned name; later calls only OR the bit in.
    pub fn add(
        &mut self,
        relation: &str,
        expr: &SqlExpr,
        onion: Onion,
    ) -> Result<(), DomainError> {
        if onion == Onion::Plain {
            return Err(DomainError::PlainOnion {
                relation: relation.to_string(),
            });
        }
        let key = PolicyKey::new(relation, expr);
        match self.entries.get_mut(&key) {
            Some(entry) => entry.mask |= onion.bit(),
            None => {
                let name = match &key.target {
                    PolicyTarget::Column(name) => name.clone(),
                    PolicyTarget::Expr(_) => self.namer.next_local(),
                };
                self.entries.insert(
                    key,
                    PolicyEntry {
                        name,
                        mask: onion.bit(),
                    },
                );
            }
        }
        Ok(())
    }

    /// [`OnionSet::add`] for a precomputed expression whose name was assigned
    /// elsewhere, e.g. a saved design. The name only applies when the entry
    /// is new; column entries always use the column name.
    pub fn add_named(
        &mut self,
        relation: &str,
        expr: &SqlExpr,
        onion: Onion,
        name: &str,
    ) -> Result<(), DomainError> {
        let key = PolicyKey::new(relation, expr);
        if !key.is_precomputed() || self.entries.contains_key(&key) {
            return self.add(relation, expr, onion);
        }
        if onion == Onion::Plain {
            return Err(DomainError::PlainOnion {
                relation: relation.to_string(),
            });
        }
        if self.lookup_precomputed_by_name(relation, name).is_some() {
            return Err(DomainError::DuplicateName {
                relation: relation.to_string(),
                name: name.to_string(),
            });
        }
        self.namer.reserve(name);
        self.entries.insert(
            key,
            PolicyEntry {
                name: name.to_string(),
                mask: onion.bit(),
            },
        );
        Ok(())
    }

    /// Boundary form of [`OnionSet::add`] for untyped masks.
    pub fn add_mask(
        &mut self,
        relation: &str,
        expr: &SqlExpr,
        mask: OnionMask,
    ) -> Result<(), DomainError> {
        let onion = mask.single()?;
        self.add(relation, expr, onion)
    }

    /// Packs `expr` into the relation's last homomorphic group, opening the
    /// first group if the relation has none.
    pub fn add_packed_hom_to_last_group(&mut self, relation: &str, expr: &SqlExpr) {
        let normalized = expr.normalize();
        let groups = self.groups.entry(relation.to_string()).or_default();
        match groups.last_mut() {
            Some(last) => {
                if !last.contains(&normalized) {
                    last.push(normalized);
                }
            }
            None => groups.push(vec![normalized]),
        }
    }

    // --- Lookup ---

    pub fn lookup(&self, relation: &str, expr: &SqlExpr) -> Option<(&str, OnionMask)> {
        self.entries
            .get(&PolicyKey::new(relation, expr))
            .map(|e| (e.name.as_str(), e.mask))
    }

    pub fn lookup_key(&self, key: &PolicyKey) -> Option<&PolicyEntry> {
        self.entries.get(key)
    }

    /// Reverse lookup of a precomputed expression by its assigned name.
    pub fn lookup_precomputed_by_name(
        &self,
        relation: &str,
        name: &str,
    ) -> Option<(&NormalizedExpr, OnionMask)> {
        self.entries.iter().find_map(|(key, entry)| match &key.target {
            PolicyTarget::Expr(expr) if key.relation == relation && entry.name == name => {
                Some((expr, entry.mask))
            }
            _ => None,
        })
    }

    /// Every `(group index, position in group)` holding `expr`.
    pub fn lookup_packed_hom(&self, relation: &str, expr: &SqlExpr) -> Vec<(usize, usize)> {
        let normalized = expr.normalize();
        let target = &normalized;
        self.groups
            .get(relation)
            .map(|groups| {
                groups
                    .iter()
                    .enumerate()
                    .flat_map(move |(gi, group)| {
                        group
                            .iter()
                            .enumerate()
                            .filter(move |(_, e)| *e == target)
                            .map(move |(pos, _)| (gi, pos))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `None` when the relation has no groups at all.
    pub fn lookup_packed_hom_by_id(
        &self,
        relation: &str,
        index: usize,
    ) -> Result<Option<&[NormalizedExpr]>, DomainError> {
        let Some(groups) = self.groups.get(relation) else {
            return Ok(None);
        };
        groups
            .get(index)
            .map(|g| Some(g.as_slice()))
            .ok_or_else(|| DomainError::GroupIndexOutOfRange {
                relation: relation.to_string(),
                index,
                len: groups.len(),
            })
    }

    pub fn entries(&self) -> impl Iterator<Item = (&PolicyKey, &PolicyEntry)> {
        self.entries.iter()
    }

    pub fn groups(&self) -> &BTreeMap<String, HomGroups> {
        &self.groups
    }

    pub fn relation_groups(&self, relation: &str) -> &[Vec<NormalizedExpr>] {
        self.groups.get(relation).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.groups.is_empty()
    }

    // --- Derivations ---

    /// Union of two designs.
    ///
    /// Masks are OR-ed per key and the receiver's assigned name wins. A
    /// precomputed entry that only `other` has keeps its name unless that
    /// name is already taken in the relation, in which case it gets a fresh
    /// one. Per relation, `other`'s groups are listed before the receiver's
    /// own; groups are not deduplicated against each other.
    pub fn merge(&self, other: &OnionSet) -> OnionSet {
        let mut merged = self.copy();
        merged.namer.advance_past(&other.namer);

        for (key, entry) in &other.entries {
            if let Some(existing) = merged.entries.get_mut(key) {
                existing.mask |= entry.mask;
                continue;
            }
            let name = if key.is_precomputed()
                && merged
                    .lookup_precomputed_by_name(&key.relation, &entry.name)
                    .is_some()
            {
                merged.namer.next_local()
            } else {
                entry.name.clone()
            };
            merged.entries.insert(
                PolicyKey {
                    relation: key.relation.clone(),
                    target: key.target.renormalize(),
                },
                PolicyEntry {
                    name,
                    mask: entry.mask,
                },
            );
        }

        for (relation, theirs) in &other.groups {
            let ours = merged.groups.remove(relation).unwrap_or_default();
            let mut combined: HomGroups = theirs
                .iter()
                .map(|g| g.iter().map(NormalizedExpr::renormalize).collect())
                .collect();
            combined.extend(ours);
            merged.groups.insert(relation.clone(), combined);
        }
        merged
    }

    /// Gives every schema column lacking both `DET` and `OPE` the `DET` onion.
    pub fn complete(&self, definitions: &Definitions) -> OnionSet {
        let mut completed = self.copy();
        for (relation, column) in definitions.columns() {
            let key = PolicyKey::column(relation, column);
            match completed.entries.get_mut(&key) {
                Some(entry) => {
                    if !entry.mask.intersects(OnionMask::DET | OnionMask::OPE) {
                        entry.mask |= OnionMask::DET;
                    }
                }
                None => {
                    completed.entries.insert(
                        key,
                        PolicyEntry {
                            name: column.to_string(),
                            mask: OnionMask::DET,
                        },
                    );
                }
            }
        }
        completed
    }

    /// Independent deep copy; keys and groups are normalized again.
    pub fn copy(&self) -> OnionSet {
        OnionSet {
            entries: self
                .entries
                .iter()
                .map(|(k, v)| {
                    (
                        PolicyKey {
                            relation: k.relation.clone(),
                            target: k.target.renormalize(),
                        },
                        v.clone(),
                    )
                })
                .collect(),
            groups: self
                .groups
                .iter()
                .map(|(rel, groups)| {
                    (
                        rel.clone(),
                        groups
                            .iter()
                            .map(|g| g.iter().map(NormalizedExpr::renormalize).collect())
                            .collect(),
                    )
                })
                .collect(),
            namer: self.namer.clone(),
        }
    }

    pub fn without_groups(&self) -> OnionSet {
        OnionSet {
            entries: self.entries.clone(),
            groups: BTreeMap::new(),
            namer: self.namer.clone(),
        }
    }

    /// Replaces the whole group table.
    pub fn with_groups(&self, groups: &BTreeMap<String, Vec<Vec<SqlExpr>>>) -> OnionSet {
        OnionSet {
            entries: self.entries.clone(),
            groups: groups
                .iter()
                .map(|(rel, gs)| {
                    (
                        rel.clone(),
                        gs.iter()
                            .map(|g| g.iter().map(SqlExpr::normalize).collect())
                            .collect(),
                    )
                })
                .collect(),
            namer: self.namer.clone(),
        }
    }

    /// Renames every precomputed entry to the global name of its position in
    /// `canonical`, the per-relation list shared by every design of a workload.
    pub fn with_global_precomp_exprs(
        &self,
        canonical: &BTreeMap<String, Vec<SqlExpr>>,
    ) -> Result<OnionSet, DomainError> {
        let mut renamed = self.copy();
        for (key, entry) in renamed.entries.iter_mut() {
            let PolicyTarget::Expr(expr) = &key.target else {
                continue;
            };
            let exprs = canonical
                .get(&key.relation)
                .ok_or_else(|| DomainError::MissingCanonicalRelation(key.relation.clone()))?;
            let position = exprs
                .iter()
                .position(|e| e.normalize() == *expr)
                .ok_or_else(|| DomainError::MissingCanonicalExpression {
                    relation: key.relation.clone(),
                    expr: expr.to_string(),
                })?;
            entry.name = self.namer.global(position);
        }
        Ok(renamed)
    }

    /// Keeps only the picked `(key, onion)` choices; groups and namer carry over.
    /// `PLAIN` picks and keys unknown to this set are dropped.
    pub fn subset(&self, picks: &[(PolicyKey, Onion)]) -> OnionSet {
        let mut out = OnionSet {
            entries: BTreeMap::new(),
            groups: self.groups.clone(),
            namer: self.namer.clone(),
        };
        for (key, onion) in picks {
            if *onion == Onion::Plain {
                continue;
            }
            let Some(entry) = self.entries.get(key) else {
                continue;
            };
            out.entries
                .entry(key.clone())
                .or_insert_with(|| PolicyEntry {
                    name: entry.name.clone(),
                    mask: OnionMask::EMPTY,
                })
                .mask |= onion.bit();
        }
        out
    }

    // --- Rendering ---

    pub fn pretty(&self) -> String {
        let mut lines = vec!["OnionSet {".to_string()];
        for (key, entry) in &self.entries {
            lines.push(format!(
                "  {}.{} -> {}: {}",
                key.relation, key.target, entry.name, entry.mask
            ));
        }
        if !self.groups.is_empty() {
            lines.push("  hom_groups:".to_string());
            for (relation, groups) in &self.groups {
                for (i, group) in groups.iter().enumerate() {
                    let exprs: Vec<String> = group.iter().map(ToString::to_string).collect();
                    lines.push(format!("    {}#{}: [{}]", relation, i, exprs.join(", ")));
                }
            }
        }
        lines.push("}".to_string());
        lines.join("\n")
    }

    /// One line per entry, skipping plain columns that only carry the
    /// default `DET` added by completion.
    pub fn compact_to_string(&self) -> String {
        let mut parts: Vec<String> = self
            .entries
            .iter()
            .filter(|(key, entry)| key.is_precomputed() || entry.mask != OnionMask::DET)
            .map(|(key, entry)| match &key.target {
                PolicyTarget::Column(column) => {
                    format!("{}.{}={}", key.relation, column, entry.mask)
                }
                PolicyTarget::Expr(expr) => {
                    format!("{}.{}[{}]={}", key.relation, entry.name, expr, entry.mask)
                }
            })
            .collect();
        for (relation, groups) in &self.groups {
            for (i, group) in groups.iter().enumerate() {
                let exprs: Vec<String> = group.iter().map(ToString::to_string).collect();
                parts.push(format!("{}#{}{{{}}}", relation, i, exprs.join(", ")));
            }
        }
        parts.join("\n")
    }
}

impl PartialEq for OnionSet {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries && self.groups == other.groups
    }
}

impl Eq for OnionSet {}

impl Hash for OnionSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entries.hash(state);
        self.groups.hash(state);
    }
}

impl fmt::Display for OnionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.compact_to_string())
    }
}
