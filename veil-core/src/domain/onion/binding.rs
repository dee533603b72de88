// veil-core/src/domain/onion/binding.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use super::bits::{Onion, OnionMask};
use super::security_level::{RuntimeEncoding, SecLevel};
use crate::domain::error::DomainError;

/// A single-row onion (`DET`, `OPE` or `SWP`), validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Onion", into = "Onion")]
pub struct RegularOnion(Onion);

impl RegularOnion {
    pub fn new(onion: Onion) -> Result<Self, DomainError> {
        if onion.is_single_row_enc() {
            Ok(Self(onion))
        } else {
            Err(DomainError::IrregularOnion(onion.to_string()))
        }
    }

    pub fn onion(self) -> Onion {
        self.0
    }
}

impl TryFrom<Onion> for RegularOnion {
    type Error = DomainError;

    fn try_from(onion: Onion) -> Result<Self, Self::Error> {
        Self::new(onion)
    }
}

impl From<RegularOnion> for Onion {
    fn from(regular: RegularOnion) -> Self {
        regular.0
    }
}

/// How one column or expression is read by a plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OnionBinding {
    Plain,
    Regular { onion: RegularOnion },
    HomGroup { relation: String, group: usize },
    HomRowDesc { relation: String },
}

impl OnionBinding {
    pub fn regular(onion: Onion) -> Result<Self, DomainError> {
        Ok(Self::Regular {
            onion: RegularOnion::new(onion)?,
        })
    }

    pub fn hom_group(relation: impl Into<String>, group: usize) -> Self {
        Self::HomGroup {
            relation: relation.into(),
            group,
        }
    }

    pub fn hom_row_desc(relation: impl Into<String>) -> Self {
        Self::HomRowDesc {
            relation: relation.into(),
        }
    }

    pub fn onion(&self) -> Onion {
        match self {
            Self::Plain => Onion::Plain,
            Self::Regular { onion } => onion.onion(),
            Self::HomGroup { .. } => Onion::HomAgg,
            Self::HomRowDesc { .. } => Onion::HomRowDesc,
        }
    }

    pub fn is_one_of(&self, mask: OnionMask) -> bool {
        mask.contains(self.onion())
    }

    pub fn is_plain(&self) -> bool {
        matches!(self, Self::Plain)
    }

    pub fn runtime_encoding(&self) -> RuntimeEncoding {
        match self {
            Self::Plain => RuntimeEncoding::Plain,
            Self::Regular { onion } => match onion.onion() {
                Onion::Ope => RuntimeEncoding::Ope,
                Onion::Swp => RuntimeEncoding::Swp,
                _ => RuntimeEncoding::Det,
            },
            Self::HomGroup { .. } | Self::HomRowDesc { .. } => RuntimeEncoding::Agg,
        }
    }

    /// Security level the column is exposed at; `join` selects the
    /// cross-column deterministic variant.
    pub fn sec_level(&self, join: bool) -> SecLevel {
        match self {
            Self::Plain => SecLevel::PlainVal,
            Self::Regular { onion } => match (onion.onion(), join) {
                (Onion::Ope, _) => SecLevel::Ope,
                (Onion::Swp, _) => SecLevel::Search,
                (_, true) => SecLevel::DetJoin,
                (_, false) => SecLevel::Det,
            },
            Self::HomGroup { .. } | Self::HomRowDesc { .. } => SecLevel::Hom,
        }
    }
}

impl fmt::Display for OnionBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "PLAIN"),
            Self::Regular { onion } => write!(f, "{}", onion.onion()),
            Self::HomGroup { relation, group } => write!(f, "HOM_AGG({relation}#{group})"),
            Self::HomRowDesc { relation } => write!(f, "HOM_ROW_DESC({relation})"),
        }
    }
}
