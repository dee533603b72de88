// veil-core/src/domain/onion/bits.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

use crate::domain::error::DomainError;

// Declaration order is the selection priority: derived Ord gives
// PLAIN < DET < OPE < HOM < HOM_ROW_DESC < HOM_AGG < SWP.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Onion {
    Plain,
    Det,
    Ope,
    /// Generic homomorphic layer. Reserved, never assigned directly.
    Hom,
    HomRowDesc,
    HomAgg,
    Swp,
}

impl Onion {
    /// Every onion, in priority order.
    pub const PRIORITY: [Onion; 7] = [
        Onion::Plain,
        Onion::Det,
        Onion::Ope,
        Onion::Hom,
        Onion::HomRowDesc,
        Onion::HomAgg,
        Onion::Swp,
    ];

    pub fn bit(self) -> OnionMask {
        OnionMask(1 << (self as u8))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::Det => "DET",
            Self::Ope => "OPE",
            Self::Hom => "HOM",
            Self::HomRowDesc => "HOM_ROW_DESC",
            Self::HomAgg => "HOM_AGG",
            Self::Swp => "SWP",
        }
    }

    /// Parses the name of a single-row encryption onion.
    ///
    /// Only `DET`, `OPE` and `SWP` round-trip; everything else is `None`.
    pub fn from_name(name: &str) -> Option<Onion> {
        match name {
            "DET" => Some(Self::Det),
            "OPE" => Some(Self::Ope),
            "SWP" => Some(Self::Swp),
            _ => None,
        }
    }

    /// Whether the layer can be peeled back to plaintext.
    pub fn is_decryptable(self) -> bool {
        !matches!(self, Self::Plain | Self::HomRowDesc)
    }

    /// Onions that encrypt one value per row, independently of other rows.
    pub fn is_single_row_enc(self) -> bool {
        matches!(self, Self::Det | Self::Ope | Self::Swp)
    }
}

impl fmt::Display for Onion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A union of onion bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OnionMask(u8);

impl OnionMask {
    pub const EMPTY: OnionMask = OnionMask(0);
    pub const PLAIN: OnionMask = OnionMask(1 << (Onion::Plain as u8));
    pub const DET: OnionMask = OnionMask(1 << (Onion::Det as u8));
    pub const OPE: OnionMask = OnionMask(1 << (Onion::Ope as u8));
    pub const HOM: OnionMask = OnionMask(1 << (Onion::Hom as u8));
    pub const HOM_ROW_DESC: OnionMask = OnionMask(1 << (Onion::HomRowDesc as u8));
    pub const HOM_AGG: OnionMask = OnionMask(1 << (Onion::HomAgg as u8));
    pub const SWP: OnionMask = OnionMask(1 << (Onion::Swp as u8));

    /// Every onion except the reserved generic `HOM`.
    pub const ALL: OnionMask = OnionMask(
        Self::PLAIN.0
            | Self::DET.0
            | Self::OPE.0
            | Self::HOM_ROW_DESC.0
            | Self::HOM_AGG.0
            | Self::SWP.0,
    );

    // --- Capability classes ---
    pub const EQUALITY: OnionMask = OnionMask(Self::PLAIN.0 | Self::DET.0);
    pub const ORDER: OnionMask = OnionMask(Self::PLAIN.0 | Self::OPE.0);
    pub const SEARCH: OnionMask = OnionMask(Self::PLAIN.0 | Self::SWP.0);
    pub const AGGREGATE: OnionMask = OnionMask(Self::PLAIN.0 | Self::HOM_AGG.0);
    pub const SINGLE_ROW: OnionMask = OnionMask(Self::DET.0 | Self::OPE.0 | Self::SWP.0);
    pub const DECRYPTABLE: OnionMask = OnionMask(
        Self::DET.0 | Self::OPE.0 | Self::HOM.0 | Self::HOM_AGG.0 | Self::SWP.0,
    );

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    pub fn contains(self, onion: Onion) -> bool {
        self.0 & onion.bit().0 != 0
    }

    pub fn intersects(self, other: OnionMask) -> bool {
        self.0 & other.0 != 0
    }

    /// Set bits in priority order.
    pub fn to_seq(self) -> Vec<Onion> {
        Onion::PRIORITY
            .into_iter()
            .filter(|o| self.contains(*o))
            .collect()
    }

    /// The highest-priority onion of the mask.
    pub fn pick_one(self) -> Result<Onion, DomainError> {
        Onion::PRIORITY
            .into_iter()
            .find(|o| self.contains(*o))
            .ok_or_else(|| DomainError::UnsatisfiableSelection(self.to_string()))
    }

    /// Total order over `ALL` that keeps the bits of `self` first.
    pub fn complete_seq_with_preference(self) -> Vec<Onion> {
        let mut seq = self.to_seq();
        seq.extend(
            Self::ALL
                .to_seq()
                .into_iter()
                .filter(|o| !self.contains(*o)),
        );
        seq
    }

    /// Narrows the mask to the one onion it holds.
    pub fn single(self) -> Result<Onion, DomainError> {
        match self.to_seq().as_slice() {
            [onion] => Ok(*onion),
            _ => Err(DomainError::NotSingleOnion(self.to_string())),
        }
    }

    /// Mask-level decryptability test; rejects anything but a single bit.
    pub fn is_decryptable(self) -> Result<bool, DomainError> {
        self.single().map(Onion::is_decryptable)
    }
}

impl From<Onion> for OnionMask {
    fn from(onion: Onion) -> Self {
        onion.bit()
    }
}

impl FromIterator<Onion> for OnionMask {
    fn from_iter<I: IntoIterator<Item = Onion>>(iter: I) -> Self {
        iter.into_iter()
            .fold(OnionMask::EMPTY, |acc, o| acc | o.bit())
    }
}

impl BitOr for OnionMask {
    type Output = OnionMask;

    fn bitor(self, rhs: OnionMask) -> OnionMask {
        OnionMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for OnionMask {
    fn bitor_assign(&mut self, rhs: OnionMask) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for OnionMask {
    type Output = OnionMask;

    fn bitand(self, rhs: OnionMask) -> OnionMask {
        OnionMask(self.0 & rhs.0)
    }
}

impl Not for OnionMask {
    type Output = OnionMask;

    fn not(self) -> OnionMask {
        OnionMask(!self.0 & (Self::ALL.0 | Self::HOM.0))
    }
}

impl fmt::Display for OnionMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seq = self.to_seq();
        if let [onion] = seq.as_slice() {
            return write!(f, "{}", onion);
        }
        let names: Vec<&str> = seq.iter().map(Onion::as_str).collect();
        write!(f, "({})", names.join("|"))
    }
}

// Serialized as the ordered list of onion names, which is how design files spell it.
impl Serialize for OnionMask {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_seq().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OnionMask {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let onions = Vec::<Onion>::deserialize(deserializer)?;
        Ok(onions.into_iter().collect())
    }
}
