// veil-core/src/domain/onion/security_level.rs

use serde::{Deserialize, Serialize};
use std::fmt;

// Tags handed to the downstream encrypted execution engine. They are opaque
// to the planner: only the binding -> tag tables in `binding.rs` produce them.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecLevel {
    #[serde(rename = "PLAINVAL")]
    PlainVal,
    #[serde(rename = "DET")]
    Det,
    #[serde(rename = "DETJOIN")]
    DetJoin,
    #[serde(rename = "OPE")]
    Ope,
    #[serde(rename = "SEARCH")]
    Search,
    #[serde(rename = "HOM")]
    Hom,
}

impl SecLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlainVal => "PLAINVAL",
            Self::Det => "DET",
            Self::DetJoin => "DETJOIN",
            Self::Ope => "OPE",
            Self::Search => "SEARCH",
            Self::Hom => "HOM",
        }
    }
}

impl fmt::Display for SecLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SecLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PLAINVAL" => Ok(Self::PlainVal),
            "DET" => Ok(Self::Det),
            "DETJOIN" => Ok(Self::DetJoin),
            "OPE" => Ok(Self::Ope),
            "SEARCH" => Ok(Self::Search),
            "HOM" => Ok(Self::Hom),
            _ => Err(format!("Unknown security level: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuntimeEncoding {
    #[serde(rename = "oPLAIN")]
    Plain,
    #[serde(rename = "oDET")]
    Det,
    #[serde(rename = "oOPE")]
    Ope,
    #[serde(rename = "oAGG")]
    Agg,
    #[serde(rename = "oSWP")]
    Swp,
}

impl RuntimeEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "oPLAIN",
            Self::Det => "oDET",
            Self::Ope => "oOPE",
            Self::Agg => "oAGG",
            Self::Swp => "oSWP",
        }
    }
}

impl fmt::Display for RuntimeEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RuntimeEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "oPLAIN" => Ok(Self::Plain),
            "oDET" => Ok(Self::Det),
            "oOPE" => Ok(Self::Ope),
            "oAGG" => Ok(Self::Agg),
            "oSWP" => Ok(Self::Swp),
            _ => Err(format!("Unknown runtime encoding: {}", s)),
        }
    }
}
