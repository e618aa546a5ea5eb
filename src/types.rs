use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CalcError, IdentifierKind};

/// GHG Protocol reporting scope. Serialized as the bare number 1, 2 or 3.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Scope {
    /// Direct emissions from owned combustion.
    One,
    /// Purchased energy.
    Two,
    /// Value chain.
    Three,
}

impl Scope {
    pub const ALL: [Scope; 3] = [Scope::One, Scope::Two, Scope::Three];

    pub fn number(self) -> u8 {
        match self {
            Scope::One => 1,
            Scope::Two => 2,
            Scope::Three => 3,
        }
    }
}

impl From<Scope> for u8 {
    fn from(scope: Scope) -> u8 {
        scope.number()
    }
}

impl TryFrom<u8> for Scope {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Scope::One),
            2 => Ok(Scope::Two),
            3 => Ok(Scope::Three),
            other => Err(format!("scope must be 1, 2 or 3, got {other}")),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scope {}", self.number())
    }
}

/// Scope 2 accounting method.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope2Method {
    /// Grid-average factor for the location.
    #[default]
    LocationBased,
    /// Grid factor reduced by the renewable share actually purchased.
    MarketBased,
}

impl Scope2Method {
    pub const ALL: [Scope2Method; 2] = [Scope2Method::LocationBased, Scope2Method::MarketBased];

    pub fn as_str(self) -> &'static str {
        match self {
            Scope2Method::LocationBased => "location_based",
            Scope2Method::MarketBased => "market_based",
        }
    }
}

impl fmt::Display for Scope2Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope2Method {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scope2Method::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                CalcError::unknown(
                    IdentifierKind::Scope2Method,
                    s,
                    Scope2Method::ALL.iter().map(|m| m.as_str()),
                )
            })
    }
}
