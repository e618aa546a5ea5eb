use std::fmt;

use thiserror::Error;

/// Which lookup an unknown identifier was rejected by.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum IdentifierKind {
    Fuel,
    TransportMode,
    WaterSource,
    WasteDisposal,
    CoolingSystem,
    GwpGas,
    Scope3Category,
    Scope2Method,
    FactorCategory,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IdentifierKind::Fuel => "fuel type",
            IdentifierKind::TransportMode => "transport mode",
            IdentifierKind::WaterSource => "water source",
            IdentifierKind::WasteDisposal => "waste disposal method",
            IdentifierKind::CoolingSystem => "cooling system",
            IdentifierKind::GwpGas => "GWP gas",
            IdentifierKind::Scope3Category => "scope 3 category",
            IdentifierKind::Scope2Method => "scope 2 method",
            IdentifierKind::FactorCategory => "factor category",
        };
        f.write_str(label)
    }
}

/// Rejected-input failures raised at the calculator boundary.
/// A calculation that fails with one of these is never appended to a ledger.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CalcError {
    #[error("unknown {kind} '{given}', valid options: {}", .valid.join(", "))]
    UnknownIdentifier {
        kind: IdentifierKind,
        given: String,
        valid: Vec<String>,
    },
    #[error("invalid {field} {value}: {reason}")]
    InvalidInput {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },
    #[error("malformed scope 3 payload: {0}")]
    MalformedPayload(String),
}

impl CalcError {
    pub(crate) fn unknown<I, S>(kind: IdentifierKind, given: &str, valid: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CalcError::UnknownIdentifier {
            kind,
            given: given.to_string(),
            valid: valid.into_iter().map(Into::into).collect(),
        }
    }
}
