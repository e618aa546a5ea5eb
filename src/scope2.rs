//! Scope 2: purchased electricity, location- or market-based.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CalcError;
use crate::factors::{Factor, FactorTable};
use crate::guards::InputGuard;
use crate::result::{EmissionResult, DEFAULT_METHODOLOGY, DEFAULT_UNCERTAINTY};
use crate::types::{Scope, Scope2Method};

pub const CATEGORY: &str = "Purchased Electricity";

/// Regional average used when a location matches no grid (kg CO2e/kWh).
pub const FALLBACK_GRID_FACTOR: f64 = 0.475;
pub const FALLBACK_GRID_UNCERTAINTY: f64 = 0.15;

/// Delivered-to-consumed ratio when transmission & distribution losses are included.
pub const TD_LOSS_MULTIPLIER: f64 = 1.06;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricityInput {
    pub kwh: f64,
    pub location: String,
    #[serde(default)]
    pub method: Scope2Method,
    /// Caller-supplied renewable share in percent (0-100), market-based only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renewable_pct: Option<f64>,
    #[serde(default)]
    pub include_losses: bool,
}

impl ElectricityInput {
    pub fn new(kwh: f64, location: impl Into<String>) -> Self {
        Self {
            kwh,
            location: location.into(),
            method: Scope2Method::LocationBased,
            renewable_pct: None,
            include_losses: false,
        }
    }

    pub fn with_method(mut self, method: Scope2Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_renewable_pct(mut self, pct: f64) -> Self {
        self.renewable_pct = Some(pct);
        self
    }

    pub fn with_losses(mut self, include: bool) -> Self {
        self.include_losses = include;
        self
    }
}

/// Grid a location resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedGrid {
    /// Table key that matched, or `None` for the regional fallback.
    pub key: Option<String>,
    pub factor: f64,
    pub renewable_share: Option<f64>,
    pub uncertainty: f64,
}

impl ResolvedGrid {
    fn from_entry(key: &str, entry: &Factor) -> Self {
        Self {
            key: Some(key.to_string()),
            factor: entry.value(),
            renewable_share: entry.renewable_share(),
            uncertainty: entry.uncertainty().unwrap_or(DEFAULT_UNCERTAINTY),
        }
    }
}

/// Exact match first, then each comma-separated part ("Dubai, UAE" tries
/// "Dubai" then "UAE"), then the regional average.
pub fn resolve_location(table: &FactorTable, location: &str) -> ResolvedGrid {
    if let Some(entry) = table.grid(location) {
        return ResolvedGrid::from_entry(location, entry);
    }

    if location.contains(',') {
        let parts = location.split(',').map(str::trim).filter(|p| !p.is_empty());
        for part in parts {
            if let Some(entry) = table.grid(part) {
                debug!(location, matched = part, "grid resolved from location part");
                return ResolvedGrid::from_entry(part, entry);
            }
        }
    }

    warn!(
        location,
        factor = FALLBACK_GRID_FACTOR,
        "no grid factor for location, using regional average"
    );
    ResolvedGrid {
        key: None,
        factor: FALLBACK_GRID_FACTOR,
        renewable_share: None,
        uncertainty: FALLBACK_GRID_UNCERTAINTY,
    }
}

pub fn calculate(table: &FactorTable, input: &ElectricityInput) -> Result<EmissionResult, CalcError> {
    InputGuard::validate_quantity("kwh", input.kwh)?;
    if let Some(pct) = input.renewable_pct {
        InputGuard::validate_percentage("renewable_pct", pct)?;
    }

    let grid = resolve_location(table, &input.location);

    let mut factor = grid.factor;
    let mut renewable_fraction = None;
    if input.method == Scope2Method::MarketBased {
        let fraction = input
            .renewable_pct
            .map(|pct| pct / 100.0)
            .or(grid.renewable_share)
            .unwrap_or(0.0);
        factor *= 1.0 - fraction;
        renewable_fraction = Some(fraction);
    }

    let adjusted_kwh = if input.include_losses {
        input.kwh * TD_LOSS_MULTIPLIER
    } else {
        input.kwh
    };
    let value = adjusted_kwh * factor / 1000.0;

    debug!(location = %input.location, method = %input.method, value, "scope 2 calculated");

    let mut result = EmissionResult::new(
        value,
        Scope::Two,
        CATEGORY,
        format!("{} kWh in {}", input.kwh, input.location),
    )
    .with_methodology(format!("{DEFAULT_METHODOLOGY} - {}", input.method))
    .with_uncertainty(grid.uncertainty)
    .with_metadata("location", input.location.as_str())
    .with_metadata("method", input.method.as_str())
    .with_metadata("emission_factor", factor)
    .with_metadata("include_losses", input.include_losses)
    .with_metadata("fallback_factor", grid.key.is_none());

    if let Some(key) = grid.key.as_deref().filter(|k| *k != input.location) {
        result = result.with_metadata("grid", key);
    }
    if let Some(fraction) = renewable_fraction {
        result = result.with_metadata("renewable_pct", fraction * 100.0);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_neom_location_based_with_and_without_losses() {
        let t = FactorTable::defaults();
        let with = calculate(&t, &ElectricityInput::new(1000.0, "NEOM").with_losses(true)).unwrap();
        assert!(close(with.value(), 1000.0 * 1.06 * 0.050 / 1000.0));
        let without = calculate(&t, &ElectricityInput::new(1000.0, "NEOM")).unwrap();
        assert!(close(without.value(), 0.050));
        assert_eq!(without.methodology(), "GHG Protocol - location_based");
        assert_eq!(without.metadata()["include_losses"], serde_json::json!(false));
        assert!(!without.metadata().contains_key("renewable_pct"));
    }

    #[test]
    fn test_market_based_override_halves_factor() {
        let t = FactorTable::defaults();
        let location = calculate(&t, &ElectricityInput::new(5000.0, "Riyadh")).unwrap();
        let market = calculate(
            &t,
            &ElectricityInput::new(5000.0, "Riyadh")
                .with_method(Scope2Method::MarketBased)
                .with_renewable_pct(50.0),
        )
        .unwrap();
        assert!(close(market.value(), location.value() / 2.0));
        assert_eq!(market.metadata()["renewable_pct"], serde_json::json!(50.0));
        assert_eq!(market.methodology(), "GHG Protocol - market_based");
    }

    #[test]
    fn test_market_based_uses_recorded_share() {
        let t = FactorTable::defaults();
        let r = calculate(
            &t,
            &ElectricityInput::new(1000.0, "Dubai").with_method(Scope2Method::MarketBased),
        )
        .unwrap();
        assert!(close(r.value(), 0.440 * (1.0 - 0.11)));
    }

    #[test]
    fn test_comma_fallback_then_regional_average() {
        let t = FactorTable::defaults();
        let g = resolve_location(&t, "Al Quoz, Dubai");
        assert_eq!(g.key.as_deref(), Some("Dubai"));
        let g = resolve_location(&t, "Jeddah, Saudi Arabia");
        assert_eq!(g.key.as_deref(), Some("Jeddah"));

        let r = calculate(&t, &ElectricityInput::new(1000.0, "Atlantis")).unwrap();
        assert!(close(r.value(), FALLBACK_GRID_FACTOR));
        assert_eq!(r.uncertainty(), Some(FALLBACK_GRID_UNCERTAINTY));
        assert_eq!(r.metadata()["fallback_factor"], serde_json::json!(true));
    }

    #[test]
    fn test_invalid_inputs() {
        let t = FactorTable::defaults();
        assert!(calculate(&t, &ElectricityInput::new(-10.0, "UAE")).is_err());
        assert!(calculate(
            &t,
            &ElectricityInput::new(10.0, "UAE")
                .with_method(Scope2Method::MarketBased)
                .with_renewable_pct(120.0)
        )
        .is_err());
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let input: ElectricityInput =
            serde_json::from_str(r#"{ "kwh": 250.0, "location": "Oman" }"#).unwrap();
        assert_eq!(input.method, Scope2Method::LocationBased);
        assert!(!input.include_losses);
    }
}
