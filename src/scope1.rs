//! Scope 1: direct emissions from fuel combustion.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CalcError;
use crate::factors::{FactorTable, FuelFactor};
use crate::guards::InputGuard;
use crate::result::{EmissionResult, DEFAULT_UNCERTAINTY};
use crate::types::Scope;

pub const CATEGORY: &str = "Stationary Combustion";

/// One fuel purchase or meter reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelInput {
    pub fuel: String,
    pub quantity: f64,
    pub unit: String,
    /// kg CO2e per native unit; bypasses the per-gas decomposition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_factor: Option<f64>,
}

impl FuelInput {
    pub fn new(fuel: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Self {
        Self {
            fuel: fuel.into(),
            quantity,
            unit: unit.into(),
            custom_factor: None,
        }
    }

    pub fn with_custom_factor(mut self, kg_co2e_per_unit: f64) -> Self {
        self.custom_factor = Some(kg_co2e_per_unit);
        self
    }
}

/// CO2e = E * (co2 + ch4 * GWP_CH4 + n2o * GWP_N2O) / 1000, with E = quantity * heating_value.
pub fn calculate(table: &FactorTable, input: &FuelInput) -> Result<EmissionResult, CalcError> {
    InputGuard::validate_quantity("amount", input.quantity)?;
    let activity = format!("{} {} of {}", input.quantity, input.unit, input.fuel);

    if let Some(custom) = input.custom_factor {
        InputGuard::validate_factor("custom_factor", custom)?;
        let value = input.quantity * custom / 1000.0;
        debug!(fuel = %input.fuel, value, "scope 1 with custom factor");
        return Ok(EmissionResult::new(value, Scope::One, CATEGORY, activity)
            .with_uncertainty(DEFAULT_UNCERTAINTY)
            .with_metadata("fuel", input.fuel.as_str())
            .with_metadata("quantity", input.quantity)
            .with_metadata("unit", input.unit.as_str())
            .with_metadata("custom_factor", custom));
    }

    let fuel = table.fuel(&input.fuel)?;
    let uncertainty = fuel.uncertainty().unwrap_or(DEFAULT_UNCERTAINTY);

    let result = match fuel {
        FuelFactor::Direct(factor) => {
            let value = input.quantity * factor / 1000.0;
            EmissionResult::new(value, Scope::One, CATEGORY, activity)
                .with_metadata("emission_factor", *factor)
        }
        FuelFactor::Combustion(c) => {
            if let Some(native) = c.native_unit() {
                if native != input.unit {
                    warn!(
                        fuel = %input.fuel,
                        expected = native,
                        given = %input.unit,
                        "fuel unit differs from heating value unit, quantity used as-is"
                    );
                }
            }
            let gwp_ch4 = table.gwp("CH4")?;
            let gwp_n2o = table.gwp("N2O")?;
            let energy_gj = input.quantity * c.heating_value;
            let co2 = energy_gj * c.co2 / 1000.0;
            let ch4 = energy_gj * c.ch4 * gwp_ch4 / 1000.0;
            let n2o = energy_gj * c.n2o * gwp_n2o / 1000.0;
            EmissionResult::new(co2 + ch4 + n2o, Scope::One, CATEGORY, activity)
                .with_metadata("energy_gj", energy_gj)
                .with_metadata("co2_t", co2)
                .with_metadata("ch4_t_co2e", ch4)
                .with_metadata("n2o_t_co2e", n2o)
        }
    };

    debug!(fuel = %input.fuel, value = result.value(), "scope 1 calculated");
    Ok(result
        .with_uncertainty(uncertainty)
        .with_metadata("fuel", input.fuel.as_str())
        .with_metadata("quantity", input.quantity)
        .with_metadata("unit", input.unit.as_str()))
}
