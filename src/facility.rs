//! Whole-facility assessment: every activity of one site in a single call.

use serde::{Deserialize, Serialize};

use crate::error::CalcError;
use crate::factors::FactorTable;
use crate::ledger::Totals;
use crate::report::{recommendations, Recommendation};
use crate::result::EmissionResult;
use crate::scope1::{self, FuelInput};
use crate::scope2::{self, ElectricityInput};
use crate::scope3::{self, Scope3Activity};

/// Annual activity data for one facility.
///
/// ```json
/// {
///   "name": "Jebel Ali warehouse",
///   "fuels": [{ "fuel": "diesel", "quantity": 12000, "unit": "L" }],
///   "electricity": [{ "kwh": 450000, "location": "Dubai", "include_losses": true }],
///   "value_chain": [{ "category": "waste", "disposal": "recycling", "mass_kg": 8000 }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityProfile {
    pub name: String,
    #[serde(default)]
    pub fuels: Vec<FuelInput>,
    #[serde(default)]
    pub electricity: Vec<ElectricityInput>,
    #[serde(default)]
    pub value_chain: Vec<Scope3Activity>,
}

impl FacilityProfile {
    pub fn activity_count(&self) -> usize {
        self.fuels.len() + self.electricity.len() + self.value_chain.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilityAssessment {
    pub facility: String,
    pub results: Vec<EmissionResult>,
    pub totals: Totals,
    pub recommendations: Vec<Recommendation>,
}

/// Calculate every activity of `profile`, in scope order. Stops at the first
/// rejected activity; nothing partial is returned.
pub fn evaluate(table: &FactorTable, profile: &FacilityProfile) -> Result<FacilityAssessment, CalcError> {
    let mut results = Vec::with_capacity(profile.activity_count());
    for fuel in &profile.fuels {
        results.push(scope1::calculate(table, fuel)?);
    }
    for supply in &profile.electricity {
        results.push(scope2::calculate(table, supply)?);
    }
    for activity in &profile.value_chain {
        results.push(scope3::calculate(table, activity)?);
    }

    let totals = Totals::from_results(&results);
    Ok(FacilityAssessment {
        facility: profile.name.clone(),
        recommendations: recommendations(&totals),
        results,
        totals,
    })
}
