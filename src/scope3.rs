//! Scope 3: value-chain emissions, one variant per sub-category.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{CalcError, IdentifierKind};
use crate::factors::{Factor, FactorTable};
use crate::guards::InputGuard;
use crate::result::EmissionResult;
use crate::types::Scope;

pub const TRAVEL_UNCERTAINTY: f64 = 0.15;
pub const WATER_UNCERTAINTY: f64 = 0.10;
pub const COOLING_UNCERTAINTY: f64 = 0.15;
pub const WASTE_UNCERTAINTY: f64 = 0.20;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Scope3Category {
    BusinessTravel,
    EmployeeCommute,
    Water,
    Waste,
    Cooling,
}

impl Scope3Category {
    pub const ALL: [Scope3Category; 5] = [
        Scope3Category::BusinessTravel,
        Scope3Category::EmployeeCommute,
        Scope3Category::Water,
        Scope3Category::Waste,
        Scope3Category::Cooling,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Scope3Category::BusinessTravel => "business_travel",
            Scope3Category::EmployeeCommute => "employee_commute",
            Scope3Category::Water => "water",
            Scope3Category::Waste => "waste",
            Scope3Category::Cooling => "cooling",
        }
    }

    /// Label carried by results of this category.
    pub fn label(self) -> &'static str {
        match self {
            Scope3Category::BusinessTravel => "Business Travel",
            Scope3Category::EmployeeCommute => "Employee Commuting",
            Scope3Category::Water => "Water Consumption",
            Scope3Category::Waste => "Waste Disposal",
            Scope3Category::Cooling => "Cooling",
        }
    }
}

impl fmt::Display for Scope3Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope3Category {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scope3Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                CalcError::unknown(
                    IdentifierKind::Scope3Category,
                    s,
                    Scope3Category::ALL.iter().map(|c| c.as_str()),
                )
            })
    }
}

fn one() -> u32 {
    1
}

/// A scope 3 activity. On the wire the variant is selected by `category`:
/// `{ "category": "water", "source": "groundwater", "volume_m3": 120.0 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum Scope3Activity {
    BusinessTravel {
        mode: String,
        distance_km: f64,
        #[serde(default)]
        round_trip: bool,
        #[serde(default = "one")]
        passengers: u32,
    },
    /// `daily_distance_km` is already the per-employee round trip.
    EmployeeCommute {
        mode: String,
        daily_distance_km: f64,
        working_days: u32,
        employees: u32,
    },
    Water {
        source: String,
        volume_m3: f64,
    },
    Waste {
        disposal: String,
        mass_kg: f64,
    },
    Cooling {
        system: String,
        kwh: f64,
    },
}

impl Scope3Activity {
    pub fn category(&self) -> Scope3Category {
        match self {
            Scope3Activity::BusinessTravel { .. } => Scope3Category::BusinessTravel,
            Scope3Activity::EmployeeCommute { .. } => Scope3Category::EmployeeCommute,
            Scope3Activity::Water { .. } => Scope3Category::Water,
            Scope3Activity::Waste { .. } => Scope3Category::Waste,
            Scope3Activity::Cooling { .. } => Scope3Category::Cooling,
        }
    }

    /// Parse a wrapper payload. The category name is checked first so that an
    /// unknown category reports the valid names rather than a serde message.
    pub fn from_json(payload: Value) -> Result<Self, CalcError> {
        let category = payload
            .get("category")
            .and_then(Value::as_str)
            .ok_or_else(|| CalcError::MalformedPayload("missing string field 'category'".into()))?;
        category.parse::<Scope3Category>()?;
        serde_json::from_value(payload).map_err(|e| CalcError::MalformedPayload(e.to_string()))
    }
}

/// kg CO2e per km for the whole party. Per-vehicle factors with an occupancy
/// are split per seat; per-passenger factors scale with headcount.
fn effective_travel_factor(entry: &Factor, passengers: u32) -> f64 {
    let passengers = f64::from(passengers);
    match entry.occupancy().filter(|o| *o > 0.0) {
        Some(occupancy) => entry.value() / occupancy * passengers,
        None if is_per_passenger(entry) => entry.value() * passengers,
        None => entry.value(),
    }
}

fn is_per_passenger(entry: &Factor) -> bool {
    entry
        .unit()
        .is_some_and(|u| u.ends_with("pkm") || u.contains("passenger"))
}

pub fn calculate(table: &FactorTable, activity: &Scope3Activity) -> Result<EmissionResult, CalcError> {
    let category = activity.category();
    let result = match activity {
        Scope3Activity::BusinessTravel {
            mode,
            distance_km,
            round_trip,
            passengers,
        } => {
            InputGuard::validate_quantity("distance", *distance_km)?;
            InputGuard::validate_travellers("passengers", *passengers)?;
            let entry = table.transport_mode(mode)?;
            let distance = if *round_trip { distance_km * 2.0 } else { *distance_km };
            let factor = effective_travel_factor(entry, *passengers);

            let mut description = format!("{distance_km} km by {mode}");
            if *round_trip {
                description.push_str(" (round trip)");
            }
            if *passengers > 1 {
                description.push_str(&format!(", {passengers} passengers"));
            }

            EmissionResult::new(distance * factor / 1000.0, Scope::Three, category.label(), description)
                .with_uncertainty(entry.uncertainty().unwrap_or(TRAVEL_UNCERTAINTY))
                .with_metadata("mode", mode.as_str())
                .with_metadata("distance_km", distance)
                .with_metadata("round_trip", *round_trip)
                .with_metadata("passengers", *passengers)
                .with_metadata("emission_factor", factor)
        }
        Scope3Activity::EmployeeCommute {
            mode,
            daily_distance_km,
            working_days,
            employees,
        } => {
            InputGuard::validate_quantity("daily_distance", *daily_distance_km)?;
            let entry = table.transport_mode(mode)?;
            let annual_km = daily_distance_km * f64::from(*working_days) * f64::from(*employees);
            let factor = effective_travel_factor(entry, 1);

            EmissionResult::new(
                annual_km * factor / 1000.0,
                Scope::Three,
                category.label(),
                format!(
                    "{employees} employees commuting {daily_distance_km} km/day for {working_days} days by {mode}"
                ),
            )
            .with_uncertainty(entry.uncertainty().unwrap_or(TRAVEL_UNCERTAINTY))
            .with_metadata("mode", mode.as_str())
            .with_metadata("annual_distance_km", annual_km)
            .with_metadata("employees", *employees)
            .with_metadata("working_days", *working_days)
            .with_metadata("emission_factor", factor)
        }
        Scope3Activity::Water { source, volume_m3 } => {
            InputGuard::validate_quantity("volume_m3", *volume_m3)?;
            let entry = table.water_source(source)?;
            simple_result(category, entry, *volume_m3, WATER_UNCERTAINTY, format!("{volume_m3} m3 of {source}"))
                .with_metadata("source", source.as_str())
                .with_metadata("volume_m3", *volume_m3)
        }
        Scope3Activity::Waste { disposal, mass_kg } => {
            InputGuard::validate_quantity("mass_kg", *mass_kg)?;
            let entry = table.waste_disposal(disposal)?;
            simple_result(category, entry, *mass_kg, WASTE_UNCERTAINTY, format!("{mass_kg} kg via {disposal}"))
                .with_metadata("disposal", disposal.as_str())
                .with_metadata("mass_kg", *mass_kg)
        }
        Scope3Activity::Cooling { system, kwh } => {
            InputGuard::validate_quantity("kwh", *kwh)?;
            let entry = table.cooling_system(system)?;
            simple_result(category, entry, *kwh, COOLING_UNCERTAINTY, format!("{kwh} kWh of {system}"))
                .with_metadata("system", system.as_str())
                .with_metadata("kwh", *kwh)
        }
    };

    debug!(category = %category, value = result.value(), "scope 3 calculated");
    Ok(result)
}

/// quantity * factor / 1000. The factor may be negative (avoided emissions).
fn simple_result(
    category: Scope3Category,
    entry: &Factor,
    quantity: f64,
    default_uncertainty: f64,
    description: String,
) -> EmissionResult {
    EmissionResult::new(quantity * entry.value() / 1000.0, Scope::Three, category.label(), description)
        .with_uncertainty(entry.uncertainty().unwrap_or(default_uncertainty))
        .with_metadata("emission_factor", entry.value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn travel(mode: &str, distance_km: f64, round_trip: bool, passengers: u32) -> Scope3Activity {
        Scope3Activity::BusinessTravel {
            mode: mode.into(),
            distance_km,
            round_trip,
            passengers,
        }
    }

    #[test]
    fn test_business_travel() {
        let t = FactorTable::defaults();
        let r = calculate(&t, &travel("airplane_domestic", 500.0, false, 1)).unwrap();
        assert!(close(r.value(), 500.0 * 0.255 / 1000.0));
        assert_eq!(r.scope(), Scope::Three);
        assert_eq!(r.category(), "Business Travel");
        assert_eq!(r.uncertainty(), Some(TRAVEL_UNCERTAINTY));

        let rt = calculate(&t, &travel("airplane_domestic", 500.0, true, 1)).unwrap();
        assert!(close(rt.value(), 2.0 * r.value()));
    }

    #[test]
    fn test_occupancy_divides_per_vehicle_factor() {
        let t = FactorTable::defaults();
        let r = calculate(&t, &travel("carpool", 100.0, false, 2)).unwrap();
        assert!(close(r.value(), 100.0 * (0.17 / 3.0 * 2.0) / 1000.0));

        // Private car without occupancy: one vehicle regardless of passengers.
        let car = calculate(&t, &travel("car_medium", 100.0, false, 3)).unwrap();
        assert!(close(car.value(), 0.017));

        // Per-passenger modes scale with headcount.
        let bus = calculate(&t, &travel("bus_public", 100.0, false, 4)).unwrap();
        assert!(close(bus.value(), 100.0 * 0.089 * 4.0 / 1000.0));
    }

    #[test]
    fn test_unknown_mode_lists_modes() {
        let t = FactorTable::defaults();
        match calculate(&t, &travel("hyperloop", 10.0, false, 1)).unwrap_err() {
            CalcError::UnknownIdentifier { kind, valid, .. } => {
                assert_eq!(kind, IdentifierKind::TransportMode);
                assert!(valid.contains(&"metro_dubai".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_employee_commute_builds_own_result() {
        let t = FactorTable::defaults();
        let activity = Scope3Activity::EmployeeCommute {
            mode: "car_medium".into(),
            daily_distance_km: 30.0,
            working_days: 250,
            employees: 10,
        };
        let r = calculate(&t, &activity).unwrap();
        assert!(close(r.value(), 30.0 * 250.0 * 10.0 * 0.17 / 1000.0));
        assert_eq!(r.category(), "Employee Commuting");
        assert!(r.activity().starts_with("10 employees commuting 30 km/day"));
        assert_eq!(r.uncertainty(), Some(TRAVEL_UNCERTAINTY));
    }

    #[test]
    fn test_water_cooling_and_waste_credit() {
        let t = FactorTable::defaults();
        let water = calculate(
            &t,
            &Scope3Activity::Water {
                source: "desalinated_water_uae".into(),
                volume_m3: 1000.0,
            },
        )
        .unwrap();
        assert!(close(water.value(), 1.82));
        assert_eq!(water.uncertainty(), Some(WATER_UNCERTAINTY));

        let cooling = calculate(
            &t,
            &Scope3Activity::Cooling {
                system: "district_cooling_uae".into(),
                kwh: 10_000.0,
            },
        )
        .unwrap();
        assert!(close(cooling.value(), 1.8));

        let recycling = calculate(
            &t,
            &Scope3Activity::Waste {
                disposal: "recycling".into(),
                mass_kg: 2000.0,
            },
        )
        .unwrap();
        assert!(close(recycling.value(), -0.468));
        assert!(recycling.is_credit());
        assert_eq!(recycling.uncertainty(), Some(WASTE_UNCERTAINTY));
    }

    #[test]
    fn test_from_json_dispatch() {
        let a = Scope3Activity::from_json(json!({
            "category": "business_travel",
            "mode": "airplane_gcc",
            "distance_km": 1200.0
        }))
        .unwrap();
        assert_eq!(a, travel("airplane_gcc", 1200.0, false, 1));

        match Scope3Activity::from_json(json!({ "category": "purchased_goods" })).unwrap_err() {
            CalcError::UnknownIdentifier { kind, given, valid } => {
                assert_eq!(kind, IdentifierKind::Scope3Category);
                assert_eq!(given, "purchased_goods");
                assert_eq!(valid.len(), 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(matches!(
            Scope3Activity::from_json(json!({ "category": "water", "source": "groundwater" })),
            Err(CalcError::MalformedPayload(_))
        ));
        assert!(matches!(
            Scope3Activity::from_json(json!({ "mode": "suv" })),
            Err(CalcError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_large_workforce_is_accepted() {
        let t = FactorTable::defaults();
        let activity = Scope3Activity::EmployeeCommute {
            mode: "metro_dubai".into(),
            daily_distance_km: 20.0,
            working_days: 240,
            employees: 2_100_000,
        };
        let r = calculate(&t, &activity).unwrap();
        let expected = 20.0 * 240.0 * 2_100_000.0 * 0.027 / 1000.0;
        assert!((r.value() - expected).abs() < 1e-6 * expected);
    }

    #[test]
    fn test_zero_passengers_rejected_for_every_basis() {
        let t = FactorTable::defaults();
        for mode in ["car_medium", "carpool", "bus_public"] {
            assert!(
                matches!(
                    calculate(&t, &travel(mode, 100.0, false, 0)),
                    Err(CalcError::InvalidInput { field: "passengers", .. })
                ),
                "{mode}"
            );
        }
    }

    #[test]
    fn test_negative_distance_rejected() {
        let t = FactorTable::defaults();
        assert!(matches!(
            calculate(&t, &travel("suv", -5.0, false, 1)),
            Err(CalcError::InvalidInput { field: "distance", .. })
        ));
    }
}
