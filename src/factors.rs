//! Emission factor table: loading, backfilling and lookups.
//!
//! The on-disk shape is a JSON object with seven required categories. Every
//! leaf is either a bare number (legacy form) or a structured record:
//!
//! ```json
//! {
//!   "fuels":       { "diesel": { "co2": 74.1, "ch4": 0.003, "n2o": 0.0006, "heating_value": 0.0381 } },
//!   "electricity": { "Dubai": { "factor": 0.44, "renewable_share": 0.11 }, "Oman": 0.52 },
//!   "transport":   { "carpool": { "factor": 0.17, "occupancy": 3.0, "unit": "kg CO2e/vkm" } },
//!   "cooling": {}, "water": {}, "waste": {}, "gwp": { "CH4": 29.8, "N2O": 273 }
//! }
//! ```
//!
//! A category missing from the file is filled from [`FactorTable::defaults`].
//! A file that is absent or does not parse is replaced by the defaults wholesale.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::{CalcError, IdentifierKind};

/// Version tag of the built-in table. Bumped whenever a default value changes.
pub const DEFAULT_TABLE_VERSION: &str = "gcc-2023.1";

/// Assessment report all default GWP values are taken from.
pub const GWP_VINTAGE: &str = "IPCC AR6 GWP100";

pub const CATEGORY_NAMES: [&str; 7] = [
    "fuels",
    "electricity",
    "transport",
    "cooling",
    "water",
    "waste",
    "gwp",
];

#[derive(Debug, Error)]
pub enum FactorError {
    #[error("factor table I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("factor table serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid factor {category}.{key}: {reason}")]
    Invalid {
        category: &'static str,
        key: String,
        reason: &'static str,
    },
    #[error(transparent)]
    Lookup(#[from] CalcError),
}

fn invalid(category: &'static str, key: &str, reason: &'static str) -> FactorError {
    FactorError::Invalid {
        category,
        key: key.to_string(),
        reason,
    }
}

fn check_non_negative(category: &'static str, key: &str, value: f64) -> Result<(), FactorError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(category, key, "must be finite and non-negative"))
    }
}

/// Per-gas combustion coefficients for one fuel (kg per GJ) plus the heating
/// value converting the fuel's native unit into GJ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombustionFactor {
    pub co2: f64,
    pub ch4: f64,
    pub n2o: f64,
    pub heating_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<f64>,
    /// Heating-value unit, e.g. "GJ/m3".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl CombustionFactor {
    /// Native quantity unit implied by the heating-value unit ("GJ/L" -> "L").
    pub fn native_unit(&self) -> Option<&str> {
        self.unit.as_deref()?.split('/').nth(1).map(str::trim)
    }
}

/// A fuel is either decomposed per gas, or (legacy) a single kg CO2e per native unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FuelFactor {
    Combustion(CombustionFactor),
    Direct(f64),
}

impl FuelFactor {
    pub fn uncertainty(&self) -> Option<f64> {
        match self {
            FuelFactor::Combustion(c) => c.uncertainty,
            FuelFactor::Direct(_) => None,
        }
    }

    fn validate(&self, key: &str) -> Result<(), FactorError> {
        match self {
            FuelFactor::Combustion(c) => {
                for value in [c.co2, c.ch4, c.n2o, c.heating_value] {
                    check_non_negative("fuels", key, value)?;
                }
                if let Some(u) = c.uncertainty {
                    check_non_negative("fuels", key, u)?;
                }
                Ok(())
            }
            FuelFactor::Direct(factor) => check_non_negative("fuels", key, *factor),
        }
    }
}

/// Structured leaf used by every non-fuel category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorRecord {
    pub factor: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Electricity only: fraction of the grid mix that is renewable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renewable_share: Option<f64>,
    /// Transport only: average occupants per vehicle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupancy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Factor {
    Record(FactorRecord),
    Bare(f64),
}

impl Factor {
    pub fn value(&self) -> f64 {
        match self {
            Factor::Record(r) => r.factor,
            Factor::Bare(v) => *v,
        }
    }

    pub fn uncertainty(&self) -> Option<f64> {
        self.record().and_then(|r| r.uncertainty)
    }

    pub fn unit(&self) -> Option<&str> {
        self.record().and_then(|r| r.unit.as_deref())
    }

    pub fn renewable_share(&self) -> Option<f64> {
        self.record().and_then(|r| r.renewable_share)
    }

    pub fn occupancy(&self) -> Option<f64> {
        self.record().and_then(|r| r.occupancy)
    }

    /// Only waste factors may be negative (avoided emissions).
    fn validate(&self, category: &'static str, key: &str) -> Result<(), FactorError> {
        if category == "waste" {
            if !self.value().is_finite() {
                return Err(invalid(category, key, "must be finite"));
            }
        } else {
            check_non_negative(category, key, self.value())?;
        }
        if let Some(u) = self.uncertainty() {
            check_non_negative(category, key, u)?;
        }
        if let Some(share) = self.renewable_share() {
            if !(0.0..=1.0).contains(&share) {
                return Err(invalid(category, key, "renewable_share must be between 0 and 1"));
            }
        }
        if let Some(occupancy) = self.occupancy() {
            if !(occupancy.is_finite() && occupancy > 0.0) {
                return Err(invalid(category, key, "occupancy must be positive"));
            }
        }
        Ok(())
    }

    fn record(&self) -> Option<&FactorRecord> {
        match self {
            Factor::Record(r) => Some(r),
            Factor::Bare(_) => None,
        }
    }
}

pub type FactorMap = BTreeMap<String, Factor>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub fuels: BTreeMap<String, FuelFactor>,
    pub electricity: FactorMap,
    pub transport: FactorMap,
    pub cooling: FactorMap,
    pub water: FactorMap,
    pub waste: FactorMap,
    pub gwp: FactorMap,
}

/// On-disk form before backfilling; any category may be absent.
#[derive(Debug, Deserialize)]
struct PartialFactorTable {
    version: Option<String>,
    fuels: Option<BTreeMap<String, FuelFactor>>,
    electricity: Option<FactorMap>,
    transport: Option<FactorMap>,
    cooling: Option<FactorMap>,
    water: Option<FactorMap>,
    waste: Option<FactorMap>,
    gwp: Option<FactorMap>,
}

fn backfill<T>(slot: Option<T>, name: &'static str, default: T, filled: &mut Vec<&'static str>) -> T {
    match slot {
        Some(v) => v,
        None => {
            filled.push(name);
            default
        }
    }
}

fn lookup<'a, T>(
    map: &'a BTreeMap<String, T>,
    kind: IdentifierKind,
    key: &str,
) -> Result<&'a T, CalcError> {
    map.get(key)
        .ok_or_else(|| CalcError::unknown(kind, key, map.keys().map(String::as_str)))
}

impl FactorTable {
    /// Load a table from `path`, degrading to the built-in defaults when the
    /// file is missing, unreadable or malformed. Never fails.
    pub fn load(path: impl AsRef<Path>) -> FactorTable {
        let path = path.as_ref();
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "factor table not found, using built-in defaults");
                return FactorTable::defaults();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read factor table, using built-in defaults");
                return FactorTable::defaults();
            }
        };

        match FactorTable::from_json_str(&raw) {
            Ok(table) => {
                info!(
                    path = %path.display(),
                    version = table.version(),
                    fuels = table.fuels.len(),
                    grids = table.electricity.len(),
                    "loaded emission factor table"
                );
                table
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed factor table, using built-in defaults");
                FactorTable::defaults()
            }
        }
    }

    /// Parse a table, backfill any absent category from the defaults and
    /// reject values no calculator can use.
    pub fn from_json_str(raw: &str) -> Result<FactorTable, FactorError> {
        let partial: PartialFactorTable = serde_json::from_str(raw)?;
        let defaults = FactorTable::defaults();
        let mut filled = Vec::new();

        let table = FactorTable {
            version: partial.version,
            fuels: backfill(partial.fuels, "fuels", defaults.fuels, &mut filled),
            electricity: backfill(partial.electricity, "electricity", defaults.electricity, &mut filled),
            transport: backfill(partial.transport, "transport", defaults.transport, &mut filled),
            cooling: backfill(partial.cooling, "cooling", defaults.cooling, &mut filled),
            water: backfill(partial.water, "water", defaults.water, &mut filled),
            waste: backfill(partial.waste, "waste", defaults.waste, &mut filled),
            gwp: backfill(partial.gwp, "gwp", defaults.gwp, &mut filled),
        };

        if !filled.is_empty() {
            warn!(
                categories = ?filled,
                default_version = DEFAULT_TABLE_VERSION,
                "factor table missing categories, backfilled from defaults"
            );
        }
        table.validate()?;
        Ok(table)
    }

    /// Range checks on every entry: finite non-negative factors and
    /// uncertainties (waste excepted), renewable shares within [0, 1],
    /// positive occupancies.
    pub fn validate(&self) -> Result<(), FactorError> {
        for (key, fuel) in &self.fuels {
            fuel.validate(key)?;
        }
        let categories: [(&'static str, &FactorMap); 6] = [
            ("electricity", &self.electricity),
            ("transport", &self.transport),
            ("cooling", &self.cooling),
            ("water", &self.water),
            ("waste", &self.waste),
            ("gwp", &self.gwp),
        ];
        for (category, map) in categories {
            for (key, factor) in map {
                factor.validate(category, key)?;
            }
        }
        Ok(())
    }

    /// Persist the table in the same shape [`FactorTable::load`] reads.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), FactorError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(self)?;
        fs::write(path, body)?;
        Ok(())
    }

    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or("unversioned")
    }

    pub fn fuel(&self, id: &str) -> Result<&FuelFactor, CalcError> {
        lookup(&self.fuels, IdentifierKind::Fuel, id)
    }

    pub fn transport_mode(&self, mode: &str) -> Result<&Factor, CalcError> {
        lookup(&self.transport, IdentifierKind::TransportMode, mode)
    }

    pub fn water_source(&self, source: &str) -> Result<&Factor, CalcError> {
        lookup(&self.water, IdentifierKind::WaterSource, source)
    }

    pub fn waste_disposal(&self, method: &str) -> Result<&Factor, CalcError> {
        lookup(&self.waste, IdentifierKind::WasteDisposal, method)
    }

    pub fn cooling_system(&self, system: &str) -> Result<&Factor, CalcError> {
        lookup(&self.cooling, IdentifierKind::CoolingSystem, system)
    }

    pub fn gwp(&self, gas: &str) -> Result<f64, CalcError> {
        lookup(&self.gwp, IdentifierKind::GwpGas, gas).map(Factor::value)
    }

    /// Exact grid lookup; fallback resolution lives with the scope 2 calculator.
    pub fn grid(&self, location: &str) -> Option<&Factor> {
        self.electricity.get(location)
    }

    /// All factors of one top-level category as JSON.
    pub fn category(&self, name: &str) -> Result<Value, FactorError> {
        let value = match name {
            "fuels" => serde_json::to_value(&self.fuels)?,
            "electricity" => serde_json::to_value(&self.electricity)?,
            "transport" => serde_json::to_value(&self.transport)?,
            "cooling" => serde_json::to_value(&self.cooling)?,
            "water" => serde_json::to_value(&self.water)?,
            "waste" => serde_json::to_value(&self.waste)?,
            "gwp" => serde_json::to_value(&self.gwp)?,
            other => {
                return Err(CalcError::unknown(IdentifierKind::FactorCategory, other, CATEGORY_NAMES).into());
            }
        };
        Ok(value)
    }

    /// Built-in GCC (UAE & KSA focused) factor set.
    ///
    /// Fuels follow IPCC 2006 stationary-combustion defaults; grids follow the
    /// 2023 utility disclosures (DEWA, ADWEA, SEWA, FEWA, SEC) and IEA 2023;
    /// GWPs are AR6 100-year values.
    pub fn defaults() -> FactorTable {
        FactorTable {
            version: Some(DEFAULT_TABLE_VERSION.to_string()),
            fuels: default_fuels(),
            electricity: default_electricity(),
            transport: default_transport(),
            cooling: default_cooling(),
            water: default_water(),
            waste: default_waste(),
            gwp: default_gwp(),
        }
    }
}

impl Default for FactorTable {
    fn default() -> Self {
        FactorTable::defaults()
    }
}

fn combustion(co2: f64, ch4: f64, n2o: f64, heating_value: f64, uncertainty: f64, unit: &str) -> FuelFactor {
    FuelFactor::Combustion(CombustionFactor {
        co2,
        ch4,
        n2o,
        heating_value,
        uncertainty: Some(uncertainty),
        unit: Some(unit.to_string()),
        source: Some("IPCC 2006".to_string()),
    })
}

fn record(factor: f64, unit: &str) -> FactorRecord {
    FactorRecord {
        factor,
        uncertainty: None,
        unit: Some(unit.to_string()),
        renewable_share: None,
        occupancy: None,
        source: None,
    }
}

fn grid(factor: f64, renewable_share: f64, uncertainty: f64, source: &str) -> Factor {
    Factor::Record(FactorRecord {
        uncertainty: Some(uncertainty),
        renewable_share: Some(renewable_share),
        source: Some(source.to_string()),
        ..record(factor, "kg CO2e/kWh")
    })
}

fn per_vehicle(factor: f64, occupancy: Option<f64>) -> Factor {
    Factor::Record(FactorRecord {
        occupancy,
        ..record(factor, "kg CO2e/vkm")
    })
}

fn per_passenger(factor: f64) -> Factor {
    Factor::Record(record(factor, "kg CO2e/pkm"))
}

fn simple(factor: f64, unit: &str) -> Factor {
    Factor::Record(record(factor, unit))
}

fn named<T>(entries: Vec<(&str, T)>) -> BTreeMap<String, T> {
    entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

fn default_fuels() -> BTreeMap<String, FuelFactor> {
    named(vec![
        ("natural_gas", combustion(56.1, 0.001, 0.0001, 0.0373, 0.03, "GJ/m3")),
        ("diesel", combustion(74.1, 0.003, 0.0006, 0.0381, 0.05, "GJ/L")),
        ("gasoline", combustion(69.3, 0.003, 0.0006, 0.0342, 0.05, "GJ/L")),
        ("lpg", combustion(63.1, 0.001, 0.0001, 0.0474, 0.05, "GJ/kg")),
        ("fuel_oil", combustion(77.4, 0.003, 0.0006, 0.0404, 0.05, "GJ/L")),
        ("coal", combustion(94.6, 0.001, 0.0015, 0.0246, 0.10, "GJ/kg")),
        ("kerosene", combustion(71.9, 0.003, 0.0006, 0.0350, 0.05, "GJ/L")),
    ])
}

fn default_electricity() -> FactorMap {
    named(vec![
        ("UAE", grid(0.450, 0.07, 0.05, "IEA 2023, UAE Ministry of Energy")),
        ("Dubai", grid(0.440, 0.11, 0.05, "DEWA Sustainability Report 2023")),
        ("Abu Dhabi", grid(0.460, 0.08, 0.05, "ADWEA 2023")),
        ("Sharjah", grid(0.455, 0.01, 0.07, "SEWA 2023")),
        ("Northern Emirates", grid(0.465, 0.01, 0.07, "FEWA 2023")),
        ("Saudi Arabia", grid(0.720, 0.01, 0.05, "Saudi Electricity Company 2023")),
        ("Riyadh", grid(0.710, 0.01, 0.06, "SEC Central Region 2023")),
        ("Jeddah", grid(0.725, 0.01, 0.06, "SEC Western Region 2023")),
        ("Dammam", grid(0.730, 0.00, 0.06, "SEC Eastern Region 2023")),
        ("NEOM", grid(0.050, 0.95, 0.10, "NEOM Energy 2023")),
        ("Kuwait", grid(0.570, 0.01, 0.08, "IEA 2023")),
        ("Qatar", grid(0.490, 0.02, 0.08, "IEA 2023")),
        ("Bahrain", grid(0.620, 0.01, 0.08, "IEA 2023")),
        ("Oman", grid(0.520, 0.03, 0.08, "IEA 2023")),
        ("World Average", grid(0.475, 0.29, 0.15, "IEA 2023")),
    ])
}

fn default_transport() -> FactorMap {
    named(vec![
        ("car_small", per_vehicle(0.14, None)),
        ("car_medium", per_vehicle(0.17, None)),
        ("car_large", per_vehicle(0.21, None)),
        ("suv", per_vehicle(0.24, None)),
        ("pickup_truck", per_vehicle(0.28, None)),
        ("taxi_dubai", per_vehicle(0.18, None)),
        ("taxi_riyadh", per_vehicle(0.19, None)),
        ("carpool", per_vehicle(0.17, Some(3.0))),
        ("coach_charter", per_vehicle(0.95, Some(35.0))),
        ("bus_public", per_passenger(0.089)),
        ("metro_dubai", per_passenger(0.027)),
        ("metro_riyadh", per_passenger(0.030)),
        ("airplane_domestic", per_passenger(0.255)),
        ("airplane_gcc", per_passenger(0.185)),
        ("airplane_international", per_passenger(0.147)),
    ])
}

fn default_cooling() -> FactorMap {
    named(vec![
        ("district_cooling_uae", simple(0.180, "kg CO2e/kWh")),
        ("district_cooling_ksa", simple(0.290, "kg CO2e/kWh")),
        ("split_ac", simple(0.450, "kg CO2e/kWh")),
        ("central_ac", simple(0.420, "kg CO2e/kWh")),
        ("window_ac", simple(0.480, "kg CO2e/kWh")),
    ])
}

fn default_water() -> FactorMap {
    named(vec![
        ("desalinated_water_uae", simple(1.82, "kg CO2e/m3")),
        ("desalinated_water_ksa", simple(2.15, "kg CO2e/m3")),
        ("groundwater", simple(0.35, "kg CO2e/m3")),
        ("treated_wastewater", simple(0.65, "kg CO2e/m3")),
        ("bottled_water", simple(0.23, "kg CO2e/m3")),
    ])
}

fn default_waste() -> FactorMap {
    named(vec![
        ("landfill_uae", simple(0.467, "kg CO2e/kg")),
        ("landfill_ksa", simple(0.485, "kg CO2e/kg")),
        ("recycling", simple(-0.234, "kg CO2e/kg")),
        ("composting", simple(0.012, "kg CO2e/kg")),
        ("anaerobic_digestion", simple(-0.078, "kg CO2e/kg")),
        ("incineration", simple(0.908, "kg CO2e/kg")),
    ])
}

fn default_gwp() -> FactorMap {
    named(vec![
        ("CO2", Factor::Bare(1.0)),
        ("CH4", Factor::Bare(29.8)),
        ("N2O", Factor::Bare(273.0)),
        ("HFC-32", Factor::Bare(771.0)),
        ("R134a", Factor::Bare(1530.0)),
        ("R410A", Factor::Bare(2256.0)),
        ("R404A", Factor::Bare(4728.0)),
        ("SF6", Factor::Bare(25200.0)),
    ])
}
