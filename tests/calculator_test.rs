//! End-to-end session tests: factor loading, calculation, aggregation, reporting.

use std::fs;

use chrono::{TimeZone, Utc};
use ghg_emissions::{
    CalcError, CalculatorConfig, ElectricityInput, FactorTable, FuelInput, GhgCalculator, Report,
    Scope, Scope2Method, Scope3Activity,
};
use serde_json::json;
use tempfile::TempDir;

fn session_in(dir: &TempDir) -> GhgCalculator {
    GhgCalculator::new(CalculatorConfig {
        factors_path: dir.path().join("factors.json"),
        report_path: dir.path().join("reports").join("emissions_report.json"),
        ..CalculatorConfig::default()
    })
}

// =============================================================================
// Factor loading
// =============================================================================

#[test]
fn test_missing_factor_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let calc = session_in(&dir);
    assert_eq!(calc.factors(), &FactorTable::defaults());
}

#[test]
fn test_partial_factor_file_is_backfilled_and_used() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("factors.json"),
        r#"{
            "version": "site-audit-7",
            "electricity": { "Muscat": { "factor": 0.40, "renewable_share": 0.25, "uncertainty": 0.08 } }
        }"#,
    )
    .unwrap();

    let mut calc = session_in(&dir);
    assert_eq!(calc.factors().version(), "site-audit-7");

    // Overridden category: only the file's grid is known.
    let r = calc.calculate_scope2(&ElectricityInput::new(1000.0, "Muscat")).unwrap();
    assert!((r.value() - 0.40).abs() < 1e-9);
    assert_eq!(r.uncertainty(), Some(0.08));

    // Backfilled categories behave like the defaults.
    let gas = calc.calculate_scope1(&FuelInput::new("natural_gas", 1000.0, "m3")).unwrap();
    assert!((gas.value() - 2.098).abs() < 1e-3);
}

#[test]
fn test_corrupt_factor_file_does_not_fail_session() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("factors.json"), "{{{ definitely not json").unwrap();
    let mut calc = session_in(&dir);
    assert!(calc.calculate_scope1(&FuelInput::new("kerosene", 100.0, "L")).is_ok());
}

// =============================================================================
// Reference values
// =============================================================================

#[test]
fn test_reference_values() {
    let mut calc = GhgCalculator::default();

    let gas = calc.calculate_scope1(&FuelInput::new("natural_gas", 1000.0, "m3")).unwrap();
    let expected = 1000.0 * 0.0373 * (56.1 + 0.001 * 29.8 + 0.0001 * 273.0) / 1000.0;
    assert!((gas.value() - expected).abs() < 1e-9);

    let neom = calc
        .calculate_scope2(&ElectricityInput::new(1000.0, "NEOM").with_losses(true))
        .unwrap();
    assert!((neom.value() - 0.053).abs() < 1e-9);

    let neom_bare = calc.calculate_scope2(&ElectricityInput::new(1000.0, "NEOM")).unwrap();
    assert!((neom_bare.value() - 0.050).abs() < 1e-9);

    let market = calc
        .calculate_scope2(
            &ElectricityInput::new(1000.0, "NEOM")
                .with_method(Scope2Method::MarketBased)
                .with_renewable_pct(50.0),
        )
        .unwrap();
    assert!((market.value() - neom_bare.value() / 2.0).abs() < 1e-12);

    assert_eq!(calc.results().len(), 4);
}

#[test]
fn test_unknown_fuel_echoes_name_and_alternatives() {
    let mut calc = GhgCalculator::default();
    let before = calc.ledger().len();
    match calc.calculate_scope1(&FuelInput::new("plutonium", 1.0, "kg")) {
        Err(CalcError::UnknownIdentifier { given, valid, .. }) => {
            assert_eq!(given, "plutonium");
            assert!(!valid.is_empty());
        }
        other => panic!("expected unknown identifier, got {other:?}"),
    }
    assert_eq!(calc.ledger().len(), before);
}

#[test]
fn test_recycling_credit_reduces_total() {
    let mut calc = GhgCalculator::default();
    let x = calc.calculate_scope1(&FuelInput::new("diesel", 500.0, "L")).unwrap().value();
    let y = calc
        .calculate_scope3_json(json!({ "category": "waste", "disposal": "recycling", "mass_kg": 3000.0 }))
        .unwrap()
        .value();
    assert!(y < 0.0);
    let totals = calc.totals();
    assert_eq!(totals.total, x + y);
    assert_eq!(totals.subtotal(Scope::Three), y);
}

#[test]
fn test_empty_session_totals_are_zero() {
    let calc = GhgCalculator::default();
    let t = calc.totals();
    assert_eq!(t.total, 0.0);
    assert_eq!(t.breakdown.scope1_pct, 0.0);
    assert_eq!(t.breakdown.scope2_pct, 0.0);
    assert_eq!(t.breakdown.scope3_pct, 0.0);
    assert_eq!(t, calc.totals());
}

// =============================================================================
// Reports
// =============================================================================

#[test]
fn test_report_round_trip_preserves_summary() {
    let dir = TempDir::new().unwrap();
    let mut calc = session_in(&dir);
    calc.calculate_scope1(&FuelInput::new("natural_gas", 500.0, "m3")).unwrap();
    calc.calculate_scope2(&ElectricityInput::new(25_000.0, "Dubai")).unwrap();
    calc.calculate_scope3(&Scope3Activity::EmployeeCommute {
        mode: "car_medium".into(),
        daily_distance_km: 30.0,
        working_days: 250,
        employees: 10,
    })
    .unwrap();

    let written = calc.write_report(true).unwrap();
    let reloaded = Report::read_json(&calc.config().report_path).unwrap();

    assert_eq!(reloaded.executive_summary, written.executive_summary);
    assert_eq!(reloaded.results.len(), 3);
    assert_eq!(reloaded.results[2].category, "Employee Commuting");
    assert_eq!(reloaded.recommendations, written.recommendations);

    let breakdown = reloaded.executive_summary.breakdown;
    let pct_sum = breakdown.scope1_pct + breakdown.scope2_pct + breakdown.scope3_pct;
    assert!((pct_sum - 100.0).abs() < 0.2);
}

#[test]
fn test_reports_differ_only_in_timestamp() {
    let mut calc = GhgCalculator::default();
    calc.calculate_scope2(&ElectricityInput::new(9_000.0, "Abu Dhabi")).unwrap();
    calc.calculate_scope3(&Scope3Activity::Water {
        source: "desalinated_water_uae".into(),
        volume_m3: 800.0,
    })
    .unwrap();

    let mut first = calc.generate_report(true);
    let mut second = calc.generate_report(true);
    second.metadata.generated_at = first.metadata.generated_at;
    assert_eq!(first.to_json_pretty().unwrap(), second.to_json_pretty().unwrap());

    first.metadata.generated_at = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
    assert_ne!(first.to_json_pretty().unwrap(), second.to_json_pretty().unwrap());
}
