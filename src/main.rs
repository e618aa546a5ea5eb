use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use ghg_emissions::{
    CalculatorConfig, ElectricityInput, FuelInput, GhgCalculator, Scope, Scope2Method, Scope3Activity,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "ghg_emissions")]
#[command(about = "Annual Scope 1/2/3 emissions for a small Dubai office")]
struct Cli {
    /// Path to a JSON calculator config
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("ghg_emissions=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => CalculatorConfig::from_file(&path)?,
        None => CalculatorConfig {
            region: "Dubai".to_string(),
            report_path: "small_office_dubai.json".into(),
            ..CalculatorConfig::default()
        },
    };
    let mut calc = GhgCalculator::new(config);

    // Small office in Dubai, one reporting year.
    calc.calculate_scope1(&FuelInput::new("natural_gas", 500.0, "m3"))?;
    calc.calculate_scope1(&FuelInput::new("diesel", 200.0, "L"))?;

    calc.calculate_scope2(&ElectricityInput::new(25_000.0, "Dubai").with_losses(true))?;
    calc.calculate_scope2(
        &ElectricityInput::new(8_000.0, "Dubai")
            .with_method(Scope2Method::MarketBased)
            .with_renewable_pct(40.0),
    )?;

    calc.calculate_scope3(&Scope3Activity::EmployeeCommute {
        mode: "car_medium".to_string(),
        daily_distance_km: 30.0,
        working_days: 250,
        employees: 10,
    })?;
    calc.calculate_scope3(&Scope3Activity::BusinessTravel {
        mode: "airplane_gcc".to_string(),
        distance_km: 850.0,
        round_trip: true,
        passengers: 2,
    })?;
    calc.calculate_scope3(&Scope3Activity::Cooling {
        system: "district_cooling_uae".to_string(),
        kwh: 12_000.0,
    })?;
    calc.calculate_scope3(&Scope3Activity::Waste {
        disposal: "recycling".to_string(),
        mass_kg: 1_500.0,
    })?;

    // Emit per-result rows: scope, category, tCO2e, uncertainty.
    for r in calc.results() {
        println!(
            "{},{},{:.3},{:.2}",
            r.scope().number(),
            r.category(),
            r.value(),
            r.effective_uncertainty()
        );
    }

    let totals = calc.totals();
    println!("\nTotal annual emissions: {:.3} tCO2e", totals.total);
    for scope in Scope::ALL {
        println!(
            "  {}: {:.3} tCO2e ({:.1}%)",
            scope,
            totals.subtotal(scope),
            totals.breakdown.share(scope)
        );
    }

    let report = calc.write_report(true)?;
    info!(
        path = %calc.config().report_path.display(),
        recommendations = report.recommendations.as_ref().map_or(0, Vec::len),
        "done"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_flag_is_optional() {
        let cli = Cli::try_parse_from(["ghg_emissions"]).unwrap();
        assert!(cli.config.is_none());

        let cli = Cli::try_parse_from(["ghg_emissions", "--config", "dubai.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("dubai.json")));

        let cli = Cli::try_parse_from(["ghg_emissions", "-c", "ksa.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("ksa.json")));
    }

    #[test]
    fn test_stray_positional_is_rejected() {
        assert!(Cli::try_parse_from(["ghg_emissions", "dubai.json"]).is_err());
    }
}
