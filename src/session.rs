//! Caller-owned calculator session: one factor table, one ledger.

use serde_json::Value;
use tracing::{info, warn};

use crate::config::CalculatorConfig;
use crate::error::CalcError;
use crate::facility::{self, FacilityAssessment, FacilityProfile};
use crate::factors::FactorTable;
use crate::ledger::{Ledger, Totals};
use crate::report::{Report, ReportError, ReportOptions};
use crate::result::EmissionResult;
use crate::scope1::{self, FuelInput};
use crate::scope2::{self, ElectricityInput};
use crate::scope3::{self, Scope3Activity};

/// One accounting session. Not shared between threads or requests; wrappers
/// construct one per accounting context.
#[derive(Debug, Clone)]
pub struct GhgCalculator {
    config: CalculatorConfig,
    factors: FactorTable,
    ledger: Ledger,
}

impl Default for GhgCalculator {
    fn default() -> Self {
        Self::with_factors(CalculatorConfig::default(), FactorTable::defaults())
    }
}

impl GhgCalculator {
    /// Load factors from `config.factors_path`, falling back to defaults.
    pub fn new(config: CalculatorConfig) -> Self {
        let factors = FactorTable::load(&config.factors_path);
        Self::with_factors(config, factors)
    }

    pub fn with_factors(config: CalculatorConfig, factors: FactorTable) -> Self {
        info!(
            region = %config.region,
            factor_version = factors.version(),
            "calculator session created"
        );
        Self {
            config,
            factors,
            ledger: Ledger::new(),
        }
    }

    pub fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    pub fn factors(&self) -> &FactorTable {
        &self.factors
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn results(&self) -> &[EmissionResult] {
        self.ledger.results()
    }

    pub fn calculate_scope1(&mut self, input: &FuelInput) -> Result<EmissionResult, CalcError> {
        let outcome = scope1::calculate(&self.factors, input);
        self.record(outcome)
    }

    pub fn calculate_scope2(&mut self, input: &ElectricityInput) -> Result<EmissionResult, CalcError> {
        let outcome = scope2::calculate(&self.factors, input);
        self.record(outcome)
    }

    pub fn calculate_scope3(&mut self, activity: &Scope3Activity) -> Result<EmissionResult, CalcError> {
        let outcome = scope3::calculate(&self.factors, activity);
        self.record(outcome)
    }

    /// Scope 3 from an untyped `{ "category": ..., params }` payload.
    pub fn calculate_scope3_json(&mut self, payload: Value) -> Result<EmissionResult, CalcError> {
        let outcome = Scope3Activity::from_json(payload).and_then(|a| scope3::calculate(&self.factors, &a));
        self.record(outcome)
    }

    /// All-or-nothing: the ledger is only extended when every activity succeeds.
    pub fn assess_facility(&mut self, profile: &FacilityProfile) -> Result<FacilityAssessment, CalcError> {
        let assessment = facility::evaluate(&self.factors, profile).map_err(|e| {
            warn!(facility = %profile.name, error = %e, "facility assessment rejected");
            e
        })?;
        self.ledger.extend(assessment.results.iter().cloned());
        info!(
            facility = %profile.name,
            results = assessment.results.len(),
            total_tco2e = assessment.totals.total,
            "facility assessed"
        );
        Ok(assessment)
    }

    pub fn totals(&self) -> Totals {
        self.ledger.totals()
    }

    pub fn report_options(&self, recommendations: bool) -> ReportOptions {
        ReportOptions {
            region: self.config.region.clone(),
            methodology: self.config.methodology.clone(),
            factor_table_version: Some(self.factors.version().to_string()),
            recommendations,
        }
    }

    pub fn generate_report(&self, recommendations: bool) -> Report {
        Report::generate(&self.ledger, &self.report_options(recommendations))
    }

    /// Generate and persist to `config.report_path`.
    pub fn write_report(&self, recommendations: bool) -> Result<Report, ReportError> {
        let report = self.generate_report(recommendations);
        report.write_json(&self.config.report_path)?;
        Ok(report)
    }

    pub fn clear(&mut self) {
        info!(cleared = self.ledger.len(), "ledger cleared");
        self.ledger.clear();
    }

    fn record(&mut self, outcome: Result<EmissionResult, CalcError>) -> Result<EmissionResult, CalcError> {
        match outcome {
            Ok(result) => {
                self.ledger.append(result.clone());
                Ok(result)
            }
            Err(e) => {
                warn!(error = %e, "calculation rejected");
                Err(e)
            }
        }
    }
}
