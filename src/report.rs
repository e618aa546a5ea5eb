//! Report snapshots and rule-based reduction recommendations.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::factors::GWP_VINTAGE;
use crate::ledger::{Breakdown, Ledger, Totals};
use crate::result::EmissionResult;
use crate::types::Scope;

pub const REPORT_METHODOLOGY: &str = "GHG Protocol Corporate Standard";
pub const DEFAULT_REGION: &str = "UAE & KSA";

/// Scope share (percent) at or above which a recommendation is high priority.
pub const HIGH_PRIORITY_SHARE_PCT: f64 = 40.0;
pub const MEDIUM_PRIORITY_SHARE_PCT: f64 = 20.0;
/// Mean uncertainty (fraction) at or above which data quality is flagged.
pub const DATA_QUALITY_UNCERTAINTY: f64 = 0.10;

const EMISSIONS_DECIMALS: i32 = 3;
const PERCENT_DECIMALS: i32 = 1;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("report serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    pub region: String,
    pub methodology: String,
    pub factor_table_version: Option<String>,
    pub recommendations: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            methodology: REPORT_METHODOLOGY.to_string(),
            factor_table_version: None,
            recommendations: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub methodology: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor_table_version: Option<String>,
    pub gwp_vintage: String,
    pub result_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub total_tco2e: f64,
    pub scope1_tco2e: f64,
    pub scope2_tco2e: f64,
    pub scope3_tco2e: f64,
    pub uncertainty_pct: f64,
    pub breakdown: Breakdown,
}

impl ExecutiveSummary {
    fn from_totals(t: &Totals) -> Self {
        Self {
            total_tco2e: round_to(t.total, EMISSIONS_DECIMALS),
            scope1_tco2e: round_to(t.scope1, EMISSIONS_DECIMALS),
            scope2_tco2e: round_to(t.scope2, EMISSIONS_DECIMALS),
            scope3_tco2e: round_to(t.scope3, EMISSIONS_DECIMALS),
            uncertainty_pct: round_to(t.uncertainty * 100.0, PERCENT_DECIMALS),
            breakdown: Breakdown {
                scope1_pct: round_to(t.breakdown.scope1_pct, PERCENT_DECIMALS),
                scope2_pct: round_to(t.breakdown.scope2_pct, PERCENT_DECIMALS),
                scope3_pct: round_to(t.breakdown.scope3_pct, PERCENT_DECIMALS),
            },
        }
    }
}

/// Plain copy of one ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub scope: Scope,
    pub category: String,
    pub activity: String,
    pub methodology: String,
    pub emissions_tco2e: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl From<&EmissionResult> for ResultRecord {
    fn from(r: &EmissionResult) -> Self {
        Self {
            scope: r.scope(),
            category: r.category().to_string(),
            activity: r.activity().to_string(),
            methodology: r.methodology().to_string(),
            emissions_tco2e: round_to(r.value(), EMISSIONS_DECIMALS),
            uncertainty_pct: r.uncertainty().map(|u| round_to(u * 100.0, PERCENT_DECIMALS)),
            metadata: r.metadata().clone(),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    fn for_share(share_pct: f64) -> Priority {
        if share_pct >= HIGH_PRIORITY_SHARE_PCT {
            Priority::High
        } else if share_pct >= MEDIUM_PRIORITY_SHARE_PCT {
            Priority::Medium
        } else {
            Priority::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_pct: Option<f64>,
    pub title: String,
    pub actions: Vec<String>,
}

struct ScopeRule {
    scope: Scope,
    title: &'static str,
    actions: &'static [&'static str],
}

const SCOPE_RULES: [ScopeRule; 3] = [
    ScopeRule {
        scope: Scope::One,
        title: "Reduce direct fuel combustion",
        actions: &[
            "Switch diesel and fuel oil equipment to natural gas or electric alternatives",
            "Schedule boiler and generator efficiency maintenance",
            "Electrify the light vehicle fleet",
        ],
    },
    ScopeRule {
        scope: Scope::Two,
        title: "Decarbonize purchased electricity",
        actions: &[
            "Procure renewable electricity through I-RECs or a green tariff",
            "Install rooftop solar PV",
            "Upgrade to high-efficiency HVAC and LED lighting",
        ],
    },
    ScopeRule {
        scope: Scope::Three,
        title: "Engage the value chain",
        actions: &[
            "Favour metro and public bus for commuting and local travel",
            "Replace short-haul flights with virtual meetings",
            "Divert landfill waste to recycling and composting",
        ],
    },
];

const DATA_QUALITY_ACTIONS: &[&str] = &[
    "Replace estimated activity data with metered or invoiced quantities",
    "Request supplier-specific emission factors",
];

/// Static rule table: one recommendation per positive scope, prioritised by
/// that scope's share of the total, plus a data-quality note when the mean
/// uncertainty is high. Ordered by priority, then scope.
pub fn recommendations(totals: &Totals) -> Vec<Recommendation> {
    let mut out: Vec<Recommendation> = SCOPE_RULES
        .iter()
        .filter(|rule| totals.subtotal(rule.scope) > 0.0)
        .map(|rule| {
            let share = totals.breakdown.share(rule.scope);
            Recommendation {
                scope: Some(rule.scope),
                priority: Priority::for_share(share),
                share_pct: Some(round_to(share, PERCENT_DECIMALS)),
                title: rule.title.to_string(),
                actions: rule.actions.iter().map(|a| a.to_string()).collect(),
            }
        })
        .collect();

    if totals.uncertainty >= DATA_QUALITY_UNCERTAINTY {
        out.push(Recommendation {
            scope: None,
            priority: Priority::Medium,
            share_pct: None,
            title: "Improve activity data quality".to_string(),
            actions: DATA_QUALITY_ACTIONS.iter().map(|a| a.to_string()).collect(),
        });
    }

    out.sort_by_key(|r| r.priority);
    out
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub executive_summary: ExecutiveSummary,
    pub results: Vec<ResultRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<Recommendation>>,
}

impl Report {
    pub fn generate(ledger: &Ledger, options: &ReportOptions) -> Report {
        Report::generate_at(ledger, options, Utc::now())
    }

    /// Same as [`Report::generate`] with a fixed timestamp.
    pub fn generate_at(ledger: &Ledger, options: &ReportOptions, generated_at: DateTime<Utc>) -> Report {
        let totals = ledger.totals();
        Report {
            metadata: ReportMetadata {
                generated_at,
                methodology: options.methodology.clone(),
                region: options.region.clone(),
                factor_table_version: options.factor_table_version.clone(),
                gwp_vintage: GWP_VINTAGE.to_string(),
                result_count: ledger.len(),
            },
            executive_summary: ExecutiveSummary::from_totals(&totals),
            results: ledger.results().iter().map(ResultRecord::from).collect(),
            recommendations: options.recommendations.then(|| recommendations(&totals)),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json_pretty()?)?;
        info!(
            path = %path.display(),
            results = self.results.len(),
            total_tco2e = self.executive_summary.total_tco2e,
            "emissions report written"
        );
        Ok(())
    }

    pub fn read_json(path: impl AsRef<Path>) -> Result<Report, ReportError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}
