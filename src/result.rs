use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Scope;

pub const DEFAULT_METHODOLOGY: &str = "GHG Protocol";

/// Uncertainty assumed for any result that does not carry its own.
pub const DEFAULT_UNCERTAINTY: f64 = 0.05;

/// Output of every scope calculator.
///
/// Fields are private: a result is assembled once by its calculator through the
/// `with_*` builders and is read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionResult {
    value: f64,
    scope: Scope,
    category: String,
    activity: String,
    methodology: String,
    uncertainty: Option<f64>,
    #[serde(default)]
    metadata: BTreeMap<String, Value>,
}

impl EmissionResult {
    pub fn new(
        value: f64,
        scope: Scope,
        category: impl Into<String>,
        activity: impl Into<String>,
    ) -> Self {
        Self {
            value,
            scope,
            category: category.into(),
            activity: activity.into(),
            methodology: DEFAULT_METHODOLOGY.to_string(),
            uncertainty: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_methodology(mut self, methodology: impl Into<String>) -> Self {
        self.methodology = methodology.into();
        self
    }

    pub fn with_uncertainty(mut self, uncertainty: f64) -> Self {
        self.uncertainty = Some(uncertainty);
        self
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Emissions in tCO2e. Negative only for avoided-emission credits.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn activity(&self) -> &str {
        &self.activity
    }

    pub fn methodology(&self) -> &str {
        &self.methodology
    }

    pub fn uncertainty(&self) -> Option<f64> {
        self.uncertainty
    }

    /// Uncertainty with [`DEFAULT_UNCERTAINTY`] substituted when unknown.
    pub fn effective_uncertainty(&self) -> f64 {
        self.uncertainty.unwrap_or(DEFAULT_UNCERTAINTY)
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    pub fn is_credit(&self) -> bool {
        self.value < 0.0
    }
}
