use serde::{Deserialize, Serialize};

use crate::result::EmissionResult;
use crate::types::Scope;

/// Share of the total per scope, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub scope1_pct: f64,
    pub scope2_pct: f64,
    pub scope3_pct: f64,
}

impl Breakdown {
    pub fn share(&self, scope: Scope) -> f64 {
        match scope {
            Scope::One => self.scope1_pct,
            Scope::Two => self.scope2_pct,
            Scope::Three => self.scope3_pct,
        }
    }
}

/// Scope subtotals in tCO2e plus the aggregate uncertainty (a fraction).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub scope1: f64,
    pub scope2: f64,
    pub scope3: f64,
    pub total: f64,
    pub uncertainty: f64,
    pub breakdown: Breakdown,
}

impl Totals {
    pub fn subtotal(&self, scope: Scope) -> f64 {
        match scope {
            Scope::One => self.scope1,
            Scope::Two => self.scope2,
            Scope::Three => self.scope3,
        }
    }

    /// Aggregate a set of results.
    ///
    /// The uncertainty is the plain mean of per-result uncertainties (absent
    /// ones count as 5%), not a propagated error.
    pub fn from_results<'a, I>(results: I) -> Totals
    where
        I: IntoIterator<Item = &'a EmissionResult>,
    {
        let mut totals = Totals::default();
        let mut uncertainty_sum = 0.0;
        let mut count = 0usize;

        for r in results {
            match r.scope() {
                Scope::One => totals.scope1 += r.value(),
                Scope::Two => totals.scope2 += r.value(),
                Scope::Three => totals.scope3 += r.value(),
            }
            uncertainty_sum += r.effective_uncertainty();
            count += 1;
        }

        totals.total = totals.scope1 + totals.scope2 + totals.scope3;
        if count > 0 {
            totals.uncertainty = uncertainty_sum / count as f64;
        }
        if totals.total != 0.0 {
            totals.breakdown = Breakdown {
                scope1_pct: totals.scope1 / totals.total * 100.0,
                scope2_pct: totals.scope2 / totals.total * 100.0,
                scope3_pct: totals.scope3 / totals.total * 100.0,
            };
        }
        totals
    }
}

/// Ordered, append-only record of one accounting session.
/// Duplicates are kept: the same fuel reported twice is counted twice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    results: Vec<EmissionResult>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, result: EmissionResult) {
        self.results.push(result);
    }

    pub(crate) fn extend(&mut self, results: impl IntoIterator<Item = EmissionResult>) {
        self.results.extend(results);
    }

    pub fn clear(&mut self) {
        self.results.clear();
    }

    pub fn results(&self) -> &[EmissionResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn totals(&self) -> Totals {
        Totals::from_results(&self.results)
    }
}
