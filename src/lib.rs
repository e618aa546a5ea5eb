#![forbid(unsafe_code)]

//! Greenhouse-gas accounting for Scope 1, 2 and 3 emissions.
//!
//! Data flows one way:
//!
//! ```text
//! FactorTable ──> scope1 / scope2 / scope3 ──> Ledger ──> Report
//! ```
//!
//! [`GhgCalculator`] bundles a factor table and a ledger into a caller-owned
//! session; the scope modules expose the same formulas as pure functions.

pub mod config;
pub mod error;
pub mod facility;
pub mod factors;
pub mod guards;
pub mod ledger;
pub mod report;
pub mod result;
pub mod scope1;
pub mod scope2;
pub mod scope3;
pub mod session;
pub mod types;

pub use config::{CalculatorConfig, ConfigError};
pub use error::{CalcError, IdentifierKind};
pub use facility::{FacilityAssessment, FacilityProfile};
pub use factors::{FactorError, FactorTable, DEFAULT_TABLE_VERSION, GWP_VINTAGE};
pub use ledger::{Breakdown, Ledger, Totals};
pub use report::{Priority, Recommendation, Report, ReportError, ReportOptions};
pub use result::{EmissionResult, DEFAULT_UNCERTAINTY};
pub use scope1::FuelInput;
pub use scope2::ElectricityInput;
pub use scope3::{Scope3Activity, Scope3Category};
pub use session::GhgCalculator;
pub use types::{Scope, Scope2Method};
