use crate::error::CalcError;

/// InputGuard: first line of defense against malformed numeric inputs.
/// Every calculator runs its quantities through here before touching a factor.
pub struct InputGuard;

impl InputGuard {
    /// Consumption quantities (fuel, kWh, m3, kg, km) must be finite and >= 0.
    pub fn validate_quantity(field: &'static str, value: f64) -> Result<(), CalcError> {
        if !value.is_finite() {
            return Err(CalcError::InvalidInput {
                field,
                value,
                reason: "must be a finite number",
            });
        }
        if value < 0.0 {
            return Err(CalcError::InvalidInput {
                field,
                value,
                reason: "must not be negative",
            });
        }
        Ok(())
    }

    /// Caller-supplied emission factors: finite, non-negative.
    pub fn validate_factor(field: &'static str, value: f64) -> Result<(), CalcError> {
        Self::validate_quantity(field, value)
    }

    /// Renewable override, expressed in percent.
    pub fn validate_percentage(field: &'static str, value: f64) -> Result<(), CalcError> {
        if !value.is_finite() || !(0.0..=100.0).contains(&value) {
            return Err(CalcError::InvalidInput {
                field,
                value,
                reason: "must be between 0 and 100",
            });
        }
        Ok(())
    }

    /// A travelling party needs at least one traveller.
    pub fn validate_travellers(field: &'static str, value: u32) -> Result<(), CalcError> {
        if value == 0 {
            return Err(CalcError::InvalidInput {
                field,
                value: 0.0,
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}
