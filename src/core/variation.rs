use rust_decimal::Decimal;
use serde::Serialize;

use super::error::ProjectionError;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// `(0, 0)` is exactly zero; any other change from a zero base is an error.
pub fn percent_change(initial: Decimal, final_value: Decimal) -> Result<Decimal, ProjectionError> {
    if initial.is_zero() {
        return if final_value.is_zero() {
            Ok(Decimal::ZERO)
        } else {
            Err(ProjectionError::DivisionByZero)
        };
    }
    final_value
        .checked_sub(initial)
        .and_then(|diff| diff.checked_div(initial))
        .and_then(|ratio| ratio.checked_mul(HUNDRED))
        .map(|pct| pct.normalize())
        .ok_or(ProjectionError::Overflow)
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Decreasing,
    Stable,
    Increasing,
}

impl Trend {
    pub fn classify(change: Decimal) -> Self {
        if change.is_sign_negative() && !change.is_zero() {
            Trend::Decreasing
        } else if change.is_zero() {
            Trend::Stable
        } else {
            Trend::Increasing
        }
    }
}
