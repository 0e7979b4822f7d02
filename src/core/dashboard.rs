use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use super::error::ProjectionError;
use super::format::{decimal_comma, format_brl_opt, format_percentage};
use super::simulator::PaymentType;
use super::types::{PensionData, ProjectionPayload};
use super::variation::{Trend, percent_change};

pub fn age_on(birth: NaiveDate, today: NaiveDate) -> u32 {
    today.years_since(birth).unwrap_or(0)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenefitChange {
    pub percent: Decimal,
    pub label: String,
    pub trend: Trend,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    pub current_age: u32,
    pub depletion_date: String,
    pub termination_reason: String,
    pub termination_age: u32,
    /// Negative when the projection ends before the current age.
    pub years_remaining: i64,
    pub remaining_balance: Decimal,
    pub current_benefit: Decimal,
    pub final_benefit: Option<Decimal>,
    pub benefit_change: Option<BenefitChange>,
    pub payment_form: Option<String>,
}

pub fn payment_form(pension: &PensionData) -> Option<String> {
    let parameter = &pension.modality.parameter;
    let form = match PaymentType::from_modality_code(pension.modality.code)? {
        PaymentType::BalancePercentage => {
            format!("Percentual do saldo: {} %", decimal_comma(parameter))
        }
        PaymentType::FixedTerm => format!("Prazo certo: {} anos", decimal_comma(parameter)),
        PaymentType::FixedAmount => format!(
            "Valor em reais: {}",
            format_brl_opt(Decimal::from_str(parameter.trim()).ok())
        ),
    };
    Some(form)
}

fn benefit_change(current: Decimal, final_benefit: Decimal) -> Option<BenefitChange> {
    match percent_change(current, final_benefit) {
        Ok(percent) => Some(BenefitChange {
            label: format_percentage(percent),
            trend: Trend::classify(percent),
            percent,
        }),
        Err(ProjectionError::DivisionByZero) => {
            debug!(%final_benefit, "current benefit is zero; no variation to report");
            None
        }
        Err(err) => {
            warn!(error = %err, "benefit variation could not be computed");
            None
        }
    }
}

pub fn diagnose(
    pension: &PensionData,
    projection: &ProjectionPayload,
    birth: NaiveDate,
    today: NaiveDate,
) -> Diagnosis {
    let current_age = age_on(birth, today);
    let termination = &projection.termination;
    let final_benefit = projection.records.last().map(|r| r.paid_benefit);
    Diagnosis {
        current_age,
        depletion_date: termination.termination_date.clone(),
        termination_reason: termination.reason_description.clone(),
        termination_age: termination.termination_age,
        years_remaining: i64::from(termination.termination_age) - i64::from(current_age),
        remaining_balance: termination.remaining_balance,
        current_benefit: pension.benefit.value,
        final_benefit,
        benefit_change: final_benefit.and_then(|last| benefit_change(pension.benefit.value, last)),
        payment_form: payment_form(pension),
    }
}
