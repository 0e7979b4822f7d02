use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ProjectionError;
use super::types::PensionData;

pub const DASHBOARD_ANNUAL_RETURN: Decimal = Decimal::from_parts(45, 0, 0, false, 1);
pub const DASHBOARD_MAX_AGE: u32 = 100;
pub const SIMULATOR_MAX_AGE: u32 = 110;
pub const DEFAULT_MAX_WITHDRAWAL_PCT: Decimal = Decimal::from_parts(25, 0, 0, false, 0);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum PaymentType {
    #[serde(rename = "VALOR_FIXO")]
    FixedAmount,
    #[serde(rename = "PERCENTUAL_SALDO_ANUAL")]
    BalancePercentage,
    #[serde(rename = "PRAZO_DEFINIDO")]
    FixedTerm,
}

impl PaymentType {
    pub fn from_modality_code(code: u32) -> Option<Self> {
        match code {
            39 | 40 | 42 => Some(PaymentType::BalancePercentage),
            43 | 44 | 46 => Some(PaymentType::FixedTerm),
            66 | 67 | 68 => Some(PaymentType::FixedAmount),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PaymentType::FixedAmount => "Valor em Reais",
            PaymentType::BalancePercentage => "Percentual do Saldo",
            PaymentType::FixedTerm => "Prazo Definido",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    pub withdrawn: Decimal,
    pub remaining: Decimal,
}

pub fn apply_withdrawal(
    balance: Decimal,
    percentage: Decimal,
    max_percentage: Decimal,
) -> Result<Withdrawal, ProjectionError> {
    if percentage < Decimal::ZERO || percentage > max_percentage {
        return Err(ProjectionError::InvalidArgument(format!(
            "withdrawal percentage must be between 0 and {max_percentage}, got {percentage}"
        )));
    }
    let withdrawn = balance
        .checked_mul(percentage)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .ok_or(ProjectionError::Overflow)?
        .round_dp(2);
    let remaining = balance
        .checked_sub(withdrawn)
        .ok_or(ProjectionError::Overflow)?;
    Ok(Withdrawal {
        withdrawn,
        remaining,
    })
}

/// Request body of the remote `simular-evolucao` call. Amounts go out as JSON numbers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub saldo_acumulado_inicial: Decimal,
    pub data_inicio_beneficio: NaiveDate,
    pub data_nascimento_cliente: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub percentual_rentabilidade_anual: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub saldo_minimo: Decimal,
    pub idade_maxima: u32,
    pub tipo_pagamento: PaymentType,
    #[serde(with = "rust_decimal::serde::float")]
    pub parametro_pagamento: Decimal,
}

impl SimulationRequest {
    pub fn for_dashboard(
        pension: &PensionData,
        birth_date: NaiveDate,
        start_date: NaiveDate,
    ) -> Result<Self, ProjectionError> {
        let payment_type =
            PaymentType::from_modality_code(pension.modality.code).ok_or_else(|| {
                ProjectionError::InvalidArgument(format!(
                    "unknown payment modality code {}",
                    pension.modality.code
                ))
            })?;
        let parameter = Decimal::from_str(pension.modality.parameter.trim()).map_err(|_| {
            ProjectionError::InvalidArgument(format!(
                "modality parameter {:?} is not a number",
                pension.modality.parameter
            ))
        })?;
        let minimum_balance = match payment_type {
            PaymentType::FixedAmount => pension.benefit.value,
            _ => Decimal::ZERO,
        };
        Ok(Self {
            saldo_acumulado_inicial: pension.balance.value,
            data_inicio_beneficio: start_date,
            data_nascimento_cliente: birth_date,
            percentual_rentabilidade_anual: DASHBOARD_ANNUAL_RETURN,
            saldo_minimo: minimum_balance,
            idade_maxima: DASHBOARD_MAX_AGE,
            tipo_pagamento: payment_type,
            parametro_pagamento: parameter,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatorInput {
    pub income_type: PaymentType,
    #[serde(default)]
    pub fixed_amount_cents: Option<i64>,
    #[serde(default)]
    pub balance_percentage: Option<Decimal>,
    #[serde(default)]
    pub term_years: Option<u32>,
    pub annual_return: Decimal,
    #[serde(default)]
    pub withdrawal_percentage: Option<Decimal>,
}

impl SimulatorInput {
    fn payment_parameter(&self) -> Result<Decimal, ProjectionError> {
        let missing = |what: &str| {
            ProjectionError::InvalidArgument(format!(
                "{what} is required for {}",
                self.income_type.label()
            ))
        };
        match self.income_type {
            PaymentType::FixedAmount => self
                .fixed_amount_cents
                .map(|cents| Decimal::new(cents, 2))
                .ok_or_else(|| missing("fixedAmountCents")),
            PaymentType::BalancePercentage => self
                .balance_percentage
                .ok_or_else(|| missing("balancePercentage")),
            PaymentType::FixedTerm => self
                .term_years
                .map(Decimal::from)
                .ok_or_else(|| missing("termYears")),
        }
    }

    pub fn withdrawal(&self, pension: &PensionData) -> Result<Option<Withdrawal>, ProjectionError> {
        self.withdrawal_percentage
            .map(|pct| apply_withdrawal(pension.balance.value, pct, DEFAULT_MAX_WITHDRAWAL_PCT))
            .transpose()
    }

    pub fn into_request(
        self,
        pension: &PensionData,
        birth_date: NaiveDate,
        start_date: NaiveDate,
    ) -> Result<SimulationRequest, ProjectionError> {
        let parameter = self.payment_parameter()?;
        let balance = match self.withdrawal(pension)? {
            Some(withdrawal) => withdrawal.remaining,
            None => pension.balance.value,
        };
        Ok(SimulationRequest {
            saldo_acumulado_inicial: balance,
            data_inicio_beneficio: start_date,
            data_nascimento_cliente: birth_date,
            percentual_rentabilidade_anual: self.annual_return,
            saldo_minimo: pension.benefit.value,
            idade_maxima: SIMULATOR_MAX_AGE,
            tipo_pagamento: self.income_type,
            parametro_pagamento: parameter,
        })
    }
}
