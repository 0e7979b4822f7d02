use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn parse(label: &str) -> Option<Self> {
        let (month, year) = label.trim().split_once('/')?;
        if month.is_empty() || year.is_empty() {
            return None;
        }
        if !month.bytes().all(|b| b.is_ascii_digit()) || !year.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        let month = month.parse::<u32>().ok()?;
        let year = year.parse::<i32>().ok()?;
        if !(1..=12).contains(&month) {
            return None;
        }
        Some(Self { year, month })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:04}", self.month, self.year)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecord {
    #[serde(rename = "mesAno")]
    pub period: String,
    #[serde(rename = "idadeCliente", default)]
    pub age: u32,
    #[serde(rename = "saldoInicial")]
    pub opening_balance: Decimal,
    #[serde(rename = "beneficioBruto", default)]
    pub gross_benefit: Decimal,
    #[serde(rename = "beneficioPago")]
    pub paid_benefit: Decimal,
    #[serde(rename = "juros", default)]
    pub interest: Decimal,
    #[serde(rename = "saldoFinal", default)]
    pub closing_balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Termination {
    #[serde(rename = "code")]
    pub reason_code: String,
    #[serde(rename = "description")]
    pub reason_description: String,
    #[serde(rename = "dataTermino")]
    pub termination_date: String,
    #[serde(rename = "saldoRemanescente")]
    pub remaining_balance: Decimal,
    #[serde(rename = "idadeTermino")]
    pub termination_age: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPayload {
    #[serde(rename = "projecao")]
    pub records: Vec<MonthlyRecord>,
    #[serde(rename = "motivoTermino")]
    pub termination: Termination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlySample {
    pub year: i32,
    pub opening_balance: Decimal,
    pub paid_benefit: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedPoint {
    pub index: usize,
    pub year: i32,
    pub opening_balance: Decimal,
    pub paid_benefit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modality {
    #[serde(rename = "parametro", deserialize_with = "string_or_number")]
    pub parameter: String,
    #[serde(rename = "codigo")]
    pub code: u32,
    #[serde(rename = "descricao", default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRegime {
    #[serde(rename = "codigo")]
    pub code: u32,
    #[serde(rename = "descricao", default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    #[serde(rename = "valor")]
    pub value: Decimal,
    #[serde(rename = "referencia", default)]
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benefit {
    #[serde(rename = "dataInicio", default)]
    pub start_date: String,
    #[serde(rename = "valor")]
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PensionData {
    #[serde(rename = "matricula", deserialize_with = "string_or_number")]
    pub registration: String,
    #[serde(rename = "modalidade")]
    pub modality: Modality,
    #[serde(rename = "regimeTributario")]
    pub tax_regime: TaxRegime,
    #[serde(rename = "saldo")]
    pub balance: Balance,
    #[serde(rename = "beneficio")]
    pub benefit: Benefit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDetails {
    pub id: u64,
    pub cpf: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "dataNascimento")]
    pub birth_date: String,
}

impl UserDetails {
    pub fn parsed_birth_date(&self) -> Option<NaiveDate> {
        let head = self.birth_date.trim().get(..10)?;
        NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
    }

    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    #[serde(rename = "codigoEmpresa", deserialize_with = "string_or_number")]
    pub company_code: String,
    #[serde(rename = "matricula", deserialize_with = "string_or_number")]
    pub registration: String,
    #[serde(rename = "codigoPlano", deserialize_with = "string_or_number")]
    pub plan_code: String,
    #[serde(rename = "nomePlano", default)]
    pub plan_name: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}
