use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

const THOUSAND: Decimal = Decimal::from_parts(1_000, 0, 0, false, 0);
const MILLION: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

fn group_thousands(integer_digits: &str) -> String {
    let len = integer_digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in integer_digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

pub fn format_brl(value: Decimal) -> String {
    let rounded = round_half_up(value, 2);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let digits = format!("{:.2}", rounded.abs());
    let (integer, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));
    format!("{sign}R$ {},{fraction}", group_thousands(integer))
}

pub fn format_brl_opt(value: Option<Decimal>) -> String {
    value.map_or_else(|| "R$ --".to_string(), format_brl)
}

pub fn format_cents(cents: i64) -> String {
    format_brl(Decimal::new(cents, 2))
}

pub fn only_digits(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

pub fn parse_cents(text: &str) -> Option<i64> {
    let digits = only_digits(text);
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

pub fn format_percentage(value: Decimal) -> String {
    format!("{:.2}%", round_half_up(value, 2)).replace('.', ",")
}

pub fn parse_percentage(text: &str) -> Option<Decimal> {
    let cleaned = text.replace('%', "").replacen(',', ".", 1);
    Decimal::from_str(cleaned.trim()).ok()
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PercentRange {
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

impl Default for PercentRange {
    fn default() -> Self {
        Self {
            min: Decimal::ZERO,
            max: Decimal::ONE_HUNDRED,
            step: Decimal::new(1, 2),
        }
    }
}

impl PercentRange {
    pub fn clamp(&self, value: Decimal) -> Decimal {
        value.max(self.min).min(self.max)
    }

    pub fn round_to_step(&self, value: Decimal) -> Decimal {
        if self.step <= Decimal::ZERO {
            return value;
        }
        value
            .checked_div(self.step)
            .map(|steps| round_half_up(steps, 0))
            .and_then(|steps| steps.checked_mul(self.step))
            .map_or(value, |v| v.normalize())
    }

    pub fn settle(&self, value: Decimal) -> Decimal {
        self.clamp(self.round_to_step(value))
    }
}

pub fn parse_integer(text: &str, min: u32, max: u32) -> Option<u32> {
    let digits = only_digits(text);
    let value: u32 = digits.parse().ok()?;
    (min..=max).contains(&value).then_some(value)
}

pub fn axis_label(value: Decimal) -> String {
    if value >= MILLION {
        format!("R$ {:.1}M", round_half_up(value / MILLION, 1))
    } else {
        format!("R$ {:.1}K", round_half_up(value / THOUSAND, 1))
    }
}

pub fn decimal_comma(text: &str) -> String {
    text.replace('.', ",")
}
