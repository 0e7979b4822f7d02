use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::aggregate::aggregate_by_year;
use super::detail::resolve_detail;
use super::downsample::downsample;
use super::error::ProjectionError;
use super::format::axis_label;
use super::types::{MonthlyRecord, SelectedPoint, YearlySample};

pub const DEFAULT_HORIZONTAL_PADDING: f64 = 32.0;
pub const DEFAULT_MIN_PIXELS_PER_POINT: f64 = 55.0;
pub const Y_TICK_COUNT: usize = 5;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum ChartMode {
    #[default]
    #[serde(rename = "beneficio")]
    Benefit,
    #[serde(rename = "saldo")]
    Balance,
}

impl ChartMode {
    pub fn title(self) -> &'static str {
        match self {
            ChartMode::Benefit => "Projeção do Benefício",
            ChartMode::Balance => "Projeção do Saldo",
        }
    }

    pub fn value_of(self, sample: &YearlySample) -> Decimal {
        match self {
            ChartMode::Benefit => sample.paid_benefit,
            ChartMode::Balance => sample.opening_balance,
        }
    }
}

/// Largest number of points that fit without crowding; never below two.
pub fn max_points_for_width(available_width: f64, min_pixels_per_point: f64) -> usize {
    if !available_width.is_finite()
        || !min_pixels_per_point.is_finite()
        || available_width <= 0.0
        || min_pixels_per_point <= 0.0
    {
        return 2;
    }
    ((available_width / min_pixels_per_point).floor() as usize).max(2)
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ChartLayout {
    pub screen_width: f64,
    pub horizontal_padding: f64,
    pub min_pixels_per_point: f64,
}

impl ChartLayout {
    pub fn new(screen_width: f64) -> Self {
        Self {
            screen_width,
            horizontal_padding: DEFAULT_HORIZONTAL_PADDING,
            min_pixels_per_point: DEFAULT_MIN_PIXELS_PER_POINT,
        }
    }

    pub fn available_width(&self) -> f64 {
        self.screen_width - self.horizontal_padding
    }

    pub fn max_points(&self) -> usize {
        max_points_for_width(self.available_width(), self.min_pixels_per_point)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartView {
    pub mode: ChartMode,
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<Decimal>,
    pub y_ticks: Vec<String>,
    pub points: Vec<YearlySample>,
}

impl ChartView {
    pub fn detail(&self, index: i64) -> Result<SelectedPoint, ProjectionError> {
        resolve_detail(&self.points, index)
    }
}

fn linspace(start: Decimal, end: Decimal, steps: usize) -> Option<Vec<Decimal>> {
    if steps < 2 {
        return Some(vec![start, end]);
    }
    let step = end
        .checked_sub(start)?
        .checked_div(Decimal::from(steps - 1))?;
    (0..steps)
        .map(|i| step.checked_mul(Decimal::from(i))?.checked_add(start))
        .collect()
}

fn y_ticks(values: &[Decimal]) -> Result<Vec<String>, ProjectionError> {
    let (Some(min), Some(max)) = (values.iter().min(), values.iter().max()) else {
        return Ok(Vec::new());
    };
    let ticks = linspace(*min, *max, Y_TICK_COUNT).ok_or(ProjectionError::Overflow)?;
    Ok(ticks.into_iter().map(axis_label).collect())
}

pub fn build_chart(
    records: &[MonthlyRecord],
    mode: ChartMode,
    max_points: usize,
) -> Result<ChartView, ProjectionError> {
    let points = downsample(&aggregate_by_year(records), max_points)?;
    let labels = points.iter().map(|p| p.year.to_string()).collect();
    let values: Vec<Decimal> = points.iter().map(|p| mode.value_of(p)).collect();
    Ok(ChartView {
        mode,
        title: mode.title().to_string(),
        labels,
        y_ticks: y_ticks(&values)?,
        values,
        points,
    })
}
