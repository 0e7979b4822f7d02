mod aggregate;
mod chart;
mod dashboard;
mod detail;
mod downsample;
mod error;
pub mod format;
mod simulator;
mod types;
mod variation;

pub use aggregate::{Aggregation, aggregate_by_year, aggregate_by_year_with_report};
pub use chart::{ChartLayout, ChartMode, ChartView, build_chart, max_points_for_width};
pub use dashboard::{BenefitChange, Diagnosis, age_on, diagnose, payment_form};
pub use detail::resolve_detail;
pub use downsample::{downsample, select_indices};
pub use error::ProjectionError;
pub use simulator::{
    DEFAULT_MAX_WITHDRAWAL_PCT, PaymentType, SimulationRequest, SimulatorInput, Withdrawal,
    apply_withdrawal,
};
pub use types::{
    Balance, Benefit, Modality, MonthlyRecord, PensionData, Period, ProductInfo,
    ProjectionPayload, SelectedPoint, TaxRegime, Termination, UserDetails, YearlySample,
};
pub use variation::{Trend, percent_change};
