use super::error::ProjectionError;
use super::types::{SelectedPoint, YearlySample};

/// Out-of-range indices are reported, never clamped.
pub fn resolve_detail(
    render_series: &[YearlySample],
    index: i64,
) -> Result<SelectedPoint, ProjectionError> {
    let out_of_range = ProjectionError::IndexOutOfRange {
        index,
        len: render_series.len(),
    };
    let position = usize::try_from(index).map_err(|_| out_of_range.clone())?;
    let sample = render_series.get(position).ok_or(out_of_range)?;
    Ok(SelectedPoint {
        index: position,
        year: sample.year,
        opening_balance: sample.opening_balance,
        paid_benefit: sample.paid_benefit,
    })
}
