use std::collections::HashMap;

use tracing::warn;

use super::error::ProjectionError;
use super::types::{MonthlyRecord, Period, YearlySample};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    pub samples: Vec<YearlySample>,
    pub skipped: Vec<ProjectionError>,
}

/// First month of each year, verbatim. Years keep first-encountered order.
pub fn aggregate_by_year(records: &[MonthlyRecord]) -> Vec<YearlySample> {
    aggregate_by_year_with_report(records).samples
}

pub fn aggregate_by_year_with_report(records: &[MonthlyRecord]) -> Aggregation {
    let mut year_slots: HashMap<i32, usize> = HashMap::new();
    let mut groups: Vec<(i32, Vec<(u32, &MonthlyRecord)>)> = Vec::new();
    let mut skipped = Vec::new();

    for record in records {
        let Some(period) = Period::parse(&record.period) else {
            warn!(period = %record.period, "skipping projection record with malformed period");
            skipped.push(ProjectionError::MalformedRecord {
                period: record.period.clone(),
            });
            continue;
        };
        let slot = *year_slots.entry(period.year).or_insert_with(|| {
            groups.push((period.year, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push((period.month, record));
    }

    let samples = groups
        .into_iter()
        .filter_map(|(year, mut months)| {
            // Stable, so duplicate months keep their input order.
            months.sort_by_key(|(month, _)| *month);
            months.first().map(|(_, first)| YearlySample {
                year,
                opening_balance: first.opening_balance,
                paid_benefit: first.paid_benefit,
            })
        })
        .collect();

    Aggregation { samples, skipped }
}
