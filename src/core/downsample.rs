use super::error::ProjectionError;

pub fn select_indices(len: usize, max_points: usize) -> Result<Vec<usize>, ProjectionError> {
    if max_points < 2 {
        return Err(ProjectionError::InvalidArgument(format!(
            "max_points must be >= 2, got {max_points}"
        )));
    }
    if len <= max_points {
        return Ok((0..len).collect());
    }

    let last = len - 1;
    let stride = last as f64 / (max_points - 1) as f64;
    let mut selected: Vec<usize> = Vec::with_capacity(max_points);
    for i in 0..max_points {
        let index = ((i as f64 * stride).round() as usize).min(last);
        if selected.last() == Some(&index) {
            continue;
        }
        selected.push(index);
    }
    if selected.last() != Some(&last) {
        selected.push(last);
    }
    Ok(selected)
}

pub fn downsample<T: Clone>(samples: &[T], max_points: usize) -> Result<Vec<T>, ProjectionError> {
    let indices = select_indices(samples.len(), max_points)?;
    Ok(indices.into_iter().map(|i| samples[i].clone()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregate::aggregate_by_year;
    use crate::core::aggregate::tests::monthly_series;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    #[test]
    fn rejects_fewer_than_two_points() {
        for max_points in [0, 1] {
            let err = downsample(&[1, 2, 3], max_points).expect_err("must reject");
            assert!(matches!(err, ProjectionError::InvalidArgument(_)));
        }
        assert!(downsample::<u8>(&[], 1).is_err());
    }

    #[test]
    fn short_series_passes_through_unchanged() {
        let data = vec![10, 20, 30];
        assert_eq!(downsample(&data, 3).expect("valid"), data);
        assert_eq!(downsample(&data, 50).expect("valid"), data);
        assert!(downsample::<i32>(&[], 2).expect("valid").is_empty());
    }

    #[test]
    fn hundred_years_thinned_to_ten_points() {
        let data: Vec<usize> = (0..100).collect();
        let out = downsample(&data, 10).expect("valid");
        assert_eq!(out.len(), 10);
        assert_eq!(out[0], 0);
        assert_eq!(out[9], 99);
        assert_eq!(out, vec![0, 11, 22, 33, 44, 55, 66, 77, 88, 99]);
        assert!(out.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn barely_oversized_series_keeps_endpoints() {
        let out = select_indices(11, 10).expect("valid");
        assert_eq!(out.first(), Some(&0));
        assert_eq!(out.last(), Some(&10));
        assert!(out.len() <= 10);
        assert!(out.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn two_points_are_first_and_last() {
        assert_eq!(select_indices(57, 2).expect("valid"), vec![0, 56]);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(256))]

        #[test]
        fn prop_selection_is_bounded_increasing_and_keeps_endpoints(
            len in 1usize..2_000,
            max_points in 2usize..300,
        ) {
            let indices = select_indices(len, max_points).expect("valid max_points");
            prop_assert!(indices.len() <= max_points);
            prop_assert_eq!(indices[0], 0);
            prop_assert_eq!(*indices.last().expect("non-empty"), len - 1);
            for pair in indices.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
            if len <= max_points {
                prop_assert_eq!(indices.len(), len);
            } else {
                prop_assert_eq!(indices.len(), max_points);
            }
        }

        #[test]
        fn prop_fitting_aggregation_is_identity(
            start_year in 1990i32..2060,
            months in 0usize..1_000,
            headroom in 0usize..10,
        ) {
            let samples = aggregate_by_year(&monthly_series(start_year, months));
            let max_points = samples.len().max(2) + headroom;
            prop_assert_eq!(downsample(&samples, max_points).expect("valid"), samples);
        }

        #[test]
        fn prop_endpoints_survive_downsampling(
            start_year in 1990i32..2060,
            months in 1usize..1_000,
            max_points in 2usize..40,
        ) {
            let samples = aggregate_by_year(&monthly_series(start_year, months));
            let out = downsample(&samples, max_points).expect("valid");
            prop_assert_eq!(out.first(), samples.first());
            prop_assert_eq!(out.last(), samples.last());
        }

        #[test]
        fn prop_downsampling_is_idempotent_per_input(len in 0usize..1_500, max_points in 2usize..64) {
            let data: Vec<usize> = (0..len).collect();
            prop_assert_eq!(downsample(&data, max_points).expect("valid"), downsample(&data, max_points).expect("valid"));
        }
    }
}
