//! Quantile computation using O(n) selection.
//!
//! Uses `slice.select_nth_unstable_by()` (introselect) for O(n) average time.

/// Compute a single quantile from a mutable slice.
///
/// Uses the R-7 definition (linear interpolation between order statistics).
/// The slice is partially reordered as a side effect.
///
/// # Panics
///
/// Panics if `data` is empty or if `p` is outside [0, 1].
pub fn compute_quantile(data: &mut [f64], p: f64) -> f64 {
    assert!(!data.is_empty(), "Cannot compute quantile of empty slice");
    assert!(
        (0.0..=1.0).contains(&p),
        "Quantile probability must be in [0, 1]"
    );

    let n = data.len();
    if n == 1 {
        return data[0];
    }

    let h = (n - 1) as f64 * p;
    let h_floor = h.floor() as usize;
    let h_frac = h - h.floor();

    if h_floor >= n - 1 {
        let (_, &mut max, _) = data.select_nth_unstable_by(n - 1, |a, b| a.total_cmp(b));
        return max;
    }

    let (_, &mut lower, upper) = data.select_nth_unstable_by(h_floor, |a, b| a.total_cmp(b));

    if h_frac == 0.0 {
        return lower;
    }

    // The next order statistic is the minimum of the upper partition.
    let upper_min = upper
        .iter()
        .copied()
        .min_by(|a, b| a.total_cmp(b))
        .unwrap_or(lower);

    lower + h_frac * (upper_min - lower)
}

/// Median of `data` (R-7, so the mean of the two middle values for even n).
///
/// # Panics
///
/// Panics if `data` is empty.
pub fn median(data: &[f64]) -> f64 {
    let mut scratch = data.to_vec();
    compute_quantile(&mut scratch, 0.5)
}

/// Median absolute deviation around `center`.
///
/// # Panics
///
/// Panics if `data` is empty.
pub fn median_abs_deviation(data: &[f64], center: f64) -> f64 {
    let mut deviations: Vec<f64> = data.iter().map(|x| (x - center).abs()).collect();
    compute_quantile(&mut deviations, 0.5)
}
