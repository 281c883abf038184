//! NaN-aware statistical helpers shared by the hbvcal metric engine.
//!
//! Missing observations are encoded as `NaN`. Functions that summarise a
//! single series skip non-finite entries; pairwise functions keep only the
//! indices where both inputs are finite.

use std::cmp::Ordering;

/// Arithmetic mean of the finite values in a slice.
///
/// Returns `NaN` if the slice has no finite values.
pub fn nan_mean(data: &[f64]) -> f64 {
    let (sum, n) = data
        .iter()
        .filter(|x| x.is_finite())
        .fold((0.0, 0usize), |(s, n), &x| (s + x, n + 1));
    if n == 0 {
        return f64::NAN;
    }
    sum / n as f64
}

/// Sum of the finite values in a slice. Returns 0.0 if there are none.
pub fn nan_sum(data: &[f64]) -> f64 {
    data.iter().filter(|x| x.is_finite()).sum()
}

/// Population standard deviation (N denominator) of the finite values.
///
/// Returns `NaN` if the slice has no finite values.
pub fn nan_population_sd(data: &[f64]) -> f64 {
    let mean = nan_mean(data);
    if mean.is_nan() {
        return f64::NAN;
    }
    let (ss, n) = data
        .iter()
        .filter(|x| x.is_finite())
        .fold((0.0, 0usize), |(s, n), &x| (s + (x - mean) * (x - mean), n + 1));
    (ss / n as f64).sqrt()
}

/// Sum of squared deviations of the finite values around `centre`.
pub fn sum_sq_dev(data: &[f64], centre: f64) -> f64 {
    data.iter()
        .filter(|x| x.is_finite())
        .map(|&x| (x - centre) * (x - centre))
        .sum()
}

/// Collects `(x[i], y[i])` pairs where both values are finite.
fn finite_pairs(x: &[f64], y: &[f64]) -> Vec<(f64, f64)> {
    x.iter()
        .zip(y.iter())
        .filter(|(xi, yi)| xi.is_finite() && yi.is_finite())
        .map(|(xi, yi)| (*xi, *yi))
        .collect()
}

/// Centred cross-products `(Sxy, Sxx, Syy)` over a set of pairs.
fn cross_products(pairs: &[(f64, f64)]) -> (f64, f64, f64) {
    let n = pairs.len() as f64;
    let mx: f64 = pairs.iter().map(|(xi, _)| xi).sum::<f64>() / n;
    let my: f64 = pairs.iter().map(|(_, yi)| yi).sum::<f64>() / n;

    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;
    let mut sum_yy = 0.0;
    for &(xi, yi) in pairs {
        let dx = xi - mx;
        let dy = yi - my;
        sum_xy += dx * dy;
        sum_xx += dx * dx;
        sum_yy += dy * dy;
    }
    (sum_xy, sum_xx, sum_yy)
}

/// Pearson correlation coefficient.
///
/// Filters to indices where both `x[i]` and `y[i]` are finite.
/// Returns `None` if fewer than 2 finite pairs or if either side has zero
/// variance (constant input).
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    let pairs = finite_pairs(x, y);
    if pairs.len() < 2 {
        return None;
    }

    let (sum_xy, sum_xx, sum_yy) = cross_products(&pairs);
    let denom = (sum_xx * sum_yy).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }

    // Rounding can push |r| marginally above 1.
    Some((sum_xy / denom).clamp(-1.0, 1.0))
}

/// Slope of the ordinary least-squares regression of `y` on `x`.
///
/// Filters to finite pairs. Returns `None` if fewer than 2 pairs or if `x`
/// is constant.
pub fn ols_slope(x: &[f64], y: &[f64]) -> Option<f64> {
    let pairs = finite_pairs(x, y);
    if pairs.len() < 2 {
        return None;
    }

    let (sum_xy, sum_xx, _) = cross_products(&pairs);
    if sum_xx == 0.0 {
        return None;
    }
    Some(sum_xy / sum_xx)
}

/// 1-based ranks with ties resolved to the average rank.
///
/// Non-finite entries are left out of the ranking and come back as `NaN`
/// in their original positions.
pub fn average_ranks(data: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..data.len()).filter(|&i| data[i].is_finite()).collect();
    order.sort_by(|&a, &b| data[a].partial_cmp(&data[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![f64::NAN; data.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && data[order[end]] == data[order[start]] {
            end += 1;
        }
        // Positions start..end (0-based) share ranks start+1..=end.
        let rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}

/// Running sum of `data` where entries with `valid[i] == false` contribute
/// zero and are reported as `NaN`.
///
/// # Panics
///
/// Panics if `data` and `valid` differ in length.
pub fn masked_cumsum(data: &[f64], valid: &[bool]) -> Vec<f64> {
    assert_eq!(
        data.len(),
        valid.len(),
        "masked_cumsum: data and mask lengths differ"
    );
    let mut acc = 0.0;
    data.iter()
        .zip(valid)
        .map(|(&x, &ok)| {
            if ok {
                acc += x;
                acc
            } else {
                f64::NAN
            }
        })
        .collect()
}
