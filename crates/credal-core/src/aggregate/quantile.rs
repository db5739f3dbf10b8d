//! Weighted summary statistics

/// Quantile with linear interpolation between order statistics.
///
/// Non-finite values are ignored. Returns `None` when nothing is left.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Weighted empirical quantile.
///
/// Sorts by value, builds the normalized cumulative-weight curve and linearly
/// interpolates `q` on it, clamping to the extreme values outside the curve.
/// Pairs with a non-finite value or weight are ignored. Falls back to
/// [`quantile`] when the total weight is zero, negative or non-finite.
pub fn weighted_quantile(values: &[f64], weights: &[f64], q: f64) -> Option<f64> {
    let mut pairs: Vec<(f64, f64)> = values
        .iter()
        .zip(weights)
        .filter(|(v, w)| v.is_finite() && w.is_finite())
        .map(|(v, w)| (*v, *w))
        .collect();
    if pairs.is_empty() {
        return None;
    }

    let total: f64 = pairs.iter().map(|(_, w)| w).sum();
    if !total.is_finite() || total <= 0.0 {
        let values: Vec<f64> = pairs.iter().map(|(v, _)| *v).collect();
        return quantile(&values, q);
    }

    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut running = 0.0;
    let cdf: Vec<f64> = pairs
        .iter()
        .map(|(_, w)| {
            running += w;
            running / total
        })
        .collect();

    if q <= cdf[0] {
        return Some(pairs[0].0);
    }
    for j in 1..pairs.len() {
        if q <= cdf[j] {
            let (x0, x1) = (cdf[j - 1], cdf[j]);
            let (y0, y1) = (pairs[j - 1].0, pairs[j].0);
            return Some(y0 + (y1 - y0) * (q - x0) / (x1 - x0));
        }
    }
    pairs.last().map(|(v, _)| *v)
}

/// Weighted arithmetic mean. `None` when the weights sum to zero.
pub fn weighted_mean(values: &[f64], weights: &[f64]) -> Option<f64> {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return None;
    }
    let sum: f64 = values.iter().zip(weights).map(|(v, w)| v * w).sum();
    Some(sum / total)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}
