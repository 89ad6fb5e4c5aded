//! Simple moving average, population standard deviation, Bollinger Bands.

/// SMA over the last `period` values (all values when fewer exist).
pub fn sma(values: &[f64], period: usize) -> f64 {
    if values.is_empty() || period == 0 {
        return 0.0;
    }
    let start = values.len().saturating_sub(period);
    let window = &values[start..];
    window.iter().sum::<f64>() / window.len() as f64
}

/// Population standard deviation over the last `period` values.
pub fn stddev(values: &[f64], period: usize) -> f64 {
    if values.is_empty() || period == 0 {
        return 0.0;
    }
    let start = values.len().saturating_sub(period);
    let window = &values[start..];
    let mean = window.iter().sum::<f64>() / window.len() as f64;
    let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / window.len() as f64;
    variance.sqrt()
}

/// Bollinger Bands: (upper, middle, lower) = SMA ± k·σ over the last `period`
/// values, population σ.
pub fn bollinger(values: &[f64], period: usize, k: f64) -> (f64, f64, f64) {
    let middle = sma(values, period);
    let sigma = stddev(values, period);
    (middle + k * sigma, middle, middle - k * sigma)
}
