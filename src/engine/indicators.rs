//! Simple moving averages over closing-price series.
//!
//! Only the value at the last candle matters to the classifier, so the
//! engine computes each trailing mean directly instead of materialising a
//! full rolling series.

use crate::types::IndicatorSnapshot;

/// Mean of the last `min(window, len)` prices.
///
/// Short series are averaged over what is available (min-periods = 1).
/// Returns `None` for an empty series, a zero window, or a non-finite
/// price inside the window.
pub fn trailing_mean(closes: &[f64], window: usize) -> Option<f64> {
    if closes.is_empty() || window == 0 {
        return None;
    }
    let start = closes.len().saturating_sub(window);
    let tail = &closes[start..];
    if tail.iter().any(|p| !p.is_finite()) {
        return None;
    }
    Some(tail.iter().sum::<f64>() / tail.len() as f64)
}

/// Short, medium and long trailing means at the last candle.
pub fn compute(closes: &[f64], windows: [usize; 3]) -> Option<IndicatorSnapshot> {
    let [short, medium, long] = windows;
    Some(IndicatorSnapshot {
        short: trailing_mean(closes, short)?,
        medium: trailing_mean(closes, medium)?,
        long: trailing_mean(closes, long)?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOWS: [usize; 3] = [20, 50, 100];

    fn ramp(n: usize) -> Vec<f64> {
        (1..=n).map(|i| i as f64).collect()
    }

    #[test]
    fn test_empty_series_unavailable() {
        assert!(compute(&[], WINDOWS).is_none());
        assert!(trailing_mean(&[], 5).is_none());
    }

    #[test]
    fn test_zero_window_unavailable() {
        assert!(trailing_mean(&[1.0, 2.0], 0).is_none());
    }

    #[test]
    fn test_full_windows() {
        let closes = ramp(150);
        let snap = compute(&closes, WINDOWS).unwrap();
        // Mean of 131..=150, 101..=150, 51..=150.
        assert!((snap.short - 140.5).abs() < 1e-9);
        assert!((snap.medium - 125.5).abs() < 1e-9);
        assert!((snap.long - 100.5).abs() < 1e-9);
    }

    #[test]
    fn test_min_periods_short_series() {
        // 30 points: short uses 20, medium and long both fall back to all 30.
        let closes = ramp(30);
        let snap = compute(&closes, WINDOWS).unwrap();
        assert!((snap.short - 20.5).abs() < 1e-9);
        assert!((snap.medium - 15.5).abs() < 1e-9);
        assert_eq!(snap.medium, snap.long);
    }

    #[test]
    fn test_single_point() {
        let snap = compute(&[42.0], WINDOWS).unwrap();
        assert_eq!(snap.short, 42.0);
        assert_eq!(snap.medium, 42.0);
        assert_eq!(snap.long, 42.0);
    }

    #[test]
    fn test_nan_inside_window_unavailable() {
        let mut closes = ramp(60);
        closes[55] = f64::NAN;
        assert!(compute(&closes, WINDOWS).is_none());
    }

    #[test]
    fn test_nan_outside_window_ignored() {
        let mut closes = ramp(60);
        closes[0] = f64::NAN;
        assert!(trailing_mean(&closes, 20).is_some());
    }

    #[test]
    fn test_means_bounded_by_window_prices() {
        // Deterministic pseudo-random walk.
        let mut price = 100.0;
        let mut seed: u64 = 0x2545F4914F6CDD1D;
        for len in [1usize, 7, 19, 20, 21, 49, 99, 100, 150] {
            let mut closes = Vec::with_capacity(len);
            for _ in 0..len {
                seed ^= seed << 13;
                seed ^= seed >> 7;
                seed ^= seed << 17;
                price *= 1.0 + ((seed % 2001) as f64 - 1000.0) / 20_000.0;
                closes.push(price);
            }
            for w in WINDOWS {
                let tail = &closes[len.saturating_sub(w)..];
                let lo = tail.iter().cloned().fold(f64::INFINITY, f64::min);
                let hi = tail.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                let m = trailing_mean(&closes, w).unwrap();
                assert!(m >= lo - 1e-9 && m <= hi + 1e-9, "len={len} w={w} m={m}");
            }
        }
    }
}
