//! Client-to-server latency smoothing for lag compensation (§4.5.1).

const SMOOTHING_OLD_WEIGHT: f64 = 0.8;
const SMOOTHING_NEW_WEIGHT: f64 = 0.2;
const MAX_CLIENT_CLOCK_SKEW_MS: i64 = 2000;
const MIN_LAG_COMP_MS: f64 = 0.0;
const MAX_LAG_COMP_MS: f64 = 120.0;

/// Folds one sample of `client_sent_at_ms` into `previous_ema`, returning the
/// updated estimate. Samples whose clock distance from `now` exceeds 2s are
/// distrusted and the previous estimate is returned unchanged.
pub fn smooth(previous_ema: f64, now_ms: i64, client_sent_at_ms: Option<i64>) -> f64 {
    let Some(client_sent_at_ms) = client_sent_at_ms else {
        return previous_ema.clamp(MIN_LAG_COMP_MS, MAX_LAG_COMP_MS);
    };
    let age_ms = now_ms - client_sent_at_ms;
    if age_ms.abs() > MAX_CLIENT_CLOCK_SKEW_MS {
        return previous_ema.clamp(MIN_LAG_COMP_MS, MAX_LAG_COMP_MS);
    }
    let updated = previous_ema * SMOOTHING_OLD_WEIGHT + (age_ms as f64) * SMOOTHING_NEW_WEIGHT;
    updated.clamp(MIN_LAG_COMP_MS, MAX_LAG_COMP_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_sample_preserves_previous_value() {
        assert_eq!(smooth(42.0, 1_000, None), 42.0);
    }

    #[test]
    fn out_of_skew_sample_preserves_previous_value() {
        assert_eq!(smooth(42.0, 10_000, Some(1)), 42.0);
    }

    #[test]
    fn in_range_sample_moves_estimate_toward_age() {
        let updated = smooth(0.0, 1_100, Some(1_000));
        assert_eq!(updated, 0.0 * 0.8 + 100.0 * 0.2);
    }

    #[test]
    fn result_is_clamped_to_the_valid_range() {
        assert_eq!(smooth(119.0, 2_000, Some(0)), 120.0);
        assert_eq!(smooth(0.0, 0, Some(0)), 0.0);
    }
}
