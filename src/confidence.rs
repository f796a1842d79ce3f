//! Confidence model: a scalar trust score for each dead-reckoned estimate.
//!
//! Confidence is 1.0 on every fix tick and decays linearly to 0.0 over the
//! configured horizon while fixes are absent. It is display metadata only;
//! the core never discards a low-confidence estimate.

/// Linear decay over the horizon, floored at zero.
pub fn dead_reckoning_confidence(elapsed_since_fix: f64, horizon: f64) -> f64 {
    if horizon <= 0.0 {
        return 0.0;
    }
    (1.0 - elapsed_since_fix / horizon).clamp(0.0, 1.0)
}

/// One-tick penalty for an estimate integrated under a stale attitude.
pub fn apply_attitude_penalty(confidence: f64, penalty: f64) -> f64 {
    (confidence * penalty).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn fresh_fix_is_full_confidence() {
        assert_relative_eq!(dead_reckoning_confidence(0.0, 180.0), 1.0);
    }

    #[test]
    fn decays_linearly_to_the_horizon() {
        assert_relative_eq!(dead_reckoning_confidence(45.0, 180.0), 0.75);
        assert_relative_eq!(dead_reckoning_confidence(90.0, 180.0), 0.5);
        assert_relative_eq!(dead_reckoning_confidence(180.0, 180.0), 0.0);
    }

    #[test]
    fn floors_at_zero_past_the_horizon() {
        assert_eq!(dead_reckoning_confidence(1e6, 180.0), 0.0);
    }

    #[test]
    fn monotonically_non_increasing() {
        let mut last = f64::INFINITY;
        for i in 0..2000 {
            let c = dead_reckoning_confidence(i as f64 * 0.1, 180.0);
            assert!(c <= last);
            last = c;
        }
    }

    #[test]
    fn attitude_penalty_scales_and_clamps() {
        assert_relative_eq!(apply_attitude_penalty(0.5, 0.9), 0.45);
        assert_eq!(apply_attitude_penalty(2.0, 0.9), 1.0);
        assert_eq!(apply_attitude_penalty(0.1, 0.0), 0.0);
    }
}
