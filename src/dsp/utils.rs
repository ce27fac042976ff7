/// Lowest frequency shown on the analyzer and response curve.
pub const DISPLAY_MIN_HZ: f32 = 20.0;
/// Highest frequency shown on the analyzer and response curve.
pub const DISPLAY_MAX_HZ: f32 = 20000.0;

pub fn db_to_gain(db: f32) -> f32 {
    (10.0f32).powf(db / 20.0)
}

/// Converts a linear gain to decibels, returning `floor_db` for silent or
/// negative input and never going below it.
pub fn gain_to_db(gain: f32, floor_db: f32) -> f32 {
    if gain > 0.0 {
        (20.0 * gain.log10()).max(floor_db)
    } else {
        floor_db
    }
}

/// Linear remap of `value` from `[src_lo, src_hi]` onto `[dst_lo, dst_hi]`.
/// No clamping.
#[inline]
pub fn map_range(value: f32, src_lo: f32, src_hi: f32, dst_lo: f32, dst_hi: f32) -> f32 {
    dst_lo + (dst_hi - dst_lo) * (value - src_lo) / (src_hi - src_lo)
}

/// Position of `value` on a log10 axis spanning `[lo, hi]`, 0 at `lo` and 1 at `hi`.
#[inline]
pub fn map_from_log10(value: f32, lo: f32, hi: f32) -> f32 {
    (value / lo).log10() / (hi / lo).log10()
}

/// Inverse of [`map_from_log10`].
#[inline]
pub fn map_to_log10(proportion: f64, lo: f64, hi: f64) -> f64 {
    lo * (hi / lo).powf(proportion)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_to_db_floors_silence() {
        assert_eq!(gain_to_db(0.0, -48.0), -48.0);
        assert_eq!(gain_to_db(-1.0, -48.0), -48.0);
        assert_eq!(gain_to_db(1e-9, -48.0), -48.0);
        assert!((gain_to_db(1.0, -48.0)).abs() < 1e-6);
        assert!((gain_to_db(0.5, -48.0) + 6.0206).abs() < 1e-3);
    }

    #[test]
    fn test_log_mapping_round_trips_endpoints() {
        assert!(map_from_log10(20.0, 20.0, 20000.0).abs() < 1e-6);
        assert!((map_from_log10(20000.0, 20.0, 20000.0) - 1.0).abs() < 1e-6);
        assert!((map_from_log10(632.455_5, 20.0, 20000.0) - 0.5).abs() < 1e-4);
        assert!((map_to_log10(0.5, 20.0, 20000.0) - 632.455_5).abs() < 1e-3);
    }

    #[test]
    fn test_map_range_inverts_axis() {
        // dB floor maps to the bottom edge, 0 dB to the top
        assert_eq!(map_range(-48.0, -48.0, 0.0, 110.0, 0.0), 110.0);
        assert_eq!(map_range(0.0, -48.0, 0.0, 110.0, 0.0), 0.0);
        assert_eq!(map_range(-24.0, -48.0, 0.0, 110.0, 0.0), 55.0);
    }
}
