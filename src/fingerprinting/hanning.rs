//! The analysis window applied before every 2048-point FFT.
//!
//! `hann(2050)[1..2049]` drops the two (zero-valued) endpoints of a
//! standard 2050-point Hann window, leaving a length-2048 taper with
//! strictly positive values at both ends.

use std::f64::consts::PI;

/// Build the length-2048 Hann window multipliers used by
/// [`crate::fingerprinting::algorithm::SignatureGenerator`].
pub fn hanning_window_2048() -> Vec<f32> {
    (0..2048)
        .map(|i| {
            let n = (i + 1) as f64;
            (0.5 - 0.5 * (2.0 * PI * n / 2049.0).cos()) as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_has_expected_length() {
        assert_eq!(hanning_window_2048().len(), 2048);
    }

    #[test]
    fn window_endpoints_are_not_zero() {
        let window = hanning_window_2048();
        assert!(window[0] > 0.0);
        assert!(window[2047] > 0.0);
    }

    #[test]
    fn window_peaks_near_the_middle() {
        let window = hanning_window_2048();
        let mid = window[1023];
        assert!(mid > window[0]);
        assert!(mid > window[2047]);
        assert!(mid > 0.99);
    }
}
