//! Float quantization. All world floats are rounded to 1/10000 after each
//! mutation so that replays and delta round-trips are bit-identical across
//! runs given the same inputs (§4.3.1, §9 "Determinism under float").

use crate::constants::QUANTIZE_STEPS;

#[inline]
pub fn quantize(value: f64) -> f64 {
    (value * QUANTIZE_STEPS).round() / QUANTIZE_STEPS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_four_decimal_places() {
        assert_eq!(quantize(1.0 / 3.0), 0.3333);
        assert_eq!(quantize(-2.00005), -2.0001);
    }
}
