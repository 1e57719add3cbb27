//! Time bases of the acquisition core.
//!
//! Rates are expressed as `xsps`: samples per second multiplied by a scale
//! factor `scale_sps` (1000 everywhere in the acquisition engine, so `xsps` is
//! in milli-samples per second). Durations are signed picoseconds.
//! Multiplying a rate by a picosecond duration overflows 64 bits quickly, so
//! every conversion goes through the byte buffer arithmetic of `osc-bignum`.

pub mod timer;

use osc_bignum::{add_in_place, signed_divide, unsigned_multiply};
use osc_traits::{ScopeError, ScopeResult};

pub use timer::{Prescalar, TimerScaler, TimerSetting};

/// Picoseconds in one second.
pub const PS_PER_SEC: u64 = 1_000_000_000_000;

/// Default rate scale: rates are carried in milli-samples per second.
pub const DEFAULT_SCALE_SPS: u32 = 1000;

const HALF_PS_PER_SEC: u64 = PS_PER_SEC / 2;

/// Reads a non-negative quotient back as an `i64`, failing if it does not fit.
fn narrow_quotient(wide: &[u8]) -> ScopeResult<i64> {
    let (low, high) = wide.split_at(8);
    let mut word = [0u8; 8];
    word.copy_from_slice(low);
    let value = i64::from_le_bytes(word);
    if value < 0 || high.iter().any(|&b| b != 0) {
        return Err(ScopeError::Overflow {
            needed: wide.len(),
            available: 8,
        });
    }
    Ok(value)
}

/// Number of samples covering `psec` picoseconds at `xsps / scale_sps` samples per second.
///
/// `samples = xsps * psec / (scale_sps * 10^12)`, rounded half up on the
/// magnitude so that the result is symmetric around zero.
///
/// The division by `scale_sps` is not rounded: the following division by
/// 10^12 is much larger and absorbs its truncation, only that last step adds
/// the rounding half.
///
/// Fails with [`ScopeError::Overflow`] when the sample count does not fit an `i64`.
pub fn samples_from_picoseconds(psec: i64, xsps: u64, scale_sps: u32) -> ScopeResult<i64> {
    let negative = psec < 0;
    let magnitude = psec.unsigned_abs();

    let mut product = [0u8; 16];
    unsigned_multiply(&magnitude.to_le_bytes(), &xsps.to_le_bytes(), &mut product)?;

    let mut scaled = [0u8; 16];
    signed_divide(&product, scale_sps as i64, &mut scaled)?;

    add_in_place(&mut scaled, &HALF_PS_PER_SEC.to_le_bytes());

    let mut samples = [0u8; 16];
    signed_divide(&scaled, PS_PER_SEC as i64, &mut samples)?;
    let samples = narrow_quotient(&samples)?;

    Ok(if negative { -samples } else { samples })
}

/// Duration in picoseconds of `samp` samples at `xsps / scale_sps` samples per second.
///
/// `psec = 10^12 * scale_sps * samp / xsps`, rounded half up on the magnitude.
/// `xsps` must not exceed 2^56, and the duration must fit an `i64`, otherwise
/// [`ScopeError::Overflow`] is returned.
pub fn picoseconds_from_samples(samp: i64, xsps: u64, scale_sps: u32) -> ScopeResult<i64> {
    let negative = samp < 0;
    let magnitude = samp.unsigned_abs();
    let divisor =
        i64::try_from(xsps).map_err(|_| ScopeError::DivisorTooLarge { divisor: xsps })?;

    // 10^12 * scale_sps does not fit 64 bits for large scales
    let mut ps_scale = [0u8; 12];
    unsigned_multiply(&PS_PER_SEC.to_le_bytes(), &scale_sps.to_le_bytes(), &mut ps_scale)?;

    let mut product = [0u8; 20];
    unsigned_multiply(&magnitude.to_le_bytes(), &ps_scale, &mut product)?;

    add_in_place(&mut product, &(xsps / 2).to_le_bytes());

    let mut psec = [0u8; 20];
    signed_divide(&product, divisor, &mut psec)?;
    let psec = narrow_quotient(&psec)?;

    Ok(if negative { -psec } else { psec })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_MSPS: u64 = 1_000_000 * DEFAULT_SCALE_SPS as u64;
    const HUNDRED_MSPS: u64 = 100 * ONE_MSPS;

    #[test]
    fn test_one_microsecond_at_one_msps() {
        assert_eq!(
            samples_from_picoseconds(1_000_000, ONE_MSPS, DEFAULT_SCALE_SPS).unwrap(),
            1
        );
        assert_eq!(
            picoseconds_from_samples(1, ONE_MSPS, DEFAULT_SCALE_SPS).unwrap(),
            1_000_000
        );
    }

    #[test]
    fn test_rounding_is_sign_symmetric() {
        // 1.5 samples rounds up on the magnitude
        assert_eq!(
            samples_from_picoseconds(1_500_000, ONE_MSPS, DEFAULT_SCALE_SPS).unwrap(),
            2
        );
        assert_eq!(
            samples_from_picoseconds(-1_500_000, ONE_MSPS, DEFAULT_SCALE_SPS).unwrap(),
            -2
        );
        assert_eq!(
            samples_from_picoseconds(1_499_999, ONE_MSPS, DEFAULT_SCALE_SPS).unwrap(),
            1
        );
        assert_eq!(
            samples_from_picoseconds(-1_499_999, ONE_MSPS, DEFAULT_SCALE_SPS).unwrap(),
            -1
        );
    }

    #[test]
    fn test_beyond_64_bits() {
        // 10s at 100MS/s: xsps * psec is 10^24
        let psec = 10 * PS_PER_SEC as i64;
        assert_eq!(
            samples_from_picoseconds(psec, HUNDRED_MSPS, DEFAULT_SCALE_SPS).unwrap(),
            1_000_000_000
        );
        assert_eq!(
            picoseconds_from_samples(1_000_000_000, HUNDRED_MSPS, DEFAULT_SCALE_SPS).unwrap(),
            psec
        );
    }

    #[test]
    fn test_large_scale_factor() {
        // scale of 10^9: 10^12 * scale does not fit in a u64
        let scale = 1_000_000_000u32;
        let xsps = 2 * scale as u64; // 2 samples per second
        assert_eq!(
            picoseconds_from_samples(3, xsps, scale).unwrap(),
            1_500_000_000_000
        );
        assert_eq!(
            samples_from_picoseconds(1_500_000_000_000, xsps, scale).unwrap(),
            3
        );
    }

    #[test]
    fn test_zero_rate() {
        assert_eq!(
            picoseconds_from_samples(10, 0, DEFAULT_SCALE_SPS),
            Err(ScopeError::DivideByZero)
        );
        assert_eq!(
            samples_from_picoseconds(10, ONE_MSPS, 0),
            Err(ScopeError::DivideByZero)
        );
        assert_eq!(samples_from_picoseconds(10, 0, DEFAULT_SCALE_SPS), Ok(0));
    }

    #[test]
    fn test_results_beyond_i64_overflow() {
        // i64::MAX ps at 1kS/s is 9223372037 samples, one more second than fits back
        let samples = samples_from_picoseconds(i64::MAX, 1_000_000, DEFAULT_SCALE_SPS).unwrap();
        assert_eq!(samples, 9_223_372_037);
        assert_eq!(
            picoseconds_from_samples(samples, 1_000_000, DEFAULT_SCALE_SPS),
            Err(ScopeError::Overflow {
                needed: 20,
                available: 8
            })
        );
        assert_eq!(
            picoseconds_from_samples(-samples, 1_000_000, DEFAULT_SCALE_SPS),
            Err(ScopeError::Overflow {
                needed: 20,
                available: 8
            })
        );
        assert_eq!(
            picoseconds_from_samples(samples - 1, 1_000_000, DEFAULT_SCALE_SPS).unwrap(),
            9_223_372_036_000_000_000
        );

        // the fastest representable rate over i64::MAX ps
        assert_eq!(
            samples_from_picoseconds(i64::MAX, u64::MAX, DEFAULT_SCALE_SPS),
            Err(ScopeError::Overflow {
                needed: 16,
                available: 8
            })
        );
        assert_eq!(
            samples_from_picoseconds(i64::MIN, u64::MAX, DEFAULT_SCALE_SPS),
            Err(ScopeError::Overflow {
                needed: 16,
                available: 8
            })
        );
    }

    #[test]
    fn test_approximate_inverse() {
        let rates: [(u64, u32); 4] = [
            (ONE_MSPS, DEFAULT_SCALE_SPS),
            (HUNDRED_MSPS, DEFAULT_SCALE_SPS),
            (6_250, DEFAULT_SCALE_SPS),
            (3_000_000_000, 1_000_000),
        ];
        let delays: [i64; 7] = [
            0,
            1,
            -1,
            123_456_789,
            -987_654_321_000,
            5 * PS_PER_SEC as i64,
            -3 * PS_PER_SEC as i64 + 17,
        ];
        for (xsps, scale) in rates {
            let period_ps = (PS_PER_SEC as u128 * scale as u128 / xsps as u128) as i64 + 1;
            for p in delays {
                let s = samples_from_picoseconds(p, xsps, scale).unwrap();
                let back = picoseconds_from_samples(s, xsps, scale).unwrap();
                assert!(
                    (back - p).abs() < period_ps,
                    "{p} ps -> {s} samples -> {back} ps at {xsps}/{scale}"
                );
            }
        }
    }
}
