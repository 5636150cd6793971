//! SIMD distance kernel using the `wide` crate.
//!
//! Differences are squared and accumulated four lanes at a time in `f64x4`.
//! Integer sums below 2^53 are exact in `f64`; larger totals are recomputed
//! by the scalar kernel so results never depend on the feature set.

use crate::kernel::scalar::SquaredL2Scalar;
use crate::kernel::ScoreKernel;
use wide::f64x4;

const LANES: usize = 4;
const EXACT_LIMIT: f64 = 9_007_199_254_740_992.0;

/// Load 4 i32 values and convert to f64x4.
#[inline]
fn load_i32x4_as_f64x4(slice: &[i32]) -> f64x4 {
    f64x4::from([
        f64::from(slice[0]),
        f64::from(slice[1]),
        f64::from(slice[2]),
        f64::from(slice[3]),
    ])
}

/// Horizontal sum of f64x4.
#[inline]
fn hsum(v: f64x4) -> f64 {
    let arr = v.to_array();
    arr[0] + arr[1] + arr[2] + arr[3]
}

/// SIMD squared Euclidean distance.
pub struct SquaredL2Simd;

impl ScoreKernel for SquaredL2Simd {
    #[inline]
    fn sq_dist(a: &[i32], b: &[i32]) -> u64 {
        debug_assert_eq!(a.len(), b.len());
        let simd_end = a.len() / LANES * LANES;
        let mut acc = f64x4::ZERO;
        for i in (0..simd_end).step_by(LANES) {
            let d = load_i32x4_as_f64x4(&a[i..]) - load_i32x4_as_f64x4(&b[i..]);
            acc += d * d;
        }
        let mut total = hsum(acc);
        for i in simd_end..a.len() {
            let d = f64::from(a[i]) - f64::from(b[i]);
            total += d * d;
        }
        if total < EXACT_LIMIT {
            total as u64
        } else {
            SquaredL2Scalar::sq_dist(a, b)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SquaredL2Simd;
    use crate::kernel::scalar::SquaredL2Scalar;
    use crate::kernel::ScoreKernel;

    #[test]
    fn matches_scalar_on_typical_descriptors() {
        let a: Vec<i32> = (0..23).map(|i| i * 1013 - 9000).collect();
        let b: Vec<i32> = (0..23).map(|i| 16320 - i * 777).collect();
        assert_eq!(
            SquaredL2Simd::sq_dist(&a, &b),
            SquaredL2Scalar::sq_dist(&a, &b)
        );
    }

    #[test]
    fn large_totals_fall_back_to_exact() {
        let a = [i32::MAX, i32::MIN, 7, -3, 1];
        let b = [i32::MIN, i32::MAX, 0, 0, 0];
        assert_eq!(
            SquaredL2Simd::sq_dist(&a, &b),
            SquaredL2Scalar::sq_dist(&a, &b)
        );
    }
}
