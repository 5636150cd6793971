//! Scalar reference kernel.

use crate::kernel::ScoreKernel;

/// Exact squared Euclidean distance with 64-bit accumulation.
pub struct SquaredL2Scalar;

impl ScoreKernel for SquaredL2Scalar {
    #[inline]
    fn sq_dist(a: &[i32], b: &[i32]) -> u64 {
        debug_assert_eq!(a.len(), b.len());
        a.iter().zip(b).fold(0u64, |acc, (&x, &y)| {
            let d = (i64::from(x) - i64::from(y)).unsigned_abs();
            acc.saturating_add(d * d)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::SquaredL2Scalar;
    use crate::kernel::ScoreKernel;

    #[test]
    fn squared_distance_is_exact() {
        assert_eq!(SquaredL2Scalar::sq_dist(&[1, 2, 3], &[4, 6, 3]), 25);
        assert_eq!(SquaredL2Scalar::sq_dist(&[], &[]), 0);
    }

    #[test]
    fn extreme_values_saturate_instead_of_wrapping() {
        let a = [i32::MIN; 4];
        let b = [i32::MAX; 4];
        assert_eq!(SquaredL2Scalar::sq_dist(&a, &b), u64::MAX);
        let one = (u64::from(u32::MAX)) * (u64::from(u32::MAX));
        assert_eq!(SquaredL2Scalar::sq_dist(&a[..1], &b[..1]), one);
    }
}
