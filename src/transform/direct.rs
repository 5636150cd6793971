//! Direct convolution reference for individual basis planes.
//!
//! Costs `O(S^2)` per output sample; used to cross-check the incremental
//! transform and for one-off coefficients.

use crate::image::ImageView;
use crate::util::math::{exact_log2, gray_code, reverse_bits};
use crate::util::{GckMatchError, GckMatchResult};

/// Returns the Walsh tap `(-1)^popcount(gray(index) & rev(tap))` in sequency order.
pub fn walsh_coefficient(index: usize, tap: usize, kernel_size: usize) -> i32 {
    let bits = kernel_size.trailing_zeros();
    if (gray_code(index) & reverse_bits(tap, bits)).count_ones() % 2 == 0 {
        1
    } else {
        -1
    }
}

/// Computes the plane of basis `(bx, by)` by direct correlation.
///
/// Output is `(W + S - 1) x (H + S - 1)` with samples outside the image
/// treated as zero, laid out like `GckPlanes::plane`.
pub fn direct_plane(
    image: ImageView<'_, u8>,
    kernel_size: usize,
    bx: usize,
    by: usize,
) -> GckMatchResult<Vec<i32>> {
    exact_log2(kernel_size).ok_or(GckMatchError::InvalidKernelSize {
        kernel: kernel_size,
    })?;
    if bx >= kernel_size || by >= kernel_size {
        return Err(GckMatchError::InvalidInput("basis outside kernel grid"));
    }
    let (w, h) = (image.width(), image.height());
    let taps_x: Vec<i32> = (0..kernel_size)
        .map(|t| walsh_coefficient(bx, t, kernel_size))
        .collect();
    let taps_y: Vec<i32> = (0..kernel_size)
        .map(|t| walsh_coefficient(by, t, kernel_size))
        .collect();

    let out_w = w + kernel_size - 1;
    let out_h = h + kernel_size - 1;
    let mut out = vec![0i32; out_w * out_h];
    for i in 0..out_h {
        for j in 0..out_w {
            let mut acc = 0i32;
            for (ty, &cy) in taps_y.iter().enumerate() {
                let Some(y) = (i + ty).checked_sub(kernel_size - 1).filter(|&y| y < h) else {
                    continue;
                };
                for (tx, &cx) in taps_x.iter().enumerate() {
                    let Some(x) = (j + tx).checked_sub(kernel_size - 1).filter(|&x| x < w)
                    else {
                        continue;
                    };
                    if let Some(&v) = image.get(x, y) {
                        acc += cy * cx * i32::from(v);
                    }
                }
            }
            out[i * out_w + j] = acc;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::walsh_coefficient;

    #[test]
    fn walsh_rows_are_in_sequency_order() {
        for k in 0..8 {
            let signs: Vec<i32> = (0..8).map(|t| walsh_coefficient(k, t, 8)).collect();
            let changes = signs.windows(2).filter(|w| w[0] != w[1]).count();
            assert_eq!(changes, k, "row {k}: {signs:?}");
        }
    }

    #[test]
    fn walsh_rows_are_orthogonal() {
        for a in 0..8 {
            for b in 0..8 {
                let dot: i32 = (0..8)
                    .map(|t| walsh_coefficient(a, t, 8) * walsh_coefficient(b, t, 8))
                    .sum();
                assert_eq!(dot, if a == b { 8 } else { 0 });
            }
        }
    }
}
