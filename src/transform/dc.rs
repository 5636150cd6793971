//! Box-sum pass producing the DC plane.
//!
//! The DC basis is the all-ones filter, so its plane is a separable running
//! sum. A 1D window of length `S` slides over `n` samples and yields
//! `n + S - 1` outputs in three regimes: the window grows, slides, then
//! shrinks past the trailing edge.

/// Horizontal running sum of one row; `out.len()` must be `row.len() + S - 1`.
#[inline]
pub(crate) fn box_sum_row(row: &[u8], kernel_size: usize, out: &mut [i32]) {
    let n = row.len();
    debug_assert!(kernel_size <= n);
    debug_assert_eq!(out.len(), n + kernel_size - 1);

    out[0] = i32::from(row[0]);
    for i in 1..kernel_size {
        out[i] = out[i - 1] + i32::from(row[i]);
    }
    for i in kernel_size..n {
        out[i] = out[i - 1] + i32::from(row[i]) - i32::from(row[i - kernel_size]);
    }
    for i in n..out.len() {
        out[i] = out[i - 1] - i32::from(row[i - kernel_size]);
    }
}

/// Vertical running sum over whole rows of a horizontally summed buffer.
///
/// `rows` holds `h` rows of `width` values; `out` receives `h + S - 1` rows.
pub(crate) fn box_sum_columns(rows: &[i32], width: usize, kernel_size: usize, out: &mut [i32]) {
    let h = rows.len() / width;
    debug_assert!(kernel_size <= h);
    debug_assert_eq!(out.len(), (h + kernel_size - 1) * width);

    let out_rows = h + kernel_size - 1;
    out[..width].copy_from_slice(&rows[..width]);
    for r in 1..out_rows {
        let (done, rest) = out.split_at_mut(r * width);
        let above = &done[(r - 1) * width..];
        let dst = &mut rest[..width];
        dst.copy_from_slice(above);
        if r < h {
            let add = &rows[r * width..(r + 1) * width];
            for (d, &a) in dst.iter_mut().zip(add) {
                *d += a;
            }
        }
        if r >= kernel_size {
            let sub = &rows[(r - kernel_size) * width..(r - kernel_size + 1) * width];
            for (d, &s) in dst.iter_mut().zip(sub) {
                *d -= s;
            }
        }
    }
}
