//! Dimension ordering by spread.

/// Orders dimensions by descending value range (`max - min`).
///
/// Ties keep ascending index order. An empty point set yields the identity
/// order. `points` holds `points.len() / dims` vectors of length `dims`.
pub fn rank_dimensions(points: &[i32], dims: usize) -> Vec<usize> {
    if dims == 0 {
        return Vec::new();
    }
    let mut lo = vec![i32::MAX; dims];
    let mut hi = vec![i32::MIN; dims];
    for point in points.chunks_exact(dims) {
        for (d, &v) in point.iter().enumerate() {
            lo[d] = lo[d].min(v);
            hi[d] = hi[d].max(v);
        }
    }
    let spread: Vec<i64> = lo
        .iter()
        .zip(&hi)
        .map(|(&l, &h)| if l > h { 0 } else { i64::from(h) - i64::from(l) })
        .collect();

    let mut order: Vec<usize> = (0..dims).collect();
    order.sort_by(|&a, &b| spread[b].cmp(&spread[a]));
    order
}
