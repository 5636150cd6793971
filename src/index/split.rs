//! In-place partitioning of point slots.
//!
//! Slots are `u32` indices into the flat point buffer. Every split leaves
//! the slice as `[left.. | rep | right..]`: left values are `<= value` on
//! the axis, right values are `> value`, and the representative sits at
//! `pivot` with exactly `value`.

use std::cmp::Ordering;

/// Outcome of a successful partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Split {
    pub axis: usize,
    pub value: i32,
    pub pivot: usize,
}

#[inline]
fn coord(points: &[i32], dims: usize, slot: u32, axis: usize) -> i32 {
    points[slot as usize * dims + axis]
}

#[inline]
fn vector(points: &[i32], dims: usize, slot: u32) -> &[i32] {
    let start = slot as usize * dims;
    &points[start..start + dims]
}

/// Splits at the median along `axis`, pulling ties into the left block.
///
/// Returns `None` when every value at or above the median equals it, so the
/// right side would be empty.
pub(crate) fn median_split(points: &[i32], dims: usize, slots: &mut [u32], axis: usize) -> Option<Split> {
    let n = slots.len();
    if n < 2 {
        return None;
    }
    let mid = (n - 1) / 2;
    slots.select_nth_unstable_by_key(mid, |&s| coord(points, dims, s, axis));
    let value = coord(points, dims, slots[mid], axis);

    let mut boundary = mid + 1;
    for i in (mid + 1)..n {
        if coord(points, dims, slots[i], axis) == value {
            slots.swap(i, boundary);
            boundary += 1;
        }
    }
    if boundary == n {
        return None;
    }
    slots.swap(mid, boundary - 1);
    Some(Split {
        axis,
        value,
        pivot: boundary - 1,
    })
}

/// Splits just below the maximum along `axis`.
///
/// Used for distinct point sets where the median equals the maximum on
/// every axis. Returns `None` when the axis is constant.
pub(crate) fn below_max_split(points: &[i32], dims: usize, slots: &mut [u32], axis: usize) -> Option<Split> {
    let max = slots.iter().map(|&s| coord(points, dims, s, axis)).max()?;
    let value = slots
        .iter()
        .map(|&s| coord(points, dims, s, axis))
        .filter(|&v| v < max)
        .max()?;

    let mut left = 0;
    for i in 0..slots.len() {
        if coord(points, dims, slots[i], axis) <= value {
            slots.swap(left, i);
            left += 1;
        }
    }
    let rep = slots[..left]
        .iter()
        .position(|&s| coord(points, dims, s, axis) == value)?;
    slots.swap(rep, left - 1);
    Some(Split {
        axis,
        value,
        pivot: left - 1,
    })
}

/// Moves one slot per distinct vector to the front and returns its length.
///
/// The kept slot of each class is the lowest point index. Every dropped
/// slot is reported as `(dropped, kept)`.
pub(crate) fn dedup(points: &[i32], dims: usize, slots: &mut [u32], twins: &mut Vec<(u32, u32)>) -> usize {
    slots.sort_unstable_by(|&a, &b| {
        match vector(points, dims, a).cmp(vector(points, dims, b)) {
            Ordering::Equal => a.cmp(&b),
            ord => ord,
        }
    });
    let mut unique = 0;
    for i in 0..slots.len() {
        if unique > 0 && vector(points, dims, slots[unique - 1]) == vector(points, dims, slots[i]) {
            twins.push((slots[i], slots[unique - 1]));
        } else {
            slots.swap(unique, i);
            unique += 1;
        }
    }
    unique
}
