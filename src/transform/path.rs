//! Zig-zag basis ordering and the per-basis derivation table.
//!
//! Bases are the separable Walsh filters `(x, y)` of an `S x S` kernel grid,
//! visited along anti-diagonals (`x + y` ascending, `x` ascending within a
//! diagonal). Every basis after the first is derived from one earlier basis,
//! its ancestor, which differs in exactly one grid coordinate. The table is
//! pure combinatorics and is built once per `(S, B)` pair.

use crate::util::math::{exact_log2, gray_code, shared_prefix};
use crate::util::{GckMatchError, GckMatchResult};

/// Axis along which a basis differs from its ancestor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// The horizontal coordinate changed; rows are recombined.
    Horizontal,
    /// The vertical coordinate changed; columns are recombined.
    Vertical,
}

/// Recurrence parameters that turn an ancestor plane into a new plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    /// Index of the ancestor basis in the path.
    pub ancestor: usize,
    /// Axis that changed between ancestor and basis.
    pub axis: Axis,
    /// Shift applied to the ancestor plane, `2^p` for a shared prefix `p`.
    pub delta: usize,
    /// Selects the `+` form of the recurrence.
    pub flip: bool,
}

/// One basis of the path: its kernel-grid coordinates and derivation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathEntry {
    /// Horizontal sequency index.
    pub x: usize,
    /// Vertical sequency index.
    pub y: usize,
    /// Derivation from the ancestor; `None` for the DC basis.
    pub step: Option<Step>,
}

/// Precomputed zig-zag path over the kernel grid.
#[derive(Clone, Debug)]
pub struct GckPath {
    kernel_size: usize,
    bits: u32,
    entries: Vec<PathEntry>,
}

impl GckPath {
    /// Builds the path for the first `bases` bases of an `S x S` kernel.
    pub fn new(kernel_size: usize, bases: usize) -> GckMatchResult<Self> {
        let bits = exact_log2(kernel_size).ok_or(GckMatchError::InvalidKernelSize {
            kernel: kernel_size,
        })?;
        let max = kernel_size * kernel_size;
        if bases == 0 || bases > max {
            return Err(GckMatchError::InvalidBasisCount { bases, max });
        }

        let coords = zigzag(kernel_size, bases);
        let mut entries = Vec::with_capacity(bases);
        for (idx, &(x, y)) in coords.iter().enumerate() {
            let step = if idx == 0 {
                None
            } else {
                let (ax, ay) = ancestor_of(x, y);
                let ancestor = coords[..idx]
                    .iter()
                    .rposition(|&c| c == (ax, ay))
                    .ok_or(GckMatchError::InvalidInput("zig-zag ancestor missing"))?;
                Some(if ax != x {
                    step_for(Axis::Horizontal, x, ax, ancestor, bits)
                } else {
                    step_for(Axis::Vertical, y, ay, ancestor, bits)
                })
            };
            entries.push(PathEntry { x, y, step });
        }

        Ok(Self {
            kernel_size,
            bits,
            entries,
        })
    }

    /// Returns the kernel side length.
    pub fn kernel_size(&self) -> usize {
        self.kernel_size
    }

    /// Returns `log2` of the kernel side length.
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Returns the number of bases on the path.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the path holds no bases.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the path entries in evaluation order.
    pub fn entries(&self) -> &[PathEntry] {
        &self.entries
    }
}

fn zigzag(kernel_size: usize, bases: usize) -> Vec<(usize, usize)> {
    let mut coords = Vec::with_capacity(bases);
    'diagonals: for diag in 0..(2 * kernel_size - 1) {
        let x0 = diag.saturating_sub(kernel_size - 1);
        let x1 = diag.min(kernel_size - 1);
        for x in x0..=x1 {
            if coords.len() == bases {
                break 'diagonals;
            }
            coords.push((x, diag - x));
        }
    }
    coords
}

// Undoes one step of the zig-zag construction: column 0 grows downwards,
// every other cell grows rightwards from row 0.
fn ancestor_of(x: usize, y: usize) -> (usize, usize) {
    if y > 0 {
        (x, y - 1)
    } else {
        (x.saturating_sub(1), 0)
    }
}

fn step_for(axis: Axis, coord: usize, prev: usize, ancestor: usize, bits: u32) -> Step {
    let cur_gc = gray_code(coord);
    let prev_gc = gray_code(prev);
    let prefix = shared_prefix(cur_gc, prev_gc, bits);
    let flip = (cur_gc >> (bits - 1 - prefix)) & 1 == 1;
    Step {
        ancestor,
        axis,
        delta: 1 << prefix,
        flip,
    }
}

#[cfg(test)]
mod tests {
    use super::{Axis, GckPath};
    use crate::util::GckMatchError;

    #[test]
    fn path_walks_anti_diagonals() {
        let path = GckPath::new(4, 16).unwrap();
        let coords: Vec<_> = path.entries().iter().map(|e| (e.x, e.y)).collect();
        assert_eq!(
            coords,
            vec![
                (0, 0),
                (0, 1),
                (1, 0),
                (0, 2),
                (1, 1),
                (2, 0),
                (0, 3),
                (1, 2),
                (2, 1),
                (3, 0),
                (1, 3),
                (2, 2),
                (3, 1),
                (2, 3),
                (3, 2),
                (3, 3),
            ]
        );
    }

    #[test]
    fn ancestors_precede_and_differ_in_one_coordinate() {
        let path = GckPath::new(8, 64).unwrap();
        for (idx, entry) in path.entries().iter().enumerate().skip(1) {
            let step = entry.step.unwrap();
            assert!(step.ancestor < idx);
            let anc = path.entries()[step.ancestor];
            match step.axis {
                Axis::Horizontal => {
                    assert_eq!(anc.y, entry.y);
                    assert_eq!(anc.x + 1, entry.x);
                    assert_eq!(entry.y, 0);
                }
                Axis::Vertical => {
                    assert_eq!(anc.x, entry.x);
                    assert_eq!(anc.y + 1, entry.y);
                }
            }
            assert!(step.delta.is_power_of_two() && step.delta < 8);
        }
    }

    #[test]
    fn step_parameters_follow_gray_code() {
        let path = GckPath::new(4, 4).unwrap();
        let e = path.entries();
        assert!(e[0].step.is_none());
        // (0,1) from (0,0): gray 1 vs 0 differ in the low bit.
        let s1 = e[1].step.unwrap();
        assert_eq!((s1.axis, s1.delta, s1.flip), (Axis::Vertical, 2, true));
        // (1,0) from (0,0).
        let s2 = e[2].step.unwrap();
        assert_eq!((s2.axis, s2.delta, s2.flip), (Axis::Horizontal, 2, true));
        // (0,2) from (0,1): gray 3 vs 1 differ in the high bit.
        let s3 = e[3].step.unwrap();
        assert_eq!((s3.axis, s3.delta, s3.flip), (Axis::Vertical, 1, true));
    }

    #[test]
    fn third_sequency_uses_the_minus_form() {
        let path = GckPath::new(4, 10).unwrap();
        let (idx, entry) = path
            .entries()
            .iter()
            .enumerate()
            .find(|(_, e)| (e.x, e.y) == (3, 0))
            .unwrap();
        assert_eq!(idx, 9);
        let step = entry.step.unwrap();
        assert_eq!((step.delta, step.flip), (2, false));
    }

    #[test]
    fn rejects_bad_parameters() {
        assert_eq!(
            GckPath::new(6, 4).err(),
            Some(GckMatchError::InvalidKernelSize { kernel: 6 })
        );
        assert_eq!(
            GckPath::new(4, 17).err(),
            Some(GckMatchError::InvalidBasisCount { bases: 17, max: 16 })
        );
        assert_eq!(
            GckPath::new(4, 0).err(),
            Some(GckMatchError::InvalidBasisCount { bases: 0, max: 16 })
        );
    }

    #[test]
    fn unit_kernel_has_only_dc() {
        let path = GckPath::new(1, 1).unwrap();
        assert_eq!(path.len(), 1);
        assert!(path.entries()[0].step.is_none());
    }
}
