//! Pool of reusable rectangular offcuts.
//!
//! The pool is owned by exactly one estimation pass (or one shared floor
//! pass) and mutated through `&mut` as tiles are walked. Offcuts leave the
//! pool at most once; a consumed offcut may hand back up to two guillotine
//! remainders.

use crate::geometry::{Size, LENGTH_EPSILON};
use crate::types::{CuttingOptions, Offcut, OffcutOrigin};

/// Result of a successful [`OffcutInventory::take`].
#[derive(Debug, Clone, PartialEq)]
pub struct Taken {
    pub consumed: Offcut,
    /// The request was satisfied with the offcut turned 90 degrees
    pub rotated: bool,
    /// Remainders that went back into the pool
    pub remainders: Vec<Offcut>,
}

#[derive(Debug, Clone, Default)]
pub struct OffcutInventory {
    pieces: Vec<Offcut>,
    next_id: u64,
}

/// Whether one axis of an offcut can deliver `need`.
///
/// An exact match needs no saw cut. Anything larger needs a cut, and the cut
/// eats `kerf`.
fn axis_fits(available: f64, need: f64, kerf: f64) -> bool {
    if (available - need).abs() <= LENGTH_EPSILON {
        return true;
    }
    available > need && available + LENGTH_EPSILON >= need + kerf
}

/// Kerf-aware fit test of an offcut against a request, without rotation.
pub fn fits(offcut: Size, need: Size, kerf: f64) -> bool {
    axis_fits(offcut.width, need.width, kerf) && axis_fits(offcut.height, need.height, kerf)
}

/// Guillotine remainders of a `stock` rectangle after `used` was cut from its
/// corner: a full-height strip to the right and a strip below the used part.
/// Strips that end up non-positive after kerf are dropped.
pub fn guillotine_split(stock: Size, used: Size, kerf: f64) -> Vec<Size> {
    let mut remainders = Vec::with_capacity(2);

    if stock.width - used.width > LENGTH_EPSILON {
        let right = Size::new(stock.width - used.width - kerf, stock.height);
        if right.width > LENGTH_EPSILON && right.height > LENGTH_EPSILON {
            remainders.push(right);
        }
    }

    if stock.height - used.height > LENGTH_EPSILON {
        let bottom = Size::new(used.width, stock.height - used.height - kerf);
        if bottom.width > LENGTH_EPSILON && bottom.height > LENGTH_EPSILON {
            remainders.push(bottom);
        }
    }

    remainders
}

impl OffcutInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out a fresh offcut without storing it. Used for pieces held
    /// outside the pool, such as the reserved half of a complementary pair.
    pub fn issue(
        &mut self,
        size: Size,
        origin: OffcutOrigin,
        half_tile: bool,
    ) -> Option<Offcut> {
        if !(size.width.is_finite() && size.height.is_finite())
            || size.width <= 0.0
            || size.height <= 0.0
        {
            return None;
        }

        self.next_id += 1;
        Some(Offcut {
            id: self.next_id,
            width: size.width,
            height: size.height,
            origin,
            half_tile,
        })
    }

    /// Stores a new offcut and returns its id. Non-positive sizes are rejected.
    pub fn add(&mut self, size: Size, origin: OffcutOrigin, half_tile: bool) -> Option<u64> {
        self.add_offcut(size, origin, half_tile).map(|offcut| offcut.id)
    }

    pub(crate) fn add_offcut(
        &mut self,
        size: Size,
        origin: OffcutOrigin,
        half_tile: bool,
    ) -> Option<Offcut> {
        let offcut = self.issue(size, origin, half_tile)?;
        self.pieces.push(offcut.clone());
        Some(offcut)
    }

    /// Removes an offcut that can deliver `need` and returns it.
    ///
    /// Without `optimize_cuts` the first fitting offcut wins and nothing is
    /// split off. With it, the offcut leaving the least area behind wins and
    /// its guillotine remainders go back into the pool.
    pub fn take(&mut self, need: Size, options: &CuttingOptions) -> Option<Taken> {
        let mut best: Option<(usize, bool, f64)> = None;

        for (idx, offcut) in self.pieces.iter().enumerate() {
            let rotated = if fits(offcut.size(), need, options.kerf) {
                false
            } else if options.allow_rotate && fits(offcut.size(), need.rotated(), options.kerf) {
                true
            } else {
                continue;
            };

            if !options.optimize_cuts {
                best = Some((idx, rotated, 0.0));
                break;
            }

            let leftover = offcut.area() - need.area();
            match best {
                Some((_, _, best_leftover)) if leftover >= best_leftover => {}
                _ => best = Some((idx, rotated, leftover)),
            }
        }

        let (idx, rotated, _) = best?;
        let consumed = self.pieces.remove(idx);

        let mut remainders = Vec::new();
        if options.optimize_cuts {
            let used = if rotated { need.rotated() } else { need };
            for size in guillotine_split(consumed.size(), used, options.kerf) {
                if let Some(offcut) = self.add_offcut(size, OffcutOrigin::SplitRemainder, false) {
                    remainders.push(offcut);
                }
            }
        }

        Some(Taken {
            consumed,
            rotated,
            remainders,
        })
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn pieces(&self) -> &[Offcut] {
        &self.pieces
    }

    pub fn total_area(&self) -> f64 {
        self.pieces.iter().map(Offcut::area).sum()
    }
}
