//! The packed multi-level inundation raster: one integer grid holding every
//! nested inundation class at once, plus the per-level pixel counters used
//! to keep a running planimetric-area total without rescanning the grid.
//!
//! A cell's raster value `k` means it belongs to levels `1..=k-1` (counting
//! from the widest, level 1, inward); level 1 itself is "unclaimed
//! background". `value[i]` counts cells whose *innermost* claimed level is
//! `i + 2` — i.e. raster value `i + 2`.

use lahar_common::structures::Array2D;

/// A per-source-point working raster: the packed level grid plus its
/// per-level exclusive pixel counters.
pub struct InundationRaster {
    raster: Array2D<i32>,
    /// `value[i]` = number of cells whose innermost claimed level is `i+2`.
    /// Sized to the initial number of levels (`L`); never resized, even
    /// after budget levels are popped — a popped level simply stops
    /// receiving new claims, it doesn't erase cells already assigned to it.
    value: Vec<i64>,
}

impl InundationRaster {
    /// Builds a raster of the given shape, all cells starting unclaimed
    /// (value 1), with per-level counters for `levels` inundation classes.
    pub fn new(rows: isize, columns: isize, levels: usize) -> InundationRaster {
        let raster = Array2D::new(rows, columns, 1i32, 0i32)
            .expect("rows/columns are validated non-negative by the caller");
        InundationRaster {
            raster,
            value: vec![0i64; levels],
        }
    }

    pub fn rows(&self) -> isize {
        self.raster.rows()
    }

    pub fn columns(&self) -> isize {
        self.raster.columns()
    }

    pub fn get(&self, row: isize, col: isize) -> i32 {
        self.raster.get_value(row, col)
    }

    /// Claims `(row, col)` at depth `k = current_depth` (the number of
    /// still-alive budget levels plus one). Leaves the cell untouched if it
    /// is already claimed at this level or a tighter one; narrows it
    /// (transferring its counter) if it was previously claimed at a looser
    /// level; otherwise claims it fresh.
    pub fn append(&mut self, row: isize, col: isize, current_depth: usize) {
        let k = current_depth as i32;
        let existing = self.raster.get_value(row, col);
        if existing == 1 {
            self.raster.set_value(row, col, k);
            self.value[(k - 2) as usize] += 1;
        } else if existing < k {
            self.value[(existing - 2) as usize] -= 1;
            self.value[(k - 2) as usize] += 1;
            self.raster.set_value(row, col, k);
        }
        // existing >= k: already at the same or a tighter level, no-op.
    }

    /// The reverse-prefix-sum cumulative pixel count for every level: index
    /// `i` holds the number of cells claimed at level `i+2` or tighter.
    pub fn cumulative_counts(&self) -> Vec<i64> {
        let mut out = vec![0i64; self.value.len()];
        let mut running = 0i64;
        for i in (0..self.value.len()).rev() {
            running += self.value[i];
            out[i] = running;
        }
        out
    }

    /// Total number of claimed (non-background) cells.
    pub fn total_claimed(&self) -> i64 {
        self.value.iter().sum()
    }

    pub fn into_raster(self) -> Array2D<i32> {
        self.raster
    }

    pub fn raster(&self) -> &Array2D<i32> {
        &self.raster
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_claim_increments_its_own_level() {
        let mut r = InundationRaster::new(5, 5, 3);
        r.append(2, 2, 4); // k = 4, index 2
        assert_eq!(r.get(2, 2), 4);
        assert_eq!(r.cumulative_counts()[2], 1);
        assert_eq!(r.cumulative_counts()[0], 1);
    }

    #[test]
    fn narrowing_transfers_the_counter() {
        let mut r = InundationRaster::new(5, 5, 3);
        r.append(1, 1, 2); // widest level
        assert_eq!(r.cumulative_counts()[0], 1);
        r.append(1, 1, 4); // narrow to tightest
        assert_eq!(r.get(1, 1), 4);
        assert_eq!(r.cumulative_counts()[0], 1); // still counted at-or-wider
        assert_eq!(r.cumulative_counts()[2], 1); // now also at-or-tighter
    }

    #[test]
    fn widening_is_a_no_op() {
        let mut r = InundationRaster::new(5, 5, 3);
        r.append(1, 1, 4);
        r.append(1, 1, 2); // looser than what's already there
        assert_eq!(r.get(1, 1), 4);
    }

    #[test]
    fn total_claimed_matches_sum_of_exclusive_counts() {
        let mut r = InundationRaster::new(5, 5, 3);
        r.append(0, 0, 2);
        r.append(0, 1, 3);
        r.append(0, 2, 4);
        assert_eq!(r.total_claimed(), 3);
    }
}
