//! The cross-section sweep (C4): given a channel cell and a flow
//! direction, flood cells outward to the left and right of the flow axis
//! until the cross-sectional area budget for the widest still-alive level
//! is drained.
//!
//! The budget handed in is never mutated by the caller's copy: each sweep
//! clones it into a scratch vector that is thrown away at the end of the
//! call. Persisted shrinkage of the budget (dropping a level for good)
//! only happens through the downstream walk's planimetric accounting step,
//! never here.

use crate::grid::{self, NODATA_Z};
use crate::levels::InundationRaster;
use lahar_common::structures::Array2D;

/// Digital elevation model: a single-band grid of elevations with
/// [`NODATA_Z`] as the out-of-domain sentinel.
pub type Dem = Array2D<f64>;

/// Absolute backstop on sweep iterations; never expected to fire — natural
/// termination is via the cross-section budget draining to zero or a
/// nodata cell being reached.
const ABSOLUTE_SWEEP_CAP: u64 = 1_000_000_000;

/// Sweeps exceeding this many iterations are reported [`too_long`](SweepReport::too_long),
/// checked only after the loop exits naturally.
pub const MAX_SWEEP: u64 = 5000;

/// What happened during one cross-section sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepReport {
    pub iterations: u64,
    /// True if the natural iteration count exceeded [`MAX_SWEEP`].
    pub too_long: bool,
    /// True if the sweep ran off the edge of the DEM's data extent.
    pub hit_nodata: bool,
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn subtract_and_drain(budget: &mut Vec<f64>, delta: f64) {
    for v in budget.iter_mut() {
        *v -= delta;
    }
    while budget.len() > 1 && *budget.last().unwrap() <= 0.0 {
        budget.pop();
    }
}

/// Runs one cross-section sweep rooted at `(row, col)` with flow direction
/// `dir`, claiming cells into `raster` as the budget allows. `budget` is
/// the currently-alive, descending cross-sectional area levels (widest
/// first) — it is cloned internally and never mutated for the caller.
pub fn sweep(
    dem: &Dem,
    raster: &mut InundationRaster,
    row: isize,
    col: isize,
    dir: i32,
    budget: &[f64],
    cell_width: f64,
) -> SweepReport {
    let (step_r, step_c) = grid::step(dir);
    let len = grid::cell_len(dir, cell_width);

    let mut right = (row, col);
    let mut left = (row + step_r, col + step_c);
    let fill_z_start = dem.get_value(right.0, right.1);
    if fill_z_start == NODATA_Z || dem.get_value(left.0, left.1) == NODATA_Z {
        return SweepReport {
            iterations: 0,
            too_long: false,
            hit_nodata: true,
        };
    }

    let mut cross_area = budget.to_vec();
    let mut fill_z = fill_z_start;
    let mut cell_count: u64 = 0;
    let mut iterations: u64 = 0;
    let mut hit_nodata = false;

    loop {
        if cross_area.is_empty() || cross_area[0] <= 0.0 {
            break;
        }
        if iterations >= ABSOLUTE_SWEEP_CAP {
            break;
        }
        iterations += 1;

        let z_left = dem.get_value(left.0, left.1);
        let z_right = dem.get_value(right.0, right.1);

        if z_left == NODATA_Z || z_right == NODATA_Z {
            for v in cross_area.iter_mut() {
                *v = -NODATA_Z;
            }
            hit_nodata = true;
            continue;
        }

        if approx_eq(z_left, fill_z) {
            raster.append(left.0, left.1, cross_area.len() + 1);
            left.0 += step_r;
            left.1 += step_c;
            cell_count += 1;
        } else if approx_eq(z_right, fill_z) {
            raster.append(right.0, right.1, cross_area.len() + 1);
            right.0 -= step_r;
            right.1 -= step_c;
            cell_count += 1;
        } else if z_right < fill_z {
            let delta = (fill_z - z_right) * len;
            subtract_and_drain(&mut cross_area, delta);
            cell_count += 1;
            if !cross_area.is_empty() && cross_area[0] > 0.0 {
                raster.append(right.0, right.1, cross_area.len() + 1);
                right.0 -= step_r;
                right.1 -= step_c;
            }
        } else if z_left < fill_z {
            let delta = (fill_z - z_left) * len;
            subtract_and_drain(&mut cross_area, delta);
            cell_count += 1;
            if !cross_area.is_empty() && cross_area[0] > 0.0 {
                raster.append(left.0, left.1, cross_area.len() + 1);
                left.0 += step_r;
                left.1 += step_c;
            }
        } else if approx_eq(z_right, z_left) {
            let delta = (z_right - fill_z) * len * cell_count as f64;
            fill_z = z_right;
            subtract_and_drain(&mut cross_area, delta);
            if !cross_area.is_empty() && cross_area[0] > 0.0 {
                raster.append(left.0, left.1, cross_area.len() + 1);
                raster.append(right.0, right.1, cross_area.len() + 1);
                left.0 += step_r;
                left.1 += step_c;
                right.0 -= step_r;
                right.1 -= step_c;
                cell_count += 2;
            }
        } else if z_right > z_left {
            let delta = (z_left - fill_z) * len * cell_count as f64;
            fill_z = z_left;
            subtract_and_drain(&mut cross_area, delta);
            cell_count += 1;
            if !cross_area.is_empty() && cross_area[0] > 0.0 {
                raster.append(left.0, left.1, cross_area.len() + 1);
                left.0 += step_r;
                left.1 += step_c;
            }
        } else {
            // z_right < z_left
            let delta = (z_right - fill_z) * len * cell_count as f64;
            fill_z = z_right;
            subtract_and_drain(&mut cross_area, delta);
            cell_count += 1;
            if !cross_area.is_empty() && cross_area[0] > 0.0 {
                raster.append(right.0, right.1, cross_area.len() + 1);
                right.0 -= step_r;
                right.1 -= step_c;
            }
        }
    }

    SweepReport {
        iterations,
        too_long: iterations > MAX_SWEEP,
        hit_nodata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_dem(rows: isize, cols: isize, z: f64) -> Dem {
        Dem::new(rows, cols, z, NODATA_Z).unwrap()
    }

    #[test]
    fn sweep_on_flat_dem_claims_symmetric_band_without_crashing() {
        let dem = flat_dem(21, 21, 10.0);
        let mut raster = InundationRaster::new(21, 21, 3);
        let budget = vec![40.0, 20.0, 8.0];
        let report = sweep(&dem, &mut raster, 10, 10, 1, &budget, 2.0);
        assert!(report.iterations > 0);
        assert!(!report.too_long);
        assert!(raster.total_claimed() > 0);
    }

    #[test]
    fn sweep_aborts_cleanly_at_the_dem_edge() {
        let dem = flat_dem(5, 5, 10.0);
        let mut raster = InundationRaster::new(5, 5, 3);
        let budget = vec![1000.0, 500.0, 200.0];
        let report = sweep(&dem, &mut raster, 0, 0, 1, &budget, 2.0);
        assert!(report.hit_nodata);
    }

    #[test]
    fn right_lower_than_left_branch_advances_right_consistently() {
        // A 1-wide channel where the right bank is one step lower than the
        // left at every iteration: claims should walk outward on the right
        // without ever reading a stale left cursor (regression test for
        // the z_right < z_left branch).
        let mut dem = flat_dem(11, 11, 10.0);
        for c in 0..11 {
            dem.set_value(6, c, 8.0); // right side, one row below center
        }
        let mut raster = InundationRaster::new(11, 11, 3);
        let budget = vec![100.0, 50.0, 20.0];
        let report = sweep(&dem, &mut raster, 5, 5, 1, &budget, 2.0);
        assert!(report.iterations > 0);
    }
}
