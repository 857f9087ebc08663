//! The downstream walk (C5): the main engine driver. Starting at a source
//! cell, repeatedly sweeps the cross-section at the current channel cell
//! and its cardinal/diagonal flanks, updates the planimetric budget from
//! the resulting pixel counts, and advances one cell downstream — until
//! the flow exhausts its budget, reaches a sink, runs off the DEM, or hits
//! the step cap.

use crate::cross_section::{self, Dem};
use crate::grid::{self, D8_NODATA};
use crate::levels::InundationRaster;
use lahar_common::structures::Array2D;

/// D8 flow-direction grid: {1,2,4,8,16,32,64,128} plus 0 (sink) and 255
/// (nodata).
pub type FlowDirection = Array2D<i32>;

/// Absolute step cap on the downstream walk; the reference model uses the
/// same order of magnitude as a safety backstop, never expected to fire on
/// a real DEM.
pub const MAX_STEPS: u64 = 90_000_000;

/// Half-width of the boundary-detection window: the window spans
/// `row-RADIUS..row+RADIUS` (10 cells) in each axis.
const BOUNDARY_WINDOW_RADIUS: isize = 5;

/// More than this many nodata D8 cells in the boundary window declares the
/// flow has run off the DEM's data extent with budget still remaining.
const BOUNDARY_NODATA_THRESHOLD: usize = 5;

/// How a downstream walk ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WalkOutcome {
    /// The source point itself sat on a sink/nodata D8 cell; only the
    /// starting cell was claimed, at the widest level.
    SinkAtStart,
    /// The walk reached a sink (D8 == 0) after one or more downstream
    /// steps — a normal, budget-respecting termination.
    SinkReached,
    /// The planimetric budget for the widest level was exhausted.
    PlanimetricExhausted,
    /// The walk reached the DEM's data boundary with budget still
    /// remaining.
    VolumeTooLarge,
    /// The downstream cell itself was nodata.
    FinishedAtBlank,
    /// A single cross-section sweep exceeded the iteration cap; the whole
    /// walk is aborted immediately, keeping whatever was already claimed.
    CrossSectionTooLong,
    /// The walk exceeded [`MAX_STEPS`] downstream steps.
    StepCapReached,
}

/// The full result of one downstream walk.
pub struct WalkResult {
    pub outcome: WalkOutcome,
    pub raster: InundationRaster,
    /// Remaining planimetric budget per still-alive level after the final
    /// accounting step.
    pub remaining: Vec<f64>,
    pub last_sweep_iterations: u64,
}

fn count_nodata_in_window(d8: &FlowDirection, row: isize, col: isize) -> usize {
    let mut count = 0usize;
    for dr in -BOUNDARY_WINDOW_RADIUS..BOUNDARY_WINDOW_RADIUS {
        for dc in -BOUNDARY_WINDOW_RADIUS..BOUNDARY_WINDOW_RADIUS {
            if d8.get_value(row + dr, col + dc) == D8_NODATA {
                count += 1;
            }
        }
    }
    count
}

/// Runs one downstream walk from `(start_row, start_col)`. `cross_budget`
/// and `plan_budget` are the initial, descending per-level area budgets
/// (`A_x` and `A_p`); both are cloned into the walk's own persisted working
/// copies, which only shrink via the tail-trim in the planimetric
/// accounting step.
pub fn walk(
    dem: &Dem,
    d8: &FlowDirection,
    start_row: isize,
    start_col: isize,
    cross_budget: &[f64],
    plan_budget: &[f64],
    cell_width: f64,
) -> WalkResult {
    let levels = cross_budget.len();
    let mut raster = InundationRaster::new(dem.rows(), dem.columns(), levels);

    let mut row = start_row;
    let mut col = start_col;
    let mut dir = d8.get_value(row, col);

    if !grid::is_valid_direction(dir) {
        raster.append(row, col, 2); // widest level: raster value 2, index 0
        return WalkResult {
            outcome: WalkOutcome::SinkAtStart,
            raster,
            remaining: plan_budget.to_vec(),
            last_sweep_iterations: 0,
        };
    }

    let mut cross_budget = cross_budget.to_vec();
    let mut plan_budget = plan_budget.to_vec();
    let mut remaining = plan_budget.clone();
    let cell_area = cell_width * cell_width;
    let mut last_iterations = 0u64;

    let mut steps: u64 = 0;
    loop {
        if steps >= MAX_STEPS {
            return WalkResult {
                outcome: WalkOutcome::StepCapReached,
                raster,
                remaining,
                last_sweep_iterations: last_iterations,
            };
        }
        steps += 1;

        let mut too_long = false;
        let mut run = |raster: &mut InundationRaster, r: isize, c: isize, d: i32| {
            let report = cross_section::sweep(dem, raster, r, c, d, &cross_budget, cell_width);
            last_iterations = report.iterations;
            if report.too_long {
                too_long = true;
            }
        };

        run(&mut raster, row, col, dir);

        let mut h = dir;
        if grid::is_diagonal(dir) {
            if let Some((g1, g2)) = grid::flank_primary(dir) {
                run(&mut raster, row, col, g1);
                run(&mut raster, row, col, g2);
                h = g2;
            }
        }
        if let Some((s1, s2)) = grid::flank_secondary(h) {
            run(&mut raster, row, col, s1);
            run(&mut raster, row, col, s2);
        }
        if grid::is_diagonal(dir) {
            if let Some((or, oc)) = grid::checker_offset(dir) {
                run(&mut raster, row + or, col + oc, dir);
            }
        }

        if too_long {
            return WalkResult {
                outcome: WalkOutcome::CrossSectionTooLong,
                raster,
                remaining,
                last_sweep_iterations: last_iterations,
            };
        }

        // Planimetric accounting: reverse-prefix-sum the per-level pixel
        // counts and compare against the still-alive budget levels.
        let cum_counts = raster.cumulative_counts();
        for i in 0..plan_budget.len() {
            remaining[i] = plan_budget[i] - cell_area * cum_counts[i] as f64;
        }
        while plan_budget.len() > 1 {
            let last = plan_budget.len() - 1;
            if remaining[last] < 0.0 {
                plan_budget.pop();
                if cross_budget.len() > plan_budget.len() {
                    cross_budget.pop();
                }
                remaining.pop();
            } else {
                break;
            }
        }
        if remaining[0] < 0.0 {
            return WalkResult {
                outcome: WalkOutcome::PlanimetricExhausted,
                raster,
                remaining,
                last_sweep_iterations: last_iterations,
            };
        }

        let (dr, dc) = grid::downstream(dir);
        row += dr;
        col += dc;
        dir = d8.get_value(row, col);

        if count_nodata_in_window(d8, row, col) > BOUNDARY_NODATA_THRESHOLD {
            return WalkResult {
                outcome: WalkOutcome::VolumeTooLarge,
                raster,
                remaining,
                last_sweep_iterations: last_iterations,
            };
        }
        if dir == D8_NODATA {
            return WalkResult {
                outcome: WalkOutcome::FinishedAtBlank,
                raster,
                remaining,
                last_sweep_iterations: last_iterations,
            };
        }
        if !grid::is_valid_direction(dir) {
            return WalkResult {
                outcome: WalkOutcome::SinkReached,
                raster,
                remaining,
                last_sweep_iterations: last_iterations,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::NODATA_Z;

    fn slope_dem(rows: isize, cols: isize) -> Dem {
        let mut dem = Dem::new(rows, cols, 0.0, NODATA_Z).unwrap();
        for r in 0..rows {
            for c in 0..cols {
                dem.set_value(r, c, (rows - r) as f64 * 2.0);
            }
        }
        dem
    }

    fn all_east_d8(rows: isize, cols: isize) -> FlowDirection {
        FlowDirection::new(rows, cols, 4, D8_NODATA).unwrap() // flows south
    }

    #[test]
    fn sink_at_start_claims_only_the_start_cell() {
        let dem = slope_dem(10, 10);
        let mut d8 = FlowDirection::new(10, 10, 4, D8_NODATA).unwrap();
        d8.set_value(5, 5, 0); // sink
        let result = walk(&dem, &d8, 5, 5, &[40.0, 20.0, 8.0], &[4000.0, 2000.0, 800.0], 2.0);
        assert_eq!(result.outcome, WalkOutcome::SinkAtStart);
        assert_eq!(result.raster.get(5, 5), 2);
        assert_eq!(result.raster.total_claimed(), 1);
    }

    #[test]
    fn flat_dem_never_crashes_and_terminates() {
        let dem = Dem::new(15, 15, 5.0, NODATA_Z).unwrap();
        let d8 = all_east_d8(15, 15);
        let result = walk(&dem, &d8, 2, 2, &[40.0, 20.0, 8.0], &[4000.0, 2000.0, 800.0], 2.0);
        // must reach some terminal state without panicking; on a flat DEM
        // with no sink the walk typically runs off the grid boundary.
        assert!(matches!(
            result.outcome,
            WalkOutcome::VolumeTooLarge
                | WalkOutcome::FinishedAtBlank
                | WalkOutcome::SinkReached
                | WalkOutcome::PlanimetricExhausted
                | WalkOutcome::StepCapReached
        ));
    }

    #[test]
    fn source_near_the_edge_hits_the_boundary_quickly() {
        let dem = slope_dem(20, 20);
        let d8 = all_east_d8(20, 20);
        let result = walk(&dem, &d8, 1, 1, &[40.0, 20.0, 8.0], &[4000.0, 2000.0, 800.0], 2.0);
        assert!(matches!(
            result.outcome,
            WalkOutcome::VolumeTooLarge | WalkOutcome::FinishedAtBlank
        ));
    }
}
