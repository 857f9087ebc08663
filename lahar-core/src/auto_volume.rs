//! Auto-volume search (C6): if a requested volume overflows the DEM before
//! its planimetric budget is spent, shrink it and retry until the walk
//! settles into a budget-respecting termination or the floor is reached.

use crate::cross_section::{Dem, MAX_SWEEP};
use crate::error::Result;
use crate::regression;
use crate::walk::{self, FlowDirection, WalkOutcome, WalkResult};

/// Below this volume a point is not worth modelling at all; the batch
/// driver skips such points outright, and this search floors at it rather
/// than continuing to shrink forever.
pub const V_MIN: f64 = 32.0;

/// The outcome of a full auto-volume search for one source point.
pub struct AutoVolumeResult {
    pub accepted_volume: f64,
    pub walk: WalkResult,
    pub confidence: f64,
}

fn is_acceptance_candidate(outcome: WalkOutcome) -> bool {
    matches!(
        outcome,
        WalkOutcome::SinkAtStart | WalkOutcome::SinkReached | WalkOutcome::PlanimetricExhausted
    )
}

fn descending_budget(upper: f64, central: f64, lower: f64) -> Vec<f64> {
    let mut v = vec![upper, central, lower];
    v.sort_by(|a, b| b.partial_cmp(a).unwrap());
    v
}

/// Runs the downstream walk at `volume`, shrinking it on each rejected
/// attempt, until the flow terminates in a budget-respecting state or the
/// volume is floored at [`V_MIN`].
pub fn search(
    dem: &Dem,
    d8: &FlowDirection,
    row: isize,
    col: isize,
    volume: f64,
    confidence: f64,
    cell_width: f64,
) -> Result<AutoVolumeResult> {
    let mut v = volume;
    loop {
        let cross_est = regression::cross_section_area(v, confidence)?;
        let plan_est = regression::planimetric_area(v, confidence)?;
        let cross_budget = descending_budget(cross_est.upper, cross_est.central, cross_est.lower);
        let plan_budget = descending_budget(plan_est.upper, plan_est.central, plan_est.lower);

        let result = walk::walk(dem, d8, row, col, &cross_budget, &plan_budget, cell_width);

        let accepted = is_acceptance_candidate(result.outcome)
            && result.remaining.first().copied().unwrap_or(0.0) <= 0.0
            && result.last_sweep_iterations <= MAX_SWEEP;

        if accepted || v <= V_MIN {
            return Ok(AutoVolumeResult {
                accepted_volume: v,
                walk: result,
                confidence,
            });
        }

        let remaining_head = result.remaining.first().copied().unwrap_or(0.0);
        if remaining_head > 10_000.0 {
            v -= (remaining_head / 10_000.0 * 50.0).floor();
        } else {
            v -= 20.0;
        }
        if v < V_MIN {
            v = V_MIN;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{D8_NODATA, NODATA_Z};
    use lahar_common::structures::Array2D;

    #[test]
    fn search_is_monotone_and_terminates_on_an_oversized_volume() {
        // A tiny DEM: any non-trivial volume will overflow it, so the
        // search must shrink down to the floor without looping forever.
        let dem = Dem::new(6, 6, 10.0, NODATA_Z).unwrap();
        let d8 = Array2D::new(6, 6, 4, D8_NODATA).unwrap();
        let result = search(&dem, &d8, 3, 3, 5_000_000.0, 95.0, 2.0).unwrap();
        assert!(result.accepted_volume <= 5_000_000.0);
        assert!(result.accepted_volume >= V_MIN);
    }

    #[test]
    fn search_accepts_immediately_on_a_sink_start() {
        let dem = Dem::new(10, 10, 10.0, NODATA_Z).unwrap();
        let mut d8 = Array2D::new(10, 10, 4, D8_NODATA).unwrap();
        d8.set_value(5, 5, 0);
        let result = search(&dem, &d8, 5, 5, 1000.0, 95.0, 2.0).unwrap();
        assert_eq!(result.accepted_volume, 1000.0);
        assert_eq!(result.walk.outcome, WalkOutcome::SinkAtStart);
    }
}
