//! Batch driver (C7): iterate a list of source points, run the auto-volume
//! search at each, and hand back one in-memory result per point. Turning
//! those results into files (rasters, polygons, output paths) is the
//! CLI binary's job, not this crate's.

use crate::auto_volume::{self, AutoVolumeResult};
use crate::cross_section::Dem;
use crate::error::LaharError;
use crate::walk::FlowDirection;

/// The affine mapping from map coordinates to grid indices. Equivalent to
/// the subset of a raster's georeferencing the engine actually needs; kept
/// free of any I/O-crate dependency so the core stays a pure algorithm
/// library.
#[derive(Debug, Clone, Copy)]
pub struct GridTransform {
    /// Map x-coordinate of the grid's top-left corner.
    pub origin_x: f64,
    /// Map y-coordinate of the grid's top-left corner.
    pub origin_y: f64,
    pub cell_width: f64,
}

impl GridTransform {
    pub fn row_col(&self, x: f64, y: f64) -> (isize, isize) {
        let row = ((self.origin_y - y) / self.cell_width).floor() as isize;
        let col = ((x - self.origin_x) / self.cell_width).floor() as isize;
        (row, col)
    }
}

/// One source point awaiting processing: a map coordinate plus its
/// already-resolved volume (coordinate-file value or CLI override —
/// resolving that choice is the caller's job).
#[derive(Debug, Clone, Copy)]
pub struct SourcePoint {
    pub x: f64,
    pub y: f64,
    pub volume: f64,
}

/// Why a point was skipped rather than modelled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkipReason {
    VolumeBelowMinimum,
}

/// What happened when processing one source point.
pub enum PointOutcome {
    Completed(AutoVolumeResult),
    Skipped(SkipReason),
    Failed(LaharError),
}

/// One point's place in the input order plus what happened to it.
pub struct PointRecord {
    pub index: usize,
    pub point: SourcePoint,
    pub outcome: PointOutcome,
}

/// Runs the auto-volume search for every point in `points`, in order.
/// `progress` is called before each point is processed with
/// `(points_done, total)`, mirroring the percent-complete callbacks the
/// surrounding CLI tool prints when running verbosely.
pub fn run_batch(
    dem: &Dem,
    d8: &FlowDirection,
    transform: &GridTransform,
    points: &[SourcePoint],
    confidence: f64,
    mut progress: impl FnMut(usize, usize),
) -> Vec<PointRecord> {
    let total = points.len();
    let mut records = Vec::with_capacity(total);

    for (index, point) in points.iter().enumerate() {
        progress(index, total);

        if point.volume <= auto_volume::V_MIN {
            records.push(PointRecord {
                index,
                point: *point,
                outcome: PointOutcome::Skipped(SkipReason::VolumeBelowMinimum),
            });
            continue;
        }

        let (row, col) = transform.row_col(point.x, point.y);
        let outcome = match auto_volume::search(
            dem,
            d8,
            row,
            col,
            point.volume,
            confidence,
            transform.cell_width,
        ) {
            Ok(result) => PointOutcome::Completed(result),
            Err(e) => PointOutcome::Failed(e),
        };
        records.push(PointRecord {
            index,
            point: *point,
            outcome,
        });
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{D8_NODATA, NODATA_Z};
    use lahar_common::structures::Array2D;

    #[test]
    fn points_below_the_volume_floor_are_skipped_not_modelled() {
        let dem = Dem::new(10, 10, 10.0, NODATA_Z).unwrap();
        let d8 = Array2D::new(10, 10, 4, D8_NODATA).unwrap();
        let transform = GridTransform {
            origin_x: 0.0,
            origin_y: 20.0,
            cell_width: 2.0,
        };
        let points = [SourcePoint {
            x: 10.0,
            y: 10.0,
            volume: 30.0,
        }];
        let mut calls = 0;
        let records = run_batch(&dem, &d8, &transform, &points, 95.0, |_, _| calls += 1);
        assert_eq!(calls, 1);
        assert_eq!(records.len(), 1);
        assert!(matches!(
            records[0].outcome,
            PointOutcome::Skipped(SkipReason::VolumeBelowMinimum)
        ));
    }

    #[test]
    fn grid_transform_maps_origin_correctly() {
        let transform = GridTransform {
            origin_x: 100.0,
            origin_y: 200.0,
            cell_width: 5.0,
        };
        assert_eq!(transform.row_col(100.0, 200.0), (0, 0));
        assert_eq!(transform.row_col(105.0, 195.0), (1, 1));
    }
}
