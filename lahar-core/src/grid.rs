//! D8 direction tables and the small geometric facts the sweep and walk
//! need: which neighbour sits "left" of the flow, which one is one step
//! further downstream, and how long a cell is along the flow axis.
//!
//! Direction codes follow the ESRI convention: 1=E, 2=SE, 4=S, 8=SW, 16=W,
//! 32=NW, 64=N, 128=NE. `0` is a sink (no further descent); `255` is
//! nodata.

/// Elevation sentinel used by the DEM grid to mark cells outside the domain
/// of interest. Not IEEE NaN, so it participates in ordinary comparisons —
/// the sweep logic leans on that (`NODATA_Z` sorts above any real
/// elevation).
pub const NODATA_Z: f64 = 99999.0;

/// D8 nodata code.
pub const D8_NODATA: i32 = 255;

/// D8 sink code (no valid downstream direction).
pub const D8_SINK: i32 = 0;

/// True for the eight valid D8 direction codes.
pub fn is_valid_direction(dir: i32) -> bool {
    matches!(dir, 1 | 2 | 4 | 8 | 16 | 32 | 64 | 128)
}

/// True for the four diagonal D8 codes (SE, SW, NW, NE).
pub fn is_diagonal(dir: i32) -> bool {
    matches!(dir, 2 | 8 | 32 | 128)
}

/// The (row, column) offset of the neighbour lying to the "left" of the
/// flow direction (used to seed the left bank of a cross-section sweep).
/// Numerically identical to [`step`] — the same unit vector both seeds the
/// left bank and advances either bank one cell further outward.
pub fn left_of(dir: i32) -> (isize, isize) {
    match dir {
        1 => (-1, 0),
        2 => (-1, 1),
        4 => (0, 1),
        8 => (1, 1),
        16 => (1, 0),
        32 => (1, -1),
        64 => (0, -1),
        128 => (-1, -1),
        _ => (0, 0),
    }
}

/// The (row, column) unit step perpendicular to the flow, used to advance a
/// bank one cell further from the channel.
pub fn step(dir: i32) -> (isize, isize) {
    left_of(dir)
}

/// The (row, column) offset to the next channel cell downstream.
pub fn downstream(dir: i32) -> (isize, isize) {
    match dir {
        1 => (0, 1),
        2 => (1, 1),
        4 => (1, 0),
        8 => (1, -1),
        16 => (0, -1),
        32 => (-1, -1),
        64 => (-1, 0),
        128 => (-1, 1),
        _ => (0, 0),
    }
}

/// The along-flow length of a cell: the diagonal step for diagonal
/// directions, the plain cell width otherwise.
pub fn cell_len(dir: i32, cell_width: f64) -> f64 {
    if is_diagonal(dir) {
        diagonal_width(cell_width)
    } else {
        cell_width
    }
}

/// The diagonal step length, rounded to 2 decimal places as the reference
/// model does (`round(w * sqrt(2), 2)`).
pub fn diagonal_width(cell_width: f64) -> f64 {
    (cell_width * std::f64::consts::SQRT_2 * 100.0).round() / 100.0
}

/// For a diagonal flow direction, the two adjacent cardinal directions to
/// additionally sweep from the same channel cell (fills the two "ears" a
/// pure diagonal step would leave thin).
pub fn flank_primary(dir: i32) -> Option<(i32, i32)> {
    match dir {
        32 => Some((16, 64)),
        128 => Some((64, 1)),
        2 => Some((1, 4)),
        8 => Some((4, 16)),
        _ => None,
    }
}

/// For a cardinal flow direction, the two adjacent diagonal directions to
/// additionally sweep from the same channel cell.
pub fn flank_secondary(dir: i32) -> Option<(i32, i32)> {
    match dir {
        1 => Some((128, 2)),
        4 => Some((2, 8)),
        16 => Some((8, 32)),
        64 => Some((32, 128)),
        _ => None,
    }
}

/// For a diagonal flow direction, the (row, column) offset of the adjacent
/// cell from which one extra sweep is run (same direction) to close the
/// staircase gap a diagonal step leaves open.
pub fn checker_offset(dir: i32) -> Option<(isize, isize)> {
    match dir {
        8 => Some((1, 0)),
        32 => Some((0, -1)),
        128 => Some((-1, 0)),
        2 => Some((0, 1)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_directions_are_identified() {
        for d in [2, 8, 32, 128] {
            assert!(is_diagonal(d), "{} should be diagonal", d);
        }
        for d in [1, 4, 16, 64] {
            assert!(!is_diagonal(d), "{} should not be diagonal", d);
        }
    }

    #[test]
    fn sink_and_nodata_are_not_valid_directions() {
        assert!(!is_valid_direction(D8_SINK));
        assert!(!is_valid_direction(D8_NODATA));
        assert!(is_valid_direction(1));
        assert!(is_valid_direction(128));
    }

    #[test]
    fn diagonal_width_matches_pythagorean_rounding() {
        assert_eq!(diagonal_width(10.0), 14.14);
        assert_eq!(diagonal_width(1.0), 1.41);
    }

    #[test]
    fn flank_tables_cover_every_direction_exactly_once() {
        for d in [32, 128, 2, 8] {
            assert!(flank_primary(d).is_some());
            assert!(flank_secondary(d).is_none());
        }
        for d in [1, 4, 16, 64] {
            assert!(flank_secondary(d).is_some());
            assert!(flank_primary(d).is_none());
        }
    }
}
