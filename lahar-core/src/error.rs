//! Error taxonomy for the inundation engine.
//!
//! Sweep-local conditions are recovered in place (§4.4); per-point
//! conditions are handed back up to the auto-volume search, which decides
//! whether to retry with a smaller volume; only `InvalidConfig` is fatal to
//! a whole batch run.

use std::fmt;
use std::io;

/// Errors the engine can report. Most are not "errors" in the panic sense —
/// `VolumeTooLarge`, `CrossSectionTooLong`, `SinkReached` and friends are
/// ordinary control-flow outcomes that the caller is expected to handle.
#[derive(Debug, Clone, PartialEq)]
pub enum LaharError {
    /// A D8 cell held a value outside {1,2,4,8,16,32,64,128,0,255}.
    InvalidDirection(i32),
    /// A confidence level outside the tabulated set, or a DEM/D8 shape
    /// mismatch. Fatal to the whole batch.
    InvalidConfig(String),
    /// A single cross-section sweep exceeded `MAX_SWEEP` iterations.
    CrossSectionTooLong,
    /// The downstream walk reached the DEM boundary with planimetric
    /// budget still remaining.
    VolumeTooLarge,
    /// The input volume fell to or below `V_MIN` during auto-volume
    /// reduction; the point is skipped.
    VolumeBelowMinimum,
}

impl fmt::Display for LaharError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LaharError::InvalidDirection(v) => write!(f, "invalid D8 direction code: {}", v),
            LaharError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            LaharError::CrossSectionTooLong => {
                write!(f, "cross-section sweep exceeded the iteration cap")
            }
            LaharError::VolumeTooLarge => {
                write!(f, "flow reached the DEM boundary with budget remaining")
            }
            LaharError::VolumeBelowMinimum => write!(f, "volume fell at or below the floor"),
        }
    }
}

impl std::error::Error for LaharError {}

impl From<LaharError> for io::Error {
    fn from(err: LaharError) -> io::Error {
        match err {
            LaharError::InvalidConfig(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, LaharError>;
