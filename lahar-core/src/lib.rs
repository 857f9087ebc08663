//! Energy-cone (LAHARZ-style) lahar inundation engine.
//!
//! Given a filled DEM, a D8 flow-direction grid, and a source point with an
//! estimated flow volume, this crate predicts the ground footprint of the
//! resulting lahar: a multi-level raster nesting the central volume
//! estimate inside its confidence-interval bounds, built by walking
//! downstream from the source and flooding sideways at each step until an
//! area budget derived from the volume is spent.
//!
//! This crate is a pure algorithm library — it reads nothing from disk and
//! knows nothing about coordinate reference systems or file formats.
//! `lahar_raster` and `lahar_vector` carry the GeoTIFF/Shapefile codecs,
//! and `lahar-tools-app` wires this engine to them.

pub mod auto_volume;
pub mod batch;
pub mod cross_section;
pub mod error;
pub mod grid;
pub mod levels;
pub mod regression;
pub mod walk;

pub use auto_volume::{search as search_volume, AutoVolumeResult, V_MIN};
pub use batch::{run_batch, GridTransform, PointOutcome, PointRecord, SkipReason, SourcePoint};
pub use cross_section::{Dem, MAX_SWEEP};
pub use error::{LaharError, Result};
pub use levels::InundationRaster;
pub use walk::{walk, FlowDirection, WalkOutcome, WalkResult, MAX_STEPS};
