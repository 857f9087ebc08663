/*
This code is part of the lahar inundation modelling toolkit, adapted from
the WhiteboxTools geospatial analysis library.
License: MIT
*/

// private sub-module defined in other files
pub mod polygonize;
pub mod shapefile;

// exports identifiers from private sub-modules in the current module namespace
pub use crate::shapefile::attributes::*;
pub use crate::shapefile::geometry::*;
pub use crate::shapefile::geometry::ShapeType;
pub use crate::shapefile::Shapefile;
pub use crate::polygonize::{trace_rings_by_value, Ring};
