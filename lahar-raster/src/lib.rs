//! Single-band raster I/O for the lahar inundation engine.
//!
//! Trimmed from a multi-format raster stack down to GeoTIFF, the only
//! format the DEM, flow-direction, and inundation-level grids need.

pub mod geotiff;

use lahar_common::structures::Array2D;
use lahar_common::utils::Endianness;
use num_traits::AsPrimitive;
use std::fmt;
use std::io::{Error, ErrorKind};
use std::ops::{Index, IndexMut};
use std::path::Path;

/// A single-band floating point (or integer-backed) grid, stored row-major.
#[derive(Default, Clone)]
pub struct Raster {
    pub file_name: String,
    pub configs: RasterConfigs,
    pub data: Vec<f64>,
}

impl Index<(isize, isize)> for Raster {
    type Output = f64;

    fn index(&self, index: (isize, isize)) -> &f64 {
        let (row, col) = index;
        if row < 0 || col < 0 || row as usize >= self.configs.rows || col as usize >= self.configs.columns {
            return &self.configs.nodata;
        }
        &self.data[row as usize * self.configs.columns + col as usize]
    }
}

impl IndexMut<(isize, isize)> for Raster {
    fn index_mut(&mut self, index: (isize, isize)) -> &mut f64 {
        let (row, col) = index;
        &mut self.data[row as usize * self.configs.columns + col as usize]
    }
}

impl Raster {
    /// Reads an existing GeoTIFF from disk.
    pub fn new(file_name: &str) -> Result<Raster, Error> {
        let (configs, data) = geotiff::read_geotiff(file_name)?;
        Ok(Raster {
            file_name: file_name.to_string(),
            configs,
            data,
        })
    }

    /// Creates a blank raster sharing `other`'s georeferencing, filled with nodata.
    pub fn initialize_using_file(file_name: &str, other: &Raster) -> Raster {
        let mut configs = other.configs.clone();
        configs.title = Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let n = configs.rows * configs.columns;
        Raster {
            file_name: file_name.to_string(),
            data: vec![configs.nodata; n],
            configs,
        }
    }

    /// Creates a raster from an `Array2D`, e.g. after building a level raster in memory.
    pub fn initialize_using_array2d<T: AsPrimitive<f64>>(
        file_name: &str,
        other: &Raster,
        array: &Array2D<T>,
    ) -> Raster {
        let mut r = Raster::initialize_using_file(file_name, other);
        for row in 0..r.configs.rows as isize {
            for col in 0..r.configs.columns as isize {
                r[(row, col)] = array.get_value(row, col).as_();
            }
        }
        r
    }

    pub fn get_value(&self, row: isize, col: isize) -> f64 {
        self[(row, col)]
    }

    pub fn set_value(&mut self, row: isize, col: isize, value: f64) {
        if row < 0 || col < 0 || row as usize >= self.configs.rows || col as usize >= self.configs.columns {
            return;
        }
        self[(row, col)] = value;
    }

    pub fn get_row_data(&self, row: isize) -> Vec<f64> {
        let cols = self.configs.columns;
        let start = row as usize * cols;
        self.data[start..start + cols].to_vec()
    }

    pub fn set_row_data(&mut self, row: isize, data: Vec<f64>) {
        let cols = self.configs.columns;
        let start = row as usize * cols;
        self.data[start..start + cols].copy_from_slice(&data);
    }

    pub fn num_cells(&self) -> usize {
        self.configs.rows * self.configs.columns
    }

    /// Column index of an x-coordinate, per the affine transform implied by north/south/east/west.
    pub fn get_column_from_x(&self, x: f64) -> isize {
        let xrange = self.configs.east - self.configs.west;
        (((x - self.configs.west) / xrange) * self.configs.columns as f64) as isize
    }

    pub fn get_row_from_y(&self, y: f64) -> isize {
        let yrange = self.configs.north - self.configs.south;
        ((self.configs.north - y) / yrange * self.configs.rows as f64) as isize
    }

    pub fn get_x_from_column(&self, col: isize) -> f64 {
        self.configs.west + (col as f64 + 0.5) * self.configs.resolution_x
    }

    pub fn get_y_from_row(&self, row: isize) -> f64 {
        self.configs.north - (row as f64 + 0.5) * self.configs.resolution_y
    }

    pub fn add_metadata_entry(&mut self, value: String) {
        self.configs.metadata.push(value);
    }

    pub fn write(&mut self) -> Result<(), Error> {
        if !self.file_name.to_lowercase().ends_with(".tif") && !self.file_name.to_lowercase().ends_with(".tiff") {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Only GeoTIFF (.tif) output is supported.",
            ));
        }
        geotiff::write_geotiff(self)
    }

    /// As `write`, but Deflate-compresses the output strip. The batch
    /// driver uses this for inundation-level rasters when
    /// `Configs::compress_rasters` is set.
    pub fn write_compressed(&mut self) -> Result<(), Error> {
        if !self.file_name.to_lowercase().ends_with(".tif") && !self.file_name.to_lowercase().ends_with(".tiff") {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Only GeoTIFF (.tif) output is supported.",
            ));
        }
        geotiff::write_geotiff_compressed(self)
    }
}

/// Raster metadata: dimensions, georeferencing, and value semantics.
#[derive(Clone)]
pub struct RasterConfigs {
    pub title: String,
    pub rows: usize,
    pub columns: usize,
    pub nodata: f64,
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
    pub resolution_x: f64,
    pub resolution_y: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub data_type: DataType,
    pub endian: Endianness,
    pub epsg_code: u16,
    pub z_units: String,
    pub xy_units: String,
    pub metadata: Vec<String>,
}

impl Default for RasterConfigs {
    fn default() -> RasterConfigs {
        RasterConfigs {
            title: String::new(),
            rows: 0,
            columns: 0,
            nodata: -32768.0f64,
            north: 0f64,
            south: 0f64,
            east: 0f64,
            west: 0f64,
            resolution_x: 0f64,
            resolution_y: 0f64,
            minimum: f64::INFINITY,
            maximum: f64::NEG_INFINITY,
            data_type: DataType::F32,
            endian: Endianness::LittleEndian,
            epsg_code: 0u16,
            z_units: "not specified".to_string(),
            xy_units: "not specified".to_string(),
            metadata: vec![],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    F32,
    F64,
    I16,
    I32,
    U8,
}

impl DataType {
    pub fn get_data_size(&self) -> usize {
        match *self {
            DataType::F64 => 8,
            DataType::F32 | DataType::I32 => 4,
            DataType::I16 => 2,
            DataType::U8 => 1,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(*self, DataType::F32 | DataType::F64)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match *self {
            DataType::F64 => "F64",
            DataType::F32 => "F32",
            DataType::I32 => "I32",
            DataType::I16 => "I16",
            DataType::U8 => "U8",
        };
        write!(f, "{}", s)
    }
}
