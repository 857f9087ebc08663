/*
This code is part of the lahar inundation modelling toolkit, adapted from
the WhiteboxTools geospatial analysis library.
License: MIT

Trimmed to the shape types the inundation-footprint writer actually
produces: Null, Point, PolyLine, and Polygon. The Z/M variants the
original format supports carry no meaning for a 2-D level raster.
*/
use lahar_common::structures::Point2D;
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub enum ShapeType {
    #[default]
    Null,
    Point,
    PolyLine,
    Polygon,
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match *self {
            ShapeType::Null => "Null",
            ShapeType::Point => "Point",
            ShapeType::PolyLine => "PolyLine",
            ShapeType::Polygon => "Polygon",
        };
        write!(f, "{}", s)
    }
}

impl ShapeType {
    pub fn from_int(value: i32) -> ShapeType {
        match value {
            1 => ShapeType::Point,
            3 => ShapeType::PolyLine,
            5 => ShapeType::Polygon,
            _ => ShapeType::Null,
        }
    }

    pub fn to_int(&self) -> i32 {
        match *self {
            ShapeType::Null => 0,
            ShapeType::Point => 1,
            ShapeType::PolyLine => 3,
            ShapeType::Polygon => 5,
        }
    }
}

/// A single shapefile geometry record: a point, or a part/point collection
/// for a polyline or polygon.
#[derive(Debug, Clone, Default)]
pub struct ShapefileGeometry {
    pub shape_type: ShapeType,
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
    pub num_parts: i32,
    pub num_points: i32,
    pub parts: Vec<i32>,
    pub points: Vec<Point2D>,
}

impl ShapefileGeometry {
    pub fn new(shape_type: ShapeType) -> ShapefileGeometry {
        ShapefileGeometry {
            shape_type,
            ..Default::default()
        }
    }

    /// Appends a new ring (or line part) starting at the current point count.
    pub fn add_part(&mut self, points: &[Point2D]) {
        self.parts.push(self.points.len() as i32);
        self.num_parts += 1;
        for p in points {
            self.add_point(*p);
        }
    }

    pub fn add_point(&mut self, p: Point2D) {
        if self.points.is_empty() {
            self.x_min = p.x;
            self.x_max = p.x;
            self.y_min = p.y;
            self.y_max = p.y;
        } else {
            if p.x < self.x_min {
                self.x_min = p.x;
            }
            if p.x > self.x_max {
                self.x_max = p.x;
            }
            if p.y < self.y_min {
                self.y_min = p.y;
            }
            if p.y > self.y_max {
                self.y_max = p.y;
            }
        }
        self.points.push(p);
        self.num_points += 1;
    }

    /// Length, in bytes, of the record's content (excluding the 8-byte
    /// record header), as required when filling in the .shp/.shx files.
    pub fn get_length(&self) -> i32 {
        match self.shape_type {
            ShapeType::Null => 4,
            ShapeType::Point => 4 + 16,
            ShapeType::PolyLine | ShapeType::Polygon => {
                4 + 32 + 4 + 4 + 4 * self.num_parts + 16 * self.num_points
            }
        }
    }
}
