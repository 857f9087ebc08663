/*
This code is part of the lahar inundation modelling toolkit, adapted from
the WhiteboxTools geospatial analysis library.
Authors: Dr. John Lindsay (original); adapted for lahar-vector.
License: MIT

Notes: write-only support for the ESRI Shapefile format. The engine never
needs to read vector data back in, so the reader half of the original
module (and the Z/M shape variants it exercised) is not carried over.
*/

pub mod attributes;
pub mod geometry;

use self::attributes::*;
use self::geometry::*;
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use chrono::prelude::*;
use std::fmt;
use std::fs::File;
use std::io::prelude::*;
use std::io::{BufWriter, Error, ErrorKind};
use std::path::Path;

#[derive(Debug, Default, Clone)]
pub struct ShapefileHeader {
    pub file_length: i32,
    pub version: i32,
    pub shape_type: ShapeType,
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
    pub z_min: f64,
    pub z_max: f64,
    pub m_min: f64,
    pub m_max: f64,
}

impl fmt::Display for ShapefileHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "shape_type: {}\nx_min: {}\nx_max: {}\ny_min: {}\ny_max: {}",
            self.shape_type, self.x_min, self.x_max, self.y_min, self.y_max
        )
    }
}

/// An in-memory, write-only ESRI Shapefile: geometry (.shp/.shx), attribute
/// table (.dbf), and an optional projection (.prj).
#[derive(Default, Clone)]
pub struct Shapefile {
    pub file_name: String,
    pub header: ShapefileHeader,
    pub num_records: usize,
    pub records: Vec<ShapefileGeometry>,
    pub attributes: ShapefileAttributes,
    pub projection: String,
}

impl Shapefile {
    pub fn new(file_name: &str, shape_type: ShapeType) -> Result<Shapefile, Error> {
        let new_file_name = if file_name.contains('.') {
            file_name.to_string()
        } else {
            format!("{}.shp", file_name)
        };
        let mut sf = Shapefile {
            file_name: new_file_name,
            ..Default::default()
        };
        sf.header.shape_type = shape_type;
        Ok(sf)
    }

    pub fn add_record(&mut self, geometry: ShapefileGeometry) {
        if geometry.shape_type == self.header.shape_type {
            self.records.push(geometry);
            self.num_records += 1;
        } else {
            panic!("Attempt to add a ShapefileGeometry record of the wrong ShapeType.");
        }
    }

    pub fn write(&mut self) -> Result<(), Error> {
        self.num_records = self.records.len();
        if self.num_records == 0 {
            return Err(Error::new(
                ErrorKind::Other,
                "The shapefile does not currently contain any record data.",
            ));
        }

        self.calculate_extent();
        self.write_shp()?;
        self.write_shx()?;
        self.write_prj()?;
        self.write_dbf()?;

        Ok(())
    }

    fn write_shp(&self) -> Result<(), Error> {
        let f = File::create(&self.file_name)?;
        let mut writer = BufWriter::new(f);

        writer.write_i32::<BigEndian>(9994i32)?;
        for _ in 0..5 {
            writer.write_i32::<BigEndian>(0i32)?;
        }
        let mut size = 100i32;
        for rec in &self.records {
            size += 8 + rec.get_length();
        }
        writer.write_i32::<BigEndian>(size / 2)?;

        writer.write_i32::<LittleEndian>(1000i32)?;
        writer.write_i32::<LittleEndian>(self.header.shape_type.to_int())?;
        writer.write_f64::<LittleEndian>(self.header.x_min)?;
        writer.write_f64::<LittleEndian>(self.header.y_min)?;
        writer.write_f64::<LittleEndian>(self.header.x_max)?;
        writer.write_f64::<LittleEndian>(self.header.y_max)?;
        writer.write_f64::<LittleEndian>(self.header.z_min)?;
        writer.write_f64::<LittleEndian>(self.header.z_max)?;
        writer.write_f64::<LittleEndian>(self.header.m_min)?;
        writer.write_f64::<LittleEndian>(self.header.m_max)?;

        for (i, rec) in self.records.iter().enumerate() {
            writer.write_i32::<BigEndian>(i as i32 + 1)?;
            writer.write_i32::<BigEndian>(rec.get_length() / 2)?;
            writer.write_i32::<LittleEndian>(rec.shape_type.to_int())?;

            match rec.shape_type {
                ShapeType::Null => {}
                ShapeType::Point => {
                    writer.write_f64::<LittleEndian>(rec.points[0].x)?;
                    writer.write_f64::<LittleEndian>(rec.points[0].y)?;
                }
                ShapeType::PolyLine | ShapeType::Polygon => {
                    writer.write_f64::<LittleEndian>(rec.x_min)?;
                    writer.write_f64::<LittleEndian>(rec.y_min)?;
                    writer.write_f64::<LittleEndian>(rec.x_max)?;
                    writer.write_f64::<LittleEndian>(rec.y_max)?;
                    writer.write_i32::<LittleEndian>(rec.num_parts)?;
                    writer.write_i32::<LittleEndian>(rec.num_points)?;
                    for part in &rec.parts {
                        writer.write_i32::<LittleEndian>(*part)?;
                    }
                    for pt in &rec.points {
                        writer.write_f64::<LittleEndian>(pt.x)?;
                        writer.write_f64::<LittleEndian>(pt.y)?;
                    }
                }
            }
        }

        Ok(())
    }

    fn write_shx(&self) -> Result<(), Error> {
        let index_file = Path::new(&self.file_name)
            .with_extension("shx")
            .into_os_string()
            .into_string()
            .unwrap();
        let f = File::create(&index_file)?;
        let mut writer = BufWriter::new(f);

        writer.write_i32::<BigEndian>(9994i32)?;
        for _ in 0..5 {
            writer.write_i32::<BigEndian>(0i32)?;
        }
        let file_length = (100 + 8 * self.num_records) as i32 / 2;
        writer.write_i32::<BigEndian>(file_length)?;
        writer.write_i32::<LittleEndian>(1000i32)?;
        writer.write_i32::<LittleEndian>(self.header.shape_type.to_int())?;
        writer.write_f64::<LittleEndian>(self.header.x_min)?;
        writer.write_f64::<LittleEndian>(self.header.y_min)?;
        writer.write_f64::<LittleEndian>(self.header.x_max)?;
        writer.write_f64::<LittleEndian>(self.header.y_max)?;
        writer.write_f64::<LittleEndian>(self.header.z_min)?;
        writer.write_f64::<LittleEndian>(self.header.z_max)?;
        writer.write_f64::<LittleEndian>(self.header.m_min)?;
        writer.write_f64::<LittleEndian>(self.header.m_max)?;

        let mut pos = 100i32;
        for rec in &self.records {
            writer.write_i32::<BigEndian>(pos / 2)?;
            writer.write_i32::<BigEndian>(rec.get_length() / 2)?;
            pos += 8 + rec.get_length();
        }

        Ok(())
    }

    fn write_prj(&self) -> Result<(), Error> {
        if self.projection.is_empty() {
            return Ok(());
        }
        let prj_file = Path::new(&self.file_name)
            .with_extension("prj")
            .into_os_string()
            .into_string()
            .unwrap();
        let f = File::create(&prj_file)?;
        let mut writer = BufWriter::new(f);
        writer.write_all(self.projection.as_bytes())
    }

    fn write_dbf(&mut self) -> Result<(), Error> {
        let dbf_file = Path::new(&self.file_name)
            .with_extension("dbf")
            .into_os_string()
            .into_string()
            .unwrap();
        let f = File::create(&dbf_file)?;
        let mut writer = BufWriter::new(f);

        self.attributes.stamp_today();
        writer.write_u8(3u8)?;
        writer.write_u8((self.attributes.header.year as i32 - 1900) as u8)?;
        writer.write_u8(self.attributes.header.month)?;
        writer.write_u8(self.attributes.header.day)?;

        writer.write_u32::<LittleEndian>(self.attributes.header.num_records)?;
        let header_size = 32u16 + self.attributes.header.num_fields as u16 * 32u16 + 1u16;
        self.attributes.header.bytes_in_header = header_size;
        writer.write_u16::<LittleEndian>(header_size)?;

        let mut bytes_in_record = 1u16; // leading deletion flag byte
        for field in &self.attributes.fields {
            bytes_in_record += field.field_length as u16;
        }
        self.attributes.header.bytes_in_record = bytes_in_record;
        writer.write_u16::<LittleEndian>(bytes_in_record)?;

        for _ in 0..20 {
            writer.write_u8(0u8)?;
        }

        for field in &self.attributes.fields {
            let mut s = field.name.clone();
            if s.len() > 10 {
                s.truncate(10);
            }
            for _ in s.len()..11 {
                s.push(char::from(0));
            }
            writer.write_all(s.as_bytes())?;
            writer.write_u8(field.field_type.as_xbase_char())?;
            for _ in 0..4 {
                writer.write_u8(0u8)?;
            }
            writer.write_u8(field.field_length)?;
            writer.write_u8(field.decimal_count)?;
            for _ in 0..14 {
                writer.write_u8(0u8)?;
            }
        }
        writer.write_u8(0x0D)?;

        for i in 0..self.attributes.header.num_records as usize {
            writer.write_u8(if self.attributes.is_deleted[i] { 0x2A } else { 0x20 })?;
            let rec = self.attributes.get_record(i);
            for (j, field) in self.attributes.fields.iter().enumerate() {
                let fl = field.field_length as usize;
                match &rec[j] {
                    FieldData::Null => {
                        writer.write_all(" ".repeat(fl).as_bytes())?;
                    }
                    FieldData::Int(v) => {
                        let b = v.to_string();
                        if b.len() < fl {
                            writer.write_all(format!("{}{}", " ".repeat(fl - b.len()), b).as_bytes())?;
                        } else if b.len() > fl {
                            writer.write_all(b[b.len() - fl..].as_bytes())?;
                        } else {
                            writer.write_all(b.as_bytes())?;
                        }
                    }
                    FieldData::Real(v) => {
                        let dc = field.decimal_count as usize;
                        let mut s = format!("{:.*}", dc, v);
                        if s.len() < fl {
                            s = format!("{}{}", " ".repeat(fl - s.len()), s);
                        } else if s.len() > fl {
                            s.truncate(fl);
                        }
                        writer.write_all(s.as_bytes())?;
                    }
                    FieldData::Bool(v) => {
                        writer.write_all(if *v { b"T" } else { b"F" })?;
                    }
                    FieldData::Date(v) => {
                        writer.write_all(v.as_bytes())?;
                    }
                    FieldData::Text(v) => {
                        if v.len() < fl {
                            writer.write_all(format!("{}{}", v, " ".repeat(fl - v.len())).as_bytes())?;
                        } else if v.len() > fl {
                            writer.write_all(v[0..fl].as_bytes())?;
                        } else {
                            writer.write_all(v.as_bytes())?;
                        }
                    }
                }
            }
        }

        writer.write_u8(0x1A)?;

        Ok(())
    }

    fn calculate_extent(&mut self) {
        if self.records.is_empty() {
            return;
        }
        let mut x_min = f64::INFINITY;
        let mut y_min = f64::INFINITY;
        let mut x_max = f64::NEG_INFINITY;
        let mut y_max = f64::NEG_INFINITY;
        for rec in &self.records {
            if rec.shape_type == ShapeType::Null {
                continue;
            }
            x_min = x_min.min(rec.x_min);
            y_min = y_min.min(rec.y_min);
            x_max = x_max.max(rec.x_max);
            y_max = y_max.max(rec.y_max);
        }
        self.header.x_min = x_min;
        self.header.y_min = y_min;
        self.header.x_max = x_max;
        self.header.y_max = y_max;
    }
}
