//! Minimal GeoTIFF reader/writer.
//!
//! Trimmed from a reader that understood tiled images, six compression
//! schemes, and every sample layout TIFF allows, down to what the
//! inundation engine's inputs and outputs actually use: single-band,
//! strip-organized, stored either uncompressed or Deflate-compressed.

use crate::{DataType, Raster, RasterConfigs};
use lahar_common::utils::{ByteOrderReader, ByteOrderWriter, Endianness};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Error, ErrorKind};

const TAG_IMAGE_WIDTH: u16 = 256;
const TAG_IMAGE_LENGTH: u16 = 257;
const TAG_BITS_PER_SAMPLE: u16 = 258;
const TAG_COMPRESSION: u16 = 259;
const TAG_PHOTOMETRIC: u16 = 262;
const TAG_STRIP_OFFSETS: u16 = 273;
const TAG_SAMPLES_PER_PIXEL: u16 = 277;
const TAG_ROWS_PER_STRIP: u16 = 278;
const TAG_STRIP_BYTE_COUNTS: u16 = 279;
const TAG_PLANAR_CONFIG: u16 = 284;
const TAG_SAMPLE_FORMAT: u16 = 339;
const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
const TAG_MODEL_TIEPOINT: u16 = 33922;
const TAG_GEO_KEY_DIRECTORY: u16 = 34735;
const TAG_GDAL_NODATA: u16 = 42113;

const TYPE_BYTE: u16 = 1;
const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_RATIONAL: u16 = 5;
const TYPE_DOUBLE: u16 = 12;

struct IfdEntry {
    tag: u16,
    field_type: u16,
    count: u32,
    value_offset: u32,
}

fn type_size(field_type: u16) -> usize {
    match field_type {
        TYPE_BYTE | TYPE_ASCII => 1,
        TYPE_SHORT => 2,
        TYPE_LONG => 4,
        TYPE_RATIONAL => 8,
        TYPE_DOUBLE => 8,
        _ => 1,
    }
}

/// Reads a GeoTIFF file into a `Raster`, decoding strip data and recovering
/// the affine transform from the ModelPixelScale/ModelTiepoint tags.
pub fn read_geotiff(file_name: &str) -> Result<(RasterConfigs, Vec<f64>), Error> {
    let f = File::open(file_name)?;
    let br = BufReader::new(f);
    let mut th = ByteOrderReader::<BufReader<File>>::new(br, Endianness::LittleEndian);

    let b1 = th.read_u8()?;
    let b2 = th.read_u8()?;
    let endian = if b1 == 73 && b2 == 73 {
        Endianness::LittleEndian
    } else if b1 == 77 && b2 == 77 {
        Endianness::BigEndian
    } else {
        return Err(Error::new(
            ErrorKind::InvalidData,
            "Not a recognized TIFF byte-order marker.",
        ));
    };
    th.set_byte_order(endian);

    let magic = th.read_u16()?;
    if magic != 42 {
        return Err(Error::new(ErrorKind::InvalidData, "Not a TIFF file."));
    }

    let ifd_offset = th.read_u32()?;
    th.seek(ifd_offset as usize);

    let num_entries = th.read_u16()?;
    let mut entries: Vec<IfdEntry> = Vec::with_capacity(num_entries as usize);
    for _ in 0..num_entries {
        let tag = th.read_u16()?;
        let field_type = th.read_u16()?;
        let count = th.read_u32()?;
        let value_offset = th.read_u32()?;
        entries.push(IfdEntry {
            tag,
            field_type,
            count,
            value_offset,
        });
    }

    // Read every entry's payload, resolving out-of-line values by offset.
    let mut shorts: HashMap<u16, Vec<u16>> = HashMap::new();
    let mut longs: HashMap<u16, Vec<u32>> = HashMap::new();
    let mut doubles: HashMap<u16, Vec<f64>> = HashMap::new();
    let mut ascii: HashMap<u16, String> = HashMap::new();

    for e in &entries {
        let total_bytes = type_size(e.field_type) * e.count as usize;
        let inline = total_bytes <= 4;
        let start = if inline {
            th.seek(0);
            None
        } else {
            Some(e.value_offset as usize)
        };
        match e.field_type {
            TYPE_SHORT => {
                let mut vals = Vec::with_capacity(e.count as usize);
                if inline {
                    vals.push((e.value_offset & 0xFFFF) as u16);
                    if e.count == 2 {
                        vals.push((e.value_offset >> 16) as u16);
                    }
                } else {
                    th.seek(start.unwrap());
                    for _ in 0..e.count {
                        vals.push(th.read_u16()?);
                    }
                }
                shorts.insert(e.tag, vals);
            }
            TYPE_LONG => {
                let mut vals = Vec::with_capacity(e.count as usize);
                if inline {
                    vals.push(e.value_offset);
                } else {
                    th.seek(start.unwrap());
                    for _ in 0..e.count {
                        vals.push(th.read_u32()?);
                    }
                }
                longs.insert(e.tag, vals);
            }
            TYPE_DOUBLE => {
                th.seek(start.unwrap_or(e.value_offset as usize));
                let mut vals = Vec::with_capacity(e.count as usize);
                for _ in 0..e.count {
                    vals.push(th.read_f64()?);
                }
                doubles.insert(e.tag, vals);
            }
            TYPE_ASCII => {
                th.seek(start.unwrap_or(e.value_offset as usize));
                ascii.insert(e.tag, th.read_utf8(e.count as usize));
            }
            _ => {}
        }
    }

    let columns = longs
        .get(&TAG_IMAGE_WIDTH)
        .and_then(|v| v.first().copied())
        .or_else(|| shorts.get(&TAG_IMAGE_WIDTH).and_then(|v| v.first().map(|x| *x as u32)))
        .ok_or_else(|| Error::new(ErrorKind::InvalidData, "Missing ImageWidth tag."))? as usize;

    let rows = longs
        .get(&TAG_IMAGE_LENGTH)
        .and_then(|v| v.first().copied())
        .or_else(|| shorts.get(&TAG_IMAGE_LENGTH).and_then(|v| v.first().map(|x| *x as u32)))
        .ok_or_else(|| Error::new(ErrorKind::InvalidData, "Missing ImageLength tag."))? as usize;

    let bits_per_sample = *shorts
        .get(&TAG_BITS_PER_SAMPLE)
        .and_then(|v| v.first())
        .unwrap_or(&32);
    let sample_format = *shorts.get(&TAG_SAMPLE_FORMAT).and_then(|v| v.first()).unwrap_or(&1);
    let compression = *shorts.get(&TAG_COMPRESSION).and_then(|v| v.first()).unwrap_or(&1);
    let samples_per_pixel = *shorts
        .get(&TAG_SAMPLES_PER_PIXEL)
        .and_then(|v| v.first())
        .unwrap_or(&1);
    if samples_per_pixel != 1 {
        return Err(Error::new(
            ErrorKind::InvalidData,
            "Only single-band GeoTIFFs are supported.",
        ));
    }
    let planar_config = *shorts.get(&TAG_PLANAR_CONFIG).and_then(|v| v.first()).unwrap_or(&1);
    if planar_config != 1 {
        return Err(Error::new(
            ErrorKind::InvalidData,
            "Only PlanarConfiguration=1 (chunky) is supported.",
        ));
    }

    let data_type = match (bits_per_sample, sample_format) {
        (64, 3) => DataType::F64,
        (32, 3) => DataType::F32,
        (32, _) => DataType::I32,
        (16, _) => DataType::I16,
        (8, _) => DataType::U8,
        _ => {
            return Err(Error::new(
                ErrorKind::InvalidData,
                "Unsupported BitsPerSample/SampleFormat combination.",
            ))
        }
    };

    let rows_per_strip = longs
        .get(&TAG_ROWS_PER_STRIP)
        .and_then(|v| v.first().copied())
        .or_else(|| shorts.get(&TAG_ROWS_PER_STRIP).and_then(|v| v.first().map(|x| *x as u32)))
        .unwrap_or(rows as u32) as usize;
    let strip_offsets = longs
        .get(&TAG_STRIP_OFFSETS)
        .cloned()
        .or_else(|| shorts.get(&TAG_STRIP_OFFSETS).map(|v| v.iter().map(|x| *x as u32).collect()))
        .ok_or_else(|| Error::new(ErrorKind::InvalidData, "Missing StripOffsets tag."))?;
    let strip_byte_counts = longs
        .get(&TAG_STRIP_BYTE_COUNTS)
        .cloned()
        .or_else(|| {
            shorts
                .get(&TAG_STRIP_BYTE_COUNTS)
                .map(|v| v.iter().map(|x| *x as u32).collect())
        })
        .ok_or_else(|| Error::new(ErrorKind::InvalidData, "Missing StripByteCounts tag."))?;

    let sample_bytes = bits_per_sample as usize / 8;
    let mut raw: Vec<u8> = Vec::with_capacity(rows * columns * sample_bytes);
    for (i, &offset) in strip_offsets.iter().enumerate() {
        let count = strip_byte_counts[i] as usize;
        th.seek(offset as usize);
        let mut buf = vec![0u8; count];
        th.read_exact(&mut buf)?;
        let decoded = match compression {
            1 => buf,
            8 | 32946 => miniz_oxide::inflate::decompress_to_vec_zlib(&buf)
                .map_err(|_| Error::new(ErrorKind::InvalidData, "Deflate decompression failed."))?,
            5 => {
                let strip_rows = rows_per_strip.min(rows - i * rows_per_strip);
                let expected = strip_rows * columns * sample_bytes;
                let mut decoder = lzw::DecoderEarlyChange::new(lzw::MsbReader::new(), 8);
                let mut out = Vec::with_capacity(expected);
                let mut input = &buf[..];
                while !input.is_empty() && out.len() < expected {
                    let (consumed, chunk) = decoder
                        .decode_bytes(input)
                        .map_err(|_| Error::new(ErrorKind::InvalidData, "LZW decode failed."))?;
                    out.extend_from_slice(chunk);
                    input = &input[consumed..];
                }
                out
            }
            other => {
                return Err(Error::new(
                    ErrorKind::InvalidData,
                    format!("Unsupported TIFF compression scheme: {}", other),
                ))
            }
        };
        raw.extend_from_slice(&decoded);
    }

    let mut data = Vec::with_capacity(rows * columns);
    let mut reader = ByteOrderReader::<std::io::Cursor<Vec<u8>>>::new(std::io::Cursor::new(raw), endian);
    for _ in 0..(rows * columns) {
        let v = match data_type {
            DataType::F64 => reader.read_f64()?,
            DataType::F32 => reader.read_f32()? as f64,
            DataType::I32 => reader.read_i32()? as f64,
            DataType::I16 => reader.read_i16()? as f64,
            DataType::U8 => reader.read_u8()? as f64,
        };
        data.push(v);
    }

    let pixel_scale = doubles.get(&TAG_MODEL_PIXEL_SCALE).cloned().unwrap_or(vec![1.0, 1.0, 0.0]);
    let tiepoint = doubles
        .get(&TAG_MODEL_TIEPOINT)
        .cloned()
        .unwrap_or(vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    let resolution_x = pixel_scale[0];
    let resolution_y = pixel_scale[1];
    let west = tiepoint[3];
    let north = tiepoint[4];
    let east = west + resolution_x * columns as f64;
    let south = north - resolution_y * rows as f64;

    let nodata = ascii
        .get(&TAG_GDAL_NODATA)
        .and_then(|s| s.trim_matches(char::from(0)).trim().parse::<f64>().ok())
        .unwrap_or(RasterConfigs::default().nodata);

    // GeoKeyDirectoryTag parsing (CRS identification) isn't needed by the
    // engine, which only consumes the affine transform; the tag is carried
    // through on write but not decoded back into an EPSG code here.
    let epsg_code: u16 = 0;

    let mut min_val = f64::INFINITY;
    let mut max_val = f64::NEG_INFINITY;
    for &v in &data {
        if v != nodata {
            if v < min_val {
                min_val = v;
            }
            if v > max_val {
                max_val = v;
            }
        }
    }

    let configs = RasterConfigs {
        title: std::path::Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default(),
        rows,
        columns,
        nodata,
        north,
        south,
        east,
        west,
        resolution_x,
        resolution_y,
        minimum: min_val,
        maximum: max_val,
        data_type,
        endian,
        epsg_code,
        z_units: "not specified".to_string(),
        xy_units: "not specified".to_string(),
        metadata: vec![],
    };

    Ok((configs, data))
}

/// Writes `r` to `r.file_name` as a single-strip GeoTIFF. Compression is
/// Deflate when the raster's data type benefits from it (integer class
/// rasters compress well; elevation data is left uncompressed upstream).
pub fn write_geotiff(r: &mut Raster) -> Result<(), Error> {
    write_geotiff_impl(r, false)
}

/// As `write_geotiff`, but Deflate-compresses the strip. Used for the
/// integer inundation-level rasters, which are highly repetitive.
pub fn write_geotiff_compressed(r: &mut Raster) -> Result<(), Error> {
    write_geotiff_impl(r, true)
}

fn write_geotiff_impl(r: &mut Raster, compress: bool) -> Result<(), Error> {
    let f = File::create(&r.file_name)?;
    let bw = BufWriter::new(f);
    let mut w = ByteOrderWriter::<BufWriter<File>>::new(bw, r.configs.endian);

    let is_le = r.configs.endian == Endianness::LittleEndian;
    w.write_u8(if is_le { 73 } else { 77 })?;
    w.write_u8(if is_le { 73 } else { 77 })?;
    w.write_u16(42)?;

    let rows = r.configs.rows as u32;
    let columns = r.configs.columns as u32;
    let sample_bytes = r.configs.data_type.get_data_size();
    let bits_per_sample = sample_bytes as u16 * 8;
    let sample_format: u16 = if r.configs.data_type.is_float() { 3 } else { 2 };

    let raw = {
        let mut body = ByteOrderWriter::<Vec<u8>>::new(Vec::with_capacity(r.data.len() * sample_bytes), r.configs.endian);
        for &v in &r.data {
            match r.configs.data_type {
                DataType::F64 => body.write_f64(v)?,
                DataType::F32 => body.write_f32(v as f32)?,
                DataType::I32 => body.write_i32(v as i32)?,
                DataType::I16 => body.write_i16(v as i16)?,
                DataType::U8 => body.write_u8(v as u8)?,
            }
        }
        body.into_inner()
    };

    let strip_data = if compress {
        miniz_oxide::deflate::compress_to_vec_zlib(&raw, 6)
    } else {
        raw
    };

    let nodata_str = format!("{}", r.configs.nodata);

    // IFD offset placeholder: header is 8 bytes, strip data follows, then
    // the IFD, then any out-of-line tag values.
    let strip_offset: u32 = 8;
    let ifd_offset: u32 = strip_offset + strip_data.len() as u32;

    w.write_u32(ifd_offset)?;
    w.write_bytes(&strip_data)?;

    // Tags needing out-of-line storage are appended after the IFD.
    let geo_key_dir: Vec<u16> = vec![1, 1, 0, 1, 1024, 0, 1, 2];
    let pixel_scale = vec![r.configs.resolution_x, r.configs.resolution_y, 0.0];
    let tiepoint = vec![0.0, 0.0, 0.0, r.configs.west, r.configs.north, 0.0];

    let mut entries: Vec<(u16, u16, u32, Vec<u8>)> = Vec::new();
    entries.push((TAG_IMAGE_WIDTH, TYPE_LONG, 1, columns.to_le_bytes().to_vec()));
    entries.push((TAG_IMAGE_LENGTH, TYPE_LONG, 1, rows.to_le_bytes().to_vec()));
    entries.push((TAG_BITS_PER_SAMPLE, TYPE_SHORT, 1, bits_per_sample.to_le_bytes().to_vec()));
    entries.push((
        TAG_COMPRESSION,
        TYPE_SHORT,
        1,
        (if compress { 8u16 } else { 1u16 }).to_le_bytes().to_vec(),
    ));
    entries.push((TAG_PHOTOMETRIC, TYPE_SHORT, 1, 1u16.to_le_bytes().to_vec()));
    entries.push((TAG_STRIP_OFFSETS, TYPE_LONG, 1, strip_offset.to_le_bytes().to_vec()));
    entries.push((TAG_SAMPLES_PER_PIXEL, TYPE_SHORT, 1, 1u16.to_le_bytes().to_vec()));
    entries.push((TAG_ROWS_PER_STRIP, TYPE_LONG, 1, rows.to_le_bytes().to_vec()));
    entries.push((
        TAG_STRIP_BYTE_COUNTS,
        TYPE_LONG,
        1,
        (strip_data.len() as u32).to_le_bytes().to_vec(),
    ));
    entries.push((TAG_PLANAR_CONFIG, TYPE_SHORT, 1, 1u16.to_le_bytes().to_vec()));
    entries.push((TAG_SAMPLE_FORMAT, TYPE_SHORT, 1, sample_format.to_le_bytes().to_vec()));

    let mut pixel_scale_bytes = Vec::with_capacity(24);
    for v in &pixel_scale {
        pixel_scale_bytes.extend_from_slice(&v.to_le_bytes());
    }
    entries.push((TAG_MODEL_PIXEL_SCALE, TYPE_DOUBLE, 3, pixel_scale_bytes));

    let mut tiepoint_bytes = Vec::with_capacity(48);
    for v in &tiepoint {
        tiepoint_bytes.extend_from_slice(&v.to_le_bytes());
    }
    entries.push((TAG_MODEL_TIEPOINT, TYPE_DOUBLE, 6, tiepoint_bytes));

    let mut geo_key_bytes = Vec::with_capacity(geo_key_dir.len() * 2);
    for v in &geo_key_dir {
        geo_key_bytes.extend_from_slice(&v.to_le_bytes());
    }
    entries.push((TAG_GEO_KEY_DIRECTORY, TYPE_SHORT, geo_key_dir.len() as u32, geo_key_bytes));

    let mut nodata_bytes = nodata_str.clone().into_bytes();
    nodata_bytes.push(0);
    entries.push((TAG_GDAL_NODATA, TYPE_ASCII, nodata_bytes.len() as u32, nodata_bytes));

    entries.sort_by_key(|e| e.0);

    // Lay out out-of-line value blocks right after the IFD.
    let ifd_size = 2 + entries.len() * 12 + 4;
    let mut overflow_offset = ifd_offset + ifd_size as u32;
    let mut overflow_blocks: Vec<(usize, Vec<u8>)> = Vec::new();
    let mut resolved: Vec<(u16, u16, u32, u32)> = Vec::new();
    for (i, (tag, field_type, count, bytes)) in entries.iter().enumerate() {
        if bytes.len() <= 4 {
            let mut inline = bytes.clone();
            inline.resize(4, 0);
            let value = u32::from_le_bytes([inline[0], inline[1], inline[2], inline[3]]);
            resolved.push((*tag, *field_type, *count, value));
        } else {
            resolved.push((*tag, *field_type, *count, overflow_offset));
            overflow_blocks.push((i, bytes.clone()));
            overflow_offset += bytes.len() as u32;
        }
    }

    w.write_u16(resolved.len() as u16)?;
    for (tag, field_type, count, value) in &resolved {
        w.write_u16(*tag)?;
        w.write_u16(*field_type)?;
        w.write_u32(*count)?;
        w.write_u32(*value)?;
    }
    w.write_u32(0)?; // no next IFD

    for (_, bytes) in &overflow_blocks {
        w.write_bytes(bytes)?;
    }

    Ok(())
}
