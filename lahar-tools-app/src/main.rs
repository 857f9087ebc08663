/*
This code is part of the lahar inundation modelling toolkit, adapted from
the WhiteboxTools plugin host pattern.
License: MIT
*/

use lahar_common::structures::Array2D;
use lahar_core::{
    run_batch, GridTransform, PointOutcome, SkipReason, SourcePoint, WalkOutcome,
};
use lahar_raster::Raster;
use lahar_vector::{
    AttributeField, FieldData, FieldDataType, ShapeType, Shapefile, ShapefileGeometry,
};
use std::env;
use std::fs;
use std::io::{Error, ErrorKind};
use std::path::{self, Path};
use std::time::Instant;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() <= 1 || args[1].trim() == "help" {
        help();
        return;
    }

    if args[1].trim() == "version" {
        version();
        return;
    }

    if args[1].trim() == "run" {
        match run(&args) {
            Ok(_) => {}
            Err(e) => panic!("{:?}", e),
        }
    }
}

fn help() {
    let mut ext = "";
    if cfg!(target_os = "windows") {
        ext = ".exe";
    }
    let exe_name = &format!("lahar_tools{}", ext);
    let sep: String = path::MAIN_SEPARATOR.to_string();
    let s = r#"
    lahar_tools Help

    Predicts the ground footprint of a lahar from a filled DEM, a D8
    flow-direction raster, and a list of source points with flow volumes,
    using the energy-cone (LAHARZ-style) inundation model.

    The following commands are recognized:
    help       Prints help information.
    run        Runs the tool.
    version    Prints the tool version information.

    The following flags can be used with the 'run' command:
    --dem           Name of the input filled-DEM raster.
    --dir           Name of the input D8 flow-direction raster.
    --coordinates   Name of the input coordinate file (x,y[,volume] per line).
    --confidence    Confidence level: one of 50, 70, 80, 90, 95, 97.5, 99.
    --volume        Override volume applied to every source point (optional).
    --format        Output format: 'raster' (GeoTIFF) or 'vector' (Shapefile).
    --output_dir    Output directory (defaults to <dem_dir>/stream/).
    -v              Verbose mode.

    Example Usage:
    >> .*EXE_NAME run --dem=dem_fill.tif --dir=dem_pointer.tif --coordinates=coordinate.txt --confidence=95 --format=raster

    "#
    .replace("*", &sep)
    .replace("EXE_NAME", exe_name);
    println!("{}", s);
}

fn version() {
    const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");
    println!(
        "lahar_tools v{} (c) 2026 Lahar Tools Contributors.",
        VERSION.unwrap_or("Unknown version")
    );
}

#[derive(Clone, Copy)]
enum OutputFormat {
    Raster,
    Vector,
}

fn run(args: &[String]) -> Result<(), Error> {
    let sep: String = path::MAIN_SEPARATOR.to_string();
    let configurations = lahar_common::configs::get_configs()?;
    let mut working_directory = configurations.working_directory.clone();
    if !working_directory.is_empty() && !working_directory.ends_with(&sep) {
        working_directory += &sep;
    }

    let mut dem_file = String::new();
    let mut dir_file = String::new();
    let mut coordinates_file = String::new();
    let mut confidence: f64 = 95.0;
    let mut volume_override: Option<f64> = None;
    let mut output_dir = String::new();
    let mut format = OutputFormat::Raster;
    let mut verbose = configurations.verbose_mode;

    if args.len() <= 1 {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "Tool run with too few parameters.",
        ));
    }

    for i in 0..args.len() {
        let mut arg = args[i].replace('\"', "");
        arg = arg.replace('\'', "");
        let cmd = arg.split('=');
        let vec = cmd.collect::<Vec<&str>>();
        let keyval = vec.len() > 1;
        let flag_val = vec[0].to_lowercase().replace("--", "-");
        if flag_val == "-dem" {
            dem_file = if keyval { vec[1].to_string() } else { args[i + 1].to_string() };
        } else if flag_val == "-dir" {
            dir_file = if keyval { vec[1].to_string() } else { args[i + 1].to_string() };
        } else if flag_val == "-coordinates" {
            coordinates_file = if keyval { vec[1].to_string() } else { args[i + 1].to_string() };
        } else if flag_val == "-confidence" {
            confidence = if keyval { vec[1].to_string() } else { args[i + 1].to_string() }
                .parse::<f64>()
                .map_err(|_| Error::new(ErrorKind::InvalidInput, "Error parsing --confidence"))?;
        } else if flag_val == "-volume" {
            let v = if keyval { vec[1].to_string() } else { args[i + 1].to_string() }
                .parse::<f64>()
                .map_err(|_| Error::new(ErrorKind::InvalidInput, "Error parsing --volume"))?;
            volume_override = Some(v);
        } else if flag_val == "-format" {
            let f = if keyval { vec[1].to_string() } else { args[i + 1].to_string() };
            format = match f.to_lowercase().as_str() {
                "raster" | "tif" | "tiff" => OutputFormat::Raster,
                "vector" | "shp" => OutputFormat::Vector,
                other => {
                    return Err(Error::new(
                        ErrorKind::InvalidInput,
                        format!("Unrecognized --format value: {}", other),
                    ))
                }
            };
        } else if flag_val == "-output_dir" {
            output_dir = if keyval { vec[1].to_string() } else { args[i + 1].to_string() };
        } else if flag_val == "-v" {
            verbose = true;
        }
    }

    if dem_file.is_empty() || dir_file.is_empty() || coordinates_file.is_empty() {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "--dem, --dir, and --coordinates are all required.",
        ));
    }

    if !dem_file.contains(&sep) && !dem_file.contains('/') {
        dem_file = format!("{}{}", working_directory, dem_file);
    }
    if !dir_file.contains(&sep) && !dir_file.contains('/') {
        dir_file = format!("{}{}", working_directory, dir_file);
    }
    if !coordinates_file.contains(&sep) && !coordinates_file.contains('/') {
        coordinates_file = format!("{}{}", working_directory, coordinates_file);
    }

    if verbose {
        let tool_name = "LaharInundation";
        let welcome_len = format!("* Welcome to {} *", tool_name).len().max(28);
        println!("{}", "*".repeat(welcome_len));
        println!(
            "* Welcome to {} {}*",
            tool_name,
            " ".repeat(welcome_len - 15 - tool_name.len())
        );
        println!("* Powered by the lahar-tools engine {}*", " ".repeat(welcome_len.saturating_sub(36)));
        println!("{}", "*".repeat(welcome_len));
    }

    if verbose {
        println!("Reading DEM...");
    }
    let dem_raster = Raster::new(&dem_file)?;
    if verbose {
        println!("Reading flow-direction raster...");
    }
    let dir_raster = Raster::new(&dir_file)?;

    if dem_raster.configs.rows != dir_raster.configs.rows
        || dem_raster.configs.columns != dir_raster.configs.columns
    {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "DEM and flow-direction raster must share the same shape.",
        ));
    }

    let rows = dem_raster.configs.rows as isize;
    let columns = dem_raster.configs.columns as isize;

    let mut dem = Array2D::<f64>::new(rows, columns, lahar_core::grid::NODATA_Z, lahar_core::grid::NODATA_Z)?;
    let mut d8 = Array2D::<i32>::new(rows, columns, 0, 255)?;
    let dem_nodata = dem_raster.configs.nodata;
    for row in 0..rows {
        for col in 0..columns {
            let z = dem_raster.get_value(row, col);
            dem.set_value(row, col, if z == dem_nodata { lahar_core::grid::NODATA_Z } else { z });
            d8.set_value(row, col, dir_raster.get_value(row, col).round() as i32);
        }
    }

    let points = read_coordinate_file(&coordinates_file, volume_override)?;
    if points.is_empty() {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "Coordinate file contained no usable records.",
        ));
    }

    let transform = GridTransform {
        origin_x: dem_raster.configs.west,
        origin_y: dem_raster.configs.north,
        cell_width: dem_raster.configs.resolution_x,
    };

    let out_dir = if output_dir.is_empty() {
        let parent = Path::new(&dem_file).parent().map(|p| p.to_path_buf()).unwrap_or_default();
        parent.join("stream")
    } else {
        Path::new(&output_dir).to_path_buf()
    };
    fs::create_dir_all(&out_dir)?;

    let start = Instant::now();
    let mut old_progress = usize::MAX;
    let records = run_batch(&dem, &d8, &transform, &points, confidence, |done, total| {
        if verbose && total > 0 {
            let progress = (100.0 * done as f64 / total as f64) as usize;
            if progress != old_progress {
                println!("Source points: {}%", progress);
                old_progress = progress;
            }
        }
    });

    for record in &records {
        match &record.outcome {
            PointOutcome::Skipped(SkipReason::VolumeBelowMinimum) => {
                if verbose {
                    println!(
                        "Point {} (x={}, y={}): skipped, volume {} at or below the floor.",
                        record.index, record.point.x, record.point.y, record.point.volume
                    );
                }
            }
            PointOutcome::Failed(e) => {
                eprintln!("Point {} failed: {}", record.index, e);
            }
            PointOutcome::Completed(result) => {
                let volume = result.accepted_volume.round() as i64;
                let stem = format!("stream_{}_{}", record.index, volume);
                if verbose {
                    println!(
                        "Point {} accepted at volume {} ({:?}).",
                        record.index, volume, result.walk.outcome
                    );
                    if result.walk.outcome == WalkOutcome::CrossSectionTooLong {
                        println!("  warning: a cross-section sweep hit the iteration cap.");
                    }
                }
                match format {
                    OutputFormat::Raster => {
                        write_raster_output(
                            &out_dir,
                            &stem,
                            &dem_raster,
                            &result.walk.raster,
                            configurations.compress_rasters,
                        )?;
                    }
                    OutputFormat::Vector => {
                        write_vector_output(&out_dir, &stem, &dem_raster, &result.walk.raster)?;
                    }
                }
            }
        }
    }

    if verbose {
        println!(
            "{}",
            format!(
                "Elapsed Time (excluding I/O): {}",
                lahar_common::utils::get_formatted_elapsed_time(start)
            )
        );
    }

    Ok(())
}

/// Parses `x,y[,volume]` records from the coordinate file, skipping blank
/// lines and any line without a comma, and sorts the survivors ascending
/// by their parsed `(x, y, volume)` numeric value before processing
/// (matching the deterministic ordering the batch driver's output naming
/// depends on) — sorting happens on the parsed tuples, not the raw text,
/// since text sorting and numeric sorting disagree whenever fields have
/// different digit counts (e.g. "9" vs "10").
fn read_coordinate_file(path: &str, volume_override: Option<f64>) -> Result<Vec<SourcePoint>, Error> {
    let contents = fs::read_to_string(path)?;
    let lines = contents
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && l.contains(','));

    let mut records = Vec::new();
    for line in lines {
        let fields: Vec<&str> = line.split(',').map(|f| f.trim()).collect();
        if fields.len() < 2 {
            continue;
        }
        let x: f64 = match fields[0].parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        let y: f64 = match fields[1].parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        let raw_volume: f64 = if fields.len() >= 3 {
            fields[2].parse().unwrap_or(0.0)
        } else {
            0.0
        };
        records.push((x, y, raw_volume));
    }
    records.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal))
    });

    let points = records
        .into_iter()
        .map(|(x, y, raw_volume)| SourcePoint {
            x,
            y,
            volume: volume_override.unwrap_or(raw_volume),
        })
        .collect();
    Ok(points)
}

fn write_raster_output(
    out_dir: &Path,
    stem: &str,
    dem_raster: &Raster,
    raster: &lahar_core::InundationRaster,
    compress: bool,
) -> Result<(), Error> {
    let file_name = out_dir.join(format!("{}.tif", stem));
    let mut output = Raster::initialize_using_array2d(
        file_name.to_str().unwrap(),
        dem_raster,
        raster.raster(),
    );
    output.configs.data_type = lahar_raster::DataType::I32;
    output.add_metadata_entry("Created by the lahar inundation-footprint engine".to_string());
    if compress {
        output.write_compressed()
    } else {
        output.write()
    }
}

fn write_vector_output(
    out_dir: &Path,
    stem: &str,
    dem_raster: &Raster,
    raster: &lahar_core::InundationRaster,
) -> Result<(), Error> {
    let file_name = out_dir.join(format!("{}.shp", stem));
    let rings_by_value = lahar_vector::trace_rings_by_value(
        raster.raster(),
        dem_raster.configs.west,
        dem_raster.configs.north,
        dem_raster.configs.resolution_x,
    );

    let mut sf = Shapefile::new(file_name.to_str().unwrap(), ShapeType::Polygon)?;
    sf.attributes.add_field(&AttributeField::new("raster_val", FieldDataType::Int, 10, 0));

    let mut values: Vec<i32> = rings_by_value.keys().copied().collect();
    values.sort_unstable();
    for value in values {
        let rings = &rings_by_value[&value];
        let mut geom = ShapefileGeometry::new(ShapeType::Polygon);
        for ring in rings {
            geom.add_part(&ring.points);
        }
        if geom.num_points == 0 {
            continue;
        }
        sf.add_record(geom);
        sf.attributes.add_record(vec![FieldData::Int(value)], false);
    }

    if sf.num_records == 0 {
        // No inundated cells to write; leave no half-written shapefile behind.
        return Ok(());
    }
    sf.write()
}
