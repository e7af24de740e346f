//! Synthetic reference data and granule archives on a 2×4 one-degree grid.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use sealevel_core::config::SealevelConfig;
use sealevel_core::constants::GRANULE_TIME_EPOCH;
use sealevel_core::types::cycle::seconds_since;
use sealevel_storage::codec::PackedCodec;
use sealevel_storage::dataset::{Dataset, Variable, VariableEncoding};
use sealevel_storage::ArrayCodec;

use sealevel_analysis::fine_grid::FineGridSpec;

pub const LATS: [f64; 2] = [-0.5, 0.5];
pub const LONS: [f64; 4] = [10.0, 11.0, 12.0, 13.0];
pub const FINE_LATS: [f64; 3] = [-0.5, 0.0, 0.5];
pub const FINE_LONS: [f64; 7] = [10.0, 10.5, 11.0, 11.5, 12.0, 12.5, 13.0];

pub fn codec() -> PackedCodec {
    PackedCodec::new(5)
}

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Fine grid matching the synthetic coarse grid: no padding, no smoothing.
pub fn fine_spec() -> FineGridSpec {
    FineGridSpec {
        lats: FINE_LATS.to_vec(),
        lons: FINE_LONS.to_vec(),
        pad_deg: 0.0,
        boxcar: (1, 1),
        min_count: 475.0,
        lat_limit: 82.0,
    }
}

fn write(dir: &Path, name: &str, ds: &Dataset) {
    let codec = codec();
    codec
        .write(ds, &dir.join(format!("{name}.{}", codec.extension())))
        .unwrap();
}

fn axes(lat: &str, lon: &str, lats: &[f64], lons: &[f64]) -> Dataset {
    let mut ds = Dataset::new();
    ds.add_axis(lat, lats.to_vec(), VariableEncoding::coordinate()).unwrap();
    ds.add_axis(lon, lons.to_vec(), VariableEncoding::coordinate()).unwrap();
    ds
}

fn field(ds: &mut Dataset, name: &str, dims: &[&str], value: f64) {
    let n: usize = dims.iter().map(|d| ds.dim_len(d).unwrap()).product();
    ds.add_var(name, Variable::new(dims, vec![value; n], VariableEncoding::data(5)))
        .unwrap();
}

/// Write every reference file under `<root>/ref_files` and the validity
/// windows under `<root>/conf/datasets.yaml`. The `pdo` template is all
/// zeros so its fit is always degenerate.
pub fn write_reference(root: &Path) {
    let dir = root.join("ref_files");
    let grid = ["latitude", "longitude"];
    let upper = ["Latitude", "Longitude"];

    let mut ds = axes("latitude", "longitude", &LATS, &LONS);
    field(&mut ds, "maskC", &grid, 1.0);
    write(&dir, "UPDATED_GRID_MASK_latlon", &ds);

    let mut ds = axes("latitude", "longitude", &FINE_LATS, &FINE_LONS);
    field(&mut ds, "maskC", &grid, 1.0);
    write(&dir, "HR_GRID_MASK_latlon", &ds);

    let mut ds = axes("Latitude", "Longitude", &LATS, &LONS);
    let months: Vec<f64> = (0..12).map(|m| (m as f64 + 0.5) / 12.0).collect();
    ds.add_axis("Month_grid", months, VariableEncoding::coordinate()).unwrap();
    field(&mut ds, "Seasonal_SSH", &["Month_grid", "Latitude", "Longitude"], 0.0);
    field(&mut ds, "SSH_Slope", &upper, 0.0);
    field(&mut ds, "SSH_Offset", &upper, 0.0);
    write(&dir, "trnd_seas_simple_grid", &ds);

    let mut ds = axes("latitude", "longitude", &LATS, &LONS);
    field(&mut ds, "area", &grid, 1.0);
    field(&mut ds, "maskC", &grid, 1.0);
    write(&dir, "GRID_GEOMETRY_ECCO_V4r4_latlon_0p50deg", &ds);

    let mut ds = axes("latitude", "longitude", &LATS, &LONS);
    field(&mut ds, "BH_sea_level_offset_meters", &grid, 0.0);
    field(&mut ds, "BH_sea_level_trend_meters_per_second", &grid, 0.0);
    write(&dir, "BH_offset_and_trend_v0_new_grid", &ds);

    let mut ds = axes("Latitude", "Longitude", &LATS, &LONS);
    ds.add_axis("month", (1..=12).map(f64::from).collect(), VariableEncoding::coordinate())
        .unwrap();
    field(&mut ds, "ann_pattern", &["month", "Latitude", "Longitude"], 0.0);
    write(&dir, "ann_pattern", &ds);

    for (name, value) in [("enso", 20.0), ("pdo", 0.0), ("iod", -5.0)] {
        let mut ds = axes("Latitude", "Longitude", &LATS, &LONS);
        field(&mut ds, &format!("{name}_pattern"), &upper, value);
        write(&dir, &format!("{name}_pattern_and_index"), &ds);
    }

    let conf = root.join("conf");
    std::fs::create_dir_all(&conf).unwrap();
    std::fs::write(
        conf.join("datasets.yaml"),
        "- ds_name: SNTNL-6A\n  start: 19920101\n  end: Present\n",
    )
    .unwrap();
}

/// A dense block of samples around the grid, all with height `ssha`.
pub fn granule(date: NaiveDate, ssha: f64) -> Dataset {
    let mut time = Vec::new();
    let mut lat = Vec::new();
    let mut lon = Vec::new();
    let t0 = seconds_since(date, GRANULE_TIME_EPOCH);
    for i in 0..61 {
        for j in 0..91 {
            time.push(t0 + (i * 91 + j) as f64);
            lat.push(-3.0 + 0.1 * i as f64);
            lon.push(7.0 + 0.1 * j as f64);
        }
    }
    let n = time.len();
    let mut ds = Dataset::new();
    ds.add_dim("i", n).unwrap();
    ds.add_var("time", Variable::new(&["i"], time, VariableEncoding::time()))
        .unwrap();
    ds.add_var("lats", Variable::new(&["i"], lat, VariableEncoding::coordinate()))
        .unwrap();
    ds.add_var("lons", Variable::new(&["i"], lon, VariableEncoding::coordinate()))
        .unwrap();
    ds.add_var("ssh", Variable::new(&["i"], vec![ssha; n], VariableEncoding::data(5)))
        .unwrap();
    ds
}

/// Write a granule to `<root>/alongtrack-delivery/<source>/ssha_<date>.json.zst`.
pub fn write_granule(root: &Path, source: &str, date: NaiveDate, ssha: f64) -> PathBuf {
    let codec = codec();
    let path = root
        .join("alongtrack-delivery")
        .join(source)
        .join(format!("ssha_{}.{}", date.format("%Y%m%d"), codec.extension()));
    codec.write(&granule(date, ssha), &path).unwrap();
    path
}

/// One cycle's worth of granules, centered on 1992-10-05, plus a later
/// anchor granule that bounds the schedule to that single cycle.
pub fn write_archive(root: &Path) {
    write_granule(root, "MERGED_ALT", d(1992, 10, 4), 0.10);
    write_granule(root, "SNTNL-6A", d(1992, 10, 6), 0.10);
    write_granule(root, "SNTNL-6A", d(1992, 10, 14), 0.10);
}

pub fn config() -> SealevelConfig {
    SealevelConfig::from_toml("[storage]\nformat = \"packed\"\n").unwrap()
}
