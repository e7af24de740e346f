//! Shared constants for the sea level indicators pipeline.

use chrono::NaiveDate;

/// A calendar date known at compile time. An invalid date fails the build.
const fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(d) => d,
        None => panic!("invalid calendar date constant"),
    }
}

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ---- Repeat cycles ----

/// First repeat-cycle center date.
pub const CYCLE_EPOCH: NaiveDate = date(1992, 10, 5);

/// Days between consecutive cycle centers.
pub const CYCLE_STEP_DAYS: i64 = 7;

/// Days before the center at which a cycle window opens.
pub const WINDOW_DAYS_BEFORE: i64 = 5;

/// Days after the center at which a cycle window closes (exclusive).
pub const WINDOW_DAYS_AFTER: i64 = 4;

/// Days subtracted from the anchor source's latest granule to bound the schedule.
pub const SCHEDULE_LAG_DAYS: i64 = 5;

/// Granule `time` values are seconds since this date.
pub const GRANULE_TIME_EPOCH: NaiveDate = date(1985, 1, 1);

// ---- Gaussian resampling ----

/// Default radius of influence in meters.
pub const DEFAULT_ROI_M: f64 = 6.0e5;

/// Default Gaussian smoothing width in meters.
pub const DEFAULT_SIGMA_M: f64 = 1.0e5;

/// Default bound on contributing neighbours per cell.
pub const DEFAULT_NEIGHBOURS: usize = 500;

/// Earth radius used for neighbour distances, in meters.
pub const EARTH_RADIUS_M: f64 = 6_370_997.0;

// ---- Fine grid ----

/// Minimum contribution count for a cell to survive the fine-grid product.
pub const FINE_GRID_MIN_COUNT: f64 = 475.0;

/// Fine grid spacing in degrees.
pub const FINE_GRID_STEP_DEG: f64 = 0.25;

/// First fine-grid latitude.
pub const FINE_GRID_LAT_START: f64 = -89.875;

/// Fine-grid latitudes stop before this value.
pub const FINE_GRID_LAT_STOP: f64 = 90.125;

/// First fine-grid longitude of the padded axis.
pub const FINE_GRID_LON_START: f64 = -9.825;

/// Fine-grid padded longitudes stop before this value.
pub const FINE_GRID_LON_STOP: f64 = 369.825;

/// Degrees of longitude duplicated on each edge before smoothing.
pub const FINE_GRID_PAD_DEG: f64 = 10.0;

/// Boxcar window as `(longitude cells, latitude cells)`.
pub const FINE_GRID_BOXCAR: (usize, usize) = (38, 16);

/// Latitude band retained in the fine-grid product.
pub const FINE_GRID_LAT_LIMIT: f64 = 82.0;

/// Seasonal and trend reference fields are in centimeters.
pub const CM_TO_MM: f64 = 10.0;

/// Gridded SSHA is in meters.
pub const M_TO_MM: f64 = 1000.0;

// ---- Indicators ----

/// Latitude band for the spatial mean and the quality gate.
pub const INDICATOR_LAT_LIMIT: f64 = 66.0;

/// Expected per-cell contribution count of a well-sampled cycle.
pub const EXPECTED_CELL_COUNT: f64 = 500.0;

/// Fraction of the expected count a cycle must reach on average.
pub const QUALITY_GATE_FRACTION: f64 = 0.9;

/// Linear-trend fields are keyed by seconds since this date.
pub const TREND_EPOCH: NaiveDate = date(1992, 10, 2);

/// Patterns and their monthly climatology are stored in millimeters.
pub const PATTERN_MM_TO_M: f64 = 1.0e3;

/// Climate patterns regressed for every cycle.
pub const PATTERN_NAMES: [&str; 3] = ["enso", "pdo", "iod"];

// ---- Storage ----

/// Fill value written for missing data (netCDF default for `f8`).
pub const FILL_VALUE_F64: f64 = 9.969209968386869e36;

/// Default compression level for data variables.
pub const DEFAULT_COMPRESSION_LEVEL: u8 = 5;

/// Compression level used on indicator-product coordinates.
pub const INDICATOR_COORD_COMPRESSION_LEVEL: u8 = 6;

// ---- Sources ----

/// Default reference mission directory name.
pub const DEFAULT_REFERENCE_MISSION: &str = "MERGED_ALT";

/// Default source whose latest granule bounds the cycle schedule.
pub const DEFAULT_ANCHOR_SOURCE: &str = "SNTNL-6A";

/// Default source receiving the additive bias correction.
pub const DEFAULT_CORRECTED_SOURCE: &str = "SNTNL-6A";
