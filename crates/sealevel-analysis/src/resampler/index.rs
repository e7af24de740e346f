//! Spatial index over scattered samples: 1° latitude/longitude buckets
//! holding Earth-centered coordinates, queried by chord distance.

use sealevel_core::constants::EARTH_RADIUS_M;

const LAT_BUCKETS: usize = 180;
const LON_BUCKETS: usize = 360;

/// Earth-centered Cartesian coordinates on a sphere of radius `EARTH_RADIUS_M`.
pub fn to_ecef(lat_deg: f64, lon_deg: f64) -> [f64; 3] {
    let (lat, lon) = (lat_deg.to_radians(), lon_deg.to_radians());
    [
        EARTH_RADIUS_M * lat.cos() * lon.cos(),
        EARTH_RADIUS_M * lat.cos() * lon.sin(),
        EARTH_RADIUS_M * lat.sin(),
    ]
}

fn squared_distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
}

fn lat_bucket(lat: f64) -> usize {
    ((lat + 90.0).floor().max(0.0) as usize).min(LAT_BUCKETS - 1)
}

fn lon_bucket(lon: f64) -> usize {
    (lon.rem_euclid(360.0).floor() as usize) % LON_BUCKETS
}

/// A neighbour found by [`PointIndex::within`]: squared chord distance and
/// sample position.
pub type Neighbour = (f64, u32);

pub struct PointIndex {
    points: Vec<[f64; 3]>,
    buckets: Vec<Vec<u32>>,
}

impl PointIndex {
    pub fn build(lats: &[f64], lons: &[f64]) -> Self {
        let mut buckets = vec![Vec::new(); LAT_BUCKETS * LON_BUCKETS];
        let mut points = Vec::with_capacity(lats.len());
        for (i, (&lat, &lon)) in lats.iter().zip(lons).enumerate() {
            points.push(to_ecef(lat, lon));
            buckets[lat_bucket(lat) * LON_BUCKETS + lon_bucket(lon)].push(i as u32);
        }
        Self { points, buckets }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Every sample within chord distance `radius_m` of `(lat, lon)`,
    /// appended to `out` (which is cleared first).
    pub fn within(&self, lat: f64, lon: f64, radius_m: f64, out: &mut Vec<Neighbour>) {
        out.clear();
        let target = to_ecef(lat, lon);
        let limit = radius_m * radius_m;

        // Central angle subtended by the chord, padded against rounding.
        let ratio = (radius_m / (2.0 * EARTH_RADIUS_M)).min(1.0);
        let angle = (2.0 * ratio.asin()).to_degrees() * (1.0 + 1e-9) + 1e-9;

        let lat_lo = lat_bucket(lat - angle);
        let lat_hi = lat_bucket(lat + angle);

        let reaches_pole = lat.abs() + angle >= 90.0;
        let half_width = if reaches_pole {
            180.0
        } else {
            let s = angle.to_radians().sin() / lat.to_radians().cos();
            if s >= 1.0 {
                180.0
            } else {
                s.asin().to_degrees() * (1.0 + 1e-9) + 1e-9
            }
        };

        let first = (lon - half_width).floor() as i64;
        let last = (lon + half_width).floor() as i64;
        let full_ring = half_width >= 180.0 || last - first + 1 >= LON_BUCKETS as i64;

        for row in lat_lo..=lat_hi {
            let base = row * LON_BUCKETS;
            if full_ring {
                for bucket in &self.buckets[base..base + LON_BUCKETS] {
                    self.scan(bucket, &target, limit, out);
                }
            } else {
                for col in first..=last {
                    let col = col.rem_euclid(LON_BUCKETS as i64) as usize;
                    self.scan(&self.buckets[base + col], &target, limit, out);
                }
            }
        }
    }

    fn scan(&self, bucket: &[u32], target: &[f64; 3], limit: f64, out: &mut Vec<Neighbour>) {
        for &i in bucket {
            let d2 = squared_distance(&self.points[i as usize], target);
            if d2 <= limit {
                out.push((d2, i));
            }
        }
    }
}
