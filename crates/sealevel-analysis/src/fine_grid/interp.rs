//! Longitude re-ordering, periodic padding and bilinear regridding.

use ndarray::{Array2, Axis};

/// Re-order columns so longitudes run ascending in `[0, 360)`.
pub fn wrap_columns(lons: &[f64], fields: &[&Array2<f64>]) -> (Vec<f64>, Vec<Array2<f64>>) {
    let wrapped: Vec<f64> = lons.iter().map(|l| l.rem_euclid(360.0)).collect();
    let mut order: Vec<usize> = (0..lons.len()).collect();
    order.sort_by(|&a, &b| wrapped[a].total_cmp(&wrapped[b]));
    let lons = order.iter().map(|&i| wrapped[i]).collect();
    let fields = fields.iter().map(|f| f.select(Axis(1), &order)).collect();
    (lons, fields)
}

/// Duplicate the columns within `pad` degrees of each edge of a `[0, 360)`
/// field onto the opposite side: `[360 - pad, 360]` shifted by -360 in
/// front, `[0, pad]` shifted by +360 behind.
pub fn pad_longitudes(lons: &[f64], field: &Array2<f64>, pad: f64) -> (Vec<f64>, Array2<f64>) {
    let back: Vec<usize> = select(lons, |l| l >= 360.0 - pad && l <= 360.0);
    let front: Vec<usize> = select(lons, |l| (0.0..=pad).contains(&l));

    let mut order = Vec::with_capacity(lons.len() + back.len() + front.len());
    let mut padded_lons = Vec::with_capacity(order.capacity());
    for &i in &back {
        order.push(i);
        padded_lons.push(lons[i] - 360.0);
    }
    for (i, &lon) in lons.iter().enumerate() {
        order.push(i);
        padded_lons.push(lon);
    }
    for &i in &front {
        order.push(i);
        padded_lons.push(lons[i] + 360.0);
    }
    (padded_lons, field.select(Axis(1), &order))
}

/// Keep the columns with longitude in `[lo, hi]`.
pub fn trim_longitudes(
    lons: &[f64],
    field: &Array2<f64>,
    lo: f64,
    hi: f64,
) -> (Vec<f64>, Array2<f64>) {
    let keep = select(lons, |l| l >= lo && l <= hi);
    (keep.iter().map(|&i| lons[i]).collect(), field.select(Axis(1), &keep))
}

/// Keep the rows with latitude in `[-limit, limit]`.
pub fn trim_latitudes(lats: &[f64], field: &Array2<f64>, limit: f64) -> (Vec<f64>, Array2<f64>) {
    let keep = select(lats, |l| l >= -limit && l <= limit);
    (keep.iter().map(|&i| lats[i]).collect(), field.select(Axis(0), &keep))
}

fn select(axis: &[f64], keep: impl Fn(f64) -> bool) -> Vec<usize> {
    axis.iter()
        .enumerate()
        .filter(|(_, v)| keep(**v))
        .map(|(i, _)| i)
        .collect()
}

/// Bracketing source indices and weight of the upper one.
type Bracket = Option<(usize, usize, f64)>;

fn brackets(source: &[f64], targets: &[f64]) -> Vec<Bracket> {
    targets
        .iter()
        .map(|&x| {
            let (first, last) = (*source.first()?, *source.last()?);
            if !(first..=last).contains(&x) {
                return None;
            }
            if source.len() == 1 {
                return Some((0, 0, 0.0));
            }
            let upper = source.partition_point(|&v| v <= x).clamp(1, source.len() - 1);
            let (x0, x1) = (source[upper - 1], source[upper]);
            Some((upper - 1, upper, (x - x0) / (x1 - x0)))
        })
        .collect()
}

/// Bilinear interpolation of `field` (on ascending `src_lats` ×
/// `src_lons`) onto `dst_lats` × `dst_lons`. Targets outside the source
/// axes, or touching a missing corner, are missing.
pub fn bilinear(
    src_lats: &[f64],
    src_lons: &[f64],
    field: &Array2<f64>,
    dst_lats: &[f64],
    dst_lons: &[f64],
) -> Array2<f64> {
    let rows = brackets(src_lats, dst_lats);
    let cols = brackets(src_lons, dst_lons);
    Array2::from_shape_fn((dst_lats.len(), dst_lons.len()), |(i, j)| {
        let (Some((r0, r1, ty)), Some((c0, c1, tx))) = (rows[i], cols[j]) else {
            return f64::NAN;
        };
        let (a, b) = (field[[r0, c0]], field[[r0, c1]]);
        let (c, d) = (field[[r1, c0]], field[[r1, c1]]);
        let bottom = a * (1.0 - tx) + b * tx;
        let top = c * (1.0 - tx) + d * tx;
        bottom * (1.0 - ty) + top * ty
    })
}
