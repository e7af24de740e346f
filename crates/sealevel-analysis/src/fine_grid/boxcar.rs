//! Centered rectangular moving average that skips missing values.

use ndarray::Array2;

/// Mean over a `rows × cols` window around each cell, ignoring `NaN`.
///
/// Windows are clipped at the edges. An even window of length `w` covers
/// `[i - w/2, i + w/2 - 1]`. A cell with no finite value in its window is
/// missing.
pub fn boxcar_mean(field: &Array2<f64>, window: (usize, usize)) -> Array2<f64> {
    let (rows, cols) = field.dim();
    let (wr, wc) = (window.0.max(1), window.1.max(1));

    // Summed-area tables of values and of finite-value counts.
    let mut sums = Array2::<f64>::zeros((rows + 1, cols + 1));
    let mut counts = Array2::<f64>::zeros((rows + 1, cols + 1));
    for i in 0..rows {
        for j in 0..cols {
            let v = field[[i, j]];
            let (s, n) = if v.is_nan() { (0.0, 0.0) } else { (v, 1.0) };
            sums[[i + 1, j + 1]] = s + sums[[i, j + 1]] + sums[[i + 1, j]] - sums[[i, j]];
            counts[[i + 1, j + 1]] = n + counts[[i, j + 1]] + counts[[i + 1, j]] - counts[[i, j]];
        }
    }

    let span = |i: usize, w: usize, len: usize| {
        let lo = i.saturating_sub(w / 2);
        let hi = (i + w - 1 - w / 2).min(len - 1);
        (lo, hi + 1)
    };
    let area = |table: &Array2<f64>, (r0, r1): (usize, usize), (c0, c1): (usize, usize)| {
        table[[r1, c1]] - table[[r0, c1]] - table[[r1, c0]] + table[[r0, c0]]
    };

    Array2::from_shape_fn((rows, cols), |(i, j)| {
        let r = span(i, wr, rows);
        let c = span(j, wc, cols);
        let n = area(&counts, r, c);
        if n < 0.5 {
            f64::NAN
        } else {
            area(&sums, r, c) / n
        }
    })
}
