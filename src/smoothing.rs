//! Savitzky-Golay smoothing: each point is replaced by the value of a
//! polynomial least-squares fit over the window centred on it.
//!
//! Points closer than half a window to either end take their value from the
//! polynomial fitted to the first or last full window, so the output is as
//! long as the input and defined everywhere.

use crate::errors::SmoothingError;

pub const TREND_WINDOW: usize = 7;
pub const TREND_ORDER: usize = 3;

#[derive(Debug, Clone)]
pub struct SavitzkyGolay {
    window: usize,
    order: usize,
    weights: Vec<f64>,
}

impl SavitzkyGolay {
    pub fn new(window: usize, order: usize) -> Result<Self, SmoothingError> {
        if window % 2 == 0 {
            return Err(SmoothingError::EvenWindow(window));
        }
        if order >= window {
            return Err(SmoothingError::OrderTooHigh { order, window });
        }
        Ok(Self::build(window, order))
    }

    /// Window 7, order 3: the trend line drawn beside raw daily counts.
    pub fn trend() -> Self {
        Self::build(TREND_WINDOW, TREND_ORDER)
    }

    fn build(window: usize, order: usize) -> Self {
        let xs = centred_positions(window);
        // The fit is linear in y, so the centre value of the fit to each unit
        // vector is that sample's convolution weight.
        let weights = (0..window)
            .map(|k| {
                let mut unit = vec![0.0; window];
                unit[k] = 1.0;
                polyfit(&xs, &unit, order)
                    .map(|coeffs| evaluate(&coeffs, 0.0))
                    .unwrap_or(0.0)
            })
            .collect();

        Self {
            window,
            order,
            weights,
        }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn smooth(&self, values: &[f64]) -> Vec<f64> {
        let n = values.len();
        if n == 0 {
            return Vec::new();
        }
        if n < self.window {
            let degree = self.order.min(n - 1);
            let xs = centred_positions(n);
            return match polyfit(&xs, values, degree) {
                Some(coeffs) => xs.iter().map(|&x| evaluate(&coeffs, x)).collect(),
                None => values.to_vec(),
            };
        }

        let half = self.window / 2;
        let xs = centred_positions(self.window);
        let mut out = vec![0.0; n];

        for i in half..n - half {
            out[i] = self
                .weights
                .iter()
                .zip(&values[i - half..=i + half])
                .map(|(w, y)| w * y)
                .sum();
        }

        let head = &values[..self.window];
        let tail = &values[n - self.window..];
        match polyfit(&xs, head, self.order) {
            Some(coeffs) => {
                for i in 0..half {
                    out[i] = evaluate(&coeffs, xs[i]);
                }
            }
            None => out[..half].copy_from_slice(&head[..half]),
        }
        match polyfit(&xs, tail, self.order) {
            Some(coeffs) => {
                for k in half + 1..self.window {
                    out[n - self.window + k] = evaluate(&coeffs, xs[k]);
                }
            }
            None => out[n - half..].copy_from_slice(&tail[half + 1..]),
        }

        out
    }

    /// Smooths a series with gaps. Gaps are bridged linearly for the fit; a
    /// series with no values at all stays empty.
    pub fn smooth_with_gaps(&self, values: &[Option<f64>]) -> Vec<Option<f64>> {
        match fill_gaps(values) {
            Some(filled) => self.smooth(&filled).into_iter().map(Some).collect(),
            None => vec![None; values.len()],
        }
    }
}

fn centred_positions(len: usize) -> Vec<f64> {
    let mid = (len as f64 - 1.0) / 2.0;
    (0..len).map(|i| i as f64 - mid).collect()
}

fn evaluate(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Least-squares polynomial coefficients, lowest power first.
fn polyfit(xs: &[f64], ys: &[f64], degree: usize) -> Option<Vec<f64>> {
    let size = degree + 1;
    let mut matrix = vec![vec![0.0; size + 1]; size];
    for (&x, &y) in xs.iter().zip(ys) {
        let powers: Vec<f64> = (0..2 * size).map(|p| x.powi(p as i32)).collect();
        for row in 0..size {
            for col in 0..size {
                matrix[row][col] += powers[row + col];
            }
            matrix[row][size] += y * powers[row];
        }
    }
    solve(matrix)
}

/// Gaussian elimination with partial pivoting on an augmented matrix.
fn solve(mut m: Vec<Vec<f64>>) -> Option<Vec<f64>> {
    let size = m.len();
    for col in 0..size {
        let pivot = (col..size).max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))?;
        if m[pivot][col].abs() < 1e-12 {
            return None;
        }
        m.swap(col, pivot);
        for row in col + 1..size {
            let factor = m[row][col] / m[col][col];
            for k in col..=size {
                m[row][k] -= factor * m[col][k];
            }
        }
    }

    let mut solution = vec![0.0; size];
    for row in (0..size).rev() {
        let tail: f64 = (row + 1..size).map(|k| m[row][k] * solution[k]).sum();
        solution[row] = (m[row][size] - tail) / m[row][row];
    }
    Some(solution)
}

fn fill_gaps(values: &[Option<f64>]) -> Option<Vec<f64>> {
    let known: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();
    let (&(first_idx, first), &(last_idx, last)) = (known.first()?, known.last()?);

    let mut filled = vec![0.0; values.len()];
    for i in 0..values.len() {
        filled[i] = match values[i] {
            Some(v) => v,
            None if i < first_idx => first,
            None if i > last_idx => last,
            None => {
                let after = known.partition_point(|&(k, _)| k < i);
                let (lo_idx, lo) = known[after - 1];
                let (hi_idx, hi) = known[after];
                lo + (hi - lo) * (i - lo_idx) as f64 / (hi_idx - lo_idx) as f64
            }
        };
    }
    Some(filled)
}
