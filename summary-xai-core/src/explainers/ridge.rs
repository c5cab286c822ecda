//! Weighted ridge regression with an unpenalized intercept.
//!
//! Solves `(Xcᵀ W Xc + αI) β = Xcᵀ W yc` on data centered by weighted means,
//! then recovers the intercept as `ȳ − x̄·β`.

/// A fitted linear model over a subset of the columns of the design rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RidgeFit {
    /// Column indices of the full rows, in coefficient order.
    pub columns: Vec<usize>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl RidgeFit {
    /// Predict for a full design row; only the fitted columns are read.
    pub fn predict(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .columns
                .iter()
                .zip(&self.coefficients)
                .map(|(&c, b)| row[c] * b)
                .sum::<f64>()
    }

    /// Weighted coefficient of determination on full `(rows, targets, weights)`.
    pub fn score(&self, rows: &[Vec<f64>], targets: &[f64], weights: &[f64]) -> f64 {
        let total_weight: f64 = weights.iter().sum();
        if total_weight <= 0.0 {
            return 0.0;
        }
        let mean = targets.iter().zip(weights).map(|(y, w)| y * w).sum::<f64>() / total_weight;
        let mut residual = 0.0;
        let mut total = 0.0;
        for ((row, y), w) in rows.iter().zip(targets).zip(weights) {
            residual += w * (y - self.predict(row)).powi(2);
            total += w * (y - mean).powi(2);
        }
        if total == 0.0 {
            return if residual == 0.0 { 1.0 } else { 0.0 };
        }
        1.0 - residual / total
    }
}

/// Fit a weighted ridge model on the given feature `columns` of `rows`.
///
/// The returned coefficients follow the order of `columns`.
pub fn fit_weighted_ridge(
    rows: &[Vec<f64>],
    targets: &[f64],
    weights: &[f64],
    columns: &[usize],
    alpha: f64,
) -> RidgeFit {
    let k = columns.len();
    let total_weight: f64 = weights.iter().sum();
    if total_weight <= 0.0 || rows.is_empty() {
        return RidgeFit {
            columns: columns.to_vec(),
            coefficients: vec![0.0; k],
            intercept: 0.0,
        };
    }

    let y_mean = targets.iter().zip(weights).map(|(y, w)| y * w).sum::<f64>() / total_weight;
    let mut x_mean = vec![0.0; k];
    for (row, w) in rows.iter().zip(weights) {
        for (m, &c) in x_mean.iter_mut().zip(columns) {
            *m += w * row[c];
        }
    }
    for m in &mut x_mean {
        *m /= total_weight;
    }

    let mut gram = vec![vec![0.0; k]; k];
    let mut rhs = vec![0.0; k];
    let mut centered = vec![0.0; k];
    for ((row, &y), &w) in rows.iter().zip(targets).zip(weights) {
        if w == 0.0 {
            continue;
        }
        for (j, &c) in columns.iter().enumerate() {
            centered[j] = row[c] - x_mean[j];
        }
        let yc = y - y_mean;
        for a in 0..k {
            let wa = w * centered[a];
            if wa == 0.0 {
                continue;
            }
            rhs[a] += wa * yc;
            for b in a..k {
                gram[a][b] += wa * centered[b];
            }
        }
    }
    for a in 0..k {
        for b in 0..a {
            gram[a][b] = gram[b][a];
        }
        gram[a][a] += alpha;
    }

    let coefficients = solve(gram.clone(), rhs.clone()).unwrap_or_else(|| {
        // Singular system (e.g. alpha = 0 with collinear columns): regularize slightly.
        for (a, row) in gram.iter_mut().enumerate() {
            row[a] += 1e-8;
        }
        solve(gram, rhs).unwrap_or_else(|| vec![0.0; k])
    });
    let intercept = y_mean
        - x_mean
            .iter()
            .zip(&coefficients)
            .map(|(m, b)| m * b)
            .sum::<f64>();

    RidgeFit {
        columns: columns.to_vec(),
        coefficients,
        intercept,
    }
}

/// Gaussian elimination with partial pivoting. `None` if the matrix is singular.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| {
            a[i][col]
                .abs()
                .partial_cmp(&a[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for c in col..n {
                a[row][c] -= factor * a[col][c];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|c| a[row][c] * x[c]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}
