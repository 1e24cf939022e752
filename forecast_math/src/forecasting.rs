//! Forecasting kernels for short daily series
//!
//! Contains implementations of:
//! - Ridge-regularised least squares (trend, seasonality and event regressors)
//! - Double Exponential Smoothing (Holt's linear method)
//! - A deterministic grid fit for Holt's smoothing parameters

use crate::{MathError, Result};
use std::time::Instant;

/// Smallest pivot accepted while solving the normal equations
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Ridge-regularised ordinary least squares
///
/// Column 0 of every design row is treated as the intercept and is never
/// penalised; every other coefficient is shrunk by `ridge`.
#[derive(Debug, Clone)]
pub struct LeastSquares {
    ridge: f64,
    coefficients: Option<Vec<f64>>,
}

impl LeastSquares {
    /// Create a new least squares solver with the specified ridge penalty
    pub fn new(ridge: f64) -> Result<Self> {
        if !ridge.is_finite() || ridge < 0.0 {
            return Err(MathError::InvalidInput(
                "Ridge penalty must be a finite, non-negative number".to_string(),
            ));
        }

        Ok(Self {
            ridge,
            coefficients: None,
        })
    }

    /// Fit the coefficients of `rows` against `targets`
    pub fn fit(&mut self, rows: &[Vec<f64>], targets: &[f64]) -> Result<()> {
        if rows.is_empty() {
            return Err(MathError::InsufficientData(
                "Least squares needs at least one row".to_string(),
            ));
        }
        if rows.len() != targets.len() {
            return Err(MathError::InvalidInput(format!(
                "Design has {} rows but {} targets",
                rows.len(),
                targets.len()
            )));
        }

        let width = rows[0].len();
        if width == 0 || rows.iter().any(|row| row.len() != width) {
            return Err(MathError::InvalidInput(
                "Design rows must share a non-zero width".to_string(),
            ));
        }

        // Normal equations: (X'X + ridge * I') b = X'y
        let mut gram = vec![vec![0.0; width]; width];
        let mut rhs = vec![0.0; width];
        for (row, &target) in rows.iter().zip(targets) {
            for i in 0..width {
                rhs[i] += row[i] * target;
                for j in 0..width {
                    gram[i][j] += row[i] * row[j];
                }
            }
        }
        for (i, gram_row) in gram.iter_mut().enumerate().skip(1) {
            gram_row[i] += self.ridge;
        }

        let coefficients = solve_linear_system(gram, rhs)?;
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(MathError::CalculationError(
                "Least squares produced a non-finite coefficient".to_string(),
            ));
        }

        self.coefficients = Some(coefficients);
        Ok(())
    }

    /// Predict the response for one design row
    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        let coefficients = self.coefficients()?;
        if row.len() != coefficients.len() {
            return Err(MathError::InvalidInput(format!(
                "Row has {} columns, model has {}",
                row.len(),
                coefficients.len()
            )));
        }

        Ok(row.iter().zip(coefficients).map(|(x, b)| x * b).sum())
    }

    /// Get the fitted coefficients
    pub fn coefficients(&self) -> Result<&[f64]> {
        self.coefficients.as_deref().ok_or_else(|| {
            MathError::CalculationError("Least squares has not been fitted".to_string())
        })
    }

    /// Get the ridge penalty
    pub fn ridge(&self) -> f64 {
        self.ridge
    }
}

/// Solve `a x = b` by Gaussian elimination with partial pivoting
fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < PIVOT_TOLERANCE {
            return Err(MathError::CalculationError(
                "Normal equations are singular".to_string(),
            ));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        let pivot_row = a[col].clone();
        let pivot_rhs = b[col];
        for row in col + 1..n {
            let factor = a[row][col] / pivot_row[col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * pivot_row[k];
            }
            b[row] -= factor * pivot_rhs;
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    Ok(x)
}

/// Double Exponential Smoothing (Holt's Method) implementation
///
/// The level starts at the first observation and the trend at the
/// difference between the first two observations.
#[derive(Debug, Clone)]
pub struct DoubleExponentialSmoothing {
    alpha: f64,
    beta: f64,
    level: Option<f64>,
    trend: Option<f64>,
    values_seen: usize,
    sse: f64,
}

impl DoubleExponentialSmoothing {
    /// Create a new Double Exponential Smoothing with the specified parameters
    pub fn new(alpha: f64, beta: f64) -> Result<Self> {
        if alpha <= 0.0 || alpha >= 1.0 {
            return Err(MathError::InvalidInput(
                "Alpha must be between 0 and 1 (exclusive)".to_string(),
            ));
        }
        if beta <= 0.0 || beta >= 1.0 {
            return Err(MathError::InvalidInput(
                "Beta must be between 0 and 1 (exclusive)".to_string(),
            ));
        }

        Ok(Self {
            alpha,
            beta,
            level: None,
            trend: None,
            values_seen: 0,
            sse: 0.0,
        })
    }

    /// Update the Double Exponential Smoothing with a new value
    pub fn update(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(MathError::InvalidInput(format!(
                "Cannot smooth non-finite value {}",
                value
            )));
        }

        match (self.level, self.trend) {
            (None, _) => {
                self.level = Some(value);
            }
            (Some(first), None) => {
                self.level = Some(value);
                self.trend = Some(value - first);
            }
            (Some(prev_level), Some(prev_trend)) => {
                let error = value - (prev_level + prev_trend);
                self.sse += error * error;

                let new_level = self.alpha * value + (1.0 - self.alpha) * (prev_level + prev_trend);
                let new_trend =
                    self.beta * (new_level - prev_level) + (1.0 - self.beta) * prev_trend;

                self.level = Some(new_level);
                self.trend = Some(new_trend);
            }
        }

        self.values_seen += 1;
        Ok(())
    }

    /// Forecast h steps ahead
    pub fn forecast(&self, h: usize) -> Result<f64> {
        match (self.level, self.trend) {
            (Some(level), Some(trend)) => Ok(level + (h as f64) * trend),
            _ => Err(MathError::InsufficientData(
                "Not enough data to make a forecast. Need at least 2 points.".to_string(),
            )),
        }
    }

    /// Get the current level
    pub fn level(&self) -> Result<f64> {
        self.level.ok_or_else(|| {
            MathError::InsufficientData("Level not calculated yet".to_string())
        })
    }

    /// Get the current trend
    pub fn trend(&self) -> Result<f64> {
        self.trend.ok_or_else(|| {
            MathError::InsufficientData("Trend not calculated yet".to_string())
        })
    }

    /// Sum of squared one-step-ahead errors seen so far
    pub fn sse(&self) -> f64 {
        self.sse
    }

    /// Smoothing parameter for the level
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Smoothing parameter for the trend
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Number of values consumed
    pub fn values_seen(&self) -> usize {
        self.values_seen
    }

    /// Reset the Double Exponential Smoothing, clearing all values
    pub fn reset(&mut self) {
        self.level = None;
        self.trend = None;
        self.values_seen = 0;
        self.sse = 0.0;
    }
}

/// Candidate smoothing parameters: 0.05, 0.10, ..., 0.95
fn parameter_grid() -> impl Iterator<Item = f64> + Clone {
    (1..=19).map(|step| step as f64 * 0.05)
}

/// Fit Holt's method by exhaustive grid search over (alpha, beta)
///
/// Minimises the one-step-ahead SSE; the first minimum in grid order wins
/// ties, so the result is fully deterministic. The search stops with
/// [`MathError::BudgetExceeded`] once `deadline` has passed.
pub fn fit_holt(values: &[f64], deadline: Option<Instant>) -> Result<DoubleExponentialSmoothing> {
    if values.len() < 2 {
        return Err(MathError::InsufficientData(format!(
            "Holt's method needs at least 2 observations, got {}",
            values.len()
        )));
    }

    let mut best: Option<DoubleExponentialSmoothing> = None;
    let mut evaluated = 0;

    for alpha in parameter_grid() {
        if deadline.is_some_and(|limit| Instant::now() > limit) {
            return Err(MathError::BudgetExceeded(evaluated));
        }

        for beta in parameter_grid() {
            let mut model = DoubleExponentialSmoothing::new(alpha, beta)?;
            for &value in values {
                model.update(value)?;
            }
            evaluated += 1;

            if !model.sse().is_finite() {
                continue;
            }
            let improves = best
                .as_ref()
                .map_or(true, |current| model.sse() < current.sse());
            if improves {
                best = Some(model);
            }
        }
    }

    best.ok_or_else(|| {
        MathError::CalculationError("No smoothing candidate produced a finite fit".to_string())
    })
}
