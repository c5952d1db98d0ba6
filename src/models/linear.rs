//! Базовая модель цены: линейная регрессия (OLS)

#![allow(non_snake_case)]

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::{DateTime, Utc};
use linfa::traits::Fit;
use linfa::Dataset;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{InputError, PipelineError, Result};

/// Обученная модель. Создаётся один раз в [`PriceModel::train`] и дальше
/// не меняется.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    feature_names: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
    n_samples: usize,
    trained_at: DateTime<Utc>,
}

impl FittedModel {
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    /// Та же модель с подписанными признаками
    pub fn with_feature_names(self, feature_names: Vec<String>) -> Self {
        Self {
            feature_names,
            ..self
        }
    }

    pub fn predict(&self, X: &Array2<f64>) -> Result<Array1<f64>> {
        if X.ncols() != self.coefficients.len() {
            return Err(InputError::FeatureCountMismatch {
                expected: self.coefficients.len(),
                got: X.ncols(),
            }
            .into());
        }

        let weights = Array1::from(self.coefficients.clone());
        Ok(X.dot(&weights) + self.intercept)
    }

    /// Сохраняет параметры в JSON; существующий файл перезаписывается
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        tracing::info!("Model saved at: {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub rmse: f64,
    pub mae: f64,
    pub n_samples: usize,
}

pub struct PriceModel;

impl PriceModel {
    /// OLS со свободным членом, без регуляризации. Пропуски не заполняются:
    /// на вход нужна полностью числовая матрица.
    ///
    /// Постоянные и линейно зависимые колонки в решение не входят и получают
    /// коэффициент 0, поэтому вырожденная матрица тоже обучается.
    pub fn train(X: &Array2<f64>, y: &Array1<f64>) -> Result<FittedModel> {
        Self::validate(X, y)?;

        let kept = independent_columns(X);
        if kept.len() < X.ncols() {
            tracing::warn!(
                "{} of {} feature columns are constant or collinear, fitted with coefficient 0",
                X.ncols() - kept.len(),
                X.ncols()
            );
        }

        let mut coefficients = vec![0.0; X.ncols()];
        let intercept = if kept.is_empty() {
            y.mean().unwrap_or(0.0)
        } else {
            let dataset = Dataset::new(X.select(Axis(1), &kept), y.clone());
            let fitted = LinearRegression::new()
                .fit(&dataset)
                .map_err(|e| PipelineError::Training(e.to_string()))?;
            for (&j, &w) in kept.iter().zip(fitted.params().iter()) {
                coefficients[j] = w;
            }
            fitted.intercept()
        };

        let model = FittedModel {
            feature_names: (0..X.ncols()).map(|j| format!("x{j}")).collect(),
            coefficients,
            intercept,
            n_samples: X.nrows(),
            trained_at: Utc::now(),
        };

        tracing::info!(
            "Linear model trained on {} samples, {} features",
            model.n_samples,
            model.coefficients.len()
        );
        Ok(model)
    }

    pub fn evaluate(model: &FittedModel, X: &Array2<f64>, y: &Array1<f64>) -> Result<EvaluationMetrics> {
        if X.nrows() != y.len() {
            return Err(InputError::ShapeMismatch {
                rows: X.nrows(),
                targets: y.len(),
            }
            .into());
        }
        if y.is_empty() {
            return Err(InputError::Empty.into());
        }

        let residuals = y - &model.predict(X)?;
        let n = y.len() as f64;
        let mse = residuals.mapv(|r| r * r).sum() / n;
        let mae = residuals.mapv(f64::abs).sum() / n;

        Ok(EvaluationMetrics {
            rmse: mse.sqrt(),
            mae,
            n_samples: y.len(),
        })
    }

    pub fn persist(model: &FittedModel, destination: &Path) -> Result<()> {
        model.save(destination)
    }

    fn validate(X: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if X.nrows() != y.len() {
            return Err(InputError::ShapeMismatch {
                rows: X.nrows(),
                targets: y.len(),
            }
            .into());
        }
        if X.nrows() == 0 || X.ncols() == 0 {
            return Err(InputError::Empty.into());
        }

        for ((row, col), value) in X.indexed_iter() {
            if !value.is_finite() {
                return Err(InputError::NonNumeric {
                    column: format!("x{col}"),
                    row,
                }
                .into());
            }
        }
        if let Some(row) = y.iter().position(|v| !v.is_finite()) {
            return Err(InputError::NonNumeric {
                column: "target".to_string(),
                row,
            }
            .into());
        }

        Ok(())
    }
}

/// Индексы колонок, которые после центрирования линейно независимы
/// (модифицированный Грам-Шмидт). Постоянные колонки отбрасываются.
fn independent_columns(X: &Array2<f64>) -> Vec<usize> {
    const RELATIVE_TOL: f64 = 1e-8;

    let mut basis: Vec<Array1<f64>> = Vec::new();
    let mut kept = Vec::new();

    for (j, column) in X.columns().into_iter().enumerate() {
        let mean = column.mean().unwrap_or(0.0);
        let centered = column.mapv(|v| v - mean);
        let spread = centered.dot(&centered).sqrt();
        let magnitude = column.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        // постоянная колонка (с точностью до округления)
        if spread <= RELATIVE_TOL * magnitude * (column.len() as f64).sqrt() || spread == 0.0 {
            continue;
        }

        let mut residual = centered;
        for q in &basis {
            let proj = q.dot(&residual);
            residual.scaled_add(-proj, q);
        }

        let norm = residual.dot(&residual).sqrt();
        if norm > RELATIVE_TOL * spread {
            basis.push(residual / norm);
            kept.push(j);
        }
    }

    kept
}
