//! Ошибки пайплайна

use thiserror::Error;

/// Нарушение предусловий на входные данные модели
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("Shape mismatch: {rows} feature rows, {targets} targets")]
    ShapeMismatch { rows: usize, targets: usize },

    #[error("Feature count mismatch: model expects {expected}, got {got}")]
    FeatureCountMismatch { expected: usize, got: usize },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Non-numeric value in column '{column}' at row {row}")]
    NonNumeric { column: String, row: usize },

    #[error("Empty dataset")]
    Empty,

    #[error("Column '{column}' has {got} rows, table has {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        got: usize,
    },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
