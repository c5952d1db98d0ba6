//! House price ML - Rust библиотека

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod storage;
pub mod types;

pub use config::PipelineConfig;
pub use error::{InputError, PipelineError};
pub use models::{EvaluationMetrics, FeatureMatrix, FittedModel, PriceModel};
pub use preprocessing::{normalize_column_name, parse_area_sqft, parse_price, FeatureEngineer};
pub use storage::DataStore;
pub use types::*;
