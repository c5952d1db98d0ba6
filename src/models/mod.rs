/// ML модели

pub mod dataset;
pub mod linear;

pub use dataset::{complete_rows, FeatureMatrix};
pub use linear::{EvaluationMetrics, FittedModel, PriceModel};
