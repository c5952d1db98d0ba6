/// Модуль предобработки данных

pub mod feature_engineering;
pub mod normalization;
pub mod value_parsers;

pub use feature_engineering::FeatureEngineer;
pub use normalization::{normalize_column_name, ColumnNormalizer};
pub use value_parsers::{parse_area_sqft, parse_price};
