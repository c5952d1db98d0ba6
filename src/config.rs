/// Настройки пайплайна

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_raw_subdir")]
    pub raw_subdir: String,
    #[serde(default = "default_processed_subdir")]
    pub processed_subdir: String,
    #[serde(default = "default_models_subdir")]
    pub models_subdir: String,
    #[serde(default = "default_target_column")]
    pub target_column: String,
    #[serde(default = "default_feature_columns")]
    pub feature_columns: Vec<String>,
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64, // 0..1
    #[serde(default = "default_split_seed")]
    pub split_seed: u64,
    #[serde(default = "default_top_locations")]
    pub top_locations: usize,
}

fn default_data_dir() -> PathBuf { PathBuf::from("data") }
fn default_raw_subdir() -> String { "raw".to_string() }
fn default_processed_subdir() -> String { "processed".to_string() }
fn default_models_subdir() -> String { "models".to_string() }
fn default_target_column() -> String { "amount_in_rupees".to_string() }
fn default_feature_columns() -> Vec<String> {
    [
        "carpet_area_sqft",
        "super_area_sqft",
        "carpet_super_ratio",
        "floor_num",
        "bathroom",
        "balcony",
        "car_parking_flag",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_test_fraction() -> f64 { 0.2 }
fn default_split_seed() -> u64 { 42 }
fn default_top_locations() -> usize { 30 }

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            raw_subdir: default_raw_subdir(),
            processed_subdir: default_processed_subdir(),
            models_subdir: default_models_subdir(),
            target_column: default_target_column(),
            feature_columns: default_feature_columns(),
            test_fraction: default_test_fraction(),
            split_seed: default_split_seed(),
            top_locations: default_top_locations(),
        }
    }
}

impl PipelineConfig {
    /// Конфиг с корнем данных в `data_dir`, остальное по умолчанию
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.test_fraction) {
            return Err(PipelineError::Config(format!(
                "test_fraction must be in [0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.top_locations == 0 {
            return Err(PipelineError::Config("top_locations must be positive".to_string()));
        }
        Ok(())
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join(&self.raw_subdir)
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.data_dir.join(&self.processed_subdir)
    }

    pub fn models_dir(&self) -> PathBuf {
        self.data_dir.join(&self.models_subdir)
    }
}
