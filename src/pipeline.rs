//! Последовательность шагов: загрузка -> нормализация -> признаки -> обучение -> оценка -> сохранение

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::{InputError, Result};
use crate::models::{complete_rows, EvaluationMetrics, FeatureMatrix, PriceModel};
use crate::preprocessing::{ColumnNormalizer, FeatureEngineer};
use crate::storage::DataStore;
use crate::types::ListingTable;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub processed_path: PathBuf,
    pub model_path: PathBuf,
    pub feature_names: Vec<String>,
    pub n_train: usize,
    pub n_test: usize,
    pub train_metrics: EvaluationMetrics,
    pub test_metrics: Option<EvaluationMetrics>,
}

/// Нормализация имён, разбор цены/площадей и производные признаки
pub fn prepare(table: &mut ListingTable, engineer: &FeatureEngineer) -> Result<()> {
    ColumnNormalizer::normalize(table);
    engineer.parse_listing_fields(table)?;
    engineer.derive_features(table)?;
    Ok(())
}

/// Перемешивание с фиксированным seed; возвращает (train, test) индексы
pub fn train_test_split(n_rows: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = (n_rows as f64 * test_fraction).round() as usize;
    let test = indices.split_off(n_rows - n_test.min(n_rows));
    (indices, test)
}

pub fn run(
    config: &PipelineConfig,
    raw_name: &str,
    processed_name: &str,
    model_name: &str,
) -> Result<PipelineReport> {
    config.validate()?;
    let store = DataStore::new(config);
    let engineer = FeatureEngineer::new(config.top_locations);

    let mut table = store.load_raw(raw_name)?;
    prepare(&mut table, &engineer)?;
    let processed_path = store.save_processed(&table, processed_name)?;

    let feature_names: Vec<String> = config
        .feature_columns
        .iter()
        .filter(|name| table.has_column(name) && !engineer.is_constant_fallback(&table, name))
        .cloned()
        .collect();
    let skipped = config.feature_columns.len() - feature_names.len();
    if skipped > 0 {
        tracing::warn!(
            "{} configured feature columns are absent or constant, skipping them",
            skipped
        );
    }
    if !table.has_column(&config.target_column) {
        return Err(InputError::MissingColumn(config.target_column.clone()).into());
    }

    let mut required = feature_names.clone();
    required.push(config.target_column.clone());
    let rows = complete_rows(&table, &required);
    tracing::info!(
        "{} of {} rows are complete for training",
        rows.len(),
        table.n_rows()
    );
    let table = table.take_rows(&rows);

    let (train_idx, test_idx) = train_test_split(table.n_rows(), config.test_fraction, config.split_seed);
    let train = FeatureMatrix::from_table(&table.take_rows(&train_idx), &feature_names, &config.target_column)?;

    let model = PriceModel::train(&train.features, &train.target)?.with_feature_names(feature_names.clone());
    let train_metrics = PriceModel::evaluate(&model, &train.features, &train.target)?;
    tracing::info!("Train RMSE: {:.2}, MAE: {:.2}", train_metrics.rmse, train_metrics.mae);

    let test_metrics = if test_idx.is_empty() {
        tracing::warn!("Empty test split, skipping held-out evaluation");
        None
    } else {
        let test = FeatureMatrix::from_table(&table.take_rows(&test_idx), &feature_names, &config.target_column)?;
        let metrics = PriceModel::evaluate(&model, &test.features, &test.target)?;
        tracing::info!("Test RMSE: {:.2}, MAE: {:.2}", metrics.rmse, metrics.mae);
        Some(metrics)
    };

    let model_path = store.save_model(&model, model_name)?;

    Ok(PipelineReport {
        processed_path,
        model_path,
        feature_names,
        n_train: train_idx.len(),
        n_test: test_idx.len(),
        train_metrics,
        test_metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_split_is_deterministic_and_disjoint() {
        let (train_a, test_a) = train_test_split(10, 0.2, 7);
        let (train_b, test_b) = train_test_split(10, 0.2, 7);

        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);
        assert_eq!(test_a.len(), 2);

        let mut all: Vec<usize> = train_a.iter().chain(&test_a).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_zero_fraction() {
        let (train, test) = train_test_split(4, 0.0, 1);
        assert_eq!(train.len(), 4);
        assert!(test.is_empty());
    }

    fn write_raw(dir: &std::path::Path) {
        let raw_dir = dir.join("raw");
        fs::create_dir_all(&raw_dir).unwrap();

        let mut csv = String::from("Amount(in rupees),Carpet Area,Bathroom,Car Parking,location,Floor\n");
        // цена = 5000 * площадь + 100000 * ванные + 200000 * парковка
        for i in 0..20 {
            let area = 500 + 37 * i;
            let bath = 1 + (i * 7) % 4;
            let parking = i % 3 == 0;
            let price = 5000 * area + 100_000 * bath + if parking { 200_000 } else { 0 };
            csv.push_str(&format!(
                "\"{}\",{} sqft,{},{},Loc{},{} out of 10\n",
                price,
                area,
                bath,
                if parking { "1 Covered" } else { "No" },
                i % 4,
                i % 10
            ));
        }
        csv.push_str("Price on Request,800 sqft,2,No,Loc1,Ground out of 3\n");
        fs::write(raw_dir.join("listings.csv"), csv).unwrap();
    }

    #[test]
    fn test_run_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        write_raw(dir.path());

        let config = PipelineConfig {
            feature_columns: vec![
                "carpet_area_sqft".to_string(),
                "bathroom".to_string(),
                "car_parking_flag".to_string(),
                "balcony".to_string(),
            ],
            test_fraction: 0.25,
            ..PipelineConfig::with_data_dir(dir.path())
        };

        let report = run(&config, "listings.csv", "listings_processed.csv", "baseline.json").unwrap();

        // строка без цены отброшена, balcony отсутствует
        assert_eq!(report.n_train + report.n_test, 20);
        assert_eq!(report.n_test, 5);
        assert_eq!(
            report.feature_names,
            vec!["carpet_area_sqft", "bathroom", "car_parking_flag"]
        );
        assert!(report.train_metrics.rmse < 1.0);
        assert!(report.test_metrics.unwrap().mae < 1.0);

        let processed = DataStore::new(&config).load_processed("listings_processed.csv").unwrap();
        assert_eq!(processed.n_rows(), 21);
        assert!(processed.has_column("price_per_sqft"));
        assert!(processed.has_column("location_clean"));

        let model = DataStore::new(&config).load_model("baseline.json").unwrap();
        assert_eq!(report.model_path, config.models_dir().join("baseline.json"));
        assert!((model.coefficients()[0] - 5000.0).abs() < 1e-2);
        assert!((model.coefficients()[2] - 200_000.0).abs() < 1e-2);
    }

    fn write_raw_without_plot_area(dir: &std::path::Path) {
        let raw_dir = dir.join("raw");
        fs::create_dir_all(&raw_dir).unwrap();

        let mut csv = String::from(
            "Amount(in rupees),Carpet Area,Super Area,Bathroom,Balcony,Car Parking,location,Floor\n",
        );
        // super area = 1.25 * carpet area, отношение постоянно
        for i in 0..30 {
            let carpet = 450 + 23 * i;
            let bath = 1 + (i * 5) % 3;
            let balcony = i % 4;
            let parking = i % 2 == 0;
            let price = 6000 * carpet + 150_000 * bath + 40_000 * balcony;
            csv.push_str(&format!(
                "{} Lac,{} sqft,{} sqft,{},{},{},Loc{},{} out of 12\n",
                price as f64 / 100_000.0,
                carpet,
                carpet as f64 * 1.25,
                bath,
                balcony,
                if parking { "1 Open" } else { "No" },
                i % 5,
                1 + i % 11
            ));
        }
        fs::write(raw_dir.join("listings.csv"), csv).unwrap();
    }

    #[test]
    fn test_run_default_config_without_plot_area() {
        let dir = tempfile::tempdir().unwrap();
        write_raw_without_plot_area(dir.path());

        let config = PipelineConfig::with_data_dir(dir.path());
        let report = run(&config, "listings.csv", "listings_processed.csv", "baseline.json").unwrap();

        assert_eq!(report.n_train + report.n_test, 30);
        assert!(!report.feature_names.contains(&"has_plot_area".to_string()));
        assert!(report.feature_names.contains(&"super_area_sqft".to_string()));
        assert!(report.feature_names.contains(&"car_parking_flag".to_string()));
        assert!(report.train_metrics.rmse.is_finite());
        assert!(report.test_metrics.unwrap().rmse.is_finite());

        let model = DataStore::new(&config).load_model("baseline.json").unwrap();
        assert_eq!(model.feature_names(), report.feature_names.as_slice());
        assert!(model.coefficients().iter().all(|w| w.is_finite()));
    }

    #[test]
    fn test_run_missing_target() {
        let dir = tempfile::tempdir().unwrap();
        write_raw(dir.path());

        let config = PipelineConfig {
            target_column: "price_in_rupees".to_string(),
            ..PipelineConfig::with_data_dir(dir.path())
        };

        assert!(run(&config, "listings.csv", "p.csv", "m.json").is_err());
    }
}
