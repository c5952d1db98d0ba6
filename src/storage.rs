//! Хранение таблиц в CSV и моделей на диске

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use csv::{Reader, Writer};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::FittedModel;
use crate::types::{coerce_number, Column, ColumnData, ListingTable};

/// Значения, которые читаются как пропуск
pub const NA_MARKERS: &[&str] = &["", "na", "n/a", "nan", "null", "none", "#n/a", "<na>"];

fn cell_value(raw: &str) -> Option<String> {
    let trimmed = raw.trim().to_lowercase();
    if NA_MARKERS.contains(&trimmed.as_str()) {
        None
    } else {
        Some(raw.to_string())
    }
}

fn is_bool(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("false")
}

/// Тип колонки по содержимому: числа, затем флаги, иначе текст
fn infer_column(cells: Vec<Option<String>>) -> ColumnData {
    if cells.iter().flatten().all(|v| coerce_number(v).is_some()) {
        return ColumnData::Number(
            cells
                .iter()
                .map(|v| v.as_deref().and_then(coerce_number))
                .collect(),
        );
    }

    if cells.iter().all(|v| v.as_deref().map(is_bool).unwrap_or(false)) {
        return ColumnData::Flag(
            cells
                .iter()
                .map(|v| v.as_deref().map(|s| s.eq_ignore_ascii_case("true")).unwrap_or(false))
                .collect(),
        );
    }

    ColumnData::Text(cells)
}

/// Загрузить таблицу из CSV (первая строка — заголовок)
pub fn read_table(path: &Path) -> Result<ListingTable> {
    let file = File::open(path)?;
    let mut reader = Reader::from_reader(file);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];

    for result in reader.records() {
        let record = result?;
        for (j, column) in cells.iter_mut().enumerate() {
            column.push(record.get(j).and_then(cell_value));
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| Column::new(name, infer_column(raw)))
        .collect();

    Ok(ListingTable::from_columns(columns)?)
}

/// Сохранить таблицу в CSV без индексной колонки; пропуск пишется пустой ячейкой
pub fn write_table(table: &ListingTable, path: &Path) -> Result<()> {
    let mut writer = Writer::from_path(path)?;

    writer.write_record(table.column_names())?;
    for row in 0..table.n_rows() {
        writer.write_record(
            table
                .columns()
                .iter()
                .map(|c| c.data.render(row).unwrap_or_default()),
        )?;
    }

    writer.flush()?;
    Ok(())
}

/// Доступ к каталогам raw / processed / models из конфига
#[derive(Debug, Clone)]
pub struct DataStore {
    raw_dir: PathBuf,
    processed_dir: PathBuf,
    models_dir: PathBuf,
}

impl DataStore {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            raw_dir: config.raw_dir(),
            processed_dir: config.processed_dir(),
            models_dir: config.models_dir(),
        }
    }

    pub fn load_raw(&self, name: &str) -> Result<ListingTable> {
        let path = self.raw_dir.join(name);
        let table = read_table(&path)?;
        tracing::info!(
            "Loaded {} rows and {} columns from {}",
            table.n_rows(),
            table.n_cols(),
            path.display()
        );
        Ok(table)
    }

    pub fn save_processed(&self, table: &ListingTable, name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.processed_dir)?;
        let path = self.processed_dir.join(name);
        write_table(table, &path)?;
        tracing::info!("Processed table saved at: {}", path.display());
        Ok(path)
    }

    pub fn load_processed(&self, name: &str) -> Result<ListingTable> {
        read_table(&self.processed_dir.join(name))
    }

    pub fn save_model(&self, model: &FittedModel, name: &str) -> Result<PathBuf> {
        let path = self.models_dir.join(name);
        model.save(&path)?;
        Ok(path)
    }

    pub fn load_model(&self, name: &str) -> Result<FittedModel> {
        FittedModel::load(&self.models_dir.join(name))
    }
}
