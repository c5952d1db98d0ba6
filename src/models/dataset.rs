//! Сборка числовой матрицы признаков из таблицы

use ndarray::{Array1, Array2};

use crate::error::InputError;
use crate::types::{ColumnData, ListingTable};

/// Матрица признаков и целевая переменная вместе с именами колонок
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub feature_names: Vec<String>,
    pub features: Array2<f64>,
    pub target: Array1<f64>,
}

impl FeatureMatrix {
    /// Флаги переводятся в 1.0/0.0. Текстовая колонка, отсутствующая колонка
    /// или пропуск в ячейке дают ошибку: обучение ничего не заполняет само.
    pub fn from_table(
        table: &ListingTable,
        features: &[String],
        target: &str,
    ) -> Result<Self, InputError> {
        let n_rows = table.n_rows();
        let mut x = Array2::zeros((n_rows, features.len()));

        for (j, name) in features.iter().enumerate() {
            let values = numeric_column(table, name)?;
            for (i, value) in values.into_iter().enumerate() {
                x[[i, j]] = value;
            }
        }

        let y = Array1::from(numeric_column(table, target)?);

        Ok(Self {
            feature_names: features.to_vec(),
            features: x,
            target: y,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }
}

fn numeric_column(table: &ListingTable, name: &str) -> Result<Vec<f64>, InputError> {
    let column = table
        .column(name)
        .ok_or_else(|| InputError::MissingColumn(name.to_string()))?;

    match &column.data {
        ColumnData::Number(values) => values
            .iter()
            .enumerate()
            .map(|(row, v)| {
                v.filter(|x| x.is_finite()).ok_or(InputError::NonNumeric {
                    column: name.to_string(),
                    row,
                })
            })
            .collect(),
        ColumnData::Flag(values) => Ok(values.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect()),
        ColumnData::Text(_) => Err(InputError::NonNumeric {
            column: name.to_string(),
            row: 0,
        }),
    }
}

/// Индексы строк без пропусков в указанных колонках.
/// Отсутствующая колонка считается полностью пустой.
pub fn complete_rows(table: &ListingTable, columns: &[String]) -> Vec<usize> {
    (0..table.n_rows())
        .filter(|&row| {
            columns.iter().all(|name| {
                table
                    .column(name)
                    .map(|c| !c.data.is_null(row))
                    .unwrap_or(false)
            })
        })
        .collect()
}
