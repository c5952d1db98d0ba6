/// Типы данных для пайплайна объявлений

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Значения одной колонки. Пропуск = `None` (у флагов пропусков нет)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnData {
    Text(Vec<Option<String>>),
    Number(Vec<Option<f64>>),
    Flag(Vec<bool>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Text(v) => v.len(),
            ColumnData::Number(v) => v.len(),
            ColumnData::Flag(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Строковое представление ячейки (как она будет записана в CSV)
    pub fn render(&self, row: usize) -> Option<String> {
        match self {
            ColumnData::Text(v) => v[row].clone(),
            ColumnData::Number(v) => v[row].map(|x| x.to_string()),
            ColumnData::Flag(v) => Some(v[row].to_string()),
        }
    }

    pub fn is_null(&self, row: usize) -> bool {
        match self {
            ColumnData::Text(v) => v[row].is_none(),
            ColumnData::Number(v) => v[row].is_none(),
            ColumnData::Flag(_) => false,
        }
    }

    fn take(&self, indices: &[usize]) -> ColumnData {
        match self {
            ColumnData::Text(v) => ColumnData::Text(indices.iter().map(|&i| v[i].clone()).collect()),
            ColumnData::Number(v) => ColumnData::Number(indices.iter().map(|&i| v[i]).collect()),
            ColumnData::Flag(v) => ColumnData::Flag(indices.iter().map(|&i| v[i]).collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self::new(name, ColumnData::Text(values))
    }

    pub fn number(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnData::Number(values))
    }

    pub fn flag(name: impl Into<String>, values: Vec<bool>) -> Self {
        Self::new(name, ColumnData::Flag(values))
    }
}

/// Таблица объявлений: колонки по имени, строки идентифицируются только позицией
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingTable {
    columns: Vec<Column>,
    n_rows: usize,
}

impl ListingTable {
    pub fn new(n_rows: usize) -> Self {
        Self {
            columns: Vec::new(),
            n_rows,
        }
    }

    pub fn from_columns(columns: Vec<Column>) -> Result<Self, InputError> {
        let n_rows = columns.first().map(|c| c.data.len()).unwrap_or(0);
        let mut table = Self::new(n_rows);
        for column in columns {
            table.set_column(column)?;
        }
        Ok(table)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Заменяет колонку с тем же именем на месте либо добавляет в конец
    pub fn set_column(&mut self, column: Column) -> Result<(), InputError> {
        if column.data.len() != self.n_rows {
            return Err(InputError::ColumnLength {
                column: column.name,
                expected: self.n_rows,
                got: column.data.len(),
            });
        }

        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    pub fn rename_columns<F>(&mut self, mut rename: F)
    where
        F: FnMut(&str) -> String,
    {
        for column in &mut self.columns {
            column.name = rename(&column.name);
        }
    }

    /// Значения колонки как текст; числа и флаги форматируются
    pub fn text_values(&self, name: &str) -> Option<Vec<Option<String>>> {
        let column = self.column(name)?;
        Some((0..self.n_rows).map(|row| column.data.render(row)).collect())
    }

    /// Значения колонки как числа; то, что не парсится, становится пропуском
    pub fn number_values(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let column = self.column(name)?;
        let values = match &column.data {
            ColumnData::Number(v) => v.clone(),
            ColumnData::Flag(v) => v.iter().map(|&b| Some(if b { 1.0 } else { 0.0 })).collect(),
            ColumnData::Text(v) => v
                .iter()
                .map(|cell| cell.as_deref().and_then(coerce_number))
                .collect(),
        };
        Some(values)
    }

    /// Новая таблица из выбранных строк (в указанном порядке)
    pub fn take_rows(&self, indices: &[usize]) -> ListingTable {
        ListingTable {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.data.take(indices)))
                .collect(),
            n_rows: indices.len(),
        }
    }
}

/// Строгое приведение к числу: только конечные значения
pub fn coerce_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|x| x.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ListingTable {
        ListingTable::from_columns(vec![
            Column::text("bathroom", vec![Some("2".into()), Some("> 10".into()), None]),
            Column::number("price", vec![Some(1.5), None, Some(3.0)]),
            Column::flag("parking", vec![true, false, true]),
        ])
        .unwrap()
    }

    #[test]
    fn test_set_column_replaces_in_place() {
        let mut table = sample();
        table
            .set_column(Column::number("price", vec![Some(1.0), Some(2.0), Some(3.0)]))
            .unwrap();

        assert_eq!(table.column_names(), vec!["bathroom", "price", "parking"]);
        assert_eq!(
            table.number_values("price").unwrap(),
            vec![Some(1.0), Some(2.0), Some(3.0)]
        );
    }

    #[test]
    fn test_set_column_rejects_wrong_length() {
        let mut table = sample();
        let err = table
            .set_column(Column::flag("short", vec![true]))
            .unwrap_err();

        assert_eq!(
            err,
            InputError::ColumnLength {
                column: "short".to_string(),
                expected: 3,
                got: 1
            }
        );
    }

    #[test]
    fn test_number_values_coerces_text() {
        let table = sample();
        assert_eq!(
            table.number_values("bathroom").unwrap(),
            vec![Some(2.0), None, None]
        );
        assert_eq!(
            table.number_values("parking").unwrap(),
            vec![Some(1.0), Some(0.0), Some(1.0)]
        );
        assert!(table.number_values("missing").is_none());
    }

    #[test]
    fn test_take_rows() {
        let table = sample().take_rows(&[2, 0]);
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.number_values("price").unwrap(), vec![Some(3.0), Some(1.5)]);
        assert_eq!(
            table.text_values("parking").unwrap(),
            vec![Some("true".to_string()), Some("true".to_string())]
        );
    }
}
