//! Нормализация имён колонок

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::ListingTable;

static NON_ALNUM_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// " Price (INR) " -> "price_inr", "Amount(in rupees)" -> "amount_in_rupees".
///
/// Скобки работают как разделители, поэтому не склеивают соседние слова.
/// Функция идемпотентна.
pub fn normalize_column_name(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    NON_ALNUM_RUN
        .replace_all(&lowered, "_")
        .trim_matches('_')
        .to_string()
}

pub struct ColumnNormalizer;

impl ColumnNormalizer {
    /// Переименовывает все колонки таблицы в каноническую форму
    pub fn normalize(table: &mut ListingTable) {
        table.rename_columns(normalize_column_name);
        tracing::debug!("Normalized columns: {:?}", table.column_names());
    }
}
