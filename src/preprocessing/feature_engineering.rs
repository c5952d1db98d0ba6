//! Feature engineering для объявлений
//!
//! Каждый производный признак описан строкой в [`FEATURE_SCHEMA`]: имя
//! колонки, от каких входных колонок он зависит и что делать, если их нет.
//! Отсутствие входной колонки никогда не является ошибкой.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::InputError;
use crate::preprocessing::value_parsers::{parse_area_sqft, parse_price};
use crate::types::{coerce_number, Column, ColumnData, ListingTable};

/// Колонки цены: основная и запасная
pub const PRICE_COLUMNS: &[&str] = &["amount_in_rupees", "price_in_rupees"];
/// Сырые колонки площади; распознанная площадь пишется в `<name>_sqft`
pub const AREA_COLUMNS: &[&str] = &["carpet_area", "super_area", "plot_area"];

pub const CARPET_AREA_SQFT: &str = "carpet_area_sqft";
pub const SUPER_AREA_SQFT: &str = "super_area_sqft";
pub const PLOT_AREA_SQFT: &str = "plot_area_sqft";

pub const OTHER_LOCATION: &str = "other";
pub const DEFAULT_TOP_LOCATIONS: usize = 30;

/// Точное совпадение (после lowercase) -> упрощённая категория
pub const FURNISHING_MAP: &[(&str, &str)] = &[
    ("fully furnished", "furnished"),
    ("semi-furnished", "semi"),
    ("unfurnished", "unfurnished"),
];

/// Любая из подстрок означает наличие парковки
pub const PARKING_TOKENS: &[&str] = &["open", "covered", "yes", "free", "available", "1"];

/// Словесные обозначения этажа
pub const FLOOR_KEYWORDS: &[(&str, f64)] = &[("ground", 0.0)];

static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d+").unwrap());

/// Условие наличия входных колонок
#[derive(Debug, Clone, Copy)]
pub enum Requirement {
    AllOf(&'static [&'static str]),
    AnyOf(&'static [&'static str]),
}

impl Requirement {
    pub fn is_met(&self, table: &ListingTable) -> bool {
        match self {
            Requirement::AllOf(cols) => cols.iter().all(|c| table.has_column(c)),
            Requirement::AnyOf(cols) => cols.iter().any(|c| table.has_column(c)),
        }
    }
}

/// Что получает признак, если входных колонок нет
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fallback {
    /// Колонка не создаётся
    Absent,
    /// Колонка-флаг с постоянным значением
    Flag(bool),
}

type DeriveFn = fn(&FeatureEngineer, &ListingTable) -> ColumnData;

pub struct FeatureRule {
    pub output: &'static str,
    pub requires: Requirement,
    pub fallback: Fallback,
    derive: DeriveFn,
}

pub const FEATURE_SCHEMA: &[FeatureRule] = &[
    FeatureRule {
        output: "price_per_sqft",
        requires: Requirement::AnyOf(PRICE_COLUMNS),
        fallback: Fallback::Absent,
        derive: FeatureEngineer::price_per_sqft,
    },
    FeatureRule {
        output: "carpet_super_ratio",
        requires: Requirement::AllOf(&[CARPET_AREA_SQFT, SUPER_AREA_SQFT]),
        fallback: Fallback::Absent,
        derive: FeatureEngineer::carpet_super_ratio,
    },
    FeatureRule {
        output: "floor_num",
        requires: Requirement::AllOf(&["floor"]),
        fallback: Fallback::Absent,
        derive: FeatureEngineer::floor_num,
    },
    FeatureRule {
        output: "bathroom",
        requires: Requirement::AllOf(&["bathroom"]),
        fallback: Fallback::Absent,
        derive: FeatureEngineer::bathroom,
    },
    FeatureRule {
        output: "balcony",
        requires: Requirement::AllOf(&["balcony"]),
        fallback: Fallback::Absent,
        derive: FeatureEngineer::balcony,
    },
    FeatureRule {
        output: "furnishing_simple",
        requires: Requirement::AllOf(&["furnishing"]),
        fallback: Fallback::Absent,
        derive: FeatureEngineer::furnishing_simple,
    },
    FeatureRule {
        output: "car_parking_flag",
        requires: Requirement::AllOf(&["car_parking"]),
        fallback: Fallback::Flag(false),
        derive: FeatureEngineer::car_parking_flag,
    },
    FeatureRule {
        output: "location_clean",
        requires: Requirement::AllOf(&["location"]),
        fallback: Fallback::Absent,
        derive: FeatureEngineer::location_clean,
    },
    FeatureRule {
        output: "has_plot_area",
        requires: Requirement::AllOf(&[PLOT_AREA_SQFT]),
        fallback: Fallback::Flag(false),
        derive: FeatureEngineer::has_plot_area,
    },
];

/// Деление без бесконечностей: пустой или нулевой знаменатель даёт `None`
pub fn safe_div(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(a), Some(b)) if b != 0.0 => Some(a / b).filter(|x| x.is_finite()),
        _ => None,
    }
}

/// "3 out of 10" -> 3, "5/12" -> 5, "Ground out of 4" -> 0, "-1" -> -1
pub fn parse_floor(raw: &str) -> Option<f64> {
    let text = raw.to_lowercase();

    if let Some((before, _)) = text.split_once('/') {
        if let Some(floor) = coerce_number(before) {
            return Some(floor);
        }
    }

    if let Some((_, value)) = FLOOR_KEYWORDS.iter().find(|(kw, _)| text.contains(kw)) {
        return Some(*value);
    }

    INTEGER
        .find(&text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

pub fn simplify_furnishing(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    FURNISHING_MAP
        .iter()
        .find(|(phrase, _)| *phrase == lowered)
        .map(|(_, simple)| simple.to_string())
        .unwrap_or(lowered)
}

pub fn has_car_parking(raw: Option<&str>) -> bool {
    raw.map(|s| {
        let lowered = s.to_lowercase();
        PARKING_TOKENS.iter().any(|t| lowered.contains(t))
    })
    .unwrap_or(false)
}

/// k самых частых непустых значений. При равной частоте раньше идёт
/// значение, встреченное первым.
pub fn top_k_by_frequency(values: &[Option<String>], k: usize) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();

    for value in values.iter().flatten() {
        let count = counts.entry(value.as_str()).or_insert(0);
        if *count == 0 {
            first_seen.push(value.as_str());
        }
        *count += 1;
    }

    // sort_by стабилен, порядок первого появления сохраняется
    first_seen.sort_by(|a, b| counts[b].cmp(&counts[a]));
    first_seen.into_iter().take(k).map(str::to_string).collect()
}

fn numbers_or_null(table: &ListingTable, name: &str) -> Vec<Option<f64>> {
    table
        .number_values(name)
        .unwrap_or_else(|| vec![None; table.n_rows()])
}

fn texts_or_null(table: &ListingTable, name: &str) -> Vec<Option<String>> {
    table
        .text_values(name)
        .unwrap_or_else(|| vec![None; table.n_rows()])
}

fn first_present<'a>(table: &ListingTable, names: &[&'a str]) -> Option<&'a str> {
    names.iter().copied().find(|n| table.has_column(n))
}

pub struct FeatureEngineer {
    top_locations: usize,
}

impl FeatureEngineer {
    pub fn new(top_locations: usize) -> Self {
        Self { top_locations }
    }

    /// Колонка есть в таблице только как постоянная заглушка (входов для неё нет)
    pub fn is_constant_fallback(&self, table: &ListingTable, name: &str) -> bool {
        FEATURE_SCHEMA.iter().any(|rule| {
            rule.output == name
                && matches!(rule.fallback, Fallback::Flag(_))
                && !rule.requires.is_met(table)
        })
    }

    /// Разбор цены (на месте) и площадей (в новые колонки `*_sqft`)
    pub fn parse_listing_fields(&self, table: &mut ListingTable) -> Result<(), InputError> {
        for &name in PRICE_COLUMNS {
            if let Some(raw) = table.text_values(name) {
                let parsed = raw.iter().map(|v| parse_price(v.as_deref())).collect();
                table.set_column(Column::number(name, parsed))?;
            }
        }

        for &name in AREA_COLUMNS {
            if let Some(raw) = table.text_values(name) {
                let parsed = raw.iter().map(|v| parse_area_sqft(v.as_deref())).collect();
                table.set_column(Column::number(format!("{name}_sqft"), parsed))?;
            }
        }

        Ok(())
    }

    /// Добавляет все производные признаки, для которых есть входные колонки
    pub fn derive_features(&self, table: &mut ListingTable) -> Result<(), InputError> {
        for rule in FEATURE_SCHEMA {
            if rule.requires.is_met(table) {
                let data = (rule.derive)(self, table);
                table.set_column(Column::new(rule.output, data))?;
                continue;
            }

            match rule.fallback {
                Fallback::Absent => {
                    tracing::debug!("Skipping feature '{}': inputs missing", rule.output);
                }
                Fallback::Flag(value) => {
                    let n_rows = table.n_rows();
                    table.set_column(Column::flag(rule.output, vec![value; n_rows]))?;
                }
            }
        }

        Ok(())
    }

    fn price_per_sqft(&self, table: &ListingTable) -> ColumnData {
        let price = first_present(table, PRICE_COLUMNS)
            .map(|name| numbers_or_null(table, name))
            .unwrap_or_else(|| vec![None; table.n_rows()]);

        let area = match first_present(table, &[CARPET_AREA_SQFT, SUPER_AREA_SQFT]) {
            Some(name) => numbers_or_null(table, name),
            None => vec![None; table.n_rows()],
        };

        ColumnData::Number(
            price
                .into_iter()
                .zip(area)
                .map(|(p, a)| safe_div(p, a))
                .collect(),
        )
    }

    fn carpet_super_ratio(&self, table: &ListingTable) -> ColumnData {
        let carpet = numbers_or_null(table, CARPET_AREA_SQFT);
        let sup = numbers_or_null(table, SUPER_AREA_SQFT);
        ColumnData::Number(carpet.into_iter().zip(sup).map(|(c, s)| safe_div(c, s)).collect())
    }

    fn floor_num(&self, table: &ListingTable) -> ColumnData {
        ColumnData::Number(
            texts_or_null(table, "floor")
                .iter()
                .map(|v| v.as_deref().and_then(parse_floor))
                .collect(),
        )
    }

    fn bathroom(&self, table: &ListingTable) -> ColumnData {
        ColumnData::Number(numbers_or_null(table, "bathroom"))
    }

    fn balcony(&self, table: &ListingTable) -> ColumnData {
        ColumnData::Number(numbers_or_null(table, "balcony"))
    }

    fn furnishing_simple(&self, table: &ListingTable) -> ColumnData {
        ColumnData::Text(
            texts_or_null(table, "furnishing")
                .iter()
                .map(|v| v.as_deref().map(simplify_furnishing))
                .collect(),
        )
    }

    fn car_parking_flag(&self, table: &ListingTable) -> ColumnData {
        ColumnData::Flag(
            texts_or_null(table, "car_parking")
                .iter()
                .map(|v| has_car_parking(v.as_deref()))
                .collect(),
        )
    }

    fn location_clean(&self, table: &ListingTable) -> ColumnData {
        let locations = texts_or_null(table, "location");
        let top: HashSet<String> = top_k_by_frequency(&locations, self.top_locations)
            .into_iter()
            .collect();

        ColumnData::Text(
            locations
                .into_iter()
                .map(|v| match v {
                    Some(loc) if top.contains(&loc) => Some(loc),
                    _ => Some(OTHER_LOCATION.to_string()),
                })
                .collect(),
        )
    }

    fn has_plot_area(&self, table: &ListingTable) -> ColumnData {
        ColumnData::Flag(
            numbers_or_null(table, PLOT_AREA_SQFT)
                .iter()
                .map(Option::is_some)
                .collect(),
        )
    }
}

impl Default for FeatureEngineer {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_LOCATIONS)
    }
}
