//! Разбор цены и площади из произвольного текста
//!
//! Ошибки разбора никогда не пробрасываются: всё, что не удалось распознать,
//! становится `None`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::coerce_number;

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());
static PURE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:\d+\.?\d*|\.\d+)$").unwrap());

pub const LAKH: f64 = 100_000.0;
pub const CRORE: f64 = 10_000_000.0;

/// Множители цены в порядке проверки; более длинные написания идут первыми,
/// чтобы при удалении не оставались хвосты
pub const PRICE_MAGNITUDES: &[(&[&str], f64)] = &[
    (&["lakhs", "lakh", "lacs", "lac"], LAKH),
    (&["crores", "crore", "cr"], CRORE),
];

pub const SQM_TO_SQFT: f64 = 10.7639;
pub const SQYD_TO_SQFT: f64 = 9.0;

/// Единицы площади: первое совпадение подстроки выигрывает
pub const AREA_UNITS: &[(&str, f64)] = &[
    // квадратные метры
    ("square meter", SQM_TO_SQFT),
    ("square metre", SQM_TO_SQFT),
    ("sq meter", SQM_TO_SQFT),
    ("sq metre", SQM_TO_SQFT),
    ("sq. m", SQM_TO_SQFT),
    ("sq.m", SQM_TO_SQFT),
    ("sq m", SQM_TO_SQFT),
    ("sqm", SQM_TO_SQFT),
    // квадратные ярды
    ("square yard", SQYD_TO_SQFT),
    ("sq yard", SQYD_TO_SQFT),
    ("sq. yd", SQYD_TO_SQFT),
    ("sq.yd", SQYD_TO_SQFT),
    ("sq yd", SQYD_TO_SQFT),
    ("sqyrd", SQYD_TO_SQFT),
    ("sqyd", SQYD_TO_SQFT),
    ("gaj", SQYD_TO_SQFT),
    // квадратные футы
    ("square feet", 1.0),
    ("square foot", 1.0),
    ("sq. ft", 1.0),
    ("sq.ft", 1.0),
    ("sq ft", 1.0),
    ("sqft", 1.0),
    ("sft", 1.0),
];

fn clean(raw: &str) -> String {
    raw.trim().replace(',', "").to_lowercase()
}

fn first_number(text: &str) -> Option<f64> {
    NUMBER
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Цена в рупиях: "1,25,000", "45 Lac", "1.2 Cr", "Rs 5000 approx"
pub fn parse_price(raw: Option<&str>) -> Option<f64> {
    let text = clean(raw?);

    if PURE_NUMBER.is_match(&text) {
        return text.parse::<f64>().ok();
    }

    for (spellings, factor) in PRICE_MAGNITUDES {
        if spellings.iter().any(|s| text.contains(s)) {
            let mut rest = text.clone();
            for s in spellings.iter() {
                rest = rest.replace(s, "");
            }
            return coerce_number(&rest).map(|x| x * factor);
        }
    }

    first_number(&text)
}

/// Площадь в квадратных футах; диапазон "400-450" даёт середину
pub fn parse_area_sqft(raw: Option<&str>) -> Option<f64> {
    let text = clean(raw?);

    let magnitude = if text.contains('-') {
        let tokens: Vec<f64> = text
            .split('-')
            .filter(|segment| !segment.is_empty())
            .filter_map(first_number)
            .collect();
        if tokens.is_empty() {
            return None;
        }
        tokens.iter().sum::<f64>() / tokens.len() as f64
    } else {
        first_number(&text)?
    };

    Some(magnitude * area_unit_factor(&text))
}

/// Множитель к квадратным футам; неизвестная единица считается футами
pub fn area_unit_factor(text: &str) -> f64 {
    AREA_UNITS
        .iter()
        .find(|(token, _)| text.contains(token))
        .map(|(_, factor)| *factor)
        .unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.map(|a| (a - b).abs() < 1e-6).unwrap_or(false)
    }

    #[test]
    fn test_parse_price_plain_and_indian_grouping() {
        assert_eq!(parse_price(Some("1,25,000")), Some(125000.0));
        assert_eq!(parse_price(Some(" 4500000 ")), Some(4500000.0));
        assert_eq!(parse_price(Some("12.5")), Some(12.5));
    }

    #[test]
    fn test_parse_price_magnitudes() {
        assert!(approx(parse_price(Some("45 Lac")), 4_500_000.0));
        assert!(approx(parse_price(Some("1.2 Cr")), 12_000_000.0));
        assert!(approx(parse_price(Some("2.5 Lakhs")), 250_000.0));
        assert!(approx(parse_price(Some("1.5 crore")), 15_000_000.0));
    }

    #[test]
    fn test_parse_price_lakh_takes_precedence() {
        // "lac" проверяется раньше "cr" и числовой выборки
        assert!(approx(parse_price(Some("150 lac")), 15_000_000.0));
        assert_eq!(parse_price(Some("approx lac cr")), None);
    }

    #[test]
    fn test_parse_price_fallback_and_missing() {
        assert_eq!(parse_price(None), None);
        assert_eq!(parse_price(Some("Price on Request")), None);
        assert_eq!(parse_price(Some("Rs 5000.50 negotiable")), Some(5000.5));
        assert_eq!(parse_price(Some("lac")), None);
    }

    #[test]
    fn test_parse_area_ranges_and_units() {
        assert!(approx(parse_area_sqft(Some("400-450 sqft")), 425.0));
        assert!(approx(parse_area_sqft(Some("120 sqm")), 120.0 * 10.7639));
        assert!(approx(parse_area_sqft(Some("100 sqyd")), 900.0));
        assert!(approx(parse_area_sqft(Some("1,200 sq ft")), 1200.0));
        assert!(approx(parse_area_sqft(Some("850")), 850.0));
        assert!(approx(parse_area_sqft(Some("100-200 Square Yard")), 1350.0));
    }

    #[test]
    fn test_parse_area_unparseable() {
        assert_eq!(parse_area_sqft(None), None);
        assert_eq!(parse_area_sqft(Some("")), None);
        assert_eq!(parse_area_sqft(Some("n/a")), None);
        assert_eq!(parse_area_sqft(Some("- sqft -")), None);
    }

    #[test]
    fn test_area_unit_factor_defaults_to_feet() {
        assert_eq!(area_unit_factor("500 acres"), 1.0);
        assert_eq!(area_unit_factor("500 sq.m"), SQM_TO_SQFT);
        assert_eq!(area_unit_factor("50 gaj"), SQYD_TO_SQFT);
    }
}
