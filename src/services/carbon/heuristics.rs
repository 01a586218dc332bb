//! Guess which fields of a free-form factor line hold its value and unit.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

const VALUE_HINTS: &[&str] = &[
    "valeur",
    "valeur_co2",
    "co2",
    "kgco2",
    "kgco2e",
    "kgco2eq",
    "total",
    "total poste",
];

const UNIT_HINTS: &[&str] = &["unite", "unité", "unity", "unit"];

static NUMBER_IN_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+(?:[.,][0-9]+)?)").expect("number regex should compile")
});

/// Numeric field most likely to be the emission factor.
///
/// Fields whose key mentions a value or CO2 hint win; among equals the first
/// one wins. With no numeric field at all, the first number found inside a
/// string field is used.
pub fn guess_factor_value(line: &Value) -> Option<f64> {
    let fields = line.as_object()?;

    let best = fields
        .iter()
        .filter_map(|(key, value)| {
            let number = value.as_f64().filter(|n| n.is_finite())?;
            let key = key.to_lowercase();
            let mut score = 0;
            if VALUE_HINTS.iter().any(|hint| key.contains(hint)) {
                score += 10;
            }
            if key.contains("co2") {
                score += 5;
            }
            Some((score, number))
        })
        .fold(None, |best: Option<(i32, f64)>, candidate| match best {
            Some(current) if current.0 >= candidate.0 => Some(current),
            _ => Some(candidate),
        });

    if let Some((_, number)) = best {
        return Some(number);
    }

    fields.values().filter_map(Value::as_str).find_map(|text| {
        let captured = NUMBER_IN_TEXT.captures(text)?.get(1)?.as_str();
        captured.replace(',', ".").parse().ok()
    })
}

/// Unit the factor is expressed per.
///
/// Prefers a unit-named field; otherwise takes the part after the last `/`
/// of a value like `kgCO2e/kWh`.
pub fn guess_factor_unit(line: &Value) -> Option<String> {
    let fields = line.as_object()?;

    let named = fields.iter().find_map(|(key, value)| {
        let key = key.to_lowercase();
        if !UNIT_HINTS.iter().any(|hint| key.contains(hint)) {
            return None;
        }
        let text = value.as_str()?.trim();
        (!text.is_empty()).then(|| text.to_string())
    });
    if named.is_some() {
        return named;
    }

    fields.values().filter_map(Value::as_str).find_map(|text| {
        if !text.contains('/') || !text.to_lowercase().contains("co2") {
            return None;
        }
        text.rsplit('/').next().map(|right| right.trim().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hinted_field_wins() {
        let line = json!({"Code": 12345, "Total_poste_non_décomposé": 3.17, "Nom": "Gazole"});
        assert_eq!(guess_factor_value(&line), Some(3.17));
    }

    #[test]
    fn test_co2_bonus() {
        let line = json!({"valeur": 1.0, "valeur_co2": 2.5});
        assert_eq!(guess_factor_value(&line), Some(2.5));
    }

    #[test]
    fn test_number_in_text_fallback() {
        let line = json!({"Nom": "Électricité", "Facteur": "0,052 kgCO2e/kWh"});
        assert_eq!(guess_factor_value(&line), Some(0.052));
        assert_eq!(guess_factor_value(&json!({"Nom": "x"})), None);
        assert_eq!(guess_factor_value(&json!([1, 2])), None);
    }

    #[test]
    fn test_unit_field_then_ratio() {
        assert_eq!(
            guess_factor_unit(&json!({"Unité_français": " kgCO2e/kWh PCI "})).as_deref(),
            Some("kgCO2e/kWh PCI")
        );
        assert_eq!(
            guess_factor_unit(&json!({"Description": "kgCO2e / litre"})).as_deref(),
            Some("litre")
        );
        assert_eq!(guess_factor_unit(&json!({"Nom": "Gazole"})), None);
    }
}
