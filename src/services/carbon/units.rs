use super::CarbonError;

/// Unit of every computed emission.
pub const EMISSIONS_UNIT: &str = "kgCO2e";

const KWH_PER_GJ: f64 = 277.7777777778;

/// Lower-case, trimmed unit with common aliases folded
/// (`kWh PCI` → `kwh`, `litre` → `l`, …).
pub fn normalize_unit(unit: &str) -> String {
    let unit = unit.trim().to_lowercase();
    match unit.as_str() {
        "gj pci" | "gigajoule" => "gj".to_string(),
        "kwh pci" | "kilowattheure" => "kwh".to_string(),
        "mwh pci" => "mwh".to_string(),
        "litre" => "l".to_string(),
        _ => unit,
    }
}

/// Convert `amount` between units. Identical units pass through.
pub fn convert_amount(amount: f64, from: &str, to: &str) -> Result<f64, CarbonError> {
    let from_norm = normalize_unit(from);
    let to_norm = normalize_unit(to);

    let factor = match (from_norm.as_str(), to_norm.as_str()) {
        (a, b) if a == b => 1.0,
        ("kwh", "gj") => 1.0 / KWH_PER_GJ,
        ("gj", "kwh") => KWH_PER_GJ,
        ("mwh", "kwh") => 1000.0,
        ("kwh", "mwh") => 1.0 / 1000.0,
        _ => {
            return Err(CarbonError::UnsupportedConversion {
                from: from.to_string(),
                to: to.to_string(),
            })
        }
    };
    Ok(amount * factor)
}

/// `amount` (in `amount_unit`) times a factor expressed per `factor_unit`.
pub fn compute_emissions(
    amount: f64,
    amount_unit: &str,
    factor_value: f64,
    factor_unit: &str,
) -> Result<(f64, &'static str), CarbonError> {
    let converted = convert_amount(amount, amount_unit, factor_unit)?;
    Ok((converted * factor_value, EMISSIONS_UNIT))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_normalize_unit() {
        assert_eq!(normalize_unit(" kWh PCI "), "kwh");
        assert_eq!(normalize_unit("Litre"), "l");
        assert_eq!(normalize_unit("t"), "t");
        assert_eq!(normalize_unit(""), "");
    }

    #[test]
    fn test_energy_conversions() {
        assert!(close(convert_amount(277.7777777778, "kWh", "GJ").unwrap(), 1.0));
        assert!(close(convert_amount(2.0, "GJ PCI", "kWh").unwrap(), 555.5555555556));
        assert!(close(convert_amount(1.5, "MWh", "kWh PCI").unwrap(), 1500.0));
        assert!(close(convert_amount(10.0, "L", "litre").unwrap(), 10.0));
    }

    #[test]
    fn test_unsupported_conversion() {
        let err = convert_amount(1.0, "kg", "kWh").unwrap_err();
        assert!(matches!(err, CarbonError::UnsupportedConversion { .. }));
        assert_eq!(err.to_string(), "unsupported conversion: kg -> kWh");
    }

    #[test]
    fn test_compute_emissions() {
        let (value, unit) = compute_emissions(2.0, "MWh", 0.052, "kWh").unwrap();
        assert!(close(value, 104.0));
        assert_eq!(unit, EMISSIONS_UNIT);
    }
}
