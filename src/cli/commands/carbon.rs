//! Carbon calculator commands.

use console::style;
use serde_json::Value;

use crate::cli::helpers::{http_client, truncate};
use crate::config::Settings;
use crate::services::carbon::{
    compute_emissions, guess_factor_unit, guess_factor_value, DataFairClient, LinesPage,
};

fn client(settings: &Settings) -> anyhow::Result<DataFairClient> {
    Ok(DataFairClient::new(
        http_client(settings)?,
        &settings.carbon_api_base,
    ))
}

/// Best human label for a dataset line.
fn line_label(line: &Value) -> String {
    let Some(fields) = line.as_object() else {
        return line.to_string();
    };
    fields
        .iter()
        .find(|(key, value)| {
            let key = key.to_lowercase();
            (key.starts_with("nom") || key.contains("raison") || key.contains("name"))
                && value.is_string()
        })
        .and_then(|(_, value)| value.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| truncate(&line.to_string(), 80))
}

fn print_page(page: &LinesPage) {
    if let Some(total) = page.total {
        println!("{} {} result(s)", style("→").cyan(), total);
    }
}

/// Search emission factors.
pub async fn cmd_search(
    settings: &Settings,
    query: &str,
    size: u32,
    page: u32,
) -> anyhow::Result<()> {
    let lines = client(settings)?
        .search_factors(Some(query), size, page)
        .await?;
    print_page(&lines);

    for line in &lines.results {
        let value = guess_factor_value(line)
            .map(|v| v.to_string())
            .unwrap_or_else(|| "?".to_string());
        let unit = guess_factor_unit(line).unwrap_or_else(|| "?".to_string());
        println!(
            "  {} {} {}",
            style("•").cyan(),
            truncate(&line_label(line), 70),
            style(format!("{} / {}", value, unit)).dim()
        );
    }
    Ok(())
}

/// Published reports for a SIREN.
pub async fn cmd_bilans(
    settings: &Settings,
    siren: &str,
    size: u32,
    page: u32,
) -> anyhow::Result<()> {
    let lines = client(settings)?.bilans_by_siren(siren, size, page).await?;
    print_page(&lines);

    if lines.results.is_empty() {
        println!("{} No published report for {}", style("!").yellow(), siren);
    }
    for line in &lines.results {
        println!("  {} {}", style("•").cyan(), line_label(line));
    }
    Ok(())
}

/// Compute emissions for an amount and factor.
pub fn cmd_compute(amount: f64, unit: &str, factor: f64, factor_unit: &str) -> anyhow::Result<()> {
    let (emissions, emissions_unit) = compute_emissions(amount, unit, factor, factor_unit)?;
    println!(
        "{} {} {} × {} per {} = {:.3} {}",
        style("✓").green(),
        amount,
        unit,
        factor,
        factor_unit,
        emissions,
        emissions_unit
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_line_label() {
        assert_eq!(
            line_label(&json!({"Nom_base_français": "Gazole routier", "Total": 3.1})),
            "Gazole routier"
        );
        assert_eq!(
            line_label(&json!({"Raison_sociale": "ACME SA"})),
            "ACME SA"
        );
        assert_eq!(line_label(&json!({"x": 1})), r#"{"x":1}"#);
    }
}
