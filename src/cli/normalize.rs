use super::fetch::{CompanyData, DataSources};
use super::ui;
use crate::core::config::AppConfig;
use crate::core::fundamentals::Field;
use crate::core::normalize::{DataNormalizer, NormalizationReport};
use anyhow::Result;
use comfy_table::{Cell, Table};

pub async fn run(config: &AppConfig, sources: &DataSources, ticker: &str) -> Result<()> {
    let data = sources.load_company(config, ticker).await;
    let report = data.normalize(&DataNormalizer::from_config(&config.normalization));

    println!(
        "\n{} {}",
        ui::style_text(&data.title(), ui::StyleType::Title),
        ui::style_text(&format!("source: {}", report.source), ui::StyleType::Subtle)
    );
    if let Some(sector) = &report.fundamentals.sector {
        println!("Sector: {sector}");
    }
    println!("{}", build_table(&data, &report));
    Ok(())
}

/// One row per field: as reported, as normalized and what changed in between.
fn build_table(data: &CompanyData, report: &NormalizationReport) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Field"),
        ui::header_cell("Reported"),
        ui::header_cell("Normalized"),
        ui::header_cell("Adjustments"),
    ]);

    for field in Field::ALL {
        let reported = data.raw.get(field);
        let normalized = report.fundamentals.get(field);
        let notes: Vec<String> = report
            .adjustments_for(field)
            .map(|adjustment| adjustment.to_string())
            .collect();
        if reported.is_none() && normalized.is_none() && notes.is_empty() {
            continue;
        }
        let has_error = normalized.is_none() && !notes.is_empty();
        table.add_row(vec![
            Cell::new(field.as_str()),
            ui::format_optional_cell(reported, |v| format!("{v}")),
            match normalized {
                Some(v) => ui::highlight_cell(v, |v| ui::format_field(field, v)),
                None => ui::na_cell(has_error),
            },
            ui::subtle_cell(&notes.join("; ")),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fundamentals::RawFundamentals;

    #[test]
    fn test_table_lists_reported_and_derived_fields() {
        let data = CompanyData {
            ticker: "PETR4".to_string(),
            name: None,
            raw: RawFundamentals::new("statusinvest")
                .with(Field::Price, 36.9)
                .with(Field::PeRatio, 4.5)
                .with(Field::DividendYield, 17.68),
            history: None,
            dcf: None,
        };
        let report = data.normalize(&DataNormalizer::default());
        let rendered = build_table(&data, &report).to_string();

        assert!(rendered.contains("dividend_yield"));
        assert!(rendered.contains("17.68%"));
        assert!(rendered.contains("percent to fraction"));
        // eps is derived from price / P/E
        assert!(rendered.contains("eps"));
        assert!(rendered.contains("8.20"));
        assert!(!rendered.contains("week52_high"));
    }
}
