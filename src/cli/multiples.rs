use super::fetch::DataSources;
use super::ui;
use crate::core::config::AppConfig;
use crate::core::fundamentals::NormalizedFundamentals;
use crate::core::multiples::{MethodOutcome, MultiplesValuator};
use crate::core::normalize::DataNormalizer;
use crate::core::sector::SectorBenchmarkTable;
use anyhow::Result;
use comfy_table::{Cell, Table};

pub async fn run(config: &AppConfig, sources: &DataSources, ticker: &str) -> Result<()> {
    let data = sources.load_company(config, ticker).await;
    let report = data.normalize(&DataNormalizer::from_config(&config.normalization));
    let sectors = config.sector_table();
    let company = &report.fundamentals;

    println!(
        "\n{}",
        ui::style_text(&data.title(), ui::StyleType::Title)
    );
    print_context(company, &sectors);

    let outcomes = MultiplesValuator::new(company, &sectors).evaluate();
    println!("{}", build_table(&outcomes));
    Ok(())
}

fn print_context(company: &NormalizedFundamentals, sectors: &SectorBenchmarkTable) {
    let price = company
        .price
        .map_or_else(|| "N/A".to_string(), ui::format_money);
    println!("Current price: {price}");
    let sector = company.sector.as_deref();
    let label = match sector {
        Some(name) if sectors.get(name).is_some() => name,
        _ => "market fallback",
    };
    match sectors.resolve(sector) {
        Some(benchmark) => println!(
            "Benchmark ({}): P/E {:.1}x, P/B {:.1}x, EV/EBITDA {:.1}x",
            label,
            benchmark.pe,
            benchmark.pb,
            benchmark.ev_to_ebitda
        ),
        None => println!(
            "{}",
            ui::style_text("No sector benchmark available", ui::StyleType::Subtle)
        ),
    }
}

/// Method, target and upside per method; failed methods show why.
pub(crate) fn build_table(outcomes: &[MethodOutcome]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Method"),
        ui::header_cell("Target Price"),
        ui::header_cell("Upside"),
        ui::header_cell("Note"),
    ]);
    for outcome in outcomes {
        let row = match &outcome.outcome {
            Ok(estimate) => vec![
                Cell::new(outcome.method.to_string()),
                ui::highlight_cell(estimate.target_price, ui::format_money),
                ui::change_cell(estimate.upside_percent),
                Cell::new(""),
            ],
            Err(e) => vec![
                Cell::new(outcome.method.to_string()),
                ui::na_cell(!e.is_no_estimate()),
                ui::na_cell(false),
                ui::subtle_cell(&e.to_string()),
            ],
        };
        table.add_row(row);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_shows_targets_and_reasons() {
        let company = NormalizedFundamentals {
            price: Some(36.9),
            eps: Some(8.2),
            pe_ratio: Some(4.5),
            sector: Some("Energy".to_string()),
            ..Default::default()
        };
        let sectors = SectorBenchmarkTable::default();
        let outcomes = MultiplesValuator::new(&company, &sectors).evaluate();
        let rendered = build_table(&outcomes).to_string();

        assert!(rendered.contains("Historic P/E"));
        // 8.2 * 4.5 * 0.9
        assert!(rendered.contains("33.21"));
        assert!(rendered.contains("-10.00%"));
        assert!(rendered.contains("missing required input"));
    }
}
