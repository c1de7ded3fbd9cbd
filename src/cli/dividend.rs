use super::fetch::DataSources;
use super::ui;
use crate::core::config::AppConfig;
use crate::core::dividend::DividendDiscountValuator;
use crate::core::normalize::DataNormalizer;
use anyhow::Result;

/// Rates in percent; `None` uses the configured defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GordonArgs {
    pub growth_pct: Option<f64>,
    pub required_return_pct: Option<f64>,
    pub sensitivity: bool,
}

impl GordonArgs {
    /// Growth and required return as fractions.
    pub fn rates(&self, config: &AppConfig) -> (f64, f64) {
        (
            self.growth_pct.unwrap_or(config.valuation.growth_rate_pct) / 100.0,
            self.required_return_pct
                .unwrap_or(config.valuation.required_return_pct)
                / 100.0,
        )
    }
}

pub async fn run(
    config: &AppConfig,
    sources: &DataSources,
    ticker: &str,
    args: GordonArgs,
) -> Result<()> {
    let data = sources.load_company(config, ticker).await;
    let report = data.normalize(&DataNormalizer::from_config(&config.normalization));
    let company = &report.fundamentals;
    let (growth, required) = args.rates(config);

    println!("\n{}", ui::style_text(&data.title(), ui::StyleType::Title));
    println!(
        "Dividend yield: {}, growth: {}, required return: {}",
        company
            .dividend_yield
            .map_or_else(|| "N/A".to_string(), ui::format_rate),
        ui::format_rate(growth),
        ui::format_rate(required)
    );

    let valuator = DividendDiscountValuator::new(company);
    match valuator.try_fair_value(growth, required) {
        Ok(fair_value) => {
            print!(
                "{} {}",
                ui::style_text("Fair value:", ui::StyleType::TotalLabel),
                ui::style_text(&ui::format_money(fair_value), ui::StyleType::TotalValue)
            );
            match valuator.estimate(growth, required) {
                Some(estimate) => println!(" ({:+.2}%)", estimate.upside_percent),
                None => println!(),
            }
        }
        Err(e) => println!(
            "{} {}",
            ui::style_text("No estimate:", ui::StyleType::Error),
            e
        ),
    }

    if args.sensitivity {
        let matrix = config
            .valuation
            .sensitivity
            .evaluate(&valuator, growth, required);
        println!("\nSensitivity (growth vs required return)");
        println!("{}", ui::sensitivity_table(&matrix, "r"));
    }
    Ok(())
}
