use super::fetch::DataSources;
use super::ui;
use crate::core::config::AppConfig;
use crate::core::dcf::{DcfInputs, DcfResult, DcfValuator};
use crate::core::normalize::DataNormalizer;
use crate::core::sensitivity::DcfSensitivity;
use anyhow::{Context, Result, anyhow};
use comfy_table::{Cell, Table};

/// Command-line replacements for the configured DCF inputs. Rates in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DcfOverrides {
    pub initial_fcff: Option<f64>,
    pub stage1_growth_pct: Option<f64>,
    pub stage1_years: Option<u32>,
    pub stage2_growth_pct: Option<f64>,
    pub wacc_pct: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub net_debt: Option<f64>,
    pub cash_and_equivalents: Option<f64>,
}

impl DcfOverrides {
    /// Overrides win over `base`. Without a base every required input must be
    /// given.
    pub fn apply(&self, base: Option<DcfInputs>) -> Result<DcfInputs> {
        fn pick<T>(value: Option<T>, base: Option<T>, flag: &str) -> Result<T> {
            value
                .or(base)
                .ok_or_else(|| anyhow!("Missing DCF input: pass --{flag} or configure it"))
        }

        Ok(DcfInputs {
            initial_fcff: pick(self.initial_fcff, base.map(|b| b.initial_fcff), "fcff")?,
            stage1_growth_pct: pick(
                self.stage1_growth_pct,
                base.map(|b| b.stage1_growth_pct),
                "stage1-growth",
            )?,
            stage1_years: pick(self.stage1_years, base.map(|b| b.stage1_years), "years")?,
            stage2_growth_pct: pick(
                self.stage2_growth_pct,
                base.map(|b| b.stage2_growth_pct),
                "stage2-growth",
            )?,
            wacc_pct: pick(self.wacc_pct, base.map(|b| b.wacc_pct), "wacc")?,
            shares_outstanding: pick(
                self.shares_outstanding,
                base.map(|b| b.shares_outstanding),
                "shares",
            )?,
            net_debt: self
                .net_debt
                .or(base.map(|b| b.net_debt))
                .unwrap_or_default(),
            cash_and_equivalents: self
                .cash_and_equivalents
                .or(base.map(|b| b.cash_and_equivalents))
                .unwrap_or_default(),
        })
    }
}

pub async fn run(
    config: &AppConfig,
    sources: &DataSources,
    ticker: &str,
    overrides: DcfOverrides,
    sensitivity: bool,
) -> Result<()> {
    let data = sources.load_company(config, ticker).await;
    let inputs = overrides
        .apply(data.dcf)
        .with_context(|| format!("No usable DCF inputs for {}", data.ticker))?;
    let assumptions = inputs.to_assumptions()?;
    let result = DcfValuator.value(&assumptions)?;

    let report = data.normalize(&DataNormalizer::from_config(&config.normalization));

    println!("\n{}", ui::style_text(&data.title(), ui::StyleType::Title));
    println!(
        "FCFF {} growing {} for {} years, then {} perpetually at WACC {}",
        ui::format_money(assumptions.initial_fcff),
        ui::format_rate(assumptions.stage1_growth_rate),
        assumptions.stage1_years,
        ui::format_rate(assumptions.stage2_growth_rate),
        ui::format_rate(assumptions.discount_rate)
    );
    println!("{}", schedule_table(&result));
    println!("{}", summary_table(&result, &inputs));

    print!(
        "{} {}",
        ui::style_text("Value per share:", ui::StyleType::TotalLabel),
        ui::style_text(
            &ui::format_money(result.value_per_share),
            ui::StyleType::TotalValue
        )
    );
    match result.estimate(report.fundamentals.price) {
        Some(estimate) => println!(
            " vs price {} ({:+.2}%)",
            ui::format_money(report.fundamentals.price.unwrap_or_default()),
            estimate.upside_percent
        ),
        None => println!(),
    }

    if sensitivity {
        let matrix = config.valuation.sensitivity.evaluate(
            &DcfSensitivity::new(assumptions),
            assumptions.stage2_growth_rate,
            assumptions.discount_rate,
        );
        println!("\nSensitivity (perpetual growth vs WACC), value per share");
        println!("{}", ui::sensitivity_table(&matrix, "WACC"));
    }
    Ok(())
}

fn schedule_table(result: &DcfResult) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Year"),
        ui::header_cell("FCFF"),
        ui::header_cell("Present Value"),
    ]);
    for entry in &result.schedule {
        table.add_row(vec![
            Cell::new(entry.year),
            Cell::new(ui::format_money(entry.fcff)),
            Cell::new(ui::format_money(entry.present_value)),
        ]);
    }
    table
}

fn summary_table(result: &DcfResult, inputs: &DcfInputs) -> Table {
    let mut table = ui::new_styled_table();
    let rows = [
        ("PV of stage one", result.present_value_of_stage1()),
        ("Terminal value", result.terminal_value),
        ("PV of terminal value", result.present_value_of_terminal),
        ("Enterprise value", result.enterprise_value),
        ("Net debt", -inputs.net_debt),
        ("Cash and equivalents", inputs.cash_and_equivalents),
        ("Equity value", result.equity_value),
    ];
    for (label, value) in rows {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(ui::format_money(value)),
        ]);
    }
    table.add_row(vec![
        ui::subtle_cell("Terminal share of EV"),
        ui::format_optional_cell(result.terminal_weight(), ui::format_rate),
    ]);
    table
}
