use super::fetch::{CompanyData, DataSources};
use super::ui;
use crate::core::config::AppConfig;
use crate::core::dcf::DcfValuator;
use crate::core::dividend::DividendDiscountValuator;
use crate::core::estimate::{ValuationEstimate, ValuationMethod};
use crate::core::multiples::MultiplesValuator;
use crate::core::normalize::DataNormalizer;
use crate::core::sector::SectorBenchmarkTable;
use anyhow::Result;
use comfy_table::{Cell, Table};
use futures::future::join_all;

/// All methods for one company; failed methods carry the reason.
struct CompanyValuation {
    title: String,
    ticker: String,
    price: Option<f64>,
    rows: Vec<(ValuationMethod, std::result::Result<ValuationEstimate, String>)>,
}

impl CompanyValuation {
    fn estimates(&self) -> impl Iterator<Item = &ValuationEstimate> {
        self.rows.iter().filter_map(|(_, row)| row.as_ref().ok())
    }

    fn mean_target(&self) -> Option<f64> {
        let targets: Vec<f64> = self.estimates().map(|e| e.target_price).collect();
        (!targets.is_empty()).then(|| targets.iter().sum::<f64>() / targets.len() as f64)
    }
}

pub async fn run(config: &AppConfig, sources: &DataSources, tickers: &[String]) -> Result<()> {
    if tickers.is_empty() {
        println!("No tickers given.");
        return Ok(());
    }

    let pb = ui::new_progress_bar(tickers.len() as u64);
    let futures = tickers.iter().map(|ticker| {
        let pb_clone = pb.clone();
        async move {
            let data = sources.load_company(config, ticker).await;
            pb_clone.inc(1);
            data
        }
    });
    let companies = join_all(futures).await;
    pb.finish_and_clear();

    let normalizer = DataNormalizer::from_config(&config.normalization);
    let sectors = config.sector_table();
    let valuations: Vec<CompanyValuation> = companies
        .iter()
        .map(|data| value_company(config, &normalizer, &sectors, data))
        .collect();

    for (i, valuation) in valuations.iter().enumerate() {
        println!(
            "\n{}",
            ui::style_text(&valuation.title, ui::StyleType::Title)
        );
        println!("{}", methods_table(valuation));
        if i < valuations.len() - 1 {
            ui::print_separator();
        }
    }

    if valuations.len() > 1 {
        println!("\n{}", ui::style_text("Summary", ui::StyleType::Title));
        println!("{}", summary_table(&valuations));
    }
    Ok(())
}

fn value_company(
    config: &AppConfig,
    normalizer: &DataNormalizer,
    sectors: &SectorBenchmarkTable,
    data: &CompanyData,
) -> CompanyValuation {
    let report = data.normalize(normalizer);
    let company = &report.fundamentals;

    let mut rows: Vec<_> = MultiplesValuator::new(company, sectors)
        .evaluate()
        .into_iter()
        .map(|o| (ValuationMethod::Multiple(o.method), o.outcome.map_err(|e| e.to_string())))
        .collect();

    let growth = config.valuation.growth_rate_pct / 100.0;
    let required = config.valuation.required_return_pct / 100.0;
    let gordon = DividendDiscountValuator::new(company);
    let dividend_row = gordon
        .try_fair_value(growth, required)
        .map_err(|e| e.to_string())
        .and_then(|_| {
            gordon
                .estimate(growth, required)
                .ok_or_else(|| "missing required input 'price'".to_string())
        });
    rows.push((ValuationMethod::DividendDiscount, dividend_row));

    let dcf_row = match data.dcf {
        Some(inputs) => inputs
            .to_assumptions()
            .and_then(|assumptions| DcfValuator.value(&assumptions))
            .map_err(|e| e.to_string())
            .and_then(|result| {
                result
                    .estimate(company.price)
                    .ok_or_else(|| "missing required input 'price'".to_string())
            }),
        None => Err("no DCF inputs configured".to_string()),
    };
    rows.push((ValuationMethod::DiscountedCashFlow, dcf_row));

    CompanyValuation {
        title: data.title(),
        ticker: data.ticker.clone(),
        price: company.price,
        rows,
    }
}

fn methods_table(valuation: &CompanyValuation) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Method"),
        ui::header_cell("Target Price"),
        ui::header_cell("Upside"),
        ui::header_cell("Note"),
    ]);
    for (method, row) in &valuation.rows {
        let cells = match row {
            Ok(estimate) => vec![
                Cell::new(method.to_string()),
                ui::highlight_cell(estimate.target_price, ui::format_money),
                ui::change_cell(estimate.upside_percent),
                Cell::new(""),
            ],
            Err(reason) => vec![
                Cell::new(method.to_string()),
                ui::na_cell(false),
                ui::na_cell(false),
                ui::subtle_cell(reason),
            ],
        };
        table.add_row(cells);
    }
    table
}

fn summary_table(valuations: &[CompanyValuation]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Ticker"),
        ui::header_cell("Price"),
        ui::header_cell("Estimates"),
        ui::header_cell("Mean Target"),
        ui::header_cell("Upside"),
    ]);
    for valuation in valuations {
        let mean = valuation.mean_target();
        let upside = mean
            .zip(valuation.price)
            .map(|(target, price)| (target / price - 1.0) * 100.0);
        table.add_row(vec![
            Cell::new(&valuation.ticker),
            ui::format_optional_cell(valuation.price, ui::format_money),
            Cell::new(format!(
                "{}/{}",
                valuation.estimates().count(),
                valuation.rows.len()
            )),
            ui::format_optional_cell(mean, ui::format_money),
            upside.map_or_else(|| ui::na_cell(false), ui::change_cell),
        ]);
    }
    table
}
