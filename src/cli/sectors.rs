use super::ui;
use crate::core::config::AppConfig;
use crate::core::sector::SectorBenchmarkTable;
use anyhow::Result;
use comfy_table::{Cell, Table};

pub fn run(config: &AppConfig) -> Result<()> {
    let sectors = config.sector_table();
    println!(
        "\n{}",
        ui::style_text("Sector benchmarks", ui::StyleType::Title)
    );
    println!("{}", build_table(&sectors));
    Ok(())
}

fn build_table(sectors: &SectorBenchmarkTable) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Sector"),
        ui::header_cell("P/E"),
        ui::header_cell("P/B"),
        ui::header_cell("ROE"),
        ui::header_cell("EV/EBITDA"),
    ]);
    let fallback = sectors.fallback().map(|b| ("(fallback)", b));
    for (name, benchmark) in sectors.iter().chain(fallback) {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(format!("{:.1}x", benchmark.pe)),
            Cell::new(format!("{:.1}x", benchmark.pb)),
            Cell::new(ui::format_rate(benchmark.roe)),
            Cell::new(format!("{:.1}x", benchmark.ev_to_ebitda)),
        ]);
    }
    table
}
