use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::core::fundamentals::{Field, FieldClass};
use crate::core::sensitivity::{GridCell, SensitivityMatrix};

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    TotalLabel,
    TotalValue,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::TotalLabel => style(text).bold(),
        StyleType::TotalValue => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Formats an `Option<T>` into a right aligned `Cell`. `None` is displayed as "N/A".
pub fn format_optional_cell<T>(value: Option<T>, format_fn: impl Fn(T) -> String) -> Cell {
    value.map_or(
        Cell::new("N/A")
            .fg(Color::DarkGrey)
            .set_alignment(CellAlignment::Right),
        |v| Cell::new(format_fn(v)).set_alignment(CellAlignment::Right),
    )
}

/// Bold green cell for the value a table is about, e.g. a target price.
pub fn highlight_cell(value: f64, format_fn: impl Fn(f64) -> String) -> Cell {
    Cell::new(format_fn(value))
        .add_attribute(Attribute::Bold)
        .fg(Color::Green)
        .set_alignment(CellAlignment::Right)
}

/// Upside or downside in percent, colored by sign.
pub fn change_cell(change: f64) -> Cell {
    let text = format!("{change:+.2}%");
    if change >= 0.0 {
        Cell::new(text)
            .fg(Color::Green)
            .set_alignment(CellAlignment::Right)
    } else {
        Cell::new(text)
            .fg(Color::Red)
            .set_alignment(CellAlignment::Right)
    }
}

/// Creates a cell for "N/A" values, with error-specific styling.
pub fn na_cell(has_error: bool) -> Cell {
    let color = if has_error {
        Color::Red
    } else {
        Color::DarkGrey
    };
    Cell::new("N/A").fg(color).set_alignment(CellAlignment::Right)
}

pub fn subtle_cell(text: &str) -> Cell {
    Cell::new(text).fg(Color::DarkGrey)
}

pub fn format_money(value: f64) -> String {
    format!("{value:.2}")
}

/// Formats a fraction as a percentage.
pub fn format_rate(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

/// Formats a fundamental according to its unit: currency, percent or multiple.
pub fn format_field(field: Field, value: f64) -> String {
    match field.class() {
        FieldClass::Price | FieldClass::PerShare => format_money(value),
        FieldClass::Fraction => format_rate(value),
        FieldClass::Multiple => format!("{value:.2}x"),
    }
}

/// Growth rates down the rows, discount rates across the columns. Pairs the
/// model is undefined for show "-"; the centered cell is highlighted.
pub fn sensitivity_table(matrix: &SensitivityMatrix, discount_label: &str) -> Table {
    let mut table = new_styled_table();
    let mut header = vec![header_cell(&format!("g \\ {discount_label}"))];
    header.extend(
        matrix
            .discount_rates
            .iter()
            .map(|r| header_cell(&format_rate(*r))),
    );
    table.set_header(header);

    let center_row = matrix.growth_rates.len() / 2;
    let center_column = matrix.discount_rates.len() / 2;
    for (row, growth) in matrix.growth_rates.iter().enumerate() {
        let mut cells = vec![header_cell(&format_rate(*growth))];
        for column in 0..matrix.discount_rates.len() {
            let cell = match matrix.get(row, column) {
                Some(GridCell::Value(v)) if row == center_row && column == center_column => {
                    highlight_cell(v, format_money)
                }
                Some(GridCell::Value(v)) => {
                    Cell::new(format_money(v)).set_alignment(CellAlignment::Right)
                }
                Some(GridCell::OutOfDomain) => subtle_cell("-").set_alignment(CellAlignment::Right),
                Some(GridCell::NoEstimate) | None => na_cell(false),
            };
            cells.push(cell);
        }
        table.add_row(cells);
    }
    table
}

/// Bar for `len` concurrent fetches.
pub fn new_progress_bar(len: u64) -> ProgressBar {
    let progress_style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    ProgressBar::new(len).with_style(progress_style)
}

/// Prints a separator line matching the terminal width.
pub fn print_separator() {
    let term_width = console::Term::stdout()
        .size_checked()
        .map(|(_, w)| w as usize)
        .unwrap_or(80);
    println!("\n{}", "─".repeat(term_width));
}
