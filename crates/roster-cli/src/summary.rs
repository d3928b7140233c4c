use std::collections::BTreeMap;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::types::SyncResult;

pub fn print_summary(result: &SyncResult) {
    let mode = if result.dry_run { " (dry run)" } else { "" };
    println!("Run date: {}{mode}", result.run_date);
    for path in &result.exports {
        println!("Export: {}", path.display());
    }
    println!("{}", action_table(result));
    if result.missing_classes > 0 {
        println!("Missing classes: {}", result.missing_classes);
    }
    if let Some(body) = &result.body {
        println!();
        println!("{body}");
    }
    if let Some(fatal) = &result.fatal {
        eprintln!("Run stopped: {fatal}");
    }
    if !result.report_errors.is_empty() {
        eprintln!("Errors:");
        for error in &result.report_errors {
            eprintln!("- {error}");
        }
    }
}

/// Per-action counts with a `TOTAL` row.
pub fn action_table(result: &SyncResult) -> Table {
    let mut rows: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for (action, count) in &result.summary.change_actions {
        rows.entry(action.as_str()).or_default().0 += count;
    }
    for (action, count) in &result.summary.error_actions {
        rows.entry(action.as_str()).or_default().1 += count;
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Action"),
        header_cell("Changes"),
        header_cell("Errors"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for (action, (changes, errors)) in rows {
        table.add_row(vec![
            Cell::new(action),
            count_cell(changes, Color::Green),
            count_cell(errors, Color::Red),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        count_cell(result.summary.changes, Color::Green).add_attribute(Attribute::Bold),
        count_cell(result.summary.errors, Color::Red).add_attribute(Attribute::Bold),
    ]);
    table
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        Cell::new(count).fg(Color::DarkGrey)
    }
}
