//! Result summary rendering.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use formfill_model::JobResult;

pub fn print_result(result: &JobResult) {
    println!("Job: {}", result.job_id);
    println!("Status: {}", result.status);

    if result.mappings.is_empty() {
        println!("No mappings were accepted.");
    } else {
        let mut table = Table::new();
        table.set_header(vec![
            header_cell("Source"),
            header_cell("Target"),
            header_cell("Confidence"),
            header_cell("Top strategy"),
            header_cell("Review"),
        ]);
        apply_table_style(&mut table);
        align_column(&mut table, 2, CellAlignment::Right);
        align_column(&mut table, 4, CellAlignment::Center);

        for mapping in &result.mappings {
            table.add_row(vec![
                Cell::new(&mapping.source_name),
                Cell::new(&mapping.target_name),
                confidence_cell(mapping.confidence),
                Cell::new(top_strategy(mapping)),
                if mapping.flagged {
                    Cell::new("review").fg(Color::Yellow)
                } else {
                    Cell::new("-").add_attribute(Attribute::Dim)
                },
            ]);
        }
        println!("{table}");
    }

    if !result.unmapped_targets.is_empty() {
        println!("Unmapped targets: {}", result.unmapped_targets.join(", "));
    }
    if !result.unmapped_sources.is_empty() {
        println!("Unmapped sources: {}", result.unmapped_sources.join(", "));
    }
    if !result.warnings.is_empty() {
        println!("Warnings:");
        for warning in &result.warnings {
            println!("- {warning}");
        }
    }
}

fn top_strategy(mapping: &formfill_model::FieldMapping) -> String {
    mapping
        .strategy_breakdown
        .iter()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(name, _)| name.clone())
        .unwrap_or_else(|| "-".to_string())
}

fn confidence_cell(confidence: f32) -> Cell {
    let text = format!("{confidence:.3}");
    if confidence >= 0.9 {
        Cell::new(text).fg(Color::Green)
    } else if confidence >= 0.7 {
        Cell::new(text)
    } else {
        Cell::new(text).fg(Color::Yellow)
    }
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}
