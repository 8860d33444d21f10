use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

/// Renders the slowest-tests ranking for the analyze command.
pub fn timing_table(timings: &[(String, u64)]) -> Table {
    let mut table = create_table();
    table.set_header(vec!["Test", "Duration"]);

    for (fingerprint, seconds) in timings {
        table.add_row(vec![Cell::new(fingerprint), duration_cell(*seconds)]);
    }

    table
}

fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn duration_cell(seconds: u64) -> Cell {
    let text = format!("{seconds}s");
    if seconds >= 60 {
        Cell::new(text).fg(TableColor::Red)
    } else if seconds >= 10 {
        Cell::new(text).fg(TableColor::Yellow)
    } else {
        Cell::new(text).fg(TableColor::Green)
    }
}
