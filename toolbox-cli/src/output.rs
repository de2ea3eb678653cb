//! Terminal output formatting for all toolbox commands.
//! Uses comfy-table for tabular output and colored for
//! terminal styling.

use colored::Colorize;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use serde::Serialize;

use toolbox_core::error::Result;
use toolbox_core::net::ipv4::SummaryValue;
use toolbox_core::util::{bytes_str, group_thousands};
use toolbox_core::{
    BuildReport, ContainerInfo, ExtractReport, HalfBlockGrid, MergeReport, NetworkSummary,
    SaveReport, ScrambleMode, ScrambleReport, ValidateReport,
};

/// Print any report as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print JSON with 4-space indentation.
pub fn print_json_indent4<T: Serialize>(value: &T) -> Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    println!("{}", String::from_utf8_lossy(&buf));
    Ok(())
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// `subnet_mask` -> `Subnet mask`.
fn title_key(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Print an IPv4 summary as a two-column table.
pub fn print_ipv4_table(summary: &NetworkSummary) {
    let mut table = new_table();
    table.set_header(vec![Cell::new("Key"), Cell::new("Value")]);

    for (key, value) in summary.entries() {
        let rendered = match value {
            SummaryValue::Text(s) => s,
            SummaryValue::Count(n) => group_thousands(n as u64),
            SummaryValue::Flag(true) => "Yes".green().to_string(),
            SummaryValue::Flag(false) => "No".to_string(),
        };
        table.add_row(vec![Cell::new(title_key(key)), Cell::new(rendered)]);
    }

    println!("{table}");
}

/// Print the details of a stego container.
pub fn print_stego_info(info: &ContainerInfo) {
    let mut table = new_table();
    table.set_header(vec![Cell::new(&info.path), Cell::new("")]);

    let header = if info.valid_header {
        "Valid".green().to_string()
    } else {
        "Invalid".red().bold().to_string()
    };
    let header_end = info
        .header_end
        .map(|n| format!("byte {}", n))
        .unwrap_or_else(|| "-".to_string());

    let rows = vec![
        ("Header", header),
        (
            "Dimensions",
            format!("{} px X {} px", info.height, info.width),
        ),
        ("Capacity", bytes_str(info.capacity as u64)),
        (
            "Used",
            format!(
                "{} ({:.2}%)",
                bytes_str(info.used as u64),
                info.used_percent
            ),
        ),
        (
            "Channel LSBs",
            format!("{} x {}", group_thousands(info.channels as u64), info.lsb),
        ),
        ("Checksum", info.checksum.clone()),
        ("Reserved", info.reserved.clone()),
        ("Header end", header_end),
        ("Visual integrity", format!("{:.2}%", info.visual_integrity)),
    ];
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key), Cell::new(value)]);
    }

    println!("{table}");
}

/// Print a successful stego validation.
pub fn print_validate_result(report: &ValidateReport) {
    let what = if report.header_only { "header" } else { "header and checksum" };
    println!(
        "{}",
        format!("{} has a valid {}.", report.path, what).green().bold()
    );
}

/// Print the result of a command that saved a container.
pub fn print_save_result(action: &str, report: &SaveReport) {
    println!(
        "{}",
        format!("{} {}", action, report.path).green().bold()
    );
    println!(
        "  {} of {} used",
        bytes_str(report.used as u64),
        bytes_str(report.capacity as u64)
    );
}

pub fn print_extract_report(report: &ExtractReport) {
    println!(
        "{}",
        format!(
            "Extracted {} frame(s) to {}",
            report.frames, report.out_folder
        )
        .green()
        .bold()
    );
}

pub fn print_build_report(report: &BuildReport) {
    println!(
        "{}",
        format!(
            "Built {} from {} frame(s) at {}ms per frame",
            report.out_file, report.frames, report.duration_ms
        )
        .green()
        .bold()
    );
}

/// Print a scramble run as a table of input/output pairs.
pub fn print_scramble_report(report: &ScrambleReport) {
    if report.files.is_empty() {
        println!("{}", "No images found.".yellow());
        return;
    }

    let mut table = new_table();
    table.set_header(vec![
        Cell::new("Input"),
        Cell::new("Output"),
        Cell::new("Pixels"),
    ]);
    for file in &report.files {
        table.add_row(vec![
            Cell::new(&file.input),
            Cell::new(&file.output),
            Cell::new(group_thousands(file.pixels as u64)),
        ]);
    }
    println!("{table}");

    let verb = match report.mode {
        ScrambleMode::Scramble => "Scrambled",
        ScrambleMode::Unscramble => "Unscrambled",
    };
    println!(
        "{}",
        format!("{} {} image(s)", verb, report.files.len()).green()
    );
}

/// Paint a half-block grid with 24-bit color.
pub fn print_half_blocks(grid: &HalfBlockGrid) {
    println!(
        "{}",
        format!(
            "{} ({} x {})",
            grid.title, grid.source_width, grid.source_height
        )
        .dimmed()
    );
    for row in &grid.rows {
        let mut line = String::new();
        for cell in row {
            let [tr, tg, tb] = cell.top;
            let [br, bg, bb] = cell.bottom;
            line.push_str(
                &"▀"
                    .truecolor(tr, tg, tb)
                    .on_truecolor(br, bg, bb)
                    .to_string(),
            );
        }
        println!("{line}");
    }
}

pub fn print_merge_report(report: &MergeReport) {
    println!(
        "{}",
        format!(
            "Merged {} video(s) into {} ({}ms)",
            report.inputs.len(),
            report.output,
            report.elapsed_ms
        )
        .green()
        .bold()
    );
}
