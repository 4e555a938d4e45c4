//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;

use crate::domain::{Device, DeviceReport};

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print success status (green checkmark)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print plain output (no color)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// Numbered device names, one per line, indented.
pub fn device_list(devices: &[Device]) -> String {
    devices
        .iter()
        .enumerate()
        .map(|(i, d)| format!("  {}. {}\n", i + 1, d.name))
        .collect()
}

const TABLE_COLUMNS: [&str; 8] = [
    "Name",
    "Serial",
    "Temperature",
    "Mode",
    "Fan Speed",
    "Status",
    "WiFi",
    "IP",
];

/// Width-aligned table of device reports (plain text, no colors).
pub fn device_table(reports: &[DeviceReport]) -> String {
    let rows: Vec<[String; 8]> = reports
        .iter()
        .map(|r| {
            [
                r.name.clone(),
                r.serial.clone(),
                r.temperature.to_string(),
                r.mode.to_string(),
                r.fan_speed.to_string(),
                r.run_state.to_string(),
                r.wifi_signal.to_string(),
                r.ip_address.to_string(),
            ]
        })
        .collect();

    let mut widths: Vec<usize> = TABLE_COLUMNS.iter().map(|c| c.chars().count()).collect();
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, TABLE_COLUMNS.iter().map(|c| c.to_string()), &widths);
    push_row(&mut out, widths.iter().map(|w| "-".repeat(*w)), &widths);
    for row in rows {
        push_row(&mut out, row.into_iter(), &widths);
    }
    out
}

fn push_row(out: &mut String, cells: impl Iterator<Item = String>, widths: &[usize]) {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| {
            // pad by chars, not bytes ("°" is two bytes)
            let pad = width.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}
