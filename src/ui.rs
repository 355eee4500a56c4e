use std::io::{self, IsTerminal};

use time::Date;

use crate::store::{InstallationView, MachineSummary, Statistics, ToolSummary};
use crate::validate::days_installed;

const HEADERS: [&str; 8] = [
    "Machine",
    "Tool",
    "Tool Type",
    "Installed Date",
    "Time",
    "Removal Date",
    "Days",
    "Notes",
];

pub fn print_installation_list(rows: &[InstallationView], today: Date) {
    if rows.is_empty() {
        println!("No records found");
        return;
    }
    println!("{}", format_grid(rows, today));
    println!();
    println!("Total records: {}", rows.len());
}

pub fn print_search_results(query: &str, rows: &[InstallationView], today: Date) {
    if rows.is_empty() {
        println!("No records found matching '{query}'");
        return;
    }
    println!("{}", format_grid(rows, today));
    println!();
    println!("Found {} matching record(s)", rows.len());
}

pub fn print_statistics(stats: &Statistics) {
    let palette = Palette::auto();
    let rule = "=".repeat(50);
    println!("{rule}");
    println!("{}", palette.heading("TOOL INSTALLATION STATISTICS"));
    println!("{rule}");
    println!("Total Installation Records: {}", stats.total_records);
    println!("Total Machines: {}", stats.total_machines);
    println!("Total Tools: {}", stats.total_tools);

    if !stats.tools_per_machine.is_empty() {
        println!();
        println!("Tools per Machine:");
        println!("{}", "-".repeat(50));
        for entry in &stats.tools_per_machine {
            println!("  {}: {} tool(s)", palette.name(&entry.machine), entry.count);
        }
    }
}

pub fn print_unknown(kind: &str, name: &str) {
    println!("Unknown {kind} '{name}'");
}

pub fn print_machine_detail(machine: &str, rows: &[InstallationView]) {
    if rows.is_empty() {
        println!("No records found for machine '{machine}'");
        return;
    }
    let palette = Palette::auto();
    println!("Machine: {}", palette.name(machine));
    println!("Tools installed: {}", rows.len());
    println!();
    println!("Tools:");
    for row in rows {
        println!("  - {}", detail_line(&row.tool, row, &palette));
    }
}

pub fn print_tool_detail(tool: &str, rows: &[InstallationView]) {
    if rows.is_empty() {
        println!("No records found for tool '{tool}'");
        return;
    }
    let palette = Palette::auto();
    println!("Tool: {}", palette.name(tool));
    println!("Installed on: {} machine(s)", rows.len());
    println!();
    println!("Machines:");
    for row in rows {
        println!("  - {}", detail_line(&row.machine, row, &palette));
    }
}

pub fn print_machines(machines: &[MachineSummary]) {
    if machines.is_empty() {
        println!("No machines found");
        return;
    }
    let palette = Palette::auto();
    println!("Machines in database:");
    for machine in machines {
        println!(
            "  - {} ({} tool(s))",
            palette.name(&machine.name),
            machine.installation_count
        );
    }
}

pub fn print_tools(tools: &[ToolSummary]) {
    if tools.is_empty() {
        println!("No tools found");
        return;
    }
    let palette = Palette::auto();
    println!("Tools in database:");
    for tool in tools {
        let type_label = tool
            .tool_type
            .as_deref()
            .map(|kind| format!(" {}", palette.type_label(kind)))
            .unwrap_or_default();
        println!(
            "  - {}{}: installed on {} machine(s)",
            palette.name(&tool.name),
            type_label,
            tool.machine_count
        );
    }
}

fn detail_line(name: &str, row: &InstallationView, palette: &Palette) -> String {
    let mut line = format!(
        "{} (installed: {})",
        palette.name(name),
        row.installed_date
    );
    if let Some(removed) = row.removal_date.as_deref() {
        line.push(' ');
        line.push_str(&palette.dim(&format!("[removed {removed}]")));
    }
    line
}

fn table_cells(row: &InstallationView, today: Date) -> [String; 8] {
    let days = days_installed(&row.installed_date, row.removal_date.as_deref(), today)
        .map(|days| days.to_string());
    [
        row.machine.clone(),
        row.tool.clone(),
        or_dash(row.tool_type.as_deref()),
        row.installed_date.clone(),
        or_dash(row.installation_time.as_deref()),
        or_dash(row.removal_date.as_deref()),
        or_dash(days.as_deref()),
        or_dash(row.notes.as_deref()),
    ]
}

fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => "-".to_string(),
    }
}

fn format_grid(rows: &[InstallationView], today: Date) -> String {
    let body: Vec<[String; 8]> = rows.iter().map(|row| table_cells(row, today)).collect();
    let mut widths = HEADERS.map(|header| header.chars().count());
    for cells in &body {
        for (width, cell) in widths.iter_mut().zip(cells.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let border = |fill: char| -> String {
        let mut line = String::from("+");
        for width in widths {
            line.push_str(&fill.to_string().repeat(width + 2));
            line.push('+');
        }
        line
    };
    let render_row = |cells: &[&str]| -> String {
        let mut line = String::from("|");
        for (cell, width) in cells.iter().zip(widths) {
            let pad = width - cell.chars().count();
            line.push(' ');
            line.push_str(cell);
            line.push_str(&" ".repeat(pad + 1));
            line.push('|');
        }
        line
    };

    let mut lines = vec![border('-'), render_row(&HEADERS), border('=')];
    for cells in &body {
        let refs: Vec<&str> = cells.iter().map(String::as_str).collect();
        lines.push(render_row(&refs));
        lines.push(border('-'));
    }
    lines.join("\n")
}

struct Palette {
    enabled: bool,
}

impl Palette {
    fn auto() -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self { enabled }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        self.paint("1;36", text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    fn name(&self, text: &str) -> String {
        self.paint("1;94", text)
    }

    fn type_label(&self, tool_type: &str) -> String {
        self.paint("35", &format!("({tool_type})"))
    }
}
