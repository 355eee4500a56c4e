use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, CommandFactory, Parser, Subcommand};

use crate::store::DEFAULT_DB_PATH;

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

pub fn styled_command() -> clap::Command {
    Cli::command()
}

#[derive(Debug, Parser)]
#[command(name = "tool-tracker")]
#[command(bin_name = "tool-tracker")]
#[command(version)]
#[command(about = "Track tool installations on machines")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'd',
        long,
        env = "TOOL_TRACKER_DB",
        default_value = DEFAULT_DB_PATH,
        help = "Path to the SQLite database file."
    )]
    pub db: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Add a new tool installation record.")]
    Add(AddArgs),
    #[command(about = "List installation records.")]
    List(ListArgs),
    #[command(about = "Search installation records by machine, tool, or notes.")]
    Search(SearchArgs),
    #[command(about = "Display installation statistics.")]
    Stats(JsonArgs),
    #[command(about = "List all machines or show the tools on one machine.")]
    Machines(MachinesArgs),
    #[command(about = "List all tools or show the machines carrying one tool.")]
    Tools(ToolsArgs),
    #[command(about = "Mark an installation as removed.")]
    Remove(RemoveArgs),
    #[command(about = "Register a machine or tool without an installation.")]
    Register(RegisterArgs),
    #[command(about = "Generate or install shell completions.")]
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(short = 'm', long, help = "Machine name.")]
    pub machine: String,

    #[arg(short = 't', long, help = "Tool name.")]
    pub tool: String,

    #[arg(long, help = "Installation date (YYYY-MM-DD).")]
    pub installed_date: String,

    #[arg(long, help = "Installation time (HH:MM:SS).")]
    pub installation_time: Option<String>,

    #[arg(long, help = "Tool type/category, applied when the tool is new.")]
    pub tool_type: Option<String>,

    #[arg(short = 'n', long, help = "Notes or comments.")]
    pub notes: Option<String>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(
        short = 'm',
        long,
        conflicts_with = "tool",
        help = "Filter by machine name."
    )]
    pub machine: Option<String>,

    #[arg(short = 't', long, help = "Filter by tool name.")]
    pub tool: Option<String>,

    #[arg(short = 'a', long, help = "Only show installations without a removal date.")]
    pub active: bool,

    #[arg(short = 'l', long, help = "Limit number of records (0 shows all).")]
    pub limit: Option<usize>,

    #[arg(long, help = "Print records as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(short = 'q', long, help = "Search query (machine, tool name, or notes).")]
    pub query: String,

    #[arg(long, help = "Print records as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct JsonArgs {
    #[arg(long, help = "Print output as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct MachinesArgs {
    #[arg(short = 'm', long, help = "Show details for one machine.")]
    pub machine: Option<String>,

    #[arg(long, help = "Print output as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ToolsArgs {
    #[arg(short = 't', long, help = "Show details for one tool.")]
    pub tool: Option<String>,

    #[arg(long, help = "Print output as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    #[arg(short = 'm', long, help = "Machine name.")]
    pub machine: String,

    #[arg(short = 't', long, help = "Tool name.")]
    pub tool: String,

    #[arg(long, help = "Installation date of the record to close (YYYY-MM-DD).")]
    pub installed_date: String,

    #[arg(long, help = "Removal date (YYYY-MM-DD).")]
    pub removal_date: String,
}

#[derive(Debug, Args)]
#[command(
    about = "Register commands.",
    long_about = "Create a machine or tool explicitly, ahead of any installation."
)]
pub struct RegisterArgs {
    #[command(subcommand)]
    pub command: RegisterSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum RegisterSubcommands {
    #[command(about = "Register a machine by name.")]
    Machine(RegisterMachineArgs),
    #[command(about = "Register a tool by name.")]
    Tool(RegisterToolArgs),
}

#[derive(Debug, Args)]
pub struct RegisterMachineArgs {
    #[arg(help = "Machine name.")]
    pub name: String,
}

#[derive(Debug, Args)]
pub struct RegisterToolArgs {
    #[arg(help = "Tool name.")]
    pub name: String,

    #[arg(long, help = "Tool type/category.")]
    pub tool_type: Option<String>,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    #[arg(help = "Shell name (bash, zsh, fish). Auto-detected if omitted.")]
    pub shell: Option<String>,

    #[arg(
        short = 'i',
        long = "install",
        help = "Write completions to the canonical path for the shell."
    )]
    pub install: bool,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
