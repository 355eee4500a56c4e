mod cli;
mod completions;
mod db;
mod errors;
mod listing;
mod store;
mod ui;
mod validate;

use errors::CliError;
use store::Store;

fn main() {
    init_tracing();
    if let Err(err) = run() {
        tracing::debug!(error = ?err, "command failed");
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn init_tracing() {
    use tracing::level_filters::LevelFilter;
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(value: &impl serde::Serialize) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run() -> Result<(), CliError> {
    use clap::Parser;
    use cli::Commands;

    let cli = cli::Cli::parse();
    if let Commands::Completions(args) = &cli.command {
        return completions::run_completions_command(args.shell.as_deref(), args.install);
    }

    let mut store = Store::open(&cli.db)?;
    dispatch(&mut store, cli.command)
}

fn dispatch(store: &mut Store, command: cli::Commands) -> Result<(), CliError> {
    use cli::{Commands, RegisterSubcommands};

    match command {
        Commands::Add(args) => {
            let input = new_installation(args)?;
            let id = store.record_installation(&input)?;
            println!("✓ Installation record added successfully (ID: {id})");
            println!("  Machine: {}", input.machine);
            println!("  Tool: {}", input.tool);
            println!("  Date: {}", input.installed_date);
        }
        Commands::List(args) => {
            let records = match (args.machine.as_deref(), args.tool.as_deref()) {
                (Some(machine), _) => store.list_by_machine(machine)?,
                (None, Some(tool)) => store.list_by_tool(tool)?,
                (None, None) => store.list_all()?,
            };
            let filter = listing::InstallationFilter {
                active_only: args.active,
                limit: args.limit,
            };
            let records = listing::apply_filters(records, &filter);
            if args.json {
                print_json(&records)?;
            } else {
                ui::print_installation_list(&records, validate::today_utc());
            }
        }
        Commands::Search(args) => {
            let records = store.search(&args.query)?;
            if args.json {
                print_json(&records)?;
            } else {
                ui::print_search_results(&args.query, &records, validate::today_utc());
            }
        }
        Commands::Stats(args) => {
            let stats = store.statistics()?;
            if args.json {
                print_json(&stats)?;
            } else {
                ui::print_statistics(&stats);
            }
        }
        Commands::Machines(args) => match args.machine {
            Some(machine) => {
                if store.lookup_machine_id(&machine)?.is_none() {
                    if args.json {
                        print_json(&Vec::<store::InstallationView>::new())?;
                    } else {
                        ui::print_unknown("machine", &machine);
                    }
                    return Ok(());
                }
                let records = store.list_by_machine(&machine)?;
                if args.json {
                    print_json(&records)?;
                } else {
                    ui::print_machine_detail(&machine, &records);
                }
            }
            None => {
                let machines = store.list_machines()?;
                if args.json {
                    print_json(&machines)?;
                } else {
                    ui::print_machines(&machines);
                }
            }
        },
        Commands::Tools(args) => match args.tool {
            Some(tool) => {
                if store.lookup_tool_id(&tool)?.is_none() {
                    if args.json {
                        print_json(&Vec::<store::InstallationView>::new())?;
                    } else {
                        ui::print_unknown("tool", &tool);
                    }
                    return Ok(());
                }
                let records = store.list_by_tool(&tool)?;
                if args.json {
                    print_json(&records)?;
                } else {
                    ui::print_tool_detail(&tool, &records);
                }
            }
            None => {
                let tools = store.list_tools()?;
                if args.json {
                    print_json(&tools)?;
                } else {
                    ui::print_tools(&tools);
                }
            }
        },
        Commands::Remove(args) => {
            require_date(&args.installed_date)?;
            require_date(&args.removal_date)?;
            let record = store.mark_removed(
                &args.machine,
                &args.tool,
                &args.installed_date,
                &args.removal_date,
            )?;
            println!(
                "removed {} from {} on {} (installed {})",
                record.tool,
                record.machine,
                args.removal_date,
                record.installed_date
            );
        }
        Commands::Register(args) => match args.command {
            RegisterSubcommands::Machine(machine_args) => {
                let id = store.create_machine(&machine_args.name)?;
                println!("registered machine {} (ID: {id})", machine_args.name);
            }
            RegisterSubcommands::Tool(tool_args) => {
                let id = store.create_tool(&tool_args.name, tool_args.tool_type.as_deref())?;
                println!("registered tool {} (ID: {id})", tool_args.name);
            }
        },
        Commands::Completions(args) => {
            completions::run_completions_command(args.shell.as_deref(), args.install)?;
        }
    }

    Ok(())
}

fn new_installation(args: cli::AddArgs) -> Result<store::NewInstallation, CliError> {
    require_date(&args.installed_date)?;
    if let Some(raw) = args.installation_time.as_deref() {
        if !validate::validate_time(raw) {
            return Err(CliError::InvalidTime(raw.to_string()));
        }
    }
    Ok(store::NewInstallation {
        machine: args.machine,
        tool: args.tool,
        tool_type: args.tool_type,
        installed_date: args.installed_date,
        installation_time: args.installation_time,
        notes: args.notes,
    })
}

fn require_date(raw: &str) -> Result<(), CliError> {
    if validate::validate_date(raw) {
        Ok(())
    } else {
        Err(CliError::InvalidDate(raw.to_string()))
    }
}
