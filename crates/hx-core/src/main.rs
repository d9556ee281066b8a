//! hx: crash-archive inspection.
//!
//! stdout carries the command payload (reports, listings); everything
//! else goes to stderr. Exit codes are stable, see `exit_codes`.

use clap::{Parser, Subcommand};
use hx_common::{Error, Result};
use hx_config::{config_dir, presets_dir, Preset, PresetManager, Settings};
use hx_core::exit_codes::ExitCode;
use hx_core::logging::init_logging;
use hx_core::plugins::{self, compile_pattern, Haruspex};
use hx_core::report::Report;
use regex::Regex;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "hx", version, about = "Inspect crash archives with a debugger")]
struct Cli {
    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration directory override
    #[arg(long, global = true, env = "HX_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List available plugins or stored presets
    List {
        /// What to list: "plugins" or "presets"
        #[arg(value_parser = ["plugins", "presets"])]
        what: String,
    },
    /// Create a preset from a plugin template
    New {
        /// Plugin the preset configures
        plugin: String,
        /// Name of the new preset
        preset: String,
    },
    /// Open a preset in $EDITOR
    Edit {
        /// Name of the preset
        preset: String,
    },
    /// Delete a preset
    Remove {
        /// Name of the preset
        preset: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Select the default preset
    Use {
        /// Name of the preset
        preset: String,
    },
    /// Inspect a local crash archive
    Inspect {
        /// Path of the crash archive
        archive: PathBuf,
        /// Preset to use (default: the selected one)
        #[arg(short, long)]
        preset: Option<String>,
        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Fetch and inspect the newest remote archive
    Reveal {
        /// Only consider archives matching this pattern
        pattern: Option<String>,
        /// Preset to use (default: the selected one)
        #[arg(short, long)]
        preset: Option<String>,
        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the newest remote archives
    Peek {
        /// Only consider archives matching this pattern
        pattern: Option<String>,
        /// Preset to use (default: the selected one)
        #[arg(short, long)]
        preset: Option<String>,
        /// How many archives to list
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },
    /// Poll the repository and inspect each new archive
    Watch {
        /// Only consider archives matching this pattern
        pattern: Option<String>,
        /// Preset to use (default: the selected one)
        #[arg(short, long)]
        preset: Option<String>,
        /// Stop watching after this many seconds (default: forever)
        #[arg(long)]
        duration: Option<u64>,
    },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            let _ = e.print();
            std::process::exit(code.as_i32());
        }
    };
    init_logging(cli.verbose);

    let code = match run(&cli) {
        Ok(()) => ExitCode::Clean,
        Err(e) => {
            eprintln!("hx: {e}");
            ExitCode::from_error(&e)
        }
    };
    std::process::exit(code.as_i32());
}

fn run(cli: &Cli) -> Result<()> {
    let config = config_dir(cli.config_dir.as_deref());
    let mut manager = PresetManager::open(&presets_dir(&config))?;

    match &cli.command {
        Command::List { what } => match what.as_str() {
            "plugins" => {
                for plugin in plugins::plugins() {
                    println!("{:<14} {}", plugin.name(), plugin.description());
                }
                Ok(())
            }
            _ => {
                let settings = Settings::load(&config)?;
                for preset in manager.presets() {
                    let marker = if settings.default_preset.as_deref() == Some(preset.name()) {
                        "*"
                    } else {
                        " "
                    };
                    println!("{marker} {:<14} {}", preset.name(), preset.plugin());
                }
                Ok(())
            }
        },

        Command::New { plugin, preset } => {
            let plugin = plugins::find_plugin(plugin)
                .ok_or_else(|| Error::UnknownPlugin(plugin.clone()))?;
            let created = manager.create(preset, plugin.preset_template())?;
            println!("created {}", created.path().display());
            // Open the fresh preset for tuning, as `edit` would. Skipped
            // when stdout is piped so scripted runs stay non-interactive.
            if io::stdout().is_terminal() {
                manager.edit(preset)?;
            }
            Ok(())
        }

        Command::Edit { preset } => manager.edit(preset),

        Command::Remove { preset, force } => {
            if !force && !confirm(&format!("Remove preset '{preset}'?"))? {
                return Ok(());
            }
            manager.remove(preset)
        }

        Command::Use { preset } => {
            if manager.lookup(preset).is_none() {
                return Err(Error::PresetNotFound(preset.clone()));
            }
            let mut settings = Settings::load(&config)?;
            settings.default_preset = Some(preset.clone());
            settings.save(&config)
        }

        Command::Inspect {
            archive,
            preset,
            output,
        } => {
            let (haruspex, _) = haruspex_for(&manager, &config, preset.as_deref())?;
            let report = haruspex.inspect(archive)?;
            emit_report(&report, output.as_deref())
        }

        Command::Reveal {
            pattern,
            preset,
            output,
        } => {
            let (haruspex, _) = haruspex_for(&manager, &config, preset.as_deref())?;
            let pattern = compile_opt(pattern.as_deref())?;

            let show_progress = io::stderr().is_terminal();
            let mut on_progress = move |bytes: u64, percent: u8| {
                if show_progress {
                    eprint!("\rdownloading... {percent:3}% ({bytes} bytes)");
                }
            };
            let report = haruspex.reveal(pattern.as_ref(), Some(&mut on_progress))?;
            if show_progress {
                eprintln!();
            }
            emit_report(&report, output.as_deref())
        }

        Command::Peek {
            pattern,
            preset,
            count,
        } => {
            let (haruspex, _) = haruspex_for(&manager, &config, preset.as_deref())?;
            let pattern = compile_opt(pattern.as_deref())?;
            for entry in haruspex.peek(pattern.as_ref(), *count)? {
                println!("{}  {}", entry.modified.format("%Y-%m-%d %H:%M:%S"), entry.filename);
            }
            Ok(())
        }

        Command::Watch {
            pattern,
            preset,
            duration,
        } => {
            let (haruspex, name) = haruspex_for(&manager, &config, preset.as_deref())?;
            let pattern = compile_opt(pattern.as_deref())?;
            let budget = duration.map_or(Duration::MAX, Duration::from_secs);
            eprintln!("watching repository with preset '{name}'...");
            haruspex.watch(pattern.as_ref(), budget, &mut |report| {
                emit_report(report, None)
            })
        }
    }
}

/// Build the haruspex for an explicit or default preset.
fn haruspex_for(
    manager: &PresetManager,
    config: &std::path::Path,
    name: Option<&str>,
) -> Result<(Box<dyn Haruspex>, String)> {
    let preset = resolve_preset(manager, config, name)?;
    let plugin = plugins::find_plugin(preset.plugin())
        .ok_or_else(|| Error::UnknownPlugin(preset.plugin().to_owned()))?;
    let haruspex = plugin.create_haruspex(preset)?;
    Ok((haruspex, preset.name().to_owned()))
}

fn resolve_preset<'a>(
    manager: &'a PresetManager,
    config: &std::path::Path,
    name: Option<&str>,
) -> Result<&'a Preset> {
    let name = match name {
        Some(name) => name.to_owned(),
        None => Settings::load(config)?.default_preset.ok_or_else(|| {
            Error::Config("no preset given and no default preset selected".into())
        })?,
    };
    manager
        .lookup(&name)
        .ok_or_else(|| Error::PresetNotFound(name))
}

fn compile_opt(pattern: Option<&str>) -> Result<Option<Regex>> {
    pattern.map(compile_pattern).transpose()
}

fn emit_report(report: &Report, output: Option<&std::path::Path>) -> Result<()> {
    let yaml = report.to_yaml()?;
    match output {
        Some(path) => std::fs::write(path, yaml).map_err(Error::Io),
        None => {
            print!("{yaml}");
            io::stdout().flush().map_err(Error::Io)
        }
    }
}

fn confirm(question: &str) -> Result<bool> {
    eprint!("{question} [y/N] ");
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
