//! `flake-triage`: report failed test scenarios to an issue tracker

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use flake_cli::{
    apply_dry_run_flag, check_config, init_tracing, load_events, render_events, run_triage,
    LogFormat,
};
use flake_context::FsSourceReader;
use flake_core::TriageConfig;
use std::path::PathBuf;
use std::process::ExitCode;

fn cli() -> Command {
    Command::new("flake-triage")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Triage failed test scenarios against an issue tracker")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .global(true)
                .default_value("text")
                .value_parser(["text", "json"])
                .help("Log output format (logs go to stderr)"),
        )
        .subcommand(
            Command::new("triage")
                .about("Reconcile failure events with the tracker")
                .arg(config_arg())
                .arg(events_arg())
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("no-dry-run")
                        .help("Print tracker requests instead of sending them"),
                )
                .arg(
                    Arg::new("no-dry-run")
                        .long("no-dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Send tracker requests even if the config says dry run"),
                ),
        )
        .subcommand(
            Command::new("render")
                .about("Print failure contexts without contacting the tracker")
                .arg(events_arg())
                .arg(
                    Arg::new("project-dir")
                        .long("project-dir")
                        .default_value(".")
                        .value_parser(value_parser!(PathBuf))
                        .help("Root that scenario paths are relative to"),
                ),
        )
        .subcommand(
            Command::new("check-config")
                .about("Load and validate a config file")
                .arg(config_arg()),
        )
}

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .short('c')
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("TOML config file")
}

fn events_arg() -> Arg {
    Arg::new("event")
        .long("event")
        .short('e')
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("JSON failure event or array of events ('-' for stdin)")
}

fn path_arg<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a PathBuf> {
    args.get_one::<PathBuf>(name)
        .with_context(|| format!("missing --{name}"))
}

fn run(matches: &ArgMatches) -> Result<ExitCode> {
    let mut stdout = std::io::stdout();

    match matches.subcommand() {
        Some(("triage", args)) => {
            let dry_run = if args.get_flag("dry-run") {
                Some(true)
            } else if args.get_flag("no-dry-run") {
                Some(false)
            } else {
                None
            };
            let config = TriageConfig::load(path_arg(args, "config")?)
                .context("failed to load config")?;
            let config = apply_dry_run_flag(config, dry_run)?;
            let events = load_events(path_arg(args, "event")?)?;

            let summary = run_triage(config, &events, &mut stdout)?;
            Ok(if summary.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            })
        }
        Some(("render", args)) => {
            let events = load_events(path_arg(args, "event")?)?;
            let project_dir = path_arg(args, "project-dir")?;
            render_events(FsSourceReader, project_dir, &events, &mut stdout)?;
            Ok(ExitCode::SUCCESS)
        }
        Some(("check-config", args)) => {
            check_config(path_arg(args, "config")?, &mut stdout)?;
            Ok(ExitCode::SUCCESS)
        }
        _ => Ok(ExitCode::from(2)),
    }
}

fn main() -> ExitCode {
    let matches = cli().get_matches();

    let format = matches
        .get_one::<String>("log-format")
        .and_then(|f| f.parse::<LogFormat>().ok())
        .unwrap_or_default();
    init_tracing(format);

    match run(&matches) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "flake-triage failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
