mod cli_args;
mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use log;
use std::path::{Path, PathBuf};
use std::process;

use cli_args::{Cli, Commands};
use pilot_core::{AppError, Config};

fn main() {
    let cli_args = Cli::parse();

    setup_logging(cli_args.quiet, cli_args.verbose);

    let quiet = cli_args.quiet;

    log::debug!("CLI args parsed: {:?}", cli_args);

    let exit_code = match run_app(cli_args, quiet) {
        Ok(_) => {
            log::info!("Application finished successfully.");
            0
        }
        Err(e) => {
            let exit_code = exit_code_for(&e);
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            exit_code
        }
    };
    log::debug!("Exiting with code {}", exit_code);
    process::exit(exit_code);
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<AppError>() {
        Some(AppError::Config(_)) => 1,
        Some(AppError::TomlParse(_)) => 1,
        Some(AppError::Io(_)) => 2,
        Some(AppError::FileRead { .. }) => 2,
        Some(AppError::FileWrite { .. }) => 2,
        Some(AppError::NonUtf8 { .. }) => 2,
        Some(AppError::WalkDir(_)) => 2,
        Some(AppError::Ignore(_)) => 2,
        Some(AppError::ToolNotFound(_)) => 3,
        Some(AppError::Command(_)) => 3,
        Some(AppError::Clipboard(_)) => 4,
        Some(AppError::InvalidArgument(_)) => 5,
        Some(AppError::TikToken(_)) => 8,
        Some(_) => 1,
        None => 1,
    }
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}

/// Root, config and command-independent settings shared by every subcommand.
pub struct Session {
    pub root: PathBuf,
    pub config: Config,
    pub quiet: bool,
}

fn run_app(cli: Cli, quiet: bool) -> Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let root = Config::determine_project_root(cli.root.as_ref())
        .context("Failed to determine project root")?;
    log::info!("Project root determined: {}", root.display());

    let config = load_config_for_command(&root, cli.config.as_deref(), cli.no_config)
        .context("Failed to load configuration")?;
    let session = Session {
        root,
        config,
        quiet,
    };

    match command {
        Commands::Assist(args) => {
            log::debug!("Executing 'assist' command...");
            commands::assist::handle_assist_command(args, session)?;
        }
        Commands::Files(args) => {
            log::debug!("Executing 'files' command...");
            commands::files::handle_files_command(args, &session)?;
        }
        Commands::Git(args) => {
            log::debug!("Executing 'git' command...");
            commands::git::handle_git_command(args, &session)?;
        }
    }
    Ok(())
}

pub fn load_config_for_command(
    project_root: &Path,
    config_file: Option<&str>,
    disable_config: bool,
) -> Result<Config> {
    let config_path = Config::locate_config_file(project_root, config_file, disable_config)
        .context("Failed to resolve configuration path")?;

    let config = match &config_path {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    log::trace!("Effective configuration: {:?}", config);
    Ok(config)
}
