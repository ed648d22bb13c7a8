// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use poolkeeper::ArchiveConfig;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ArchiveConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Parse { path, dsc, verify } => {
            commands::cmd_parse(&config, &path, dsc, verify)?;
        }
        Commands::CheckDsc { path, verify } => {
            if !commands::cmd_check_dsc(&config, &path, verify)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Init { db_path } => {
            commands::cmd_init(&config, &db_path)?;
        }
        Commands::AddSuite {
            name,
            codename,
            overridesuite,
            architectures,
            db_path,
        } => {
            commands::cmd_add_suite(
                &config,
                &name,
                codename.as_deref(),
                overridesuite.as_deref(),
                &architectures,
                &db_path,
            )?;
        }
        Commands::Import {
            suite,
            kind,
            path,
            db_path,
        } => {
            commands::cmd_import(&config, suite.as_deref(), kind, &path, &db_path)?;
        }
        Commands::Rdeps {
            packages,
            suite,
            architectures,
            no_arch_all,
            cruft,
            quiet,
            db_path,
        } => {
            let broken = commands::cmd_rdeps(
                &config,
                &packages,
                suite.as_deref(),
                architectures.as_deref(),
                no_arch_all,
                cruft,
                quiet,
                &db_path,
            )?;
            if broken {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
