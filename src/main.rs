mod cli;
mod logging;
mod reporter;

use std::io::{self, Write};
use std::process;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use colored::*;
use reporter::CliReporter;
use stash_dedupe::config::{self, AppConfig};
use stash_dedupe::{DuplicateMergeEngine, MarkerCleanupEngine, PrimaryFileFixEngine, StashClient};
use tracing::{error, info, warn};

fn main() -> anyhow::Result<()> {
    config::load_env_files();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    let Some(command) = args.command else {
        let _ = Cli::command().print_long_help();
        return Ok(());
    };

    let mut config = match config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            error!("Set STASH_URL and STASH_API_KEY in the environment or in stash.env");
            process::exit(1);
        }
    };
    command.apply_overrides(&mut config);

    if args.execute && command.mutates() {
        config.dry_run = false;
        if !args.yes {
            let confirmed = prompt_confirm(
                &format!("This will make changes on {}. Continue?", config.url),
                Some(false),
            )?;
            if !confirmed {
                process::exit(0);
            }
        }
    }

    if config.dry_run && command.mutates() {
        warn!("{}", "DRY RUN: nothing will be changed, pass --execute to apply".yellow());
    }

    match command {
        Commands::CleanMarkers(_) => {
            if let Err(err) = run_clean_markers(&config) {
                error!("Error: {:#}", err);
            }
        }
        Commands::MergeDuplicates(_) => {
            if let Err(err) = run_merge_duplicates(&config) {
                error!("Error: {:#}", err);
            }
        }
        Commands::FixPrimaryFiles(_) => {
            if let Err(err) = run_fix_primary_files(&config) {
                error!("Error: {:#}", err);
            }
        }
        Commands::PrintConfig => {
            let rendered = toml::to_string_pretty(&config).context("rendering configuration")?;
            println!("{}", rendered);
        }
    }

    Ok(())
}

fn run_clean_markers(config: &AppConfig) -> anyhow::Result<()> {
    let client = StashClient::new(config);
    let engine = MarkerCleanupEngine::new(config.clone());
    let reporter = CliReporter::new();
    let result = engine.run(&client, &reporter)?;

    println!();
    info!(
        "{} scenes processed, {} with overlapping markers",
        format!("{}", result.scenes_processed).green(),
        format!("{}", result.scenes_with_overlaps).yellow(),
    );
    info!(
        "{} overlap groups holding {} markers",
        format!("{}", result.overlap_groups).cyan(),
        format!("{}", result.overlapping_markers).cyan(),
    );
    if result.dry_run {
        info!(
            "{} markers would be deleted",
            format!("{}", result.deleted_markers).red()
        );
    } else {
        info!(
            "{} markers deleted, {} deletions failed, {} scenes failed",
            format!("{}", result.deleted_markers).red(),
            format!("{}", result.failed_deletions).red(),
            format!("{}", result.failed_scenes).red(),
        );
    }

    Ok(())
}

fn run_merge_duplicates(config: &AppConfig) -> anyhow::Result<()> {
    let client = StashClient::new(config);
    let engine = DuplicateMergeEngine::new(config.clone());
    let reporter = CliReporter::new();
    let result = engine.run(&client, &reporter)?;

    println!();
    info!(
        "{} duplicate groups, {} processed, {} remaining",
        format!("{}", result.total_groups).cyan(),
        format!("{}", result.processed_groups).green(),
        format!("{}", result.remaining_groups).yellow(),
    );
    if result.skipped_groups > 0 {
        info!(
            "{} groups skipped for having fewer than 2 scenes",
            format!("{}", result.skipped_groups).yellow()
        );
    }
    if !result.dry_run {
        info!(
            "{} applied, {} partially failed, {} failed",
            format!("{}", result.applied).green(),
            format!("{}", result.partially_failed).yellow(),
            format!("{}", result.failed).red(),
        );
    }
    if result.remaining_groups > 0 {
        info!("Run again to handle the next batch");
    }

    Ok(())
}

fn run_fix_primary_files(config: &AppConfig) -> anyhow::Result<()> {
    let client = StashClient::new(config);
    let engine = PrimaryFileFixEngine::new(config.clone());
    let reporter = CliReporter::new();

    let mut continue_after = |batch: usize| {
        prompt_confirm(&format!("Batch {} done. Continue with the next batch?", batch), Some(true))
            .unwrap_or(false)
    };
    let result = engine.run(&client, &reporter, &mut continue_after)?;

    println!();
    info!(
        "{} scenes with multiple files, {} examined, {} skipped",
        format!("{}", result.scenes_found).cyan(),
        format!("{}", result.scenes_examined).cyan(),
        format!("{}", result.skipped).yellow(),
    );
    if result.dry_run {
        info!("{} scenes would be fixed", format!("{}", result.fixed).green());
    } else {
        info!(
            "{} fixed, {} partially failed, {} failed",
            format!("{}", result.fixed).green(),
            format!("{}", result.partially_failed).yellow(),
            format!("{}", result.failed).red(),
        );
    }
    if result.stopped_early {
        info!("Stopped before the last batch");
    }

    Ok(())
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(default.unwrap_or(false));
        }

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
