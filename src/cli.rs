use clap::{Args, Parser, Subcommand};
use stash_dedupe::config::{AppConfig, MergeStrategy};

#[derive(Debug, Parser)]
#[command(name = "stash-dedupe")]
#[command(about = "Finds and resolves duplicate markers and scenes on a Stash server", long_about = None)]
pub struct Cli {
    /// Apply changes instead of only reporting what would change
    #[arg(long, global = true)]
    pub execute: bool,

    /// Don't ask for confirmation before applying changes
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Delete overlapping scene markers, keeping the lowest id of each group
    CleanMarkers(CleanMarkersArgs),
    /// Merge perceptual-hash duplicate scenes into the scene with the best file
    MergeDuplicates(MergeDuplicatesArgs),
    /// Make the MKV primary on scenes that also have an MP4, then delete the MP4
    FixPrimaryFiles(FixPrimaryFilesArgs),
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct CleanMarkersArgs {
    /// Markers starting within this many seconds of each other overlap
    #[arg(long)]
    pub tolerance: Option<f64>,
    /// Stop after this many scenes
    #[arg(long)]
    pub max_scenes: Option<usize>,
    /// Scenes fetched per page
    #[arg(long)]
    pub per_page: Option<u32>,
    /// Process only the first scene found
    #[arg(long)]
    pub test_mode: bool,
}

#[derive(Debug, Args)]
pub struct MergeDuplicatesArgs {
    /// Perceptual hash distance; 0 is an exact match
    #[arg(long)]
    pub distance: Option<u32>,
    /// Duplicate groups handled per run
    #[arg(long)]
    pub batch_size: Option<usize>,
    #[arg(long, value_enum)]
    pub strategy: Option<MergeStrategy>,
    /// Where to save the fetched duplicate groups as JSON
    #[arg(long)]
    pub dump: Option<String>,
    /// Don't save the fetched duplicate groups
    #[arg(long, conflicts_with = "dump")]
    pub no_dump: bool,
}

#[derive(Debug, Args)]
pub struct FixPrimaryFilesArgs {
    /// Scenes handled between confirmation prompts
    #[arg(long)]
    pub batch_size: Option<usize>,
    /// Go through every batch without asking
    #[arg(long)]
    pub no_confirm: bool,
}

impl Commands {
    /// Fold command-line overrides into the loaded configuration.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        match self {
            Commands::CleanMarkers(args) => {
                if let Some(tolerance) = args.tolerance {
                    config.markers.within_seconds = tolerance;
                }
                if let Some(max_scenes) = args.max_scenes {
                    config.markers.max_scenes = Some(max_scenes);
                }
                if let Some(per_page) = args.per_page {
                    config.markers.per_page = per_page;
                }
                if args.test_mode {
                    config.markers.test_mode = true;
                }
            }
            Commands::MergeDuplicates(args) => {
                if let Some(distance) = args.distance {
                    config.duplicates.phash_distance = distance;
                }
                if let Some(batch_size) = args.batch_size {
                    config.duplicates.batch_size = batch_size;
                }
                if let Some(strategy) = args.strategy {
                    config.duplicates.strategy = strategy;
                }
                if let Some(dump) = &args.dump {
                    config.duplicates.dump_path = Some(dump.clone());
                }
                if args.no_dump {
                    config.duplicates.dump_path = None;
                }
            }
            Commands::FixPrimaryFiles(args) => {
                if let Some(batch_size) = args.batch_size {
                    config.primary_files.batch_size = batch_size;
                }
                if args.no_confirm {
                    config.primary_files.confirm_batches = false;
                }
            }
            Commands::PrintConfig => {}
        }
    }

    pub fn mutates(&self) -> bool {
        !matches!(self, Commands::PrintConfig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply_to_config() {
        let cli = Cli::parse_from([
            "stash-dedupe",
            "--execute",
            "merge-duplicates",
            "--distance",
            "4",
            "--strategy",
            "keep-best",
            "--no-dump",
        ]);
        assert!(cli.execute);

        let mut config = AppConfig::new("http://stash:9999");
        cli.command.as_ref().unwrap().apply_overrides(&mut config);
        assert_eq!(config.duplicates.phash_distance, 4);
        assert_eq!(config.duplicates.strategy, MergeStrategy::KeepBest);
        assert_eq!(config.duplicates.dump_path, None);
        assert_eq!(config.duplicates.batch_size, 10);
    }

    #[test]
    fn test_marker_overrides() {
        let cli = Cli::parse_from(["stash-dedupe", "clean-markers", "--tolerance", "0.5", "--test-mode"]);
        let mut config = AppConfig::new("http://stash:9999");
        cli.command.as_ref().unwrap().apply_overrides(&mut config);
        assert_eq!(config.markers.within_seconds, 0.5);
        assert!(config.markers.test_mode);
        assert!(!cli.execute);
    }
}
