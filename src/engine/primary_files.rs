use tracing::{error, info, warn};

use super::Pacer;
use crate::analysis::primary_file::plan_primary_file;
use crate::api::StashApi;
use crate::config::AppConfig;
use crate::error::Error;
use crate::progress::ProgressReporter;

/// Makes the MKV primary on scenes holding both an MKV and an MP4 copy,
/// then deletes the MP4 file.
pub struct PrimaryFileFixEngine {
    config: AppConfig,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PrimaryFileFixResult {
    pub dry_run: bool,
    pub scenes_found: usize,
    pub scenes_examined: usize,
    /// Scenes without both an MKV and an MP4 file.
    pub skipped: usize,
    /// Scenes fixed, or that would be fixed in a dry run.
    pub fixed: usize,
    /// Primary set, but the MP4 could not be deleted.
    pub partially_failed: usize,
    pub failed: usize,
    pub stopped_early: bool,
}

impl PrimaryFileFixEngine {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// `continue_after` is asked, with the 1-based number of the batch just
    /// finished, whether to go on to the next batch.
    pub fn run(
        &self,
        api: &dyn StashApi,
        reporter: &dyn ProgressReporter,
        continue_after: &mut dyn FnMut(usize) -> bool,
    ) -> Result<PrimaryFileFixResult, Error> {
        let mut result = PrimaryFileFixResult {
            dry_run: self.config.dry_run,
            ..Default::default()
        };

        reporter.on_fetch_start("scenes with multiple files");
        let scenes = api.find_scenes_with_multiple_files()?;
        reporter.on_fetch_complete(scenes.len());
        result.scenes_found = scenes.len();

        let batch_size = self.config.primary_files.batch_size.max(1);
        info!(
            "Found {} scenes with multiple files, processing in batches of {}",
            scenes.len(),
            batch_size
        );

        let pacer = Pacer::new(self.config.rate_limit_delay(), self.config.dry_run);
        reporter.on_process_start(scenes.len());

        let batch_count = scenes.len().div_ceil(batch_size);
        for (batch_index, batch) in scenes.chunks(batch_size).enumerate() {
            info!(
                "Processing batch {} ({} scenes)...",
                batch_index + 1,
                batch.len()
            );

            for scene in batch {
                result.scenes_examined += 1;
                reporter.on_unit_complete(result.scenes_examined, scene.display_title());

                let Some(plan) = plan_primary_file(scene) else {
                    result.skipped += 1;
                    continue;
                };

                if self.config.dry_run {
                    info!(
                        "[DRY RUN] Would set file {} as primary and delete file {} for: {}",
                        plan.mkv_file_id,
                        plan.mp4_file_id,
                        scene.display_title()
                    );
                    result.fixed += 1;
                    continue;
                }

                if let Err(e) = api.set_primary_file(plan.scene_id, plan.mkv_file_id) {
                    error!("Error setting primary file for: {} - {}", scene.display_title(), e);
                    result.failed += 1;
                    pacer.pause();
                    continue;
                }
                info!("Set MKV as primary for: {}", scene.display_title());
                pacer.pause();

                match api.delete_files(&[plan.mp4_file_id]) {
                    Ok(()) => {
                        info!("Deleted MP4 file {} for: {}", plan.mp4_file_id, scene.display_title());
                        result.fixed += 1;
                    }
                    Err(e) => {
                        warn!(
                            "MKV is primary but MP4 file {} was not deleted for: {} - {}",
                            plan.mp4_file_id,
                            scene.display_title(),
                            e
                        );
                        result.partially_failed += 1;
                    }
                }
                pacer.pause();
            }

            let has_more = batch_index + 1 < batch_count;
            if has_more
                && self.config.primary_files.confirm_batches
                && !continue_after(batch_index + 1)
            {
                info!("Stopping after batch {}", batch_index + 1);
                result.stopped_early = true;
                break;
            }
        }

        reporter.on_process_complete();
        Ok(result)
    }
}
