use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::Pacer;
use crate::analysis::resolve::{self, MergePlan, Winner};
use crate::api::StashApi;
use crate::config::{AppConfig, MergeStrategy};
use crate::error::Error;
use crate::model::{Scene, SceneId, VideoFile};
use crate::progress::ProgressReporter;
use crate::report;

const PREVIEW_GROUPS: usize = 3;

/// Resolves server-reported perceptual-hash duplicate groups, a batch at a time.
pub struct DuplicateMergeEngine {
    config: AppConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupOutcome {
    /// Decisions were computed and logged, nothing was changed.
    DryRun,
    Applied,
    /// The main mutation went through but a follow-up did not.
    PartiallyFailed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupReport {
    pub scene_ids: Vec<SceneId>,
    /// Merge destination, or the kept scene for keep-best.
    pub keeper: SceneId,
    pub removed: Vec<SceneId>,
    pub outcome: GroupOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_plan: Option<MergePlan>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DuplicateMergeResult {
    pub dry_run: bool,
    pub total_groups: usize,
    pub skipped_groups: usize,
    pub processed_groups: usize,
    pub applied: usize,
    pub partially_failed: usize,
    pub failed: usize,
    pub remaining_groups: usize,
    pub groups: Vec<GroupReport>,
}

impl DuplicateMergeEngine {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn run(
        &self,
        api: &dyn StashApi,
        reporter: &dyn ProgressReporter,
    ) -> Result<DuplicateMergeResult, Error> {
        let duplicates = &self.config.duplicates;
        let mut result = DuplicateMergeResult {
            dry_run: self.config.dry_run,
            ..Default::default()
        };

        info!(
            "Finding duplicate scenes (distance {}, {})",
            duplicates.phash_distance,
            if duplicates.phash_distance == 0 {
                "exact match"
            } else {
                "tolerant matching"
            }
        );
        reporter.on_fetch_start("duplicate scenes");
        let fetched = api.find_duplicate_scenes(duplicates.phash_distance)?;
        reporter.on_fetch_complete(fetched.len());

        if let Some(path) = &duplicates.dump_path {
            if !fetched.is_empty() {
                match report::write_duplicate_dump(path, duplicates.phash_distance, &fetched) {
                    Ok(()) => info!("Duplicate scenes saved to '{}'", path),
                    Err(e) => warn!("Could not save duplicate scenes to '{}': {}", path, e),
                }
            }
        }

        let (groups, undersized): (Vec<Vec<Scene>>, Vec<Vec<Scene>>) =
            fetched.into_iter().partition(|group| group.len() >= 2);
        if !undersized.is_empty() {
            warn!("Skipping {} duplicate group(s) with fewer than 2 scenes", undersized.len());
        }
        result.skipped_groups = undersized.len();
        result.total_groups = groups.len();

        if groups.is_empty() {
            info!("No duplicate scenes found!");
            return Ok(result);
        }

        let scene_total: usize = groups.iter().map(Vec::len).sum();
        info!(
            "Found {} duplicate scenes in {} groups, processing up to {} this run",
            scene_total,
            groups.len(),
            duplicates.batch_size
        );
        for (index, group) in groups.iter().take(PREVIEW_GROUPS).enumerate() {
            debug!("=== GROUP {} ({} scenes) ===", index + 1, group.len());
            for scene in group {
                debug!("{}", describe_scene(scene));
            }
        }

        let pacer = Pacer::new(self.config.rate_limit_delay(), self.config.dry_run);
        let group_pacer = Pacer::new(self.config.merge_delay(), self.config.dry_run);
        let batch: Vec<&Vec<Scene>> = groups.iter().take(duplicates.batch_size).collect();
        reporter.on_process_start(batch.len());

        for (index, group) in batch.iter().enumerate() {
            info!(
                "Processing duplicate group {}/{} ({} scenes)",
                index + 1,
                batch.len(),
                group.len()
            );

            let group_report = match duplicates.strategy {
                MergeStrategy::Merge => self.merge_group(api, group)?,
                MergeStrategy::KeepBest => self.keep_best(api, &pacer, group)?,
            };

            match group_report.outcome {
                GroupOutcome::Applied => result.applied += 1,
                GroupOutcome::PartiallyFailed => result.partially_failed += 1,
                GroupOutcome::Failed => result.failed += 1,
                GroupOutcome::DryRun => {}
            }
            result.processed_groups += 1;
            result.groups.push(group_report);
            reporter.on_unit_complete(result.processed_groups, &format!("group {}", index + 1));

            if index + 1 < batch.len() {
                group_pacer.pause();
            }
        }

        result.remaining_groups = result.total_groups - result.processed_groups;
        reporter.on_process_complete();
        Ok(result)
    }

    fn merge_group(&self, api: &dyn StashApi, group: &[Scene]) -> Result<GroupReport, Error> {
        let plan = resolve::resolve_merge(group)?;
        log_merge_plan(&plan, group);

        let mut report = GroupReport {
            scene_ids: group.iter().map(|s| s.id).collect(),
            keeper: plan.destination,
            removed: plan.sources.clone(),
            outcome: GroupOutcome::DryRun,
            merge_plan: None,
        };

        if self.config.dry_run {
            info!(
                "[DRY RUN] Would merge {:?} into scene {}",
                plan.sources, plan.destination
            );
            if let Some(file_id) = plan.set_primary {
                info!("[DRY RUN] Would then set file {} as primary", file_id);
            }
            report.merge_plan = Some(plan);
            return Ok(report);
        }

        let merged = match api.merge_scenes(&plan.sources, plan.destination) {
            Ok(merged) => merged,
            Err(e) => {
                error!("Error during merge into scene {}: {}", plan.destination, e);
                report.outcome = GroupOutcome::Failed;
                report.merge_plan = Some(plan);
                return Ok(report);
            }
        };
        info!(
            "Merged {} scene(s) into {}; it now has {} file(s)",
            plan.sources.len(),
            merged.id,
            merged.files.len()
        );

        // The server decides the merged file order, so look again.
        let merged_files: Vec<&VideoFile> = merged.files.iter().collect();
        report.outcome = match resolve::preferred_primary(&merged_files) {
            None => GroupOutcome::Applied,
            Some(file_id) => match api.set_primary_file(merged.id, file_id) {
                Ok(()) => {
                    info!("Set file {} as primary for scene {}", file_id, merged.id);
                    GroupOutcome::Applied
                }
                Err(e) => {
                    warn!(
                        "Merged scene {} but could not set file {} as primary: {}",
                        merged.id, file_id, e
                    );
                    GroupOutcome::PartiallyFailed
                }
            },
        };
        report.merge_plan = Some(plan);
        Ok(report)
    }

    fn keep_best(&self, api: &dyn StashApi, pacer: &Pacer, group: &[Scene]) -> Result<GroupReport, Error> {
        let plan = resolve::resolve_keep_best(group)?;
        info!("Keeping scene {} (score {:.1})", plan.keeper, plan.score);

        let mut report = GroupReport {
            scene_ids: group.iter().map(|s| s.id).collect(),
            keeper: plan.keeper,
            removed: plan.losers.clone(),
            outcome: GroupOutcome::DryRun,
            merge_plan: None,
        };

        if self.config.dry_run {
            for scene_id in &plan.losers {
                info!("[DRY RUN] Would delete scene {}", scene_id);
            }
            return Ok(report);
        }

        let mut deleted = 0;
        for scene_id in &plan.losers {
            match api.destroy_scene(*scene_id) {
                Ok(()) => {
                    info!("Deleted scene {}", scene_id);
                    deleted += 1;
                }
                Err(e) => error!("Error deleting scene {}: {}", scene_id, e),
            }
            pacer.pause();
        }

        report.outcome = if deleted == plan.losers.len() {
            GroupOutcome::Applied
        } else if deleted == 0 {
            GroupOutcome::Failed
        } else {
            GroupOutcome::PartiallyFailed
        };
        Ok(report)
    }
}

fn log_merge_plan(plan: &MergePlan, group: &[Scene]) {
    let title_of = |id: SceneId| {
        group
            .iter()
            .find(|s| s.id == id)
            .map(Scene::display_title)
            .unwrap_or("No title")
    };

    info!(
        "Best metadata: scene {} - {}",
        plan.best_metadata,
        title_of(plan.best_metadata)
    );
    info!("Best file: scene {}", plan.best_file);

    match plan.winner {
        Winner::Same => info!("Best metadata and file are already in the same scene"),
        Winner::Divergent => {
            info!("Using scene {} (best file) as destination", plan.destination);
            if let Some(title) = &plan.copy_candidates.title {
                info!("Title worth copying over: '{}'", title);
            }
            if let Some(rating) = plan.copy_candidates.rating {
                info!("Rating worth copying over: {}/100", rating);
            }
        }
    }

    for scene in group.iter().filter(|s| plan.sources.contains(&s.id)) {
        if let Some(file) = scene.primary_file() {
            info!(
                "From scene {}: {} ({:.1} MB, {})",
                scene.id,
                file.display_name(),
                file.size_mb(),
                file.video_codec
            );
        }
    }
}

/// One-line summary of a scene for previews.
pub fn describe_scene(scene: &Scene) -> String {
    let rating = scene
        .rating
        .map(|r| format!("{}/100", r))
        .unwrap_or_else(|| "Unrated".to_string());
    let files: Vec<String> = scene
        .files
        .iter()
        .map(|f| {
            format!(
                "{} ({:.1} MB, {}x{}, {:.1} kbps, {})",
                f.display_name(),
                f.size_mb(),
                f.width,
                f.height,
                f.bitrate_kbps(),
                if f.video_codec.is_empty() { "Unknown" } else { f.video_codec.as_str() }
            )
        })
        .collect();
    format!(
        "Scene {}: {} | rating {} | plays {} | {} performer(s) | {} marker(s) | files: [{}]",
        scene.id,
        scene.display_title(),
        rating,
        scene.play_count,
        scene.performers.len(),
        scene.markers.len(),
        files.join(", ")
    )
}
