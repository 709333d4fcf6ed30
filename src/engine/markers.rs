use tracing::{debug, error, info};

use super::Pacer;
use crate::analysis::grouping::group_by_proximity;
use crate::analysis::resolve::resolve_markers;
use crate::api::StashApi;
use crate::config::AppConfig;
use crate::error::Error;
use crate::model::{Marker, SceneSummary};
use crate::progress::ProgressReporter;

const PROGRESS_EVERY: usize = 25;

/// Removes overlapping markers, keeping the lowest id of each overlap group.
pub struct MarkerCleanupEngine {
    config: AppConfig,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MarkerCleanupResult {
    pub dry_run: bool,
    pub scenes_processed: usize,
    pub scenes_with_overlaps: usize,
    pub overlap_groups: usize,
    pub overlapping_markers: usize,
    /// Markers deleted, or that would be deleted in a dry run.
    pub deleted_markers: usize,
    pub failed_deletions: usize,
    pub failed_scenes: usize,
}

impl MarkerCleanupEngine {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn run(
        &self,
        api: &dyn StashApi,
        reporter: &dyn ProgressReporter,
    ) -> Result<MarkerCleanupResult, Error> {
        let mut result = MarkerCleanupResult {
            dry_run: self.config.dry_run,
            ..Default::default()
        };

        let scenes = self.fetch_scenes(api, reporter);
        if scenes.is_empty() {
            info!("No scenes with markers found.");
            return Ok(result);
        }

        let pacer = Pacer::new(self.config.rate_limit_delay(), self.config.dry_run);
        reporter.on_process_start(scenes.len());

        for (index, scene) in scenes.iter().enumerate() {
            info!(
                "[{}/{}] Processing scene: {} (ID: {})",
                index + 1,
                scenes.len(),
                scene.display_title(),
                scene.id
            );

            match api.find_scene_markers(scene.id) {
                Ok(markers) => self.clean_scene(api, &pacer, &markers, &mut result)?,
                Err(e) => {
                    error!("Failed to fetch markers for scene {}: {}", scene.id, e);
                    result.failed_scenes += 1;
                }
            }

            result.scenes_processed += 1;
            reporter.on_unit_complete(result.scenes_processed, scene.display_title());

            if result.scenes_processed % PROGRESS_EVERY == 0 {
                info!(
                    "Progress: {}/{} scenes, {} with overlaps, {} overlapping markers, {} deletions",
                    result.scenes_processed,
                    scenes.len(),
                    result.scenes_with_overlaps,
                    result.overlapping_markers,
                    result.deleted_markers
                );
            }
        }

        reporter.on_process_complete();
        Ok(result)
    }

    /// Page through scenes with markers. A failed page ends the listing with
    /// whatever was fetched so far.
    fn fetch_scenes(&self, api: &dyn StashApi, reporter: &dyn ProgressReporter) -> Vec<SceneSummary> {
        let markers = &self.config.markers;
        let per_page = markers.per_page.max(1);
        let mut all_scenes: Vec<SceneSummary> = Vec::new();
        let mut page = 1;

        // Page fetches are paced in dry runs too.
        let page_pacer = Pacer::new(self.config.rate_limit_delay(), false);

        reporter.on_fetch_start("scenes with markers");
        loop {
            debug!("Fetching scenes with markers, page {}", page);
            let scenes = match api.find_scenes_with_markers(page, per_page) {
                Ok(scenes) => scenes,
                Err(e) => {
                    error!("Failed to fetch page {} of scenes with markers: {}", page, e);
                    break;
                }
            };
            if scenes.is_empty() {
                break;
            }

            let page_len = scenes.len();
            all_scenes.extend(scenes);
            reporter.on_fetch_progress(page, all_scenes.len());

            if markers.test_mode {
                all_scenes.truncate(1);
                info!("Test mode: processing only scene {}", all_scenes[0].id);
                break;
            }
            if markers.max_scenes.is_some_and(|max| all_scenes.len() >= max) {
                break;
            }
            if page_len < per_page as usize {
                break;
            }

            page += 1;
            page_pacer.pause();
        }

        if let Some(max) = markers.max_scenes {
            all_scenes.truncate(max);
        }
        reporter.on_fetch_complete(all_scenes.len());
        info!("Total scenes with markers: {}", all_scenes.len());
        all_scenes
    }

    fn clean_scene(
        &self,
        api: &dyn StashApi,
        pacer: &Pacer,
        markers: &[Marker],
        result: &mut MarkerCleanupResult,
    ) -> Result<(), Error> {
        if markers.is_empty() {
            return Ok(());
        }
        debug!("Found {} total markers", markers.len());

        let clusters = group_by_proximity(markers, self.config.markers.within_seconds);
        if clusters.is_empty() {
            debug!("No overlapping markers found");
            return Ok(());
        }

        info!("Found {} groups of overlapping markers", clusters.len());
        result.scenes_with_overlaps += 1;
        result.overlap_groups += clusters.len();

        for cluster in &clusters {
            let resolution = resolve_markers(cluster)?;
            result.overlapping_markers += cluster.len();

            info!(
                "Group at {}: {} markers, keeping ID {} - {} ({})",
                time_range(cluster),
                cluster.len(),
                resolution.keeper.id,
                resolution.keeper.title,
                resolution.keeper.tag_name()
            );

            for marker in &resolution.losers {
                if self.config.dry_run {
                    info!(
                        "[DRY RUN] Would delete marker {} - {} ({})",
                        marker.id,
                        marker.title,
                        marker.tag_name()
                    );
                    result.deleted_markers += 1;
                    continue;
                }

                match api.destroy_marker(marker.id) {
                    Ok(()) => {
                        info!("Deleted marker {} - {} ({})", marker.id, marker.title, marker.tag_name());
                        result.deleted_markers += 1;
                    }
                    Err(e) => {
                        error!("Failed to delete marker {}: {}", marker.id, e);
                        result.failed_deletions += 1;
                    }
                }
                pacer.pause();
            }
        }

        Ok(())
    }
}

/// `12.0s` for a single start time, `12.0s-13.5s` for a spread.
fn time_range(cluster: &[Marker]) -> String {
    let min = cluster.iter().map(|m| m.seconds).fold(f64::INFINITY, f64::min);
    let max = cluster.iter().map(|m| m.seconds).fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        format!("{:.1}s", min)
    } else {
        format!("{:.1}s-{:.1}s", min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(id: i64, seconds: f64) -> Marker {
        Marker {
            id,
            seconds,
            end_seconds: None,
            title: String::new(),
            primary_tag: None,
        }
    }

    #[test]
    fn test_time_range() {
        assert_eq!(time_range(&[marker(1, 12.0), marker(2, 12.0)]), "12.0s");
        assert_eq!(time_range(&[marker(1, 13.5), marker(2, 12.0)]), "12.0s-13.5s");
    }
}
