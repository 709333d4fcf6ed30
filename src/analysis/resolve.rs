//! Per-cluster keeper selection.
//!
//! Three policies:
//! - lowest id wins (markers): keep the smallest id, delete the rest
//! - weighted merge (scenes): merge everything into the scene with the best
//!   file, reporting metadata the destination lacks
//! - keep best (scenes): keep the highest overall score, delete the rest

use serde::Serialize;
use thiserror::Error;

use crate::analysis::scoring::{self, ScoringMode, PREFERRED_EXTENSION};
use crate::model::{FileId, Marker, Scene, SceneId, VideoFile};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("cluster has {size} member(s); at least 2 are required")]
    EmptyCluster { size: usize },
}

fn require_cluster<T>(cluster: &[T]) -> Result<(), ResolutionError> {
    if cluster.len() < 2 {
        return Err(ResolutionError::EmptyCluster {
            size: cluster.len(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerResolution {
    pub keeper: Marker,
    pub losers: Vec<Marker>,
}

/// Keep the marker with the smallest id, delete the others.
pub fn resolve_markers(cluster: &[Marker]) -> Result<MarkerResolution, ResolutionError> {
    require_cluster(cluster)?;

    let keeper_index = cluster
        .iter()
        .enumerate()
        .min_by_key(|(_, marker)| marker.id)
        .map(|(index, _)| index)
        .unwrap_or(0);

    let keeper = cluster[keeper_index].clone();
    let losers = cluster
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != keeper_index)
        .map(|(_, marker)| marker.clone())
        .collect();

    Ok(MarkerResolution { keeper, losers })
}

/// Whether the best-metadata and best-file scenes coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Same,
    Divergent,
}

/// Scalar metadata the destination lacks but the best-metadata scene has.
/// Advisory only; nothing copies these automatically.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CopyCandidates {
    pub title: Option<String>,
    pub rating: Option<i64>,
}

impl CopyCandidates {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.rating.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergePlan {
    pub destination: SceneId,
    pub sources: Vec<SceneId>,
    pub best_metadata: SceneId,
    pub best_file: SceneId,
    pub winner: Winner,
    pub copy_candidates: CopyCandidates,
    /// File to promote to primary once the merge has gone through.
    pub set_primary: Option<FileId>,
}

/// Pick a merge destination for a cluster of duplicate scenes.
///
/// The best file wins over the best metadata: when they live in different
/// scenes, the best-file scene becomes the destination and the
/// best-metadata scene is merged into it like any other source.
pub fn resolve_merge(cluster: &[Scene]) -> Result<MergePlan, ResolutionError> {
    require_cluster(cluster)?;

    let best_metadata = scoring::argmax_by(cluster, |s| {
        scoring::score_scene(s, ScoringMode::MetadataOnly)
    })
    .ok_or(ResolutionError::EmptyCluster { size: 0 })?;
    let best_file = scoring::argmax_by(cluster, |s| scoring::score_scene(s, ScoringMode::FileOnly))
        .ok_or(ResolutionError::EmptyCluster { size: 0 })?;

    let (destination, winner, copy_candidates) = if best_metadata.id == best_file.id {
        (best_metadata, Winner::Same, CopyCandidates::default())
    } else {
        let candidates = advisory_copies(best_file, best_metadata);
        (best_file, Winner::Divergent, candidates)
    };

    let sources: Vec<&Scene> = cluster.iter().filter(|s| s.id != destination.id).collect();

    let merged_files: Vec<&VideoFile> = destination
        .files
        .iter()
        .chain(sources.iter().flat_map(|s| s.files.iter()))
        .collect();

    Ok(MergePlan {
        destination: destination.id,
        sources: sources.iter().map(|s| s.id).collect(),
        best_metadata: best_metadata.id,
        best_file: best_file.id,
        winner,
        copy_candidates,
        set_primary: preferred_primary(&merged_files),
    })
}

fn advisory_copies(destination: &Scene, donor: &Scene) -> CopyCandidates {
    CopyCandidates {
        title: match (destination.trimmed_title(), donor.trimmed_title()) {
            (None, Some(title)) => Some(title.to_string()),
            _ => None,
        },
        rating: match (destination.rating, donor.rating) {
            (None, Some(rating)) => Some(rating),
            _ => None,
        },
    }
}

/// The last preferred-container file of a multi-file list, unless it is
/// already the primary (first) file.
pub fn preferred_primary(files: &[&VideoFile]) -> Option<FileId> {
    if files.len() < 2 {
        return None;
    }
    files
        .iter()
        .rev()
        .find(|f| f.has_extension(PREFERRED_EXTENSION))
        .map(|f| f.id)
        .filter(|id| *id != files[0].id)
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeepBestPlan {
    pub keeper: SceneId,
    pub score: f64,
    pub losers: Vec<SceneId>,
}

/// Keep the scene with the highest overall score, delete the rest.
pub fn resolve_keep_best(cluster: &[Scene]) -> Result<KeepBestPlan, ResolutionError> {
    require_cluster(cluster)?;

    let keeper = scoring::argmax_by(cluster, |s| scoring::score_scene(s, ScoringMode::Overall))
        .ok_or(ResolutionError::EmptyCluster { size: 0 })?;

    Ok(KeepBestPlan {
        keeper: keeper.id,
        score: scoring::score_scene(keeper, ScoringMode::Overall),
        losers: cluster
            .iter()
            .filter(|s| s.id != keeper.id)
            .map(|s| s.id)
            .collect(),
    })
}
