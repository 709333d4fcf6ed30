use serde::Serialize;

use crate::analysis::scoring::{PREFERRED_EXTENSION, SECONDARY_EXTENSION};
use crate::model::{FileId, Scene, SceneId};

/// A scene that holds both an MKV and an MP4 copy: the MKV becomes primary
/// and the MP4 file is redundant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimaryFilePlan {
    pub scene_id: SceneId,
    pub mkv_file_id: FileId,
    pub mp4_file_id: FileId,
}

pub fn plan_primary_file(scene: &Scene) -> Option<PrimaryFilePlan> {
    let mkv = scene
        .files
        .iter()
        .find(|f| f.has_extension(PREFERRED_EXTENSION))?;
    let mp4 = scene
        .files
        .iter()
        .find(|f| f.has_extension(SECONDARY_EXTENSION))?;

    Some(PrimaryFilePlan {
        scene_id: scene.id,
        mkv_file_id: mkv.id,
        mp4_file_id: mp4.id,
    })
}
