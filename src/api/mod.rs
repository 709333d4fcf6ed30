pub mod client;
pub mod queries;

use crate::error::Error;
use crate::model::{FileId, Marker, MarkerId, Scene, SceneId, SceneSummary};

pub use client::StashClient;

/// The slice of the Stash API the drivers need.
///
/// `StashClient` implements it over HTTP; tests implement it in memory.
/// Every call is independent: a failure is reported to the caller, never retried.
pub trait StashApi {
    /// One page of scenes that have markers, highest id first.
    fn find_scenes_with_markers(&self, page: u32, per_page: u32) -> Result<Vec<SceneSummary>, Error>;
    fn find_scene_markers(&self, scene_id: SceneId) -> Result<Vec<Marker>, Error>;
    /// Groups of scenes the server considers perceptual-hash duplicates.
    fn find_duplicate_scenes(&self, distance: u32) -> Result<Vec<Vec<Scene>>, Error>;
    fn find_scenes_with_multiple_files(&self) -> Result<Vec<Scene>, Error>;

    fn destroy_marker(&self, marker_id: MarkerId) -> Result<(), Error>;
    /// Removes the scene record only; files stay on disk, generated assets go.
    fn destroy_scene(&self, scene_id: SceneId) -> Result<(), Error>;
    /// Returns the destination scene as it looks after the merge.
    fn merge_scenes(&self, sources: &[SceneId], destination: SceneId) -> Result<Scene, Error>;
    fn set_primary_file(&self, scene_id: SceneId, file_id: FileId) -> Result<(), Error>;
    fn delete_files(&self, file_ids: &[FileId]) -> Result<(), Error>;
}
