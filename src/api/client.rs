use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::queries;
use super::StashApi;
use crate::config::AppConfig;
use crate::error::Error;
use crate::model::{FileId, Marker, MarkerId, Scene, SceneId, SceneSummary};

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct FindScenesData<T> {
    #[serde(rename = "findScenes")]
    find_scenes: SceneList<T>,
}

#[derive(Debug, Deserialize)]
struct SceneList<T> {
    #[serde(default = "Vec::new")]
    scenes: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct FindSceneMarkersData {
    #[serde(rename = "findSceneMarkers")]
    find_scene_markers: MarkerList,
}

#[derive(Debug, Deserialize)]
struct MarkerList {
    #[serde(default)]
    scene_markers: Vec<Marker>,
}

#[derive(Debug, Deserialize)]
struct FindDuplicateScenesData {
    #[serde(rename = "findDuplicateScenes")]
    find_duplicate_scenes: Vec<Vec<Scene>>,
}

#[derive(Debug, Deserialize)]
struct SceneMergeData {
    #[serde(rename = "sceneMerge")]
    scene_merge: Option<Scene>,
}

/// Blocking GraphQL client for a Stash server.
pub struct StashClient {
    http_client: ureq::Agent,
    graphql_url: String,
    api_key: String,
}

impl StashClient {
    pub fn new(config: &AppConfig) -> Self {
        let http_client = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .timeout_read(Duration::from_secs(120))
            .timeout_write(Duration::from_secs(30))
            .build();
        Self {
            http_client,
            graphql_url: config.graphql_url(),
            api_key: config.api_key.clone(),
        }
    }

    /// POST one GraphQL document and decode its `data` member.
    pub fn execute<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T, Error> {
        let operation = operation_name(query);
        debug!(operation = %operation, url = %self.graphql_url, "Executing GraphQL request");

        let payload = json!({ "query": query, "variables": variables });
        let mut request = self
            .http_client
            .post(&self.graphql_url)
            .set("Content-Type", "application/json");
        if !self.api_key.is_empty() {
            request = request.set("ApiKey", &self.api_key);
        }

        let body: GraphQlResponse = match request.send_json(payload) {
            Ok(response) => response
                .into_json()
                .map_err(|e| Error::Decode(format!("{operation}: {e}")))?,
            Err(ureq::Error::Status(code, response)) => {
                let text = response.into_string().unwrap_or_default();
                // GraphQL validation failures come back as 422 with an errors body
                match serde_json::from_str::<GraphQlResponse>(&text) {
                    Ok(parsed) if has_errors(&parsed) => parsed,
                    _ => {
                        return Err(Error::Transport(format!(
                            "{operation}: HTTP {code}: {}",
                            text.trim()
                        )))
                    }
                }
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(Error::Transport(format!("{operation}: {transport}")));
            }
        };

        decode_response(&operation, body)
    }
}

fn has_errors(response: &GraphQlResponse) -> bool {
    response.errors.as_ref().is_some_and(|errors| !errors.is_empty())
}

fn decode_response<T: DeserializeOwned>(operation: &str, body: GraphQlResponse) -> Result<T, Error> {
    if let Some(errors) = body.errors.as_ref().filter(|errors| !errors.is_empty()) {
        let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
        return Err(Error::GraphQl(format!("{operation}: {}", messages.join("; "))));
    }
    let data = body
        .data
        .ok_or_else(|| Error::Decode(format!("{operation}: response has no data")))?;
    serde_json::from_value(data).map_err(|e| Error::Decode(format!("{operation}: {e}")))
}

/// `query Foo(...)` → `Foo`, for log lines and error messages.
fn operation_name(document: &str) -> String {
    document
        .split_whitespace()
        .skip_while(|word| *word != "query" && *word != "mutation")
        .nth(1)
        .map(|name| name.split('(').next().unwrap_or(name).to_string())
        .unwrap_or_else(|| "anonymous".to_string())
}

fn expect_true(operation: &str, data: Value, field: &str) -> Result<(), Error> {
    match data.get(field) {
        Some(Value::Bool(true)) => Ok(()),
        other => Err(Error::GraphQl(format!(
            "{operation}: {field} returned {}",
            other.map(Value::to_string).unwrap_or_else(|| "nothing".to_string())
        ))),
    }
}

fn id_list(ids: &[i64]) -> Vec<String> {
    ids.iter().map(i64::to_string).collect()
}

impl StashApi for StashClient {
    fn find_scenes_with_markers(&self, page: u32, per_page: u32) -> Result<Vec<SceneSummary>, Error> {
        let data: FindScenesData<SceneSummary> = self.execute(
            queries::FIND_SCENES_WITH_MARKERS,
            json!({ "page": page, "per_page": per_page }),
        )?;
        Ok(data.find_scenes.scenes)
    }

    fn find_scene_markers(&self, scene_id: SceneId) -> Result<Vec<Marker>, Error> {
        let data: FindSceneMarkersData = self.execute(
            queries::FIND_SCENE_MARKERS,
            json!({ "scene_id": scene_id, "per_page": queries::MARKERS_PER_SCENE }),
        )?;
        Ok(data.find_scene_markers.scene_markers)
    }

    fn find_duplicate_scenes(&self, distance: u32) -> Result<Vec<Vec<Scene>>, Error> {
        let data: FindDuplicateScenesData = self.execute(
            &queries::find_duplicate_scenes(),
            json!({ "distance": distance }),
        )?;
        Ok(data.find_duplicate_scenes)
    }

    fn find_scenes_with_multiple_files(&self) -> Result<Vec<Scene>, Error> {
        let data: FindScenesData<Scene> =
            self.execute(&queries::find_scenes_with_multiple_files(), json!({}))?;
        Ok(data.find_scenes.scenes)
    }

    fn destroy_marker(&self, marker_id: MarkerId) -> Result<(), Error> {
        let data: Value = self.execute(
            queries::SCENE_MARKER_DESTROY,
            json!({ "id": marker_id.to_string() }),
        )?;
        expect_true("SceneMarkerDestroy", data, "sceneMarkerDestroy")
    }

    fn destroy_scene(&self, scene_id: SceneId) -> Result<(), Error> {
        let data: Value = self.execute(
            queries::SCENE_DESTROY,
            json!({ "scene_id": scene_id.to_string() }),
        )?;
        expect_true("DeleteScene", data, "sceneDestroy")
    }

    fn merge_scenes(&self, sources: &[SceneId], destination: SceneId) -> Result<Scene, Error> {
        let destination_id = destination.to_string();
        let data: SceneMergeData = self.execute(
            &queries::scene_merge(),
            json!({
                "source": id_list(sources),
                "destination": destination_id,
                "values": { "id": destination_id },
            }),
        )?;
        data.scene_merge
            .ok_or_else(|| Error::GraphQl("SceneMerge: no scene returned".to_string()))
    }

    fn set_primary_file(&self, scene_id: SceneId, file_id: FileId) -> Result<(), Error> {
        let data: Value = self.execute(
            queries::SET_PRIMARY_FILE,
            json!({ "scene_id": scene_id.to_string(), "file_id": file_id.to_string() }),
        )?;
        match data.get("sceneUpdate") {
            Some(Value::Object(_)) => Ok(()),
            _ => Err(Error::GraphQl("SetPrimaryFile: no scene returned".to_string())),
        }
    }

    fn delete_files(&self, file_ids: &[FileId]) -> Result<(), Error> {
        let data: Value = self.execute(queries::DELETE_FILES, json!({ "ids": id_list(file_ids) }))?;
        expect_true("DeleteFiles", data, "deleteFiles")
    }
}
