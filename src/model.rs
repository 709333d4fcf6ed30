//! Typed records as returned by the Stash GraphQL API.
//!
//! GraphQL `ID`s arrive as strings and are parsed to integers here, once.
//! Numeric fields that are absent, null or malformed decode to zero / `None`
//! so nothing downstream has to second-guess the wire format.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type SceneId = i64;
pub type MarkerId = i64;
pub type FileId = i64;

/// A reference to a tag, studio or performer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRef {
    #[serde(deserialize_with = "de_id")]
    pub id: i64,
    #[serde(default, deserialize_with = "de_string_or_null")]
    pub name: String,
}

/// A timestamped annotation on a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    #[serde(deserialize_with = "de_id")]
    pub id: MarkerId,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub seconds: f64,
    #[serde(default)]
    pub end_seconds: Option<f64>,
    #[serde(default, deserialize_with = "de_string_or_null")]
    pub title: String,
    #[serde(default)]
    pub primary_tag: Option<NamedRef>,
}

impl Marker {
    pub fn tag_name(&self) -> &str {
        self.primary_tag
            .as_ref()
            .map(|tag| tag.name.as_str())
            .unwrap_or("No tag")
    }
}

/// A video file attached to a scene. The first file of a scene is its primary file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoFile {
    #[serde(deserialize_with = "de_id")]
    pub id: FileId,
    #[serde(default, deserialize_with = "de_string_or_null")]
    pub path: String,
    #[serde(default, deserialize_with = "de_string_or_null")]
    pub basename: String,
    #[serde(default, deserialize_with = "de_lenient_u64")]
    pub size: u64,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub duration: f64,
    #[serde(default, deserialize_with = "de_string_or_null")]
    pub video_codec: String,
    #[serde(default, deserialize_with = "de_lenient_u32")]
    pub width: u32,
    #[serde(default, deserialize_with = "de_lenient_u32")]
    pub height: u32,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub frame_rate: f64,
    #[serde(default, deserialize_with = "de_lenient_u64")]
    pub bit_rate: u64,
}

impl VideoFile {
    /// Case-insensitive check of the path's extension, e.g. `has_extension(".mkv")`.
    pub fn has_extension(&self, extension: &str) -> bool {
        self.path
            .to_ascii_lowercase()
            .ends_with(&extension.to_ascii_lowercase())
    }

    pub fn size_mb(&self) -> f64 {
        self.size as f64 / (1024.0 * 1024.0)
    }

    pub fn bitrate_kbps(&self) -> f64 {
        self.bit_rate as f64 / 1000.0
    }

    pub fn display_name(&self) -> &str {
        if self.basename.is_empty() {
            &self.path
        } else {
            &self.basename
        }
    }
}

/// A scene record with the fields the scorer and the resolvers look at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(deserialize_with = "de_id")]
    pub id: SceneId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "rating100", deserialize_with = "de_lenient_opt_i64")]
    pub rating: Option<i64>,
    #[serde(default)]
    pub studio: Option<NamedRef>,
    #[serde(default, deserialize_with = "de_vec_or_null")]
    pub performers: Vec<NamedRef>,
    #[serde(default, rename = "scene_markers", deserialize_with = "de_vec_or_null")]
    pub markers: Vec<Marker>,
    #[serde(default, deserialize_with = "de_vec_or_null")]
    pub files: Vec<VideoFile>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_u64")]
    pub play_count: u64,
    #[serde(default)]
    pub resume_time: Option<f64>,
}

impl Scene {
    /// Title with surrounding whitespace removed, if anything is left.
    pub fn trimmed_title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
    }

    pub fn display_title(&self) -> &str {
        self.trimmed_title().unwrap_or("No title")
    }

    pub fn primary_file(&self) -> Option<&VideoFile> {
        self.files.first()
    }
}

/// The lightweight listing used while paginating scenes that carry markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSummary {
    #[serde(deserialize_with = "de_id")]
    pub id: SceneId,
    #[serde(default)]
    pub title: Option<String>,
}

impl SceneSummary {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .unwrap_or("No title")
    }
}

fn de_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Str(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Int(id) => Ok(id),
        RawId::Str(raw) => raw
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid id: {raw:?}"))),
    }
}

fn de_string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn de_vec_or_null<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn number_from(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|number| number.is_finite())
}

fn de_lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(number_from(&value).unwrap_or(0.0))
}

fn de_lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if let Some(exact) = value.as_u64() {
        return Ok(exact);
    }
    Ok(number_from(&value)
        .filter(|number| *number >= 0.0)
        .map(|number| number as u64)
        .unwrap_or(0))
}

fn de_lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(de_lenient_u64(deserializer)?.min(u32::MAX as u64) as u32)
}

fn de_lenient_opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if let Some(exact) = value.as_i64() {
        return Ok(Some(exact));
    }
    Ok(number_from(&value).map(|number| number.round() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ids_decode_from_strings_and_numbers() {
        let marker: Marker = serde_json::from_value(json!({
            "id": "42",
            "seconds": 12.5,
            "title": "Intro",
            "primary_tag": { "id": 7, "name": "Opening" }
        }))
        .unwrap();
        assert_eq!(marker.id, 42);
        assert_eq!(marker.primary_tag.as_ref().unwrap().id, 7);
        assert_eq!(marker.tag_name(), "Opening");
    }

    #[test]
    fn test_malformed_numbers_decode_to_zero() {
        let file: VideoFile = serde_json::from_value(json!({
            "id": "3",
            "path": "/media/a.mkv",
            "size": null,
            "bit_rate": "not a number",
            "duration": "61.5"
        }))
        .unwrap();
        assert_eq!(file.size, 0);
        assert_eq!(file.bit_rate, 0);
        assert_eq!(file.duration, 61.5);
        assert_eq!(file.video_codec, "");
    }

    #[test]
    fn test_scene_null_lists_and_rating() {
        let scene: Scene = serde_json::from_value(json!({
            "id": "10",
            "title": "   ",
            "rating100": null,
            "performers": null,
            "scene_markers": null,
            "files": []
        }))
        .unwrap();
        assert_eq!(scene.rating, None);
        assert!(scene.performers.is_empty());
        assert!(scene.markers.is_empty());
        assert_eq!(scene.trimmed_title(), None);
        assert_eq!(scene.display_title(), "No title");
    }

    #[test]
    fn test_has_extension_is_case_insensitive() {
        let file = VideoFile {
            id: 1,
            path: "/media/Movie.MKV".to_string(),
            basename: "Movie.MKV".to_string(),
            size: 0,
            duration: 0.0,
            video_codec: String::new(),
            width: 0,
            height: 0,
            frame_rate: 0.0,
            bit_rate: 0,
        };
        assert!(file.has_extension(".mkv"));
        assert!(!file.has_extension(".mp4"));
    }
}
