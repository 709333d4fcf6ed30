use crate::model::{Scene, VideoFile};

/// Scoring weights. Additive and unnormalized, so the magnitudes matter.
pub mod weights {
    pub const RATING_PRESENT: f64 = 100.0;
    pub const TITLE_PRESENT: f64 = 50.0;
    pub const STUDIO_PRESENT: f64 = 25.0;
    pub const PERFORMERS_PRESENT: f64 = 25.0;
    pub const PER_MARKER: f64 = 10.0;
    /// Divisor applied to the largest file size in MB.
    pub const SIZE_MB_DIVISOR: f64 = 10.0;
    /// Divisor applied to the highest bitrate in kbps.
    pub const BITRATE_KBPS_DIVISOR: f64 = 1000.0;
    pub const PREFERRED_CONTAINER: f64 = 1000.0;
    pub const PREFERRED_CODEC: f64 = 500.0;
}

pub const PREFERRED_EXTENSION: &str = ".mkv";
pub const SECONDARY_EXTENSION: &str = ".mp4";
pub const PREFERRED_CODECS: [&str; 3] = ["hevc", "h265", "h.265"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringMode {
    /// Every signal.
    Overall,
    /// Rating, title, studio, performers and markers.
    MetadataOnly,
    /// Size, bitrate, container and codec.
    FileOnly,
}

impl ScoringMode {
    fn includes_metadata(self) -> bool {
        matches!(self, ScoringMode::Overall | ScoringMode::MetadataOnly)
    }

    fn includes_files(self) -> bool {
        matches!(self, ScoringMode::Overall | ScoringMode::FileOnly)
    }
}

pub fn is_preferred_codec(codec: &str) -> bool {
    let codec = codec.trim().to_ascii_lowercase();
    PREFERRED_CODECS.contains(&codec.as_str())
}

pub fn score_scene(scene: &Scene, mode: ScoringMode) -> f64 {
    let mut score = 0.0;
    if mode.includes_metadata() {
        score += metadata_score(scene);
    }
    if mode.includes_files() {
        score += file_set_score(&scene.files);
    }
    score
}

fn metadata_score(scene: &Scene) -> f64 {
    let mut score = 0.0;
    if scene.rating.is_some() {
        score += weights::RATING_PRESENT;
    }
    if scene.trimmed_title().is_some() {
        score += weights::TITLE_PRESENT;
    }
    if scene.studio.is_some() {
        score += weights::STUDIO_PRESENT;
    }
    if !scene.performers.is_empty() {
        score += weights::PERFORMERS_PRESENT;
    }
    score += weights::PER_MARKER * scene.markers.len() as f64;
    score
}

/// Size and bitrate come from the best file of the set (each maximised
/// independently); container and codec bonuses apply if any file qualifies.
fn file_set_score(files: &[VideoFile]) -> f64 {
    let best_size_mb = files.iter().map(VideoFile::size_mb).fold(0.0, f64::max);
    let best_kbps = files.iter().map(VideoFile::bitrate_kbps).fold(0.0, f64::max);

    let mut score = best_size_mb / weights::SIZE_MB_DIVISOR + best_kbps / weights::BITRATE_KBPS_DIVISOR;
    if files.iter().any(|f| f.has_extension(PREFERRED_EXTENSION)) {
        score += weights::PREFERRED_CONTAINER;
    }
    if files.iter().any(|f| is_preferred_codec(&f.video_codec)) {
        score += weights::PREFERRED_CODEC;
    }
    score
}

/// File-only score of a single file.
pub fn score_file(file: &VideoFile) -> f64 {
    file_set_score(std::slice::from_ref(file))
}

/// The highest scoring file of a scene; ties go to the earlier file.
pub fn best_file_in_scene(scene: &Scene) -> Option<&VideoFile> {
    argmax_by(&scene.files, score_file)
}

/// Index-stable argmax: the first item holding the maximum wins.
pub fn argmax_by<T, F>(items: &[T], mut score: F) -> Option<&T>
where
    F: FnMut(&T) -> f64,
{
    let mut best: Option<(&T, f64)> = None;
    for item in items {
        let value = score(item);
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((item, value)),
        }
    }
    best.map(|(item, _)| item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NamedRef;

    const MB: u64 = 1024 * 1024;

    fn file(id: i64, path: &str, size_mb: u64, kbps: u64, codec: &str) -> VideoFile {
        VideoFile {
            id,
            path: path.to_string(),
            basename: path.rsplit('/').next().unwrap_or(path).to_string(),
            size: size_mb * MB,
            duration: 0.0,
            video_codec: codec.to_string(),
            width: 1920,
            height: 1080,
            frame_rate: 30.0,
            bit_rate: kbps * 1000,
        }
    }

    fn scene(id: i64) -> Scene {
        Scene {
            id,
            title: None,
            rating: None,
            studio: None,
            performers: Vec::new(),
            markers: Vec::new(),
            files: Vec::new(),
            date: None,
            created_at: None,
            updated_at: None,
            play_count: 0,
            resume_time: None,
        }
    }

    #[test]
    fn test_overall_score_example() {
        let mut s = scene(1);
        s.rating = Some(80);
        s.title = Some("X".to_string());
        s.files = vec![file(1, "/v/x.mkv", 2000, 5000, "h264")];
        assert_eq!(score_scene(&s, ScoringMode::Overall), 1355.0);
    }

    #[test]
    fn test_modes_partition_the_signals() {
        let mut s = scene(1);
        s.rating = Some(0);
        s.studio = Some(NamedRef { id: 1, name: "Studio".to_string() });
        s.files = vec![file(1, "/v/x.mp4", 100, 1000, "HEVC")];
        let metadata = score_scene(&s, ScoringMode::MetadataOnly);
        let files = score_scene(&s, ScoringMode::FileOnly);
        assert_eq!(metadata, 125.0);
        assert_eq!(files, 10.0 + 1.0 + 500.0);
        assert_eq!(score_scene(&s, ScoringMode::Overall), metadata + files);
    }

    #[test]
    fn test_blank_title_scores_nothing() {
        let mut s = scene(1);
        s.title = Some("  \t ".to_string());
        assert_eq!(score_scene(&s, ScoringMode::Overall), 0.0);
    }

    #[test]
    fn test_best_size_and_bitrate_taken_independently() {
        let mut s = scene(1);
        s.files = vec![
            file(1, "/v/a.mp4", 1000, 100, "h264"),
            file(2, "/v/b.mp4", 10, 8000, "h264"),
        ];
        assert_eq!(score_scene(&s, ScoringMode::FileOnly), 100.0 + 8.0);
    }

    #[test]
    fn test_codec_match_is_case_insensitive() {
        assert!(is_preferred_codec("HEVC"));
        assert!(is_preferred_codec("H.265"));
        assert!(!is_preferred_codec("h264"));
        assert!(!is_preferred_codec(""));
    }

    #[test]
    fn test_best_file_in_scene_prefers_mkv() {
        let mut s = scene(1);
        s.files = vec![
            file(1, "/v/a.mp4", 3000, 9000, "h264"),
            file(2, "/v/a.mkv", 500, 2000, "h264"),
        ];
        assert_eq!(best_file_in_scene(&s).map(|f| f.id), Some(2));
    }

    #[test]
    fn test_argmax_ties_go_to_first() {
        let values = [3.0, 7.0, 7.0, 1.0];
        let best = argmax_by(&values, |v| *v).unwrap();
        assert!(std::ptr::eq(best, &values[1]));
        assert!(argmax_by(&[] as &[f64], |v| *v).is_none());
    }
}
