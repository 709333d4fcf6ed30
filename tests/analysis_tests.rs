use stash_dedupe::analysis::grouping::group_by_proximity;
use stash_dedupe::analysis::primary_file::plan_primary_file;
use stash_dedupe::analysis::resolve::{
    preferred_primary, resolve_keep_best, resolve_markers, resolve_merge, ResolutionError, Winner,
};
use stash_dedupe::analysis::scoring::{score_scene, ScoringMode};
use stash_dedupe::model::{Marker, NamedRef, Scene, VideoFile};

const MB: u64 = 1024 * 1024;

fn marker(id: i64, seconds: f64) -> Marker {
    Marker {
        id,
        seconds,
        end_seconds: None,
        title: format!("marker {id}"),
        primary_tag: None,
    }
}

fn file(id: i64, path: &str, size_mb: u64, bit_rate: u64, codec: &str) -> VideoFile {
    VideoFile {
        id,
        path: path.to_string(),
        basename: path.rsplit('/').next().unwrap_or(path).to_string(),
        size: size_mb * MB,
        duration: 1800.0,
        video_codec: codec.to_string(),
        width: 1920,
        height: 1080,
        frame_rate: 29.97,
        bit_rate,
    }
}

fn scene(id: i64, files: Vec<VideoFile>) -> Scene {
    Scene {
        id,
        title: None,
        rating: None,
        studio: None,
        performers: Vec::new(),
        markers: Vec::new(),
        files,
        date: None,
        created_at: None,
        updated_at: None,
        play_count: 0,
        resume_time: None,
    }
}

fn ids(cluster: &[Marker]) -> Vec<i64> {
    cluster.iter().map(|m| m.id).collect()
}

#[test]
fn test_clusters_partition_a_subset_of_the_input() {
    let markers = vec![
        marker(1, 10.0),
        marker(2, 11.5),
        marker(3, 40.0),
        marker(4, 12.5),
        marker(5, 41.0),
        marker(6, 90.0),
    ];

    let clusters = group_by_proximity(&markers, 2.0);

    // anchor 10.0 takes 11.5 but not 12.5; 12.5 is then alone
    assert_eq!(clusters.len(), 2);
    assert_eq!(ids(&clusters[0]), vec![1, 2]);
    assert_eq!(ids(&clusters[1]), vec![3, 5]);

    let mut seen: Vec<i64> = clusters.iter().flat_map(|c| ids(c)).collect();
    let total = seen.len();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), total);
    assert!(clusters.iter().all(|c| c.len() >= 2));
}

#[test]
fn test_grouping_is_idempotent() {
    let markers = vec![
        marker(7, 5.0),
        marker(3, 5.5),
        marker(9, 6.9),
        marker(1, 30.0),
    ];

    let clusters = group_by_proximity(&markers, 2.0);
    let flattened: Vec<Marker> = clusters.iter().flatten().cloned().collect();
    let again = group_by_proximity(&flattened, 2.0);

    assert_eq!(clusters, again);
}

#[test]
fn test_grouping_ignores_input_order() {
    let markers = vec![marker(4, 20.0), marker(2, 21.0), marker(8, 20.5)];
    let mut reversed = markers.clone();
    reversed.reverse();

    assert_eq!(
        group_by_proximity(&markers, 1.0),
        group_by_proximity(&reversed, 1.0)
    );
    assert_eq!(ids(&group_by_proximity(&markers, 1.0)[0]), vec![2, 4, 8]);
}

#[test]
fn test_zero_tolerance_only_groups_identical_positions() {
    let markers = vec![marker(1, 10.0), marker(2, 10.0), marker(3, 10.0001)];

    let clusters = group_by_proximity(&markers, 0.0);
    assert_eq!(clusters.len(), 1);
    assert_eq!(ids(&clusters[0]), vec![1, 2]);

    let clusters = group_by_proximity(&markers, 0.001);
    assert_eq!(clusters.len(), 1);
    assert_eq!(ids(&clusters[0]), vec![1, 2, 3]);
}

#[test]
fn test_lowest_marker_id_is_kept() {
    let cluster = vec![marker(5, 1.0), marker(2, 1.5), marker(9, 2.0)];

    let resolution = resolve_markers(&cluster).unwrap();

    assert_eq!(resolution.keeper.id, 2);
    let mut losers: Vec<i64> = resolution.losers.iter().map(|m| m.id).collect();
    losers.sort();
    assert_eq!(losers, vec![5, 9]);
}

#[test]
fn test_single_member_cluster_is_rejected() {
    assert_eq!(
        resolve_markers(&[marker(1, 0.0)]),
        Err(ResolutionError::EmptyCluster { size: 1 })
    );
    assert_eq!(
        resolve_merge(&[]).unwrap_err(),
        ResolutionError::EmptyCluster { size: 0 }
    );
}

#[test]
fn test_overall_score_adds_every_signal() {
    let mut s = scene(1, vec![file(10, "/media/x.mkv", 2000, 5_000_000, "h264")]);
    s.rating = Some(80);
    s.title = Some("X".to_string());

    assert_eq!(score_scene(&s, ScoringMode::Overall), 1355.0);
    assert_eq!(score_scene(&s, ScoringMode::MetadataOnly), 150.0);
    assert_eq!(score_scene(&s, ScoringMode::FileOnly), 1205.0);
}

#[test]
fn test_metadata_signals() {
    let mut s = scene(1, Vec::new());
    s.studio = Some(NamedRef {
        id: 3,
        name: "Studio".to_string(),
    });
    s.performers = vec![NamedRef {
        id: 4,
        name: "Someone".to_string(),
    }];
    s.markers = vec![marker(1, 1.0), marker(2, 2.0), marker(3, 3.0)];
    s.title = Some("   ".to_string());

    assert_eq!(score_scene(&s, ScoringMode::Overall), 80.0);
}

#[test]
fn test_divergent_winners_merge_into_best_file() {
    let mut a = scene(1, vec![file(11, "/media/a.mp4", 500, 0, "h264")]);
    a.rating = Some(90);
    let b = scene(2, vec![file(22, "/media/b.mkv", 300, 0, "hevc")]);

    let plan = resolve_merge(&[a, b]).unwrap();

    assert_eq!(plan.best_metadata, 1);
    assert_eq!(plan.best_file, 2);
    assert_eq!(plan.winner, Winner::Divergent);
    assert_eq!(plan.destination, 2);
    assert_eq!(plan.sources, vec![1]);
    assert_eq!(plan.copy_candidates.rating, Some(90));
    assert_eq!(plan.copy_candidates.title, None);
    // the destination's MKV is already primary
    assert_eq!(plan.set_primary, None);
}

#[test]
fn test_same_winner_has_no_copy_candidates() {
    let mut a = scene(3, vec![file(31, "/media/a.mp4", 100, 0, "h264")]);
    let mut b = scene(4, vec![file(41, "/media/b.mp4", 900, 0, "hevc")]);
    b.title = Some("Good".to_string());
    a.title = None;

    let plan = resolve_merge(&[a, b]).unwrap();

    assert_eq!(plan.winner, Winner::Same);
    assert_eq!(plan.destination, 4);
    assert!(plan.copy_candidates.is_empty());
}

#[test]
fn test_merge_promotes_mkv_when_primary_is_not_one() {
    let a = scene(
        5,
        vec![
            file(51, "/media/a.mp4", 4000, 9_000_000, "h264"),
            file(52, "/media/a.MKV", 10, 0, "h264"),
        ],
    );
    let b = scene(6, vec![file(61, "/media/b.avi", 10, 0, "mpeg4")]);

    let plan = resolve_merge(&[a, b]).unwrap();

    assert_eq!(plan.destination, 5);
    assert_eq!(plan.set_primary, Some(52));
}

#[test]
fn test_last_mkv_is_promoted_unless_already_primary() {
    let first_mkv = file(1, "/media/a.mkv", 10, 0, "h264");
    let mp4 = file(2, "/media/b.mp4", 10, 0, "h264");
    let last_mkv = file(3, "/media/c.mkv", 10, 0, "h264");

    assert_eq!(preferred_primary(&[&first_mkv, &mp4, &last_mkv]), Some(3));
    assert_eq!(
        preferred_primary(&[&mp4, &file(4, "/media/d.mkv", 10, 0, "h264"), &last_mkv]),
        Some(3)
    );
    assert_eq!(preferred_primary(&[&last_mkv, &mp4]), None);
}

#[test]
fn test_merge_promotes_source_mkv_behind_destination_mkv() {
    let destination = scene(
        1,
        vec![
            file(11, "/media/a.mkv", 3000, 8_000_000, "hevc"),
            file(12, "/media/a.mp4", 10, 0, "h264"),
        ],
    );
    let source = scene(2, vec![file(21, "/media/b.mkv", 10, 0, "h264")]);

    let plan = resolve_merge(&[destination, source]).unwrap();

    assert_eq!(plan.destination, 1);
    assert_eq!(plan.set_primary, Some(21));
}

#[test]
fn test_merge_ties_go_to_first_scene() {
    let a = scene(8, vec![file(81, "/media/a.mp4", 100, 0, "h264")]);
    let b = scene(7, vec![file(71, "/media/b.mp4", 100, 0, "h264")]);

    let plan = resolve_merge(&[a, b]).unwrap();
    assert_eq!(plan.destination, 8);
    assert_eq!(plan.sources, vec![7]);
}

#[test]
fn test_keep_best_deletes_the_rest() {
    let mut a = scene(1, vec![file(11, "/media/a.mp4", 500, 0, "h264")]);
    a.rating = Some(50);
    let b = scene(2, vec![file(21, "/media/b.mkv", 100, 0, "h264")]);
    let c = scene(3, Vec::new());

    let plan = resolve_keep_best(&[a, b, c]).unwrap();

    assert_eq!(plan.keeper, 2);
    assert_eq!(plan.losers, vec![1, 3]);
    assert_eq!(plan.score, 1010.0);
}

#[test]
fn test_resolution_is_deterministic() {
    let mut a = scene(1, vec![file(11, "/media/a.mp4", 700, 3_000_000, "h264")]);
    a.title = Some("A".to_string());
    let b = scene(2, vec![file(21, "/media/b.mkv", 200, 1_000_000, "h265")]);
    let cluster = vec![a, b];

    let first = resolve_merge(&cluster).unwrap();
    for _ in 0..5 {
        assert_eq!(resolve_merge(&cluster).unwrap(), first);
    }
}

#[test]
fn test_primary_file_plan_needs_both_containers() {
    let both = scene(
        1,
        vec![
            file(11, "/media/a.mp4", 100, 0, "h264"),
            file(12, "/media/a.mkv", 100, 0, "h264"),
        ],
    );
    let plan = plan_primary_file(&both).unwrap();
    assert_eq!(plan.mkv_file_id, 12);
    assert_eq!(plan.mp4_file_id, 11);

    let mkv_only = scene(2, vec![file(21, "/media/b.mkv", 100, 0, "h264")]);
    assert!(plan_primary_file(&mkv_only).is_none());
}
