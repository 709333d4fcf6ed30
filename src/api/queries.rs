//! GraphQL documents sent to the Stash server.

/// Upper bound on markers fetched for one scene.
pub const MARKERS_PER_SCENE: i64 = 1000;

pub const FIND_SCENES_WITH_MARKERS: &str = r#"
query FindScenesWithMarkers($page: Int!, $per_page: Int!) {
  findScenes(
    scene_filter: { has_markers: "true" }
    filter: { page: $page, per_page: $per_page, sort: "id", direction: DESC }
  ) {
    count
    scenes {
      id
      title
    }
  }
}
"#;

pub const FIND_SCENE_MARKERS: &str = r#"
query GetSceneMarkers($scene_id: Int!, $per_page: Int!) {
  findSceneMarkers(
    scene_marker_filter: {
      scene_filter: { id: { value: $scene_id, modifier: EQUALS } }
    }
    filter: { per_page: $per_page }
  ) {
    count
    scene_markers {
      id
      seconds
      end_seconds
      title
      primary_tag {
        id
        name
      }
    }
  }
}
"#;

const SCENE_FIELDS: &str = r#"
    id
    title
    files {
      id
      path
      basename
      size
      duration
      video_codec
      width
      height
      frame_rate
      bit_rate
    }
    studio {
      id
      name
    }
    performers {
      id
      name
    }
    scene_markers {
      id
      title
      seconds
    }
    date
    created_at
    updated_at
    resume_time
    play_count
    rating100
"#;

pub fn find_duplicate_scenes() -> String {
    format!(
        "query FindDuplicateScenes($distance: Int!) {{\n  findDuplicateScenes(distance: $distance) {{{SCENE_FIELDS}  }}\n}}\n"
    )
}

pub fn find_scenes_with_multiple_files() -> String {
    format!(
        "query FindScenesWithMultipleFiles {{\n  findScenes(\n    scene_filter: {{ file_count: {{ value: 1, modifier: GREATER_THAN }} }}\n    filter: {{ per_page: -1 }}\n  ) {{\n    count\n    scenes {{{SCENE_FIELDS}    }}\n  }}\n}}\n"
    )
}

pub fn scene_merge() -> String {
    format!(
        "mutation SceneMerge($source: [ID!]!, $destination: ID!, $values: SceneUpdateInput!) {{\n  sceneMerge(input: {{ source: $source, destination: $destination, values: $values }}) {{{SCENE_FIELDS}  }}\n}}\n"
    )
}

pub const SCENE_MARKER_DESTROY: &str = r#"
mutation SceneMarkerDestroy($id: ID!) {
  sceneMarkerDestroy(id: $id)
}
"#;

pub const SCENE_DESTROY: &str = r#"
mutation DeleteScene($scene_id: ID!) {
  sceneDestroy(input: { id: $scene_id, delete_file: false, delete_generated: true })
}
"#;

pub const SET_PRIMARY_FILE: &str = r#"
mutation SetPrimaryFile($scene_id: ID!, $file_id: ID!) {
  sceneUpdate(input: { id: $scene_id, primary_file_id: $file_id }) {
    id
  }
}
"#;

pub const DELETE_FILES: &str = r#"
mutation DeleteFiles($ids: [ID!]!) {
  deleteFiles(ids: $ids)
}
"#;
