use chrono::Utc;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Error;
use crate::model::Scene;

#[derive(Debug, Serialize)]
struct DuplicateDump<'a> {
    generated_at: String,
    phash_distance: u32,
    group_count: usize,
    groups: &'a [Vec<Scene>],
}

/// Save the fetched duplicate groups as pretty JSON for later inspection.
pub fn write_duplicate_dump(path: &str, distance: u32, groups: &[Vec<Scene>]) -> Result<(), Error> {
    let path = Path::new(path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let dump = DuplicateDump {
        generated_at: Utc::now().to_rfc3339(),
        phash_distance: distance,
        group_count: groups.len(),
        groups,
    };

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &dump)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
