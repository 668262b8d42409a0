//! Layer file persistence
//!
//! Each hierarchy layer is one JSON document on disk. A missing or unparsable
//! file is an empty layer, not an error; saves replace the whole document
//! atomically so a reader never observes a torn write.

use crate::error::{SkillbookError, SkillbookResult};
use crate::types::Skill;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Persisted document schema version
pub const FORMAT_VERSION: &str = "1.0.0";

/// On-disk layer document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayerFile {
    version: String,
    updated_at: DateTime<Utc>,
    skills: BTreeMap<String, Skill>,
}

/// Load all skills from a layer file, in deterministic id order.
///
/// An absent file or unparsable content yields an empty collection; any other
/// I/O failure surfaces as a storage error.
pub async fn load(path: &Path) -> SkillbookResult<Vec<Skill>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!("no layer file at {}", path.display());
            return Ok(Vec::new());
        }
        Err(err) => return Err(SkillbookError::storage(path, err)),
    };

    match serde_json::from_str::<LayerFile>(&content) {
        Ok(file) => Ok(file.skills.into_values().collect()),
        Err(err) => {
            warn!(
                "unreadable layer file {}, treating as empty: {}",
                path.display(),
                err
            );
            Ok(Vec::new())
        }
    }
}

/// Serialize the full collection to `path`, replacing any previous content.
///
/// The document is written to a sibling temp file and renamed over the
/// target, so a crash mid-write never leaves a truncated layer behind.
pub async fn save(path: &Path, skills: &[Skill]) -> SkillbookResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|err| SkillbookError::storage(path, err))?;
    }

    let file = LayerFile {
        version: FORMAT_VERSION.to_string(),
        updated_at: Utc::now(),
        skills: skills
            .iter()
            .map(|skill| (skill.id.as_str().to_string(), skill.clone()))
            .collect(),
    };

    let content =
        serde_json::to_string_pretty(&file).map_err(|err| SkillbookError::storage(path, err))?;

    let tmp = temp_path(path);
    tokio::fs::write(&tmp, content)
        .await
        .map_err(|err| SkillbookError::storage(&tmp, err))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|err| SkillbookError::storage(path, err))?;

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "layer".into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Next id sequence number for `section` among `skills`.
///
/// Scans trailing numeric suffixes of ids sharing the section and returns
/// `max + 1`, starting at 1. Malformed ids are ignored.
pub fn next_sequence(skills: &[Skill], section: &str) -> u32 {
    let mut next = 1;
    for skill in skills.iter().filter(|s| s.section == section) {
        if let Some(seq) = skill.id.sequence() {
            next = next.max(seq + 1);
        }
    }
    next
}
