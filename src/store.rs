//! Data directory access.
//!
//! Source documents live as `<source>.json` next to the generated
//! `aggregated.*` reports.

use crate::models::{SourceDocument, SourceId};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const AGGREGATED_JSON: &str = "aggregated.json";
pub const AGGREGATED_LINO: &str = "aggregated.lino";
pub const AGGREGATED_MARKDOWN: &str = "aggregated.md";

/// Path of a source's cached document.
pub fn source_path(data_dir: &Path, id: SourceId) -> PathBuf {
    data_dir.join(id.file_name())
}

/// Read one source document.
pub fn load_source(path: &Path) -> Result<SourceDocument> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load every source document present in the data directory.
///
/// Missing files are skipped with a warning, as are files that cannot be
/// read or parsed.
pub fn load_sources(data_dir: &Path) -> BTreeMap<SourceId, SourceDocument> {
    let mut sources = BTreeMap::new();

    for id in SourceId::ALL {
        let path = source_path(data_dir, id);
        if !path.exists() {
            warn!("No data for {} ({} not found)", id.display_name(), path.display());
            continue;
        }

        match load_source(&path) {
            Ok(document) => {
                debug!(
                    "Loaded {} entries from {}",
                    document.rankings.len(),
                    path.display()
                );
                sources.insert(id, document);
            }
            Err(e) => warn!("Skipping {}: {:#}", id.display_name(), e),
        }
    }

    sources
}

/// Write `value` as pretty JSON, creating the data directory if needed.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    write_text(path, &content)
}

/// Write text, creating parent directories if needed.
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// Save a fetched source document to `<data_dir>/<source>.json`.
pub fn save_source(data_dir: &Path, id: SourceId, document: &SourceDocument) -> Result<PathBuf> {
    let path = source_path(data_dir, id);
    write_json(&path, document)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RankingEntry;

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let document = SourceDocument {
            source: Some("PYPL".to_string()),
            rankings: vec![RankingEntry::with_share("Python", 0.3)],
            ..SourceDocument::default()
        };

        let path = save_source(&data_dir, SourceId::Pypl, &document).unwrap();
        assert_eq!(path, data_dir.join("pypl.json"));

        let sources = load_sources(&data_dir);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[&SourceId::Pypl], document);
    }

    #[test]
    fn test_load_skips_missing_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("tiobe.json"),
            r#"{"rankings":[{"name":"C","share":"0.1"}],"latestDataDate":"Dec 2025"}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("githut.json"), "{ not json").unwrap();

        let sources = load_sources(dir.path());
        assert_eq!(sources.keys().copied().collect::<Vec<_>>(), vec![SourceId::Tiobe]);
        assert_eq!(sources[&SourceId::Tiobe].rankings[0].share, Some(0.1));
    }

    #[test]
    fn test_load_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_sources(&dir.path().join("missing")).is_empty());
    }

    #[test]
    fn test_write_text_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join(AGGREGATED_LINO);
        write_text(&path, "rankings ()\n").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "rankings ()\n");
    }
}
