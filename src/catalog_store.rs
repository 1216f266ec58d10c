use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogError, LevelCatalog};
use crate::constants::{LEVEL_PACK_ENV, LEVEL_PACK_VERSION};
use crate::level::Level;

#[derive(Clone, Debug, Serialize)]
struct LevelPackFile<'a> {
    version: u8,
    #[serde(rename = "generatedAt")]
    generated_at: String,
    levels: &'a [Level],
}

#[derive(Clone, Debug, Deserialize)]
struct LevelPackFileRaw {
    version: u8,
    levels: Vec<serde_json::Value>,
}

pub fn load_catalog(path: &Path) -> Result<LevelCatalog, CatalogError> {
    let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let catalog = parse_level_pack(&text, path)?;
    tracing::info!(
        path = %path.display(),
        levels = catalog.total_levels(),
        "loaded level pack"
    );
    Ok(catalog)
}

pub fn parse_level_pack(text: &str, path: &Path) -> Result<LevelCatalog, CatalogError> {
    let parse_error = |source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let raw: LevelPackFileRaw = serde_json::from_str(text).map_err(parse_error)?;
    if raw.version != LEVEL_PACK_VERSION {
        return Err(CatalogError::UnsupportedVersion {
            version: raw.version,
        });
    }

    let mut levels = Vec::with_capacity(raw.levels.len());
    for value in raw.levels {
        let level: Level = serde_json::from_value(value).map_err(parse_error)?;
        levels.push(level);
    }
    LevelCatalog::from_levels(levels)
}

pub fn save_catalog(path: &Path, catalog: &LevelCatalog) -> Result<(), CatalogError> {
    let io_error = |source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
    }

    let payload = LevelPackFile {
        version: LEVEL_PACK_VERSION,
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        levels: catalog.levels(),
    };
    let text = serde_json::to_string_pretty(&payload).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, text).map_err(io_error)
}

/// Explicit path first, then the level-pack environment variable, then the
/// built-in curriculum.
pub fn resolve_catalog(explicit: Option<&Path>) -> Result<LevelCatalog, CatalogError> {
    if let Some(path) = explicit {
        return load_catalog(path);
    }
    match std::env::var(LEVEL_PACK_ENV) {
        Ok(raw) if !raw.trim().is_empty() => load_catalog(&PathBuf::from(raw.trim())),
        _ => Ok(LevelCatalog::builtin()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::tests::sample_level;
    use crate::types::PieceType;

    #[test]
    fn save_then_load_keeps_levels() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("packs").join("builtin.json");
        let catalog = LevelCatalog::builtin();
        save_catalog(&path, &catalog).expect("save should succeed");

        let loaded = load_catalog(&path).expect("load should succeed");
        assert_eq!(loaded.levels(), catalog.levels());

        let text = fs::read_to_string(&path).expect("file exists");
        let value: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value["version"], 1);
        assert!(value["generatedAt"].is_string());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = load_catalog(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(CatalogError::Io { .. })));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let text = r#"{ "version": 2, "levels": [] }"#;
        let result = parse_level_pack(text, Path::new("pack.json"));
        assert!(matches!(
            result,
            Err(CatalogError::UnsupportedVersion { version: 2 })
        ));
    }

    #[test]
    fn malformed_level_entry_is_a_parse_error() {
        let text = r#"{ "version": 1, "levels": [ { "id": "x" } ] }"#;
        let result = parse_level_pack(text, Path::new("pack.json"));
        match result {
            Err(CatalogError::Parse { path, .. }) => assert_eq!(path, PathBuf::from("pack.json")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn out_of_bounds_level_in_pack_is_rejected() {
        let mut level = sample_level();
        level.player.position.x = 9;
        let text = serde_json::json!({ "version": 1, "levels": [level] }).to_string();
        let result = parse_level_pack(&text, Path::new("pack.json"));
        assert!(matches!(result, Err(CatalogError::InvalidLevel { .. })));
    }

    #[test]
    fn explicit_path_wins_over_builtin() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("single.json");
        let mut level = sample_level();
        level.player.piece_type = PieceType::King;
        let catalog = LevelCatalog::from_levels(vec![level]).expect("valid");
        save_catalog(&path, &catalog).expect("save");

        let resolved = resolve_catalog(Some(&path)).expect("resolve");
        assert_eq!(resolved.total_levels(), 1);
        assert_eq!(resolved.levels()[0].player.piece_type, PieceType::King);
    }
}
