//! Artifact persistence.
//!
//! Writes are whole-file overwrites: the last write for a path wins, and a
//! reader never sees a half-written artifact.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

use crate::error::ConfigError;
use crate::render::{ImageFormat, RasterImage};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Persistence error at {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Artifact not found: {0}")]
    NotFound(PathBuf),

    #[error("Cannot tell image format from path: {0}")]
    UnknownFormat(PathBuf),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub(crate) fn check_component(what: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidIdentifier(
            value.to_string(),
            format!("{} is empty", what),
        ));
    }
    if value.contains(['/', '\\']) || value == "." || value == ".." {
        return Err(ConfigError::InvalidIdentifier(
            value.to_string(),
            format!("{} must not contain path separators", what),
        ));
    }
    Ok(())
}

/// File name for one slot's artifact: `{collection_id}_{slot_id}.{ext}`.
pub fn artifact_name(
    collection_id: &str,
    slot_id: &str,
    format: ImageFormat,
) -> Result<String, ConfigError> {
    check_component("collection id", collection_id)?;
    check_component("slot id", slot_id)?;
    Ok(format!("{}_{}.{}", collection_id, slot_id, format.extension()))
}

/// `chapter_1.png` backs up to `chapter_1_original.png`.
pub fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_original.{}", stem, ext.to_string_lossy()),
        None => format!("{}_original", stem),
    };
    path.with_file_name(name)
}

fn format_of(path: &Path) -> Result<ImageFormat, StoreError> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(ImageFormat::from_extension)
        .ok_or_else(|| StoreError::UnknownFormat(path.to_path_buf()))
}

pub trait FileStore {
    /// Stores `image` under `path`, relative to the store's root.
    fn save(&self, path: &Path, image: &RasterImage) -> Result<PathBuf, StoreError>;
    fn load(&self, path: &Path) -> Result<RasterImage, StoreError>;
}

/// Directory-backed store.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
    backup_before_overwrite: bool,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            backup_before_overwrite: false,
        }
    }

    /// Keep the first version of every file as `{stem}_original.{ext}`.
    pub fn with_backup(mut self, enabled: bool) -> Self {
        self.backup_before_overwrite = enabled;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

fn write_synced(path: &Path, data: &[u8]) -> Result<(), StoreError> {
    let mut file = fs::File::create(path).map_err(|e| StoreError::io(path, e))?;
    file.write_all(data)
        .and_then(|_| file.sync_all())
        .map_err(|e| StoreError::io(path, e))
}

impl FileStore for FsStore {
    fn save(&self, path: &Path, image: &RasterImage) -> Result<PathBuf, StoreError> {
        let target = self.resolve(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        if self.backup_before_overwrite && target.exists() {
            let backup = backup_path(&target);
            if !backup.exists() {
                fs::copy(&target, &backup).map_err(|e| StoreError::io(&backup, e))?;
                tracing::info!(path = %target.display(), backup = %backup.display(), "backed up original");
            }
        }

        let mut tmp_name = target.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp = target.with_file_name(tmp_name);
        let written = write_synced(&tmp, &image.data)
            .and_then(|_| fs::rename(&tmp, &target).map_err(|e| StoreError::io(&target, e)));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        tracing::debug!(path = %target.display(), bytes = image.data.len(), "artifact written");
        Ok(target)
    }

    fn load(&self, path: &Path) -> Result<RasterImage, StoreError> {
        let target = self.resolve(path);
        let format = format_of(&target)?;
        match fs::read(&target) {
            Ok(data) => Ok(RasterImage { format, data }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound(target)),
            Err(e) => Err(StoreError::io(&target, e)),
        }
    }
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<BTreeMap<PathBuf, RasterImage>>,
    writes: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files
            .lock()
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of `save` calls, overwrites included.
    pub fn write_count(&self) -> usize {
        self.writes.lock().map(|w| *w).unwrap_or_default()
    }

    fn poisoned(path: &Path) -> StoreError {
        StoreError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::Other, "memory store lock poisoned"),
        )
    }
}

impl FileStore for MemoryStore {
    fn save(&self, path: &Path, image: &RasterImage) -> Result<PathBuf, StoreError> {
        let mut files = self.files.lock().map_err(|_| Self::poisoned(path))?;
        files.insert(path.to_path_buf(), image.clone());
        let mut writes = self.writes.lock().map_err(|_| Self::poisoned(path))?;
        *writes += 1;
        Ok(path.to_path_buf())
    }

    fn load(&self, path: &Path) -> Result<RasterImage, StoreError> {
        let files = self.files.lock().map_err(|_| Self::poisoned(path))?;
        files
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn svg(body: &str) -> RasterImage {
        RasterImage {
            format: ImageFormat::Svg,
            data: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn artifact_name_follows_collection_slot_pattern() {
        assert_eq!(
            artifact_name("chapter1", "nft_5", ImageFormat::Png).unwrap(),
            "chapter1_nft_5.png"
        );
    }

    #[test]
    fn artifact_name_rejects_path_tricks() {
        assert!(artifact_name("", "nft_5", ImageFormat::Png).is_err());
        assert!(artifact_name("chapter1", "../etc", ImageFormat::Png).is_err());
        assert!(artifact_name("a\\b", "slot", ImageFormat::Svg).is_err());
    }

    #[test]
    fn backup_path_inserts_suffix_before_extension() {
        assert_eq!(
            backup_path(Path::new("out/chapter1_nft_5.png")),
            PathBuf::from("out/chapter1_nft_5_original.png")
        );
    }

    #[test]
    fn fs_store_round_trips_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let path = Path::new("c_s.svg");

        store.save(path, &svg("<svg>1</svg>")).unwrap();
        store.save(path, &svg("<svg>2</svg>")).unwrap();

        let loaded = store.load(path).unwrap();
        assert_eq!(loaded, svg("<svg>2</svg>"));
        assert!(!dir.path().join("c_s.svg.tmp").exists());
        assert!(!dir.path().join("c_s_original.svg").exists());
    }

    #[test]
    fn failed_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        // A non-empty directory where the artifact should go makes the rename fail.
        fs::create_dir_all(dir.path().join("c_s.svg").join("inner")).unwrap();

        let err = store.save(Path::new("c_s.svg"), &svg("<svg/>")).unwrap_err();
        assert!(matches!(err, StoreError::Persistence { .. }));
        assert!(!dir.path().join("c_s.svg.tmp").exists());
        assert!(dir.path().join("c_s.svg").is_dir());
    }

    #[test]
    fn backup_keeps_first_version_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path()).with_backup(true);
        let path = Path::new("c_s.svg");

        store.save(path, &svg("first")).unwrap();
        assert!(!dir.path().join("c_s_original.svg").exists());
        store.save(path, &svg("second")).unwrap();
        store.save(path, &svg("third")).unwrap();

        let backup = fs::read(dir.path().join("c_s_original.svg")).unwrap();
        assert_eq!(backup, b"first");
        assert_eq!(store.load(path).unwrap().data, b"third");
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        assert!(matches!(
            store.load(Path::new("nope.png")),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.load(Path::new("nope.gif")),
            Err(StoreError::UnknownFormat(_))
        ));
    }

    #[test]
    fn memory_store_counts_writes() {
        let store = MemoryStore::new();
        let path = Path::new("c_s.svg");
        store.save(path, &svg("a")).unwrap();
        store.save(path, &svg("b")).unwrap();
        assert_eq!(store.write_count(), 2);
        assert_eq!(store.paths(), vec![PathBuf::from("c_s.svg")]);
        assert_eq!(store.load(path).unwrap().data, b"b");
    }
}
