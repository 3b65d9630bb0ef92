//! Filesystem-backed asset catalog.
//!
//! The library root holds one directory per category; every file inside with
//! an allow-listed video extension is an asset. Nothing is cached, each call
//! reads the directory again.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{PrerollError, Result};
use crate::types::{AssetRef, CategorySummary};

/// Extensions (lowercase, without the dot) treated as video assets.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "m4v"];

/// Returns true when `path` carries an allow-listed video extension.
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| VIDEO_EXTENSIONS.contains(&e.as_str()))
}

/// Read-only view over the category directories under a library root.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    root: PathBuf,
}

impl AssetCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every category directory with its eligible file count, sorted by name.
    ///
    /// A missing library root is an empty catalog, not an error.
    pub fn list_categories(&self) -> Result<Vec<CategorySummary>> {
        let read_dir = match std::fs::read_dir(&self.root) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut categories = Vec::new();
        for entry in read_dir {
            let Ok(entry) = entry else { continue };
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let file_count = count_videos(&entry.path());
            categories.push(CategorySummary { name, file_count });
        }

        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    /// Eligible files of `category`, sorted by file name.
    ///
    /// Returns `CategoryNotFound` when the directory does not exist or the
    /// name tries to escape the library root. An existing but empty category
    /// returns `Ok(vec![])`; the caller decides whether that is an error.
    pub fn list_files(&self, category: &str) -> Result<Vec<AssetRef>> {
        let dir = self.category_dir(category)?;
        let read_dir = std::fs::read_dir(&dir).map_err(|e| {
            debug!(category, error = %e, "category directory unreadable");
            PrerollError::CategoryNotFound {
                name: category.to_string(),
            }
        })?;

        let mut assets = Vec::new();
        for entry in read_dir {
            let Ok(entry) = entry else { continue };
            let path = entry.path();
            if !is_video_file(&path) {
                continue;
            }
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }

            let created = metadata
                .created()
                .or_else(|_| metadata.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            let absolute_path = std::fs::canonicalize(&path).unwrap_or(path);
            assets.push(AssetRef {
                file_name: entry.file_name().to_string_lossy().into_owned(),
                absolute_path,
                size_bytes: metadata.len(),
                created_at: created,
            });
        }

        assets.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(assets)
    }

    /// Total number of eligible files across all categories.
    pub fn total_assets(&self) -> Result<usize> {
        Ok(self
            .list_categories()?
            .iter()
            .map(|c| c.file_count)
            .sum())
    }

    /// Resolve a single asset path for serving, rejecting anything that is
    /// not an eligible file directly inside the category directory.
    pub fn resolve_file(&self, category: &str, file_name: &str) -> Result<PathBuf> {
        let dir = self.category_dir(category)?;
        if !is_safe_component(file_name) {
            return Err(PrerollError::Validation(format!(
                "invalid file name: {file_name}"
            )));
        }
        let path = dir.join(file_name);
        if !is_video_file(&path) || !path.is_file() {
            return Err(PrerollError::Validation(format!(
                "no such asset: {category}/{file_name}"
            )));
        }
        Ok(path)
    }

    fn category_dir(&self, category: &str) -> Result<PathBuf> {
        if !is_safe_component(category) {
            return Err(PrerollError::CategoryNotFound {
                name: category.to_string(),
            });
        }
        let dir = self.root.join(category);
        if !dir.is_dir() {
            return Err(PrerollError::CategoryNotFound {
                name: category.to_string(),
            });
        }
        Ok(dir)
    }
}

/// A single path component with no traversal or separators.
fn is_safe_component(name: &str) -> bool {
    !name.trim().is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains(['/', '\\', '\0'])
}

fn count_videos(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
                .filter(|e| is_video_file(&e.path()))
                .count()
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn library() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let christmas = tmp.path().join("Christmas");
        std::fs::create_dir(&christmas).unwrap();
        std::fs::write(christmas.join("b-snow.mp4"), b"0123456789").unwrap();
        std::fs::write(christmas.join("a-tree.MKV"), b"01234").unwrap();
        std::fs::write(christmas.join("notes.txt"), b"not a video").unwrap();
        std::fs::create_dir(christmas.join("nested.mp4")).unwrap();

        std::fs::create_dir(tmp.path().join("Empty")).unwrap();
        std::fs::write(tmp.path().join("stray.mp4"), b"x").unwrap();
        tmp
    }

    #[test]
    fn extension_allow_list_is_case_insensitive() {
        assert!(is_video_file(Path::new("/x/intro.MP4")));
        assert!(is_video_file(Path::new("clip.webm")));
        assert!(is_video_file(Path::new("clip.m4v")));
        assert!(!is_video_file(Path::new("poster.jpg")));
        assert!(!is_video_file(Path::new("no_extension")));
    }

    #[test]
    fn lists_categories_with_counts() {
        let tmp = library();
        let catalog = AssetCatalog::new(tmp.path());
        let categories = catalog.list_categories().unwrap();
        assert_eq!(
            categories,
            vec![
                CategorySummary {
                    name: "Christmas".into(),
                    file_count: 2
                },
                CategorySummary {
                    name: "Empty".into(),
                    file_count: 0
                },
            ]
        );
        assert_eq!(catalog.total_assets().unwrap(), 2);
    }

    #[test]
    fn missing_root_is_empty_catalog() {
        let catalog = AssetCatalog::new("/definitely/not/here");
        assert!(catalog.list_categories().unwrap().is_empty());
    }

    #[test]
    fn list_files_filters_and_sorts() {
        let tmp = library();
        let catalog = AssetCatalog::new(tmp.path());
        let files = catalog.list_files("Christmas").unwrap();
        let names: Vec<_> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["a-tree.MKV", "b-snow.mp4"]);
        assert_eq!(files[1].size_bytes, 10);
        assert!(files.iter().all(|f| f.absolute_path.is_absolute()));
    }

    #[test]
    fn list_files_unknown_category() {
        let tmp = library();
        let catalog = AssetCatalog::new(tmp.path());
        let err = catalog.list_files("Halloween").unwrap_err();
        assert!(matches!(err, PrerollError::CategoryNotFound { .. }));
    }

    #[test]
    fn list_files_empty_category_is_ok() {
        let tmp = library();
        let catalog = AssetCatalog::new(tmp.path());
        assert!(catalog.list_files("Empty").unwrap().is_empty());
    }

    #[test]
    fn traversal_names_are_rejected() {
        let tmp = library();
        let catalog = AssetCatalog::new(tmp.path().join("Christmas"));
        for name in ["..", "../Christmas", "a/b", "a\\b", "", "."] {
            let err = catalog.list_files(name).unwrap_err();
            assert!(
                matches!(err, PrerollError::CategoryNotFound { .. }),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn resolve_file_accepts_only_assets() {
        let tmp = library();
        let catalog = AssetCatalog::new(tmp.path());
        assert!(catalog.resolve_file("Christmas", "b-snow.mp4").is_ok());
        assert!(catalog.resolve_file("Christmas", "notes.txt").is_err());
        assert!(catalog.resolve_file("Christmas", "../stray.mp4").is_err());
        assert!(catalog.resolve_file("Christmas", "missing.mp4").is_err());
    }
}
