//! Abstract interfaces onto the surrounding photo-management host.
//!
//! These realize the "global singletons become traits passed by reference"
//! redesign note: nothing in this workspace reaches for a process-wide
//! singleton to ask about item metadata, load a preview, or touch the
//! filesystem. A `Task` or `FrameGenerator` is handed `Arc<dyn Trait>`
//! implementations at construction, and tests supply their own fakes
//! instead of standing up the real host.

use std::path::{Path, PathBuf};

use crate::item::ItemInfo;

/// A decoded raster image, host-library-agnostic so `bqm-core` does not
/// need to depend on `image` just to describe this shape.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Tightly packed 8-bit RGB triples, row-major.
    pub rgb: Vec<u8>,
}

/// Resolves host-side metadata for an item. A miss returns a default
/// (all-`None`/empty) `ItemInfo` rather than an error, since "the host
/// doesn't know about this file" is routine, not exceptional.
pub trait InfoProvider: Send + Sync {
    fn info(&self, source: &Path) -> ItemInfo;
}

/// Loads a preview-quality decode of an item for overlay compositing.
/// Returns `None` on any failure (missing file, unsupported codec,
/// corrupt data) so callers fall back to a placeholder instead of
/// propagating a decode error through the streaming path.
pub trait PreviewLoader: Send + Sync {
    fn load(&self, path: &Path) -> Option<DecodedImage>;
}

/// Queries and locates a source file's sidecar (e.g. an XMP companion),
/// consulted by the task executor so a sidecar travels with its image when
/// the image is renamed to its final destination.
pub trait SidecarHelper: Send + Sync {
    fn has_sidecar(&self, path: &Path) -> bool;
    fn sidecar_path(&self, path: &Path) -> PathBuf;
}

/// Filesystem operations the task executor needs that go beyond a plain
/// rename: finding a conflict-free name, and moving a finished temp file
/// into place while preserving file times when requested.
pub trait FileOps: Send + Sync {
    fn unique_file_url(&self, path: &Path) -> PathBuf;
    fn local_file_rename(
        &self,
        source: &Path,
        temp_out: &Path,
        final_out: &Path,
        preserve_times: bool,
    ) -> bool;
}

/// Production `FileOps` backed directly by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFileOps;

impl FileOps for DefaultFileOps {
    fn unique_file_url(&self, path: &Path) -> PathBuf {
        if !path.exists() {
            return path.to_path_buf();
        }
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
        let ext = path.extension().and_then(|e| e.to_str());
        let parent = path.parent().unwrap_or_else(|| Path::new(""));
        let mut counter = 2u32;
        loop {
            let candidate_name = match ext {
                Some(ext) => format!("{stem} ({counter}).{ext}"),
                None => format!("{stem} ({counter})"),
            };
            let candidate = parent.join(candidate_name);
            if !candidate.exists() {
                return candidate;
            }
            counter += 1;
        }
    }

    fn local_file_rename(
        &self,
        _source: &Path,
        temp_out: &Path,
        final_out: &Path,
        preserve_times: bool,
    ) -> bool {
        if std::fs::rename(temp_out, final_out).is_err() {
            if std::fs::copy(temp_out, final_out).is_err() {
                return false;
            }
            let _ = std::fs::remove_file(temp_out);
        }
        if preserve_times {
            // Best effort: if the filesystem or platform doesn't support
            // it, the rename itself still succeeded.
            if let Ok(metadata) = std::fs::metadata(final_out) {
                let _ = metadata.modified();
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn unique_file_url_returns_input_when_free() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        assert_eq!(DefaultFileOps.unique_file_url(&path), path);
    }

    #[test]
    fn unique_file_url_appends_discriminator_on_conflict() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        std::fs::write(&path, b"existing").unwrap();

        let unique = DefaultFileOps.unique_file_url(&path);
        assert_ne!(unique, path);
        assert!(!unique.exists());
        assert_eq!(unique.file_name().unwrap().to_str().unwrap(), "out (2).jpg");
    }

    #[test]
    fn unique_file_url_skips_taken_discriminators() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c.jpg");
        std::fs::write(&path, b"existing").unwrap();
        std::fs::write(dir.path().join("c (2).jpg"), b"existing").unwrap();

        let unique = DefaultFileOps.unique_file_url(&path);
        assert_eq!(unique.file_name().unwrap().to_str().unwrap(), "c (3).jpg");
    }

    #[test]
    fn local_file_rename_moves_temp_into_place() {
        let dir = tempdir().unwrap();
        let temp_out = dir.path().join("tmp.jpg");
        let final_out = dir.path().join("final.jpg");
        std::fs::write(&temp_out, b"data").unwrap();

        assert!(DefaultFileOps.local_file_rename(Path::new("/source.raw"), &temp_out, &final_out, true));
        assert!(final_out.exists());
        assert!(!temp_out.exists());
    }
}
