//! Concrete `bqm-core` host-interface implementations this binary wires
//! in. A real photo-management host would supply its own richer
//! `InfoProvider`/`PreviewLoader`; these are a self-contained default so
//! the CLI works standalone against a plain directory of files.

use std::path::{Path, PathBuf};

use bqm_core::{DecodedImage, InfoProvider, ItemInfo, SidecarHelper};

#[derive(Debug, Clone, Copy, Default)]
pub struct FsSidecarHelper;

impl SidecarHelper for FsSidecarHelper {
    fn has_sidecar(&self, path: &Path) -> bool {
        self.sidecar_path(path).exists()
    }

    fn sidecar_path(&self, path: &Path) -> PathBuf {
        path.with_extension("xmp")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPreviewLoader;

impl bqm_core::PreviewLoader for DefaultPreviewLoader {
    fn load(&self, path: &Path) -> Option<DecodedImage> {
        let decoded = image::open(path).ok()?.to_rgb8();
        let (width, height) = decoded.dimensions();
        Some(DecodedImage { width, height, rgb: decoded.into_raw() })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoInfoProvider;

impl InfoProvider for NoInfoProvider {
    fn info(&self, _source: &Path) -> ItemInfo {
        ItemInfo::default()
    }
}
