//! Per-queue processing policy: conflict resolution, renaming, raw decoding
//! defaults, and per-format I/O options, including each output format's
//! compression/lossless knobs.

use serde::{Deserialize, Serialize};

/// What to do when the resolved destination path already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictRule {
    /// Replace the existing file, noting in the result message that it was
    /// overwritten.
    Overwrite,
    /// Append a numeric discriminator until a free name is found.
    DiffName,
    /// Leave the existing file untouched and skip the item.
    Skip,
}

impl Default for ConflictRule {
    fn default() -> Self {
        ConflictRule::DiffName
    }
}

/// How the destination file name is derived from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenamingRule {
    /// Keep the original base name (suffix may still change).
    UseOriginal,
    /// Apply the queue's renaming parser pattern.
    Customize,
}

impl Default for RenamingRule {
    fn default() -> Self {
        RenamingRule::UseOriginal
    }
}

/// How RAW source files are converted before the tool chain runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawLoadingRule {
    /// Use the embedded preview JPEG instead of demosaicing.
    UseEmbeddedJpeg,
    /// Fully demosaic the sensor data.
    Demosaicing,
}

impl Default for RawLoadingRule {
    fn default() -> Self {
        RawLoadingRule::Demosaicing
    }
}

/// Per-output-format encoder options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoFileSettings {
    pub jpeg_compression: u8,
    pub jpeg_sub_sampling: u8,
    pub png_compression: u8,
    pub tiff_compression: bool,
    pub pgf_compression: u8,
    pub pgf_lossless: bool,
    pub jxl_compression: u8,
    pub jxl_lossless: bool,
    pub webp_compression: u8,
    pub webp_lossless: bool,
    pub avif_compression: u8,
    pub avif_lossless: bool,
    pub heif_compression: u8,
    pub heif_lossless: bool,
    pub jpeg2000_compression: u8,
    pub jpeg2000_lossless: bool,
}

impl Default for IoFileSettings {
    fn default() -> Self {
        IoFileSettings {
            jpeg_compression: 75,
            jpeg_sub_sampling: 1,
            png_compression: 9,
            tiff_compression: false,
            pgf_compression: 3,
            pgf_lossless: true,
            jxl_compression: 75,
            jxl_lossless: true,
            webp_compression: 75,
            webp_lossless: true,
            avif_compression: 75,
            avif_lossless: true,
            heif_compression: 75,
            heif_lossless: true,
            jpeg2000_compression: 75,
            jpeg2000_lossless: true,
        }
    }
}

/// The full processing policy attached to a queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSettings {
    pub use_multi_core_cpu: bool,
    pub save_as_new_version: bool,
    pub exif_set_orientation: bool,
    pub use_org_album: bool,
    pub conflict_rule: ConflictRule,
    pub renaming_rule: RenamingRule,
    pub renaming_parser: String,
    pub raw_loading_rule: RawLoadingRule,
    pub working_url: Option<std::path::PathBuf>,
    pub io_file_settings: IoFileSettings,
}

impl Default for QueueSettings {
    fn default() -> Self {
        QueueSettings {
            use_multi_core_cpu: false,
            save_as_new_version: true,
            exif_set_orientation: true,
            use_org_album: true,
            conflict_rule: ConflictRule::default(),
            renaming_rule: RenamingRule::default(),
            renaming_parser: String::new(),
            raw_loading_rule: RawLoadingRule::default(),
            working_url: None,
            io_file_settings: IoFileSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_file_settings_defaults_are_sane() {
        let io = IoFileSettings::default();
        assert_eq!(io.jpeg_compression, 75);
        assert_eq!(io.png_compression, 9);
        assert!(!io.tiff_compression);
        assert_eq!(io.pgf_compression, 3);
        assert!(io.pgf_lossless);
        assert!(io.heif_lossless);
        assert!(io.jpeg2000_lossless);
    }

    #[test]
    fn queue_settings_defaults_are_sane() {
        let qs = QueueSettings::default();
        assert!(!qs.use_multi_core_cpu);
        assert!(qs.save_as_new_version);
        assert!(qs.exif_set_orientation);
        assert!(qs.use_org_album);
        assert_eq!(qs.conflict_rule, ConflictRule::DiffName);
        assert_eq!(qs.renaming_rule, RenamingRule::UseOriginal);
        assert_eq!(qs.raw_loading_rule, RawLoadingRule::Demosaicing);
    }

    #[test]
    fn round_trips_through_json() {
        let qs = QueueSettings::default();
        let json = serde_json::to_string(&qs).unwrap();
        let back: QueueSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(qs, back);
    }
}
