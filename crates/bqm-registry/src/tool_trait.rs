//! The `Tool` plugin contract. A tool describes itself (name, group,
//! default settings) and then builds an outcome from a context and a
//! settings snapshot, never holding cross-task mutable state of its own:
//! each call to `apply` gets a fresh `ToolContext` and an immutable
//! settings snapshot.

use std::path::PathBuf;

use bqm_core::{DecodedImage, IoFileSettings, RawLoadingRule, ToolGroup, ToolSettings};

use crate::error::RegistryError;

/// Everything a tool needs about its position in the chain and the queue's
/// processing policy, assembled by `bqm-task` before each `apply` call.
pub struct ToolContext<'a> {
    pub input_path: PathBuf,
    pub working_dir: PathBuf,
    pub io_file_settings: &'a IoFileSettings,
    pub raw_loading_rule: RawLoadingRule,
    pub exif_set_orientation: bool,
    pub is_last_in_chain: bool,
    /// Set when the previous step in the chain produced pixels without
    /// writing them to disk. A tool that reports
    /// `supports_in_memory_input` must read from here in preference to
    /// `input_path`, since `input_path` may not name an existing file.
    pub input_image: Option<DecodedImage>,
}

impl<'a> ToolContext<'a> {
    /// Generates a fresh, collision-free path in `working_dir` carrying
    /// `suffix` (or the input's own suffix when `suffix` is `None`) for a
    /// per-step temp output file.
    pub fn temp_output_path(&self, suffix: Option<&str>) -> PathBuf {
        let suffix = suffix
            .map(|s| s.to_string())
            .unwrap_or_else(|| {
                self.input_path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("tmp")
                    .to_string()
            });
        let name = format!("bqm-{}.{}", uuid::Uuid::new_v4(), suffix);
        self.working_dir.join(name)
    }
}

/// Where a tool's result lives once `apply` returns.
pub enum ToolOutput {
    /// Written to disk already, at this path.
    Path(PathBuf),
    /// Held in memory, not yet written anywhere. Only a tool chain step
    /// that is not last can return this; the task executor always writes
    /// the final step's result to disk before resolving a destination.
    Image(DecodedImage),
}

/// What a tool produced.
pub struct ToolOutcome {
    pub output: ToolOutput,
    /// Set when this tool already wrote its changes into the existing file
    /// and the task executor should not perform its own persist/rename step
    /// for this item. Only meaningful alongside `ToolOutput::Path`.
    pub no_metadata_write: bool,
}

/// A registered batch tool. Implementors are stateless beyond their own
/// construction: all per-run data arrives through `ToolContext` and
/// `ToolSettings`.
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn group(&self) -> ToolGroup;
    fn version(&self) -> u32;
    fn default_settings(&self) -> ToolSettings;

    /// Keys this tool understands, used only for documentation/validation
    /// warnings; unrecognized keys in a settings map are never rejected.
    fn recognized_keys(&self) -> &'static [&'static str] {
        &[]
    }

    /// Whether this tool can read `ToolContext::input_image` instead of
    /// requiring `input_path` to name an existing file. Tools that shell
    /// out or edit tags in place need a real file and leave this `false`;
    /// the task executor flushes any pending in-memory image to disk
    /// before handing such a tool its context.
    fn supports_in_memory_input(&self) -> bool {
        false
    }

    /// The container suffix this tool will write, given a settings
    /// snapshot. An empty string means "keeps whatever suffix the chain
    /// currently has" (e.g. a geometry-only transform).
    fn output_suffix(&self, settings: &ToolSettings) -> String;

    fn apply(&self, ctx: &ToolContext, settings: &ToolSettings) -> Result<ToolOutcome, RegistryError>;
}

pub(crate) fn reject_unknown_type(tool: &str, key: &str, expected: &str) -> RegistryError {
    RegistryError::InvalidSetting {
        tool: tool.to_string(),
        key: key.to_string(),
        reason: format!("expected a {expected} value"),
    }
}

/// Decodes the image a tool should operate on: the in-memory buffer the
/// previous step left behind, if any, otherwise a fresh decode of
/// `input_path`.
pub(crate) fn decode_input(ctx: &ToolContext) -> Result<image::DynamicImage, RegistryError> {
    match &ctx.input_image {
        Some(decoded) => {
            let buffer = image::RgbImage::from_raw(decoded.width, decoded.height, decoded.rgb.clone())
                .ok_or_else(|| RegistryError::MalformedBuffer("declared dimensions don't match the pixel buffer length".to_string()))?;
            Ok(image::DynamicImage::ImageRgb8(buffer))
        }
        None => Ok(image::open(&ctx.input_path)?),
    }
}

/// Converts a decoded image into the host-library-agnostic shape a
/// non-final chain step hands to the next one.
pub(crate) fn to_decoded_image(image: &image::DynamicImage) -> DecodedImage {
    let rgb = image.to_rgb8();
    DecodedImage { width: rgb.width(), height: rgb.height(), rgb: rgb.into_raw() }
}
