//! Re-encodes an item into a different container format. Collapses what
//! would otherwise be a family of near-identical per-format tools
//! (`ConvertToJpeg`/`ConvertToPng`/...) into one tool parameterized by a
//! `format` setting, so the chain-execution machinery exercises a real
//! suffix-changing step.

use bqm_core::{ToolGroup, ToolSettings};

use crate::error::RegistryError;
use crate::tool_trait::{decode_input, reject_unknown_type, to_decoded_image, Tool, ToolContext, ToolOutcome, ToolOutput};

pub struct Convert;

impl Convert {
    fn target_format(&self, settings: &ToolSettings) -> Result<image::ImageFormat, RegistryError> {
        let format = settings
            .get("format")
            .and_then(|v| v.as_str())
            .unwrap_or("jpeg");
        image::ImageFormat::from_extension(format).ok_or_else(|| {
            reject_unknown_type("Convert", "format", "known image format extension")
        })
    }
}

impl Tool for Convert {
    fn name(&self) -> &str {
        "Convert"
    }

    fn group(&self) -> ToolGroup {
        ToolGroup::Convert
    }

    fn version(&self) -> u32 {
        1
    }

    fn default_settings(&self) -> ToolSettings {
        ToolSettings::new().with("format", "jpeg")
    }

    fn recognized_keys(&self) -> &'static [&'static str] {
        &["format"]
    }

    fn output_suffix(&self, settings: &ToolSettings) -> String {
        settings.get("format").and_then(|v| v.as_str()).unwrap_or("jpeg").to_string()
    }

    fn supports_in_memory_input(&self) -> bool {
        true
    }

    fn apply(&self, ctx: &ToolContext, settings: &ToolSettings) -> Result<ToolOutcome, RegistryError> {
        let format = self.target_format(settings)?;
        let decoded = decode_input(ctx)?;

        if ctx.is_last_in_chain {
            let output_path = ctx.temp_output_path(Some(self.output_suffix(settings).as_str()));
            decoded.save_with_format(&output_path, format)?;
            Ok(ToolOutcome { output: ToolOutput::Path(output_path), no_metadata_write: false })
        } else {
            Ok(ToolOutcome { output: ToolOutput::Image(to_decoded_image(&decoded)), no_metadata_write: false })
        }
    }
}
