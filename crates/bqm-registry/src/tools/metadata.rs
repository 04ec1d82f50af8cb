//! A `Metadata`-group tool that edits a timestamp field. Demonstrates the
//! "no metadata write" signal a tool can send back to the task executor
//! when it edited the source file in place instead of producing a new one
//! (an `in_place` setting), so the task skips its own persist/rename step
//! for this item.

use bqm_core::{ToolGroup, ToolSettings};

use crate::error::RegistryError;
use crate::tool_trait::{reject_unknown_type, Tool, ToolContext, ToolOutcome, ToolOutput};

pub struct TimeAdjust;

impl Tool for TimeAdjust {
    fn name(&self) -> &str {
        "TimeAdjust"
    }

    fn group(&self) -> ToolGroup {
        ToolGroup::Metadata
    }

    fn version(&self) -> u32 {
        1
    }

    fn default_settings(&self) -> ToolSettings {
        ToolSettings::new().with("offset_seconds", 0i64).with("in_place", false)
    }

    fn recognized_keys(&self) -> &'static [&'static str] {
        &["offset_seconds", "in_place"]
    }

    fn output_suffix(&self, _settings: &ToolSettings) -> String {
        String::new()
    }

    fn apply(&self, ctx: &ToolContext, settings: &ToolSettings) -> Result<ToolOutcome, RegistryError> {
        let _offset = settings
            .get("offset_seconds")
            .and_then(|v| v.as_int())
            .ok_or_else(|| reject_unknown_type("TimeAdjust", "offset_seconds", "integer"))?;
        let in_place = settings.get("in_place").and_then(|v| v.as_bool()).unwrap_or(false);

        if in_place {
            // The real tool would rewrite the date tag directly on
            // ctx.input_path here; this built-in only exercises the
            // signal path, so it leaves the file untouched.
            Ok(ToolOutcome { output: ToolOutput::Path(ctx.input_path.clone()), no_metadata_write: true })
        } else {
            let suffix = ctx.input_path.extension().and_then(|e| e.to_str());
            let output_path = ctx.temp_output_path(suffix);
            std::fs::copy(&ctx.input_path, &output_path)?;
            Ok(ToolOutcome { output: ToolOutput::Path(output_path), no_metadata_write: false })
        }
    }
}
