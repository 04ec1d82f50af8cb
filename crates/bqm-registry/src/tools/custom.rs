//! A `Custom`-group tool. Its presence in a chain is what exercises the
//! task executor's "next instance is in the Custom group" rule: whatever
//! precedes a `Custom` tool is always treated as the last in-process step,
//! even when more tools remain in the assignment, because a custom step is
//! assumed to hand off to an external process the task executor does not
//! control.

use bqm_core::{ToolGroup, ToolSettings};

use crate::error::RegistryError;
use crate::tool_trait::{reject_unknown_type, Tool, ToolContext, ToolOutcome, ToolOutput};

pub struct ScriptHook;

impl Tool for ScriptHook {
    fn name(&self) -> &str {
        "ScriptHook"
    }

    fn group(&self) -> ToolGroup {
        ToolGroup::Custom
    }

    fn version(&self) -> u32 {
        1
    }

    fn default_settings(&self) -> ToolSettings {
        ToolSettings::new().with("command", "")
    }

    fn recognized_keys(&self) -> &'static [&'static str] {
        &["command"]
    }

    fn output_suffix(&self, _settings: &ToolSettings) -> String {
        String::new()
    }

    fn apply(&self, ctx: &ToolContext, settings: &ToolSettings) -> Result<ToolOutcome, RegistryError> {
        let command = settings
            .get("command")
            .and_then(|v| v.as_str())
            .ok_or_else(|| reject_unknown_type("ScriptHook", "command", "string"))?;
        if command.is_empty() {
            return Err(reject_unknown_type("ScriptHook", "command", "non-empty string"));
        }
        tracing::info!(%command, path = %ctx.input_path.display(), "custom tool hook invoked (not executed)");
        Ok(ToolOutcome { output: ToolOutput::Path(ctx.input_path.clone()), no_metadata_write: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn requires_a_command() {
        let dir = tempdir().unwrap();
        let input_path = dir.path().join("in.jpg");
        std::fs::write(&input_path, b"x").unwrap();
        let io = bqm_core::IoFileSettings::default();
        let ctx = ToolContext {
            input_path,
            working_dir: dir.path().to_path_buf(),
            io_file_settings: &io,
            raw_loading_rule: bqm_core::RawLoadingRule::Demosaicing,
            exif_set_orientation: true,
            is_last_in_chain: true,
            input_image: None,
        };

        let tool = ScriptHook;
        assert!(tool.apply(&ctx, &tool.default_settings()).is_err());

        let settings = ToolSettings::new().with("command", "notify-send done");
        assert!(tool.apply(&ctx, &settings).is_ok());
    }
}
