//! Task execution core: walks one assignment's tool chain, tracks
//! intermediate files, and resolves the final destination.
//!
//! A sequential walk over the assignment's tool instances, last-in-chain
//! determination that special-cases the `Custom` group, intermediate
//! temp-file cleanup (including sidecar companions), exactly one terminal
//! event per run, and conflict-aware destination persistence with sidecar
//! rename best-effort before the main file rename.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use bqm_core::{Assignment, DecodedImage, FileOps, QueueSettings, SidecarHelper, ToolGroup};
use bqm_queue::{resolve_destination, DestinationResolution};
use bqm_registry::{ToolContext, ToolOutput, ToolRegistry};

use crate::action::{ActionEvent, ActionStatus};
use crate::error::TaskError;

/// The single terminal outcome of a task run. A caller never observes more
/// than one of these per `run` call, matching the "exactly one of
/// Done/Failed/Canceled/Skipped after Started" invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Done(PathBuf),
    Failed(String),
    Canceled,
    Skipped,
}

pub struct Task<'a> {
    pub queue_settings: &'a QueueSettings,
    pub registry: &'a ToolRegistry,
    pub sidecar: &'a dyn SidecarHelper,
    pub file_ops: &'a dyn FileOps,
    /// Polled between tool steps; cooperative cancellation has no hard
    /// latency bound beyond "checked once per tool".
    pub cancel: &'a AtomicBool,
}

impl<'a> Task<'a> {
    pub fn run(
        &self,
        assignment: &Assignment,
        working_dir: &std::path::Path,
        mut emit: impl FnMut(ActionEvent),
    ) -> Result<TaskOutcome, TaskError> {
        emit(ActionEvent::new(
            ActionStatus::BatchStarted,
            assignment.item_url.clone(),
            "processing started",
        ));

        let mut current_path = assignment.item_url.clone();
        let mut current_image: Option<DecodedImage> = None;
        // Whether `current_path` is a temp file this task created (and so
        // must eventually delete), as opposed to the original input or a
        // stale name kept only for its extension while the real pixels
        // live in `current_image`.
        let mut current_is_temp = false;
        let mut tmp_to_delete: Vec<PathBuf> = Vec::new();
        let mut last_no_metadata_write = false;

        for (index, instance) in assignment.tools.iter().enumerate() {
            if self.cancel.load(Ordering::Relaxed) {
                tracing::debug!(item = %assignment.item_url.display(), step = index, "task canceled");
                self.cleanup(&tmp_to_delete);
                emit(ActionEvent::new(ActionStatus::BatchCanceled, assignment.item_url.clone(), "canceled"));
                return Ok(TaskOutcome::Canceled);
            }

            let tool = self.registry.find_for_instance(instance)?;
            let is_last_in_chain = index + 1 == assignment.tools.len()
                || assignment.tools[index + 1].group == ToolGroup::Custom;

            let mut ctx = ToolContext {
                input_path: current_path.clone(),
                working_dir: working_dir.to_path_buf(),
                io_file_settings: &self.queue_settings.io_file_settings,
                raw_loading_rule: self.queue_settings.raw_loading_rule,
                exif_set_orientation: self.queue_settings.exif_set_orientation,
                is_last_in_chain,
                input_image: current_image.clone(),
            };

            // A tool that needs a real file (tag edits, external hooks)
            // can't read the previous step's in-memory result directly;
            // materialize it to a temp file first.
            if ctx.input_image.is_some() && !tool.supports_in_memory_input() {
                let flushed = flush_to_disk(&ctx)?;
                ctx.input_path = flushed.clone();
                ctx.input_image = None;
                current_path = flushed;
                current_image = None;
                current_is_temp = true;
            }

            match tool.apply(&ctx, &instance.settings) {
                Ok(outcome) => {
                    match outcome.output {
                        ToolOutput::Path(path) => {
                            if current_is_temp && current_path != path {
                                tmp_to_delete.push(current_path.clone());
                            }
                            current_path = path;
                            current_image = None;
                            current_is_temp = current_path != assignment.item_url;
                        }
                        ToolOutput::Image(image) => {
                            if current_is_temp {
                                tmp_to_delete.push(current_path.clone());
                            }
                            current_image = Some(image);
                            current_is_temp = false;
                        }
                    }
                    last_no_metadata_write = outcome.no_metadata_write;
                }
                Err(err) => {
                    tracing::warn!(item = %assignment.item_url.display(), tool = %instance.name, error = %err, "tool step failed");
                    self.cleanup(&tmp_to_delete);
                    let message = format!("tool `{}` failed: {err}", instance.name);
                    emit(ActionEvent::new(ActionStatus::BatchFailed, assignment.item_url.clone(), message.clone()));
                    return Ok(TaskOutcome::Failed(message));
                }
            }
        }

        // The final output is not a temp file to delete, only the
        // intermediate steps' leftovers are.
        tmp_to_delete.retain(|p| p != &current_path);
        self.cleanup(&tmp_to_delete);

        if matches!(
            std::fs::metadata(&current_path).map(|m| m.len()),
            Ok(0)
        ) {
            let _ = std::fs::remove_file(&current_path);
            let message = "tool chain produced an empty output file".to_string();
            emit(ActionEvent::new(ActionStatus::BatchFailed, assignment.item_url.clone(), message.clone()));
            return Ok(TaskOutcome::Failed(message));
        }

        let resolution = resolve_destination(
            assignment,
            working_dir,
            self.registry,
            self.queue_settings.renaming_rule,
            &self.queue_settings.renaming_parser,
            self.queue_settings.conflict_rule,
            0,
            self.file_ops,
        );

        let (dest, done_message) = match resolution {
            DestinationResolution::Clear(dest) => (dest, "done".to_string()),
            DestinationResolution::Overwrite(dest) => (dest, "done (overwritten)".to_string()),
            DestinationResolution::Renamed(dest) => {
                let file_name = dest.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
                let message = format!("done (renamed to {file_name})");
                (dest, message)
            }
            DestinationResolution::Skip => {
                if current_path != assignment.item_url {
                    let _ = std::fs::remove_file(&current_path);
                }
                emit(ActionEvent::new(
                    ActionStatus::BatchSkipped,
                    assignment.item_url.clone(),
                    "destination exists, skipped by conflict policy",
                ));
                return Ok(TaskOutcome::Skipped);
            }
        };

        if last_no_metadata_write {
            emit(ActionEvent::new(
                ActionStatus::BatchDone,
                assignment.item_url.clone(),
                "edited in place",
            )
            .with_dest(dest.clone())
            .with_no_write(true));
            return Ok(TaskOutcome::Done(dest));
        }

        if self.sidecar.has_sidecar(&current_path) {
            let sidecar_src = self.sidecar.sidecar_path(&current_path);
            let sidecar_dst = self.sidecar.sidecar_path(&dest);
            if !self.file_ops.local_file_rename(&current_path, &sidecar_src, &sidecar_dst, true) {
                emit(ActionEvent::new(
                    ActionStatus::BatchFailed,
                    assignment.item_url.clone(),
                    "failed to move sidecar file",
                ));
            }
        }

        if self.file_ops.local_file_rename(&assignment.item_url, &current_path, &dest, self.queue_settings.exif_set_orientation) {
            emit(ActionEvent::new(ActionStatus::BatchDone, assignment.item_url.clone(), done_message.as_str()).with_dest(dest.clone()));
            Ok(TaskOutcome::Done(dest))
        } else {
            let message = "failed to move output into place".to_string();
            emit(ActionEvent::new(ActionStatus::BatchFailed, assignment.item_url.clone(), message.clone()));
            Ok(TaskOutcome::Failed(message))
        }
    }

    fn cleanup(&self, paths: &[PathBuf]) {
        for path in paths {
            if self.sidecar.has_sidecar(path) {
                let _ = std::fs::remove_file(self.sidecar.sidecar_path(path));
            }
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Writes the context's in-memory input image to a fresh temp file, for a
/// tool step that can't consume `ToolContext::input_image` directly.
fn flush_to_disk(ctx: &ToolContext) -> Result<PathBuf, TaskError> {
    let image = ctx.input_image.as_ref().expect("caller checked input_image is Some");
    let buffer = image::RgbImage::from_raw(image.width, image.height, image.rgb.clone())
        .ok_or_else(|| TaskError::FlushFailed("declared dimensions don't match the pixel buffer length".to_string()))?;
    let suffix = ctx.input_path.extension().and_then(|e| e.to_str());
    let output_path = ctx.temp_output_path(suffix);
    buffer
        .save(&output_path)
        .map_err(|e| TaskError::FlushFailed(e.to_string()))?;
    Ok(output_path)
}
