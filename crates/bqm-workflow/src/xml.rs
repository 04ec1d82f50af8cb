//! XML persistence for the workflow list: a flat, attribute-heavy DOM
//! rather than deeply nested elements. One `<workflow>` element per saved
//! preset, one `<tool>` child per chain step, and settings blobs that
//! don't have a natural attribute shape (queue I/O settings, tool
//! settings) carried as embedded JSON text so they round-trip exactly
//! without a second schema to keep in sync with `bqm-core::ToolValue`.

use std::io::Cursor;

use bqm_core::{ConflictRule, IoFileSettings, QueueSettings, RawLoadingRule, RenamingRule, ToolGroup, ToolInstance, ToolSettings};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use crate::error::WorkflowError;
use crate::workflow::Workflow;

const DOCUMENT_VERSION: &str = "1";

pub fn write_workflows(workflows: &[Workflow]) -> Result<String, WorkflowError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    let mut root = BytesStart::new("workflowlist");
    root.push_attribute(("version", DOCUMENT_VERSION));
    writer.write_event(Event::Start(root))?;

    for workflow in workflows {
        write_workflow(&mut writer, workflow)?;
    }

    writer.write_event(Event::End(BytesEnd::new("workflowlist")))?;

    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_workflow(writer: &mut Writer<Cursor<Vec<u8>>>, workflow: &Workflow) -> Result<(), WorkflowError> {
    let io_json = serde_json::to_string(&workflow.queue_settings.io_file_settings)?;

    let mut start = BytesStart::new("workflow");
    start.push_attribute(("title", workflow.title.as_str()));
    start.push_attribute(("desc", workflow.description.as_str()));
    start.push_attribute(("use_multi_core_cpu", bool_str(workflow.queue_settings.use_multi_core_cpu)));
    start.push_attribute(("save_as_new_version", bool_str(workflow.queue_settings.save_as_new_version)));
    start.push_attribute(("exif_set_orientation", bool_str(workflow.queue_settings.exif_set_orientation)));
    start.push_attribute(("use_org_album", bool_str(workflow.queue_settings.use_org_album)));
    start.push_attribute(("conflict_rule", conflict_rule_to_str(workflow.queue_settings.conflict_rule)));
    start.push_attribute(("renaming_rule", renaming_rule_to_str(workflow.queue_settings.renaming_rule)));
    start.push_attribute(("renaming_parser", workflow.queue_settings.renaming_parser.as_str()));
    start.push_attribute(("raw_loading_rule", raw_loading_rule_to_str(workflow.queue_settings.raw_loading_rule)));
    start.push_attribute(("io_file_settings", io_json.as_str()));
    writer.write_event(Event::Start(start))?;

    for tool in &workflow.tools {
        write_tool(writer, tool)?;
    }

    writer.write_event(Event::End(BytesEnd::new("workflow")))?;
    Ok(())
}

fn write_tool(writer: &mut Writer<Cursor<Vec<u8>>>, tool: &ToolInstance) -> Result<(), WorkflowError> {
    let settings_json = serde_json::to_string(&tool.settings)?;

    let mut start = BytesStart::new("tool");
    start.push_attribute(("index", tool.index.to_string().as_str()));
    start.push_attribute(("version", tool.version.to_string().as_str()));
    start.push_attribute(("name", tool.name.as_str()));
    start.push_attribute(("group", group_to_str(tool.group)));
    writer.write_event(Event::Empty(start))?;
    // Settings travel as text content of a sibling element rather than an
    // attribute: a tool's settings JSON can be arbitrarily large (embedded
    // byte blobs), and XML attribute values are a poor fit for that.
    let mut settings_start = BytesStart::new("settings");
    settings_start.push_attribute(("for_index", tool.index.to_string().as_str()));
    writer.write_event(Event::Start(settings_start))?;
    writer.write_event(Event::Text(BytesText::new(&settings_json)))?;
    writer.write_event(Event::End(BytesEnd::new("settings")))?;

    Ok(())
}

/// Parses a workflow list document. Workflows referencing a tool absent
/// from `known_tools` (or present at an incompatible version) are
/// collected into the returned `failed` titles instead of the loaded set.
pub fn read_workflows(
    xml: &str,
    known_tools: &dyn Fn(ToolGroup, &str) -> Option<u32>,
) -> Result<(Vec<Workflow>, Vec<String>), WorkflowError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut loaded = Vec::new();
    let mut failed = Vec::new();

    let mut current: Option<Workflow> = None;
    let mut current_compatible = true;
    let mut pending_tool: Option<ToolInstance> = None;
    let mut settings_text = String::new();
    let mut reading_settings = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"workflow" => {
                let mut title = String::new();
                let mut description = String::new();
                let mut qs = QueueSettings::default();

                for attr in e.attributes() {
                    let attr = attr?;
                    let value = attr.unescape_value()?.into_owned();
                    match attr.key.as_ref() {
                        b"title" => title = value,
                        b"desc" => description = value,
                        b"use_multi_core_cpu" => qs.use_multi_core_cpu = value == "true",
                        b"save_as_new_version" => qs.save_as_new_version = value == "true",
                        b"exif_set_orientation" => qs.exif_set_orientation = value == "true",
                        b"use_org_album" => qs.use_org_album = value == "true",
                        b"conflict_rule" => qs.conflict_rule = conflict_rule_from_str(&value),
                        b"renaming_rule" => qs.renaming_rule = renaming_rule_from_str(&value),
                        b"renaming_parser" => qs.renaming_parser = value,
                        b"raw_loading_rule" => qs.raw_loading_rule = raw_loading_rule_from_str(&value),
                        b"io_file_settings" => {
                            qs.io_file_settings = serde_json::from_str::<IoFileSettings>(&value)
                                .unwrap_or_default();
                        }
                        _ => {}
                    }
                }

                current_compatible = true;
                current = Some(Workflow { title, description, queue_settings: qs, tools: Vec::new() });
            }
            Event::End(e) if e.name().as_ref() == b"workflow" => {
                if let Some(workflow) = current.take() {
                    if current_compatible {
                        loaded.push(workflow);
                    } else {
                        failed.push(workflow.title);
                    }
                }
            }
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"tool" => {
                let mut index = 0usize;
                let mut version = 0u32;
                let mut name = String::new();
                let mut group = ToolGroup::Convert;

                for attr in e.attributes() {
                    let attr = attr?;
                    let value = attr.unescape_value()?.into_owned();
                    match attr.key.as_ref() {
                        b"index" => index = value.parse().unwrap_or(0),
                        b"version" => version = value.parse().unwrap_or(0),
                        b"name" => name = value,
                        b"group" => group = group_from_str(&value),
                        _ => {}
                    }
                }

                if let Some(expected_version) = known_tools(group, &name) {
                    if version > expected_version {
                        current_compatible = false;
                    }
                } else {
                    current_compatible = false;
                }

                pending_tool = Some(ToolInstance { index, version, name, group, settings: ToolSettings::new() });
            }
            Event::Start(e) if e.name().as_ref() == b"settings" => {
                reading_settings = true;
                settings_text.clear();
            }
            Event::Text(e) if reading_settings => {
                let decoded = e.decode().map_err(quick_xml::Error::from)?;
                let unescaped = quick_xml::escape::unescape(&decoded).map_err(quick_xml::Error::from)?;
                settings_text.push_str(&unescaped);
            }
            Event::GeneralRef(e) if reading_settings => {
                let name = e.decode().map_err(quick_xml::Error::from)?;
                match quick_xml::escape::resolve_predefined_entity(&name) {
                    Some(resolved) => settings_text.push_str(resolved),
                    None => {
                        settings_text.push('&');
                        settings_text.push_str(&name);
                        settings_text.push(';');
                    }
                }
            }
            Event::End(e) if e.name().as_ref() == b"settings" => {
                reading_settings = false;
                if let Some(mut tool) = pending_tool.take() {
                    tool.settings = serde_json::from_str(&settings_text).unwrap_or_default();
                    if let Some(workflow) = current.as_mut() {
                        workflow.tools.push(tool);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok((loaded, failed))
}

fn bool_str(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

fn conflict_rule_to_str(rule: ConflictRule) -> &'static str {
    match rule {
        ConflictRule::Overwrite => "overwrite",
        ConflictRule::DiffName => "diff_name",
        ConflictRule::Skip => "skip",
    }
}

fn conflict_rule_from_str(s: &str) -> ConflictRule {
    match s {
        "overwrite" => ConflictRule::Overwrite,
        "skip" => ConflictRule::Skip,
        _ => ConflictRule::DiffName,
    }
}

fn renaming_rule_to_str(rule: RenamingRule) -> &'static str {
    match rule {
        RenamingRule::UseOriginal => "use_original",
        RenamingRule::Customize => "customize",
    }
}

fn renaming_rule_from_str(s: &str) -> RenamingRule {
    match s {
        "customize" => RenamingRule::Customize,
        _ => RenamingRule::UseOriginal,
    }
}

fn raw_loading_rule_to_str(rule: RawLoadingRule) -> &'static str {
    match rule {
        RawLoadingRule::UseEmbeddedJpeg => "use_embedded_jpeg",
        RawLoadingRule::Demosaicing => "demosaicing",
    }
}

fn raw_loading_rule_from_str(s: &str) -> RawLoadingRule {
    match s {
        "use_embedded_jpeg" => RawLoadingRule::UseEmbeddedJpeg,
        _ => RawLoadingRule::Demosaicing,
    }
}

fn group_to_str(group: ToolGroup) -> &'static str {
    match group {
        ToolGroup::Convert => "convert",
        ToolGroup::Transform => "transform",
        ToolGroup::Decorate => "decorate",
        ToolGroup::Filters => "filters",
        ToolGroup::Color => "color",
        ToolGroup::Enhance => "enhance",
        ToolGroup::Metadata => "metadata",
        ToolGroup::Custom => "custom",
    }
}

fn group_from_str(s: &str) -> ToolGroup {
    match s {
        "transform" => ToolGroup::Transform,
        "decorate" => ToolGroup::Decorate,
        "filters" => ToolGroup::Filters,
        "color" => ToolGroup::Color,
        "enhance" => ToolGroup::Enhance,
        "metadata" => ToolGroup::Metadata,
        "custom" => ToolGroup::Custom,
        _ => ToolGroup::Convert,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bqm_core::ToolDescriptor;

    fn sample_workflow() -> Workflow {
        let mut workflow = Workflow::new("Web export", "resize then convert", QueueSettings::default());
        let resize = ToolDescriptor {
            name: "Resize".to_string(),
            group: ToolGroup::Transform,
            version: 1,
            output_suffix: String::new(),
            in_place: false,
        };
        workflow.tools.push(ToolInstance::new(0, &resize, ToolSettings::new().with("width", 800i64)));
        workflow
    }

    #[test]
    fn round_trips_a_workflow_with_tools() {
        let workflows = vec![sample_workflow()];
        let xml = write_workflows(&workflows).unwrap();
        assert!(xml.contains("<workflowlist version=\"1\">"));

        let (loaded, failed) = read_workflows(&xml, &|_, name| if name == "Resize" { Some(1) } else { None }).unwrap();
        assert!(failed.is_empty());
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].title, "Web export");
        assert_eq!(loaded[0].tools.len(), 1);
        assert_eq!(loaded[0].tools[0].settings.get("width").unwrap().as_int(), Some(800));
    }

    #[test]
    fn unknown_tool_marks_workflow_as_failed() {
        let workflows = vec![sample_workflow()];
        let xml = write_workflows(&workflows).unwrap();

        let (loaded, failed) = read_workflows(&xml, &|_, _| None).unwrap();
        assert!(loaded.is_empty());
        assert_eq!(failed, vec!["Web export".to_string()]);
    }

    #[test]
    fn stored_version_newer_than_known_marks_workflow_as_failed() {
        let workflows = vec![sample_workflow()];
        let xml = write_workflows(&workflows).unwrap();

        // Stored tool is version 1; the running registry only knows version
        // 0 of "Resize", i.e. the workflow is newer than what can run it.
        let (loaded, failed) = read_workflows(&xml, &|_, name| if name == "Resize" { Some(0) } else { None }).unwrap();
        assert!(loaded.is_empty());
        assert_eq!(failed, vec!["Web export".to_string()]);
    }

    #[test]
    fn stored_version_older_than_known_still_loads() {
        let workflows = vec![sample_workflow()];
        let xml = write_workflows(&workflows).unwrap();

        // Stored tool is version 1; the running registry knows a newer
        // version 2 of "Resize". An older stored version is still
        // compatible, only a stored version newer than known fails.
        let (loaded, failed) = read_workflows(&xml, &|_, name| if name == "Resize" { Some(2) } else { None }).unwrap();
        assert!(failed.is_empty());
        assert_eq!(loaded.len(), 1);
    }
}
