//! Destination path resolution: combines `Assignment::target_suffix` with
//! the queue's renaming rule and conflict policy to produce the final path
//! a `Task` should write to.

use std::path::{Path, PathBuf};

use bqm_core::{Assignment, ConflictRule, FileOps, RenamingRule};
use bqm_registry::ToolRegistry;

/// Outcome of resolving a destination: the path to write to, plus whether
/// a conflict forced a renamed or overwritten target (used for a
/// human-readable result message).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationResolution {
    /// No existing file at the computed path; write there directly.
    Clear(PathBuf),
    /// The computed path already existed; this is the resolved
    /// replacement.
    Overwrite(PathBuf),
    /// The computed path already existed; this is the discriminated
    /// alternate name chosen instead.
    Renamed(PathBuf),
    /// The computed path already existed and the conflict rule says to
    /// leave it alone; nothing should be written.
    Skip,
}

/// Applies the queue's renaming parser to an assignment's base file name.
/// Supports the `{basename}` and `{index}` tokens; an empty or
/// token-less pattern (or `RenamingRule::UseOriginal`) falls back to the
/// assignment's own `dest_file_name` unchanged.
pub fn apply_renaming_rule(assignment: &Assignment, rule: RenamingRule, pattern: &str, index: usize) -> String {
    match rule {
        RenamingRule::UseOriginal => assignment.dest_file_name.clone(),
        RenamingRule::Customize => {
            if pattern.is_empty() {
                assignment.dest_file_name.clone()
            } else {
                pattern
                    .replace("{basename}", &assignment.dest_file_name)
                    .replace("{index}", &index.to_string())
            }
        }
    }
}

/// Computes the final destination path and applies the conflict policy:
/// resolve `dest` from the working directory and the assignment's
/// destination file name, then branch on whether `dest` already exists.
pub fn resolve_destination(
    assignment: &Assignment,
    working_dir: &Path,
    registry: &ToolRegistry,
    renaming_rule: RenamingRule,
    renaming_pattern: &str,
    conflict_rule: ConflictRule,
    index: usize,
    file_ops: &dyn FileOps,
) -> DestinationResolution {
    let base_name = apply_renaming_rule(assignment, renaming_rule, renaming_pattern, index);
    let (suffix, ext_set) = assignment.target_suffix(|instance| registry.output_suffix_for(instance));

    let file_name = if ext_set && !suffix.is_empty() {
        format!("{base_name}.{suffix}")
    } else {
        base_name
    };
    let dest = working_dir.join(file_name);

    if !dest.exists() {
        return DestinationResolution::Clear(dest);
    }

    match conflict_rule {
        ConflictRule::Overwrite => DestinationResolution::Overwrite(dest),
        ConflictRule::DiffName => DestinationResolution::Renamed(file_ops.unique_file_url(&dest)),
        ConflictRule::Skip => DestinationResolution::Skip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bqm_core::{DefaultFileOps, ToolInstance};
    use tempfile::tempdir;

    fn assignment_with_no_tools(dest_name: &str) -> Assignment {
        Assignment::new("/photos/source.png", dest_name)
    }

    #[test]
    fn clear_path_when_no_conflict() {
        let dir = tempdir().unwrap();
        let registry = bqm_registry::default_registry();
        let assignment = assignment_with_no_tools("result");

        let resolution = resolve_destination(
            &assignment,
            dir.path(),
            &registry,
            RenamingRule::UseOriginal,
            "",
            ConflictRule::DiffName,
            0,
            &DefaultFileOps,
        );

        match resolution {
            DestinationResolution::Clear(path) => {
                assert_eq!(path.file_name().unwrap().to_str().unwrap(), "result.png");
            }
            other => panic!("expected Clear, got {other:?}"),
        }
    }

    #[test]
    fn diffname_rule_renames_on_conflict() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("result.png"), b"existing").unwrap();
        let registry = bqm_registry::default_registry();
        let assignment = assignment_with_no_tools("result");

        let resolution = resolve_destination(
            &assignment,
            dir.path(),
            &registry,
            RenamingRule::UseOriginal,
            "",
            ConflictRule::DiffName,
            0,
            &DefaultFileOps,
        );

        assert!(matches!(resolution, DestinationResolution::Renamed(_)));
    }

    #[test]
    fn skip_rule_leaves_existing_file_alone() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("result.png"), b"existing").unwrap();
        let registry = bqm_registry::default_registry();
        let assignment = assignment_with_no_tools("result");

        let resolution = resolve_destination(
            &assignment,
            dir.path(),
            &registry,
            RenamingRule::UseOriginal,
            "",
            ConflictRule::Skip,
            0,
            &DefaultFileOps,
        );

        assert_eq!(resolution, DestinationResolution::Skip);
    }

    #[test]
    fn customize_rule_substitutes_tokens() {
        let assignment = assignment_with_no_tools("result");
        let renamed = apply_renaming_rule(&assignment, RenamingRule::Customize, "{basename}_{index}", 3);
        assert_eq!(renamed, "result_3");
    }

    #[test]
    fn last_tool_suffix_wins_over_original_extension() {
        let dir = tempdir().unwrap();
        let registry = bqm_registry::default_registry();
        let mut assignment = assignment_with_no_tools("result");
        let descriptor = registry.descriptor(bqm_core::ToolGroup::Convert, "Convert").unwrap();
        assignment.push_tool(ToolInstance::new(0, &descriptor, bqm_core::ToolSettings::new().with("format", "webp")));

        let resolution = resolve_destination(
            &assignment,
            dir.path(),
            &registry,
            RenamingRule::UseOriginal,
            "",
            ConflictRule::DiffName,
            0,
            &DefaultFileOps,
        );

        match resolution {
            DestinationResolution::Clear(path) => {
                assert_eq!(path.file_name().unwrap().to_str().unwrap(), "result.webp");
            }
            other => panic!("expected Clear, got {other:?}"),
        }
    }
}
