//! `ToolRegistry`: a process-wide catalog of available tools, grouped by
//! `(group, name)`. A read-mostly registry guarded by a single lock, with
//! registration happening once at startup and lookups happening
//! continuously from worker threads.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use bqm_core::{ToolDescriptor, ToolGroup, ToolInstance};

use crate::error::RegistryError;
use crate::tool_trait::Tool;

type Key = (ToolGroup, String);

#[derive(Default)]
struct Inner {
    tools: HashMap<Key, Arc<dyn Tool>>,
    hidden: HashSet<Key>,
}

/// The tool catalog. Cheap to clone (`Arc`-backed internally is not
/// necessary since callers hold a `ToolRegistry` behind their own `Arc`),
/// but intentionally `Send + Sync` so a `WorkerPool` can share one instance
/// across rayon threads.
#[derive(Default)]
pub struct ToolRegistry {
    inner: RwLock<Inner>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool under its own `(group, name)`. Fails if a tool is
    /// already registered at that key.
    pub fn register(&self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let key = (tool.group(), tool.name().to_string());
        let mut inner = self.inner.write().expect("tool registry lock poisoned");
        if inner.tools.contains_key(&key) {
            return Err(RegistryError::AlreadyRegistered { group: key.0, name: key.1 });
        }
        tracing::info!(group = ?key.0, name = %key.1, "registered batch tool");
        inner.tools.insert(key, tool);
        Ok(())
    }

    pub fn find(&self, group: ToolGroup, name: &str) -> Result<Arc<dyn Tool>, RegistryError> {
        let inner = self.inner.read().expect("tool registry lock poisoned");
        inner
            .tools
            .get(&(group, name.to_string()))
            .cloned()
            .ok_or_else(|| RegistryError::NotFound { group, name: name.to_string() })
    }

    pub fn find_for_instance(&self, instance: &ToolInstance) -> Result<Arc<dyn Tool>, RegistryError> {
        self.find(instance.group, &instance.name)
    }

    pub fn descriptor(&self, group: ToolGroup, name: &str) -> Result<ToolDescriptor, RegistryError> {
        let tool = self.find(group, name)?;
        Ok(ToolDescriptor {
            name: tool.name().to_string(),
            group: tool.group(),
            version: tool.version(),
            output_suffix: tool.output_suffix(&tool.default_settings()),
            in_place: tool.recognized_keys().is_empty() && tool.output_suffix(&tool.default_settings()).is_empty(),
        })
    }

    /// Resolves the output suffix a placed tool instance will write, given
    /// its own settings. Used as the lookup closure for
    /// `Assignment::target_suffix`.
    pub fn output_suffix_for(&self, instance: &ToolInstance) -> Option<String> {
        self.find_for_instance(instance).ok().map(|tool| tool.output_suffix(&instance.settings))
    }

    pub fn tools_in_group(&self, group: ToolGroup) -> Vec<ToolDescriptor> {
        let inner = self.inner.read().expect("tool registry lock poisoned");
        let mut descriptors: Vec<ToolDescriptor> = inner
            .tools
            .iter()
            .filter(|((g, _), _)| *g == group)
            .map(|((_, name), tool)| ToolDescriptor {
                name: name.clone(),
                group: tool.group(),
                version: tool.version(),
                output_suffix: tool.output_suffix(&tool.default_settings()),
                in_place: tool.recognized_keys().is_empty(),
            })
            .collect();
        descriptors.sort_by_key(|d| (d.group, d.name.clone()));
        descriptors
    }

    pub fn set_visible(&self, group: ToolGroup, name: &str, visible: bool) {
        let key = (group, name.to_string());
        let mut inner = self.inner.write().expect("tool registry lock poisoned");
        if visible {
            inner.hidden.remove(&key);
        } else {
            inner.hidden.insert(key);
        }
    }

    /// Every visible tool, sorted by group then name so UIs get a stable
    /// listing across calls. Does not gate `find`, which always resolves
    /// hidden tools too, since visibility is a UI concern only.
    pub fn list(&self) -> Vec<ToolDescriptor> {
        let inner = self.inner.read().expect("tool registry lock poisoned");
        let mut descriptors: Vec<ToolDescriptor> = inner
            .tools
            .iter()
            .filter(|(key, _)| !inner.hidden.contains(key))
            .map(|((_, name), tool)| ToolDescriptor {
                name: name.clone(),
                group: tool.group(),
                version: tool.version(),
                output_suffix: tool.output_suffix(&tool.default_settings()),
                in_place: tool.recognized_keys().is_empty(),
            })
            .collect();
        descriptors.sort_by_key(|d| (d.group, d.name.clone()));
        descriptors
    }
}

/// Builds a registry pre-populated with the built-in tools shipped by this
/// crate. Hosts that want a bare registry to register their own tools into
/// can use `ToolRegistry::new()` instead.
pub fn default_registry() -> ToolRegistry {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(crate::tools::convert::Convert)).expect("built-in tool registration");
    registry.register(Arc::new(crate::tools::transform::Resize)).expect("built-in tool registration");
    registry.register(Arc::new(crate::tools::metadata::TimeAdjust)).expect("built-in tool registration");
    registry.register(Arc::new(crate::tools::custom::ScriptHook)).expect("built-in tool registration");
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_resolves_every_built_in() {
        let registry = default_registry();
        assert!(registry.find(ToolGroup::Convert, "Convert").is_ok());
        assert!(registry.find(ToolGroup::Transform, "Resize").is_ok());
        assert!(registry.find(ToolGroup::Metadata, "TimeAdjust").is_ok());
        assert!(registry.find(ToolGroup::Custom, "ScriptHook").is_ok());
    }

    #[test]
    fn registering_same_key_twice_fails() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(crate::tools::convert::Convert)).unwrap();
        let err = registry.register(Arc::new(crate::tools::convert::Convert)).unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyRegistered { .. }));
    }

    #[test]
    fn hiding_a_tool_excludes_it_from_list_but_not_find() {
        let registry = default_registry();
        registry.set_visible(ToolGroup::Convert, "Convert", false);

        assert!(registry.find(ToolGroup::Convert, "Convert").is_ok());
        assert!(!registry
            .list()
            .iter()
            .any(|d| d.group == ToolGroup::Convert && d.name == "Convert"));
    }

    #[test]
    fn list_is_sorted_by_group_then_name() {
        let registry = default_registry();
        let names = registry.list();
        let mut sorted = names.clone();
        sorted.sort_by_key(|d| (d.group, d.name.clone()));
        let actual: Vec<_> = names.iter().map(|d| (d.group, d.name.clone())).collect();
        let expected: Vec<_> = sorted.iter().map(|d| (d.group, d.name.clone())).collect();
        assert_eq!(actual, expected);
    }
}
