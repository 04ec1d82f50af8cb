//! Typed settings values for tool instances.
//!
//! Settings are a tagged-variant map rather than a plain `serde_json::Value`
//! so that a tool's `recognized_keys()` can describe a schema without the
//! container itself enforcing one: unknown keys round-trip unchanged because
//! `ToolSettings` never validates keys on insert, only on `apply()`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single settings value. Mirrors the option types a batch tool can
/// declare: booleans, integers, floats, strings, raw byte blobs (e.g. an
/// embedded ICC profile), and nested maps for grouped options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ToolValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    #[serde(with = "base64_bytes")]
    Bytes(Vec<u8>),
    Map(BTreeMap<String, ToolValue>),
}

impl ToolValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ToolValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ToolValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ToolValue::Float(f) => Some(*f),
            ToolValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ToolValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ToolValue::Bytes(b) => Some(b.as_slice()),
            _ => None,
        }
    }
}

impl From<bool> for ToolValue {
    fn from(v: bool) -> Self {
        ToolValue::Bool(v)
    }
}

impl From<i64> for ToolValue {
    fn from(v: i64) -> Self {
        ToolValue::Int(v)
    }
}

impl From<f64> for ToolValue {
    fn from(v: f64) -> Self {
        ToolValue::Float(v)
    }
}

impl From<&str> for ToolValue {
    fn from(v: &str) -> Self {
        ToolValue::Str(v.to_string())
    }
}

impl From<String> for ToolValue {
    fn from(v: String) -> Self {
        ToolValue::Str(v)
    }
}

mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(d)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// A cloneable, equality-comparable map of option name to typed value.
///
/// Settings round-trip unknown keys unchanged: nothing in this type drops
/// or rejects an entry it doesn't recognize, since schema validation is a
/// per-tool concern (see `Tool::recognized_keys` in `bqm-registry`), not a
/// container-level one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings(pub BTreeMap<String, ToolValue>);

impl ToolSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&ToolValue> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ToolValue>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ToolValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<(String, ToolValue)> for ToolSettings {
    fn from_iter<T: IntoIterator<Item = (String, ToolValue)>>(iter: T) -> Self {
        ToolSettings(iter.into_iter().collect())
    }
}
