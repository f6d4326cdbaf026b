// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Typed model parameters stored in the `model_parameters` metadata block.
//!
//! The block is a JSON object of scalar or string-list values:
//!
//! ```json
//! {
//!   "name": "keyword_spotting",
//!   "version": 3,
//!   "runtime_memory_size": 18432,
//!   "classes": ["yes", "no", "_unknown_"],
//!   "average_window_duration_ms": 1000.0
//! }
//! ```
//!
//! Well-known keys read by the runtime: `name`, `version`, `date`, `hash`,
//! `classes` and `runtime_memory_size` (the arena size hint).

use crate::{FlatModel, FormatError};
use std::collections::BTreeMap;
use std::fmt;

/// Metadata tag of the parameter block.
pub const PARAMETERS_TAG: &str = "model_parameters";

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    StrList(Vec<String>),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Str(v) => f.write_str(v),
            ParamValue::StrList(v) => f.write_str(&v.join(", ")),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v.into())
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        ParamValue::Int(v.into())
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(v: Vec<String>) -> Self {
        ParamValue::StrList(v)
    }
}

impl From<&[&str]> for ParamValue {
    fn from(v: &[&str]) -> Self {
        ParamValue::StrList(v.iter().map(|s| s.to_string()).collect())
    }
}

/// Key/value parameters attached to a model.
///
/// Lookups are typed: asking for a value under the wrong type returns `None`
/// rather than coercing, with the single exception that integers are
/// readable as floats.
///
/// # Example
/// ```
/// use model_format::ModelParameters;
///
/// let mut p = ModelParameters::new();
/// p.insert("runtime_memory_size", 20480u32);
/// p.insert("classes", &["on", "off"][..]);
/// assert_eq!(p.get_u32("runtime_memory_size"), Some(20480));
/// assert_eq!(p.get_str("runtime_memory_size"), None);
/// assert_eq!(p.get_str_list("classes").map(|c| c.len()), Some(2));
/// ```
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ModelParameters {
    values: BTreeMap<String, ParamValue>,
}

impl ModelParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the parameter block of a parsed model.
    pub fn from_model(model: &FlatModel<'_>) -> Result<Self, FormatError> {
        let bytes = model
            .find_metadata(PARAMETERS_TAG)
            .ok_or_else(|| FormatError::MetadataNotFound(PARAMETERS_TAG.into()))?;
        Self::from_bytes(bytes)
    }

    /// Decodes a parameter block.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        serde_json::from_slice(bytes).map_err(|e| FormatError::InvalidParameters(e.to_string()))
    }

    /// Encodes the parameters as a metadata block.
    pub fn to_bytes(&self) -> Result<Vec<u8>, FormatError> {
        serde_json::to_vec(self).map_err(|e| FormatError::InvalidParameters(e.to_string()))
    }

    pub fn insert(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns an integer parameter that fits in a `u32`.
    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.get_i64(key).and_then(|v| u32::try_from(v).ok())
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            ParamValue::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_str_list(&self, key: &str) -> Option<&[String]> {
        match self.get(key)? {
            ParamValue::StrList(v) => Some(v),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModelBuilder;

    #[test]
    fn test_typed_json_decoding() {
        let json = br#"{
            "flag": true,
            "count": 12,
            "ratio": 0.25,
            "name": "kws",
            "classes": ["a", "b"]
        }"#;
        let p = ModelParameters::from_bytes(json).unwrap();
        assert_eq!(p.get_bool("flag"), Some(true));
        assert_eq!(p.get_i64("count"), Some(12));
        assert_eq!(p.get_f64("count"), Some(12.0));
        assert_eq!(p.get_f64("ratio"), Some(0.25));
        assert_eq!(p.get_i64("ratio"), None);
        assert_eq!(p.get_str("name"), Some("kws"));
        assert_eq!(p.get_str_list("classes").unwrap(), &["a".to_string(), "b".to_string()]);
        assert_eq!(p.len(), 5);
    }

    #[test]
    fn test_u32_range() {
        let mut p = ModelParameters::new();
        p.insert("neg", -1i64);
        p.insert("big", 1i64 << 40);
        assert_eq!(p.get_u32("neg"), None);
        assert_eq!(p.get_u32("big"), None);
    }

    #[test]
    fn test_invalid_block() {
        assert!(matches!(
            ModelParameters::from_bytes(b"[1, 2"),
            Err(FormatError::InvalidParameters(_))
        ));
        assert!(ModelParameters::from_bytes(br#"{"nested": {"a": 1}}"#).is_err());
    }

    #[test]
    fn test_from_model() {
        let mut p = ModelParameters::new();
        p.insert("name", "demo");
        p.insert("runtime_memory_size", 4096u32);

        let mut b = ModelBuilder::new();
        b.set_parameters(&p).unwrap();
        let blob = b.to_bytes().unwrap();
        let model = FlatModel::parse(&blob).unwrap();
        assert_eq!(ModelParameters::from_model(&model).unwrap(), p);
    }

    #[test]
    fn test_from_model_without_block() {
        let blob = ModelBuilder::new().to_bytes().unwrap();
        let model = FlatModel::parse(&blob).unwrap();
        assert!(matches!(
            ModelParameters::from_model(&model),
            Err(FormatError::MetadataNotFound(_))
        ));
    }

    #[test]
    fn test_clear() {
        let mut p = ModelParameters::new();
        p.insert("x", true);
        p.clear();
        assert!(p.is_empty());
        assert_eq!(p.get_bool("x"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(ParamValue::from(&["a", "b"][..]).to_string(), "a, b");
        assert_eq!(ParamValue::from(3i32).to_string(), "3");
    }
}
