//! In-progress Terraform JSON document

use crate::error::{JsonError, Result};
use crate::fragment::Fragment;
use crate::merge::{kind, merge_map};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::path::Path;

const INDENT: &[u8] = b"    ";

/// Accumulates fragments into one configuration document
///
/// Keys are kept sorted, so rendering the same set of fragments always
/// produces the same text regardless of merge order.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Value,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to an empty object
    pub fn clear(&mut self) {
        self.root = Value::Object(Map::new());
    }

    pub fn is_empty(&self) -> bool {
        self.root.as_object().is_none_or(Map::is_empty)
    }

    /// Merge `fragment` on top of the current state
    pub fn merge_in(&mut self, fragment: Fragment) {
        if let Value::Object(map) = fragment.into_value() {
            self.merge_map(map);
        }
    }

    /// Merge an arbitrary document on top of the current state
    ///
    /// Unlike [`Fragment`], the top-level keys are not checked; only the
    /// root must be an object.
    pub fn merge_value(&mut self, value: Value) -> Result<()> {
        match value {
            Value::Object(map) => {
                self.merge_map(map);
                Ok(())
            }
            other => Err(JsonError::invalid(format!(
                "cannot merge a {} into a configuration document",
                kind(&other)
            ))),
        }
    }

    fn merge_map(&mut self, map: Map<String, Value>) {
        if let Value::Object(root) = &mut self.root {
            merge_map(root, map);
        }
    }

    /// Read-only view of the current state
    pub fn current(&self) -> &Value {
        &self.root
    }

    /// Render as JSON with four-space indentation and a trailing newline
    pub fn render(&self) -> Result<String> {
        let mut buf = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
        self.root.serialize(&mut serializer)?;
        buf.push(b'\n');

        into_text(buf)
    }

    /// Render and write to `path`, replacing any existing file
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let content = self.render()?;
        std::fs::write(path, content).map_err(|source| JsonError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!("Wrote configuration document to {}", path.display());
        Ok(())
    }
}

fn into_text(buf: Vec<u8>) -> Result<String> {
    String::from_utf8(buf).map_err(|e| {
        JsonError::Serialization(serde_json::Error::io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e,
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment;
    use serde_json::json;

    #[test]
    fn test_clear_is_idempotent() {
        let mut doc = Document::new();
        doc.merge_in(fragment::provider("aws", json!({"region": "us-east-1"})).unwrap());

        doc.clear();
        doc.clear();
        assert_eq!(doc, Document::new());
        assert!(doc.is_empty());
    }

    #[test]
    fn test_same_identity_merges_properties() {
        let mut doc = Document::new();
        doc.merge_in(fragment::resource("vm", "web", json!({"size": "small", "zone": "a"})).unwrap());
        doc.merge_in(fragment::resource("vm", "web", json!({"size": "large"})).unwrap());

        assert_eq!(
            doc.current(),
            &json!({"resource": {"vm": {"web": {"size": "large", "zone": "a"}}}})
        );
    }

    #[test]
    fn test_bucket_scenario() {
        let mut doc = Document::new();
        doc.merge_in(fragment::resource("bucket", "data", json!({"region": "us-east-1"})).unwrap());
        doc.merge_in(fragment::output("bucket_name", json!({"value": "${bucket.data.name}"})).unwrap());

        let rendered: Value = serde_json::from_str(&doc.render().unwrap()).unwrap();
        assert_eq!(
            rendered,
            json!({
                "resource": {"bucket": {"data": {"region": "us-east-1"}}},
                "output": {"bucket_name": {"value": "${bucket.data.name}"}}
            })
        );
    }

    #[test]
    fn test_render_round_trip() {
        let fragment = fragment::required_provider(
            "kubernetes",
            json!({"source": "hashicorp/kubernetes", "version": "2.7.1", "flags": [1, 2.5, null]}),
        )
        .unwrap();

        let mut doc = Document::new();
        doc.merge_in(fragment.clone());

        let parsed: Value = serde_json::from_str(&doc.render().unwrap()).unwrap();
        assert_eq!(&parsed, fragment.as_value());
    }

    #[test]
    fn test_render_format() {
        let mut doc = Document::new();
        doc.merge_in(fragment::variable("b", json!({"type": "string"})).unwrap());
        doc.merge_in(fragment::output("a", json!({"value": 1})).unwrap());

        let expected = "{\n    \"output\": {\n        \"a\": {\n            \"value\": 1\n        }\n    },\n    \"variable\": {\n        \"b\": {\n            \"type\": \"string\"\n        }\n    }\n}\n";
        assert_eq!(doc.render().unwrap(), expected);
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(Document::new().render().unwrap(), "{}\n");
    }

    #[test]
    fn test_merge_value_rejects_non_object() {
        let mut doc = Document::new();
        let err = doc.merge_value(json!(42)).unwrap_err();
        assert!(matches!(err, JsonError::InvalidFragment(_)));
        assert!(doc.is_empty());
    }

    #[test]
    fn test_write_to_unwritable_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("missing").join("main.tf.json");

        let err = Document::new().write_to(&path).unwrap_err();
        assert!(matches!(err, JsonError::Write { .. }));
        assert!(err.is_serialization());
    }

    #[test]
    fn test_non_utf8_render_output_is_serialization_error() {
        let err = into_text(vec![b'{', 0xff, b'}']).unwrap_err();
        assert!(matches!(err, JsonError::Serialization(_)));
        assert!(err.is_serialization());

        assert_eq!(into_text(b"{}\n".to_vec()).unwrap(), "{}\n");
    }
}
