//! Terraform JSON fragment builders
//!
//! Each builder is a pure function returning one [`Fragment`]. Nothing is
//! registered anywhere; callers merge fragments into a
//! [`Session`](crate::Session) or [`Document`](crate::Document) explicitly.

use crate::error::{JsonError, Result};
use crate::merge::kind;
use serde::Serialize;
use serde_json::{Map, Value};

/// Top-level keys a Terraform JSON configuration may contain
pub const ROOT_KEYS: &[&str] = &["terraform", "provider", "variable", "data", "resource", "output"];

/// A single configuration contribution rooted at one of [`ROOT_KEYS`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Fragment(Value);

impl Fragment {
    /// The fragment as a JSON value
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Top-level keys present in this fragment
    pub fn roots(&self) -> impl Iterator<Item = &str> {
        self.0
            .as_object()
            .into_iter()
            .flat_map(|map| map.keys().map(String::as_str))
    }
}

impl TryFrom<Value> for Fragment {
    type Error = JsonError;

    fn try_from(value: Value) -> Result<Self> {
        let Value::Object(map) = &value else {
            return Err(JsonError::invalid(format!(
                "fragment root must be an object, found {}",
                kind(&value)
            )));
        };

        if let Some(unknown) = map.keys().find(|k| !ROOT_KEYS.contains(&k.as_str())) {
            return Err(JsonError::invalid(format!(
                "unknown top-level key '{}' (expected one of: {})",
                unknown,
                ROOT_KEYS.join(", ")
            )));
        }

        Ok(Fragment(value))
    }
}

impl From<Fragment> for Value {
    fn from(fragment: Fragment) -> Self {
        fragment.0
    }
}

/// `terraform.<properties>`
pub fn terraform(properties: Value) -> Result<Fragment> {
    let properties = into_properties(properties)?;
    Ok(Fragment(nest(&["terraform"], properties)))
}

/// `terraform.required_providers.<name>.<properties>`
pub fn required_provider(name: &str, properties: Value) -> Result<Fragment> {
    let properties = into_properties(properties)?;
    Ok(Fragment(nest(
        &["terraform", "required_providers", name],
        properties,
    )))
}

/// `provider.<name>.<properties>`
pub fn provider(name: &str, properties: Value) -> Result<Fragment> {
    let properties = into_properties(properties)?;
    Ok(Fragment(nest(&["provider", name], properties)))
}

/// `terraform.backend.<name>.<properties>`
pub fn backend(name: &str, properties: Value) -> Result<Fragment> {
    let properties = into_properties(properties)?;
    Ok(Fragment(nest(&["terraform", "backend", name], properties)))
}

/// `variable.<name>.<properties>`
pub fn variable(name: &str, properties: Value) -> Result<Fragment> {
    let properties = into_properties(properties)?;
    Ok(Fragment(nest(&["variable", name], properties)))
}

/// `data.<resource_type>.<name>.<properties>`
pub fn data(resource_type: &str, name: &str, properties: Value) -> Result<Fragment> {
    let properties = into_properties(properties)?;
    Ok(Fragment(nest(&["data", resource_type, name], properties)))
}

/// `resource.<resource_type>.<name>.<properties>`
pub fn resource(resource_type: &str, name: &str, properties: Value) -> Result<Fragment> {
    let properties = into_properties(properties)?;
    Ok(Fragment(nest(&["resource", resource_type, name], properties)))
}

/// `output.<name>.<properties>`
pub fn output(name: &str, properties: Value) -> Result<Fragment> {
    let properties = into_properties(properties)?;
    Ok(Fragment(nest(&["output", name], properties)))
}

/// Properties must be an object; `null` stands for "no properties".
fn into_properties(properties: Value) -> Result<Map<String, Value>> {
    match properties {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(JsonError::invalid(format!(
            "properties must be an object, found {}",
            kind(&other)
        ))),
    }
}

/// Wrap `leaf` in one single-key object per path segment, innermost last.
fn nest(path: &[&str], leaf: Map<String, Value>) -> Value {
    path.iter().rev().fold(Value::Object(leaf), |inner, key| {
        let mut map = Map::new();
        map.insert((*key).to_string(), inner);
        Value::Object(map)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_paths() {
        let cases = [
            (
                terraform(json!({"required_version": ">= 1.0"})).unwrap(),
                json!({"terraform": {"required_version": ">= 1.0"}}),
            ),
            (
                required_provider("aws", json!({"source": "hashicorp/aws"})).unwrap(),
                json!({"terraform": {"required_providers": {"aws": {"source": "hashicorp/aws"}}}}),
            ),
            (
                provider("aws", json!({"region": "us-east-1"})).unwrap(),
                json!({"provider": {"aws": {"region": "us-east-1"}}}),
            ),
            (
                backend("s3", json!({"bucket": "state"})).unwrap(),
                json!({"terraform": {"backend": {"s3": {"bucket": "state"}}}}),
            ),
            (
                variable("region", json!({"type": "string"})).unwrap(),
                json!({"variable": {"region": {"type": "string"}}}),
            ),
            (
                data("aws_ami", "ubuntu", json!({"most_recent": true})).unwrap(),
                json!({"data": {"aws_ami": {"ubuntu": {"most_recent": true}}}}),
            ),
            (
                resource("bucket", "data", json!({"region": "us-east-1"})).unwrap(),
                json!({"resource": {"bucket": {"data": {"region": "us-east-1"}}}}),
            ),
            (
                output("bucket_name", json!({"value": "${bucket.data.name}"})).unwrap(),
                json!({"output": {"bucket_name": {"value": "${bucket.data.name}"}}}),
            ),
        ];

        for (fragment, expected) in cases {
            assert_eq!(fragment.as_value(), &expected);
        }
    }

    #[test]
    fn test_null_properties_are_empty() {
        let fragment = variable("cluster_name", Value::Null).unwrap();
        assert_eq!(fragment.into_value(), json!({"variable": {"cluster_name": {}}}));
    }

    #[test]
    fn test_non_object_properties_rejected() {
        let err = resource("bucket", "data", json!(["us-east-1"])).unwrap_err();
        assert!(matches!(err, JsonError::InvalidFragment(_)));
    }

    #[test]
    fn test_try_from_validates_root() {
        assert!(Fragment::try_from(json!({"output": {"x": {"value": 1}}})).is_ok());
        assert!(Fragment::try_from(json!("resource")).is_err());

        let err = Fragment::try_from(json!({"module": {}})).unwrap_err();
        assert!(err.to_string().contains("unknown top-level key 'module'"));
    }

    #[test]
    fn test_roots() {
        let fragment = backend("local", json!({"path": "terraform.tfstate"})).unwrap();
        assert_eq!(fragment.roots().collect::<Vec<_>>(), vec!["terraform"]);
    }
}
