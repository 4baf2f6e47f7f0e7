//! Literal values carried by the entry stream.
//!
//! The metadata schema is fixed and shallow: scalar strings, arrays of
//! scalars, and one level of objects (dependency and OS-support records).
//! Objects keep their member order so that in-place rewrites preserve the
//! author's layout.

/// A parsed literal from either syntax.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// JSON `null`; reads as an absent value.
    Null,
    String(String),
    Array(Vec<Value>),
    /// Order-preserving object; keys are unique.
    Object(Vec<(String, Value)>),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Object member lookup; `None` for non-objects and missing keys.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(fields) => fields.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Replaces, inserts, or (with `None`) removes an object member,
    /// keeping existing member order. No-op on non-objects.
    pub fn set_field(&mut self, key: &str, value: Option<Value>) {
        if let Value::Object(fields) = self {
            match (fields.iter().position(|(k, _)| k == key), value) {
                (Some(idx), Some(v)) => fields[idx].1 = v,
                (Some(idx), None) => {
                    fields.remove(idx);
                }
                (None, Some(v)) => fields.push((key.to_string(), v)),
                (None, None) => {}
            }
        }
    }

    /// The strings of an array value, skipping non-string elements.
    pub fn strings(&self) -> Vec<String> {
        match self {
            Value::Array(items) => items
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_field_ops() {
        let mut v = Value::Object(vec![
            ("name".into(), Value::string("a/b")),
            ("version_requirement".into(), Value::string(">=1.0.0")),
        ]);
        v.set_field("name", Some(Value::string("a/c")));
        assert_eq!(v.get("name").and_then(Value::as_str), Some("a/c"));

        v.set_field("version_requirement", None);
        assert_eq!(v.get("version_requirement"), None);

        v.set_field("version_requirement", Some(Value::string(">=2.0.0")));
        // Re-added keys go last; original order for the rest is kept.
        if let Value::Object(fields) = &v {
            assert_eq!(fields[0].0, "name");
            assert_eq!(fields[1].0, "version_requirement");
        }
    }

    #[test]
    fn test_strings_skips_non_strings() {
        let v = Value::Array(vec![
            Value::string("6"),
            Value::Object(vec![]),
            Value::string("7"),
        ]);
        assert_eq!(v.strings(), vec!["6", "7"]);
    }
}
