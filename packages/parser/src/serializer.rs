//! Value serializers: model values back to literal source text.
//!
//! One implementation per concrete syntax. Each is the exact inverse of
//! the literal extraction its front end performs, so a serialize/reparse
//! round trip yields the same value.

use crate::calls::SourceSyntax;
use crate::value::Value;

pub trait ValueSerializer {
    /// Literal source text for `value`. Objects come out multi-line with a
    /// two-space inner indent; everything else is a single line.
    fn serialize(&self, value: &Value) -> String;

    /// Like [`serialize`](Self::serialize), but given the literal text the
    /// value replaces. Syntaxes with more than one string form use it to
    /// keep the form the author chose.
    fn serialize_like(&self, value: &Value, _existing: &str) -> String {
        self.serialize(value)
    }

    /// Multi-line variant for insertion at a known column: `indent` spaces
    /// are appended after every newline of the base form.
    fn serialize_indented(&self, value: &Value, indent: usize) -> String {
        let flat = self.serialize(value);
        if !flat.contains('\n') {
            return flat;
        }
        let pad = " ".repeat(indent);
        let mut out = String::with_capacity(flat.len() + indent * 4);
        for c in flat.chars() {
            out.push(c);
            if c == '\n' {
                out.push_str(&pad);
            }
        }
        out
    }
}

/// Serializer for metadata.json literals.
pub struct JsonSerializer;

impl ValueSerializer for JsonSerializer {
    fn serialize(&self, value: &Value) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::String(s) => json_quote(s),
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().map(|v| self.serialize(v)).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Object(fields) => {
                if fields.is_empty() {
                    return "{}".to_string();
                }
                let mut out = String::from("{");
                for (idx, (key, value)) in fields.iter().enumerate() {
                    if idx > 0 {
                        out.push(',');
                    }
                    out.push_str("\n  ");
                    out.push_str(&json_quote(key));
                    out.push_str(": ");
                    out.push_str(&self.serialize(value));
                }
                out.push_str("\n}");
                out
            }
        }
    }
}

/// Serializer for Modulefile DSL literals. New strings are single-quoted;
/// rewriting a double-quoted literal keeps its double quotes.
pub struct DslSerializer;

impl ValueSerializer for DslSerializer {
    fn serialize_like(&self, value: &Value, existing: &str) -> String {
        if existing.starts_with('"') {
            if let Value::String(s) = value {
                return dsl_double_quote(s);
            }
        }
        self.serialize(value)
    }

    fn serialize(&self, value: &Value) -> String {
        match value {
            Value::Null => "''".to_string(),
            Value::String(s) => dsl_quote(s),
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().map(|v| self.serialize(v)).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Object(fields) => {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|(k, v)| format!("{} => {}", dsl_quote(k), self.serialize(v)))
                    .collect();
                format!("{{ {} }}", parts.join(", "))
            }
        }
    }
}

pub fn serializer_for(syntax: SourceSyntax) -> &'static dyn ValueSerializer {
    match syntax {
        SourceSyntax::Modulefile => &DslSerializer,
        SourceSyntax::MetadataJson => &JsonSerializer,
    }
}

fn json_quote(s: &str) -> String {
    // Serializing a plain string cannot fail.
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

fn dsl_double_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

fn dsl_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_string_escaping() {
        assert_eq!(JsonSerializer.serialize(&Value::string("a\"b")), r#""a\"b""#);
    }

    #[test]
    fn test_json_object_layout() {
        let value = Value::Object(vec![
            ("name".into(), Value::string("a/b")),
            ("version_requirement".into(), Value::string(">=1.0.0")),
        ]);
        assert_eq!(
            JsonSerializer.serialize(&value),
            "{\n  \"name\": \"a/b\",\n  \"version_requirement\": \">=1.0.0\"\n}"
        );
    }

    #[test]
    fn test_json_indented_object() {
        let value = Value::Object(vec![("name".into(), Value::string("a/b"))]);
        assert_eq!(
            JsonSerializer.serialize_indented(&value, 4),
            "{\n      \"name\": \"a/b\"\n    }"
        );
    }

    #[test]
    fn test_json_array_is_single_line() {
        let value = Value::Array(vec![Value::string("a"), Value::string("b")]);
        assert_eq!(JsonSerializer.serialize(&value), r#"["a", "b"]"#);
    }

    #[test]
    fn test_dsl_quoting() {
        assert_eq!(DslSerializer.serialize(&Value::string("it's")), r"'it\'s'");
        assert_eq!(DslSerializer.serialize(&Value::string(r"a\b")), r"'a\\b'");
    }

    #[test]
    fn test_dsl_rewrite_follows_existing_quotes() {
        let value = Value::string("bob");
        assert_eq!(DslSerializer.serialize_like(&value, "\"alice\""), "\"bob\"");
        assert_eq!(DslSerializer.serialize_like(&value, "'alice'"), "'bob'");

        let tricky = Value::string("say \"hi\"");
        assert_eq!(
            DslSerializer.serialize_like(&tricky, "\"old\""),
            r#""say \"hi\"""#
        );
    }
}
