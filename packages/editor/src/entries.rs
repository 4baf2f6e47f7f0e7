//! Model-side bookkeeping for parsed entries.
//!
//! Each entry pairs a [`PositionId`] into the document with the value the
//! front end reported, so the model can rewrite or remove the exact text
//! an entry came from long after other edits have moved it around.

use crate::document::PositionId;
use modfile_parser::Value;

/// One tracked argument of a call.
#[derive(Debug, Clone)]
pub(crate) struct ArgEntry {
    pub id: PositionId,
    pub value: Value,
}

/// A tracked call: the whole construct's span plus its arguments.
#[derive(Debug, Clone)]
pub(crate) struct CallEntry {
    pub id: PositionId,
    pub args: Vec<ArgEntry>,
}

/// How a list item is written in the source.
#[derive(Debug, Clone)]
pub(crate) enum ItemRepr {
    /// A DSL call with positional arguments, e.g.
    /// `dependency 'a/b', '>=1.0.0'`.
    Call { args: Vec<ArgEntry> },
    /// A JSON object element, e.g. `{"name": "a/b"}`.
    Object { value: Value },
}

/// One dependency or OS-support list item.
#[derive(Debug, Clone)]
pub(crate) struct ItemEntry {
    pub id: PositionId,
    pub repr: ItemRepr,
    pub resolved: bool,
}

impl ItemEntry {
    /// A named field of the item: positional for calls, keyed for objects.
    pub fn field(&self, dsl_index: usize, json_key: &str) -> Option<&str> {
        match &self.repr {
            ItemRepr::Call { args } => args.get(dsl_index).and_then(|a| a.value.as_str()),
            ItemRepr::Object { value } => value.get(json_key).and_then(Value::as_str),
        }
    }

    /// List-valued field, e.g. OS releases.
    pub fn field_list(&self, dsl_from: usize, json_key: &str) -> Vec<String> {
        match &self.repr {
            ItemRepr::Call { args } => args
                .iter()
                .skip(dsl_from)
                .filter_map(|a| a.value.as_str().map(String::from))
                .collect(),
            ItemRepr::Object { value } => value.get(json_key).map(Value::strings).unwrap_or_default(),
        }
    }
}

/// A dependency as presented to hosts: a value snapshot, detached from
/// the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyInfo {
    pub name: String,
    pub version_requirement: String,
    /// 1-based line the entry starts on.
    pub line: u32,
    pub resolved: bool,
}

/// An OS-support entry as presented to hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsSupportInfo {
    pub name: String,
    pub releases: Vec<String>,
    pub line: u32,
    pub resolved: bool,
}
