//! The symbolic entry stream shared by both front ends.
//!
//! A front end walks its concrete syntax and emits one [`CallSink::call`] per
//! recognized top-level construct, in document order. The editor builds its
//! live model from that stream; nothing downstream ever looks at raw text
//! through anything but the spans reported here.

use crate::value::Value;
use std::ops::Range;

/// Which concrete syntax a piece of metadata text is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSyntax {
    /// The key/call-based Modulefile DSL.
    Modulefile,
    /// metadata.json.
    MetadataJson,
}

/// A byte range into the source text, as reported by a front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpan {
    pub offset: usize,
    pub length: usize,
}

impl SourceSpan {
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    pub fn from_range(range: Range<usize>) -> Self {
        Self {
            offset: range.start,
            length: range.end - range.start,
        }
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// One positional argument of a call: the literal's span (quotes and
/// brackets included) together with its parsed value.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub span: SourceSpan,
    pub value: Value,
}

impl Arg {
    pub fn new(span: SourceSpan, value: Value) -> Self {
        Self { span, value }
    }
}

/// Symbolic keys for every metadata construct both syntaxes know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallSymbol {
    Name,
    Version,
    Author,
    Summary,
    Description,
    License,
    Source,
    ProjectPage,
    IssuesUrl,
    PuppetVersion,
    Tags,
    /// Repeated DSL call, one per dependency.
    Dependency,
    /// JSON array of dependency objects.
    Dependencies,
    OperatingsystemSupport,
}

/// What a call of a given symbol is allowed to look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// One single-valued field.
    Scalar,
    /// Ordered list of scalars (tags).
    ScalarList,
    /// Ordered list of objects (dependencies, OS support).
    ObjectList,
}

/// Arity/shape constraints for one symbol. Built once, consulted by both
/// front ends; there is no global mutable registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallShape {
    pub kind: ShapeKind,
    pub min_args: usize,
    pub max_args: Option<usize>,
    /// Whether the symbol may occur more than once per document.
    pub repeatable: bool,
}

impl CallShape {
    const fn scalar() -> Self {
        Self {
            kind: ShapeKind::Scalar,
            min_args: 1,
            max_args: Some(1),
            repeatable: false,
        }
    }
}

impl CallSymbol {
    pub const ALL: [CallSymbol; 14] = [
        CallSymbol::Name,
        CallSymbol::Version,
        CallSymbol::Author,
        CallSymbol::Summary,
        CallSymbol::Description,
        CallSymbol::License,
        CallSymbol::Source,
        CallSymbol::ProjectPage,
        CallSymbol::IssuesUrl,
        CallSymbol::PuppetVersion,
        CallSymbol::Tags,
        CallSymbol::Dependency,
        CallSymbol::Dependencies,
        CallSymbol::OperatingsystemSupport,
    ];

    /// The key as it appears in source text, identical in both syntaxes.
    pub fn key(self) -> &'static str {
        match self {
            CallSymbol::Name => "name",
            CallSymbol::Version => "version",
            CallSymbol::Author => "author",
            CallSymbol::Summary => "summary",
            CallSymbol::Description => "description",
            CallSymbol::License => "license",
            CallSymbol::Source => "source",
            CallSymbol::ProjectPage => "project_page",
            CallSymbol::IssuesUrl => "issues_url",
            CallSymbol::PuppetVersion => "puppet_version",
            CallSymbol::Tags => "tags",
            CallSymbol::Dependency => "dependency",
            CallSymbol::Dependencies => "dependencies",
            CallSymbol::OperatingsystemSupport => "operatingsystem_support",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        CallSymbol::ALL.iter().copied().find(|s| s.key() == key)
    }

    pub fn shape(self) -> CallShape {
        match self {
            CallSymbol::Name
            | CallSymbol::Version
            | CallSymbol::Author
            | CallSymbol::Summary
            | CallSymbol::Description
            | CallSymbol::License
            | CallSymbol::Source
            | CallSymbol::ProjectPage
            | CallSymbol::IssuesUrl
            | CallSymbol::PuppetVersion => CallShape::scalar(),
            CallSymbol::Tags => CallShape {
                kind: ShapeKind::ScalarList,
                min_args: 0,
                max_args: None,
                repeatable: false,
            },
            CallSymbol::Dependency => CallShape {
                kind: ShapeKind::ObjectList,
                min_args: 1,
                max_args: Some(3),
                repeatable: true,
            },
            CallSymbol::Dependencies => CallShape {
                kind: ShapeKind::ObjectList,
                min_args: 0,
                max_args: None,
                repeatable: false,
            },
            CallSymbol::OperatingsystemSupport => CallShape {
                kind: ShapeKind::ObjectList,
                min_args: 1,
                max_args: None,
                repeatable: true,
            },
        }
    }

    /// Whether the symbol is a legal key in the given syntax. `dependency`
    /// exists only as a repeated DSL call, `dependencies` only as a JSON
    /// array member.
    pub fn valid_in(self, syntax: SourceSyntax) -> bool {
        match self {
            CallSymbol::Dependency => syntax == SourceSyntax::Modulefile,
            CallSymbol::Dependencies => syntax == SourceSyntax::MetadataJson,
            _ => true,
        }
    }
}

/// Callback sink for the front-end entry stream.
pub trait CallSink {
    fn call(&mut self, symbol: CallSymbol, span: SourceSpan, args: Vec<Arg>);
}

/// One recorded callback, for sinks that buffer the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub symbol: CallSymbol,
    pub span: SourceSpan,
    pub args: Vec<Arg>,
}

/// A [`CallSink`] that records the stream for later replay. Used by the
/// editor so the parse borrow ends before the model is populated.
#[derive(Debug, Default)]
pub struct CallRecorder {
    pub calls: Vec<RecordedCall>,
}

impl CallRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CallSink for CallRecorder {
    fn call(&mut self, symbol: CallSymbol, span: SourceSpan, args: Vec<Arg>) {
        self.calls.push(RecordedCall { symbol, span, args });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trip() {
        for symbol in CallSymbol::ALL {
            assert_eq!(CallSymbol::from_key(symbol.key()), Some(symbol));
        }
        assert_eq!(CallSymbol::from_key("checksums"), None);
    }

    #[test]
    fn test_syntax_validity() {
        assert!(CallSymbol::Dependency.valid_in(SourceSyntax::Modulefile));
        assert!(!CallSymbol::Dependency.valid_in(SourceSyntax::MetadataJson));
        assert!(CallSymbol::Dependencies.valid_in(SourceSyntax::MetadataJson));
        assert!(!CallSymbol::Dependencies.valid_in(SourceSyntax::Modulefile));
        assert!(CallSymbol::Tags.valid_in(SourceSyntax::Modulefile));
    }

    #[test]
    fn test_scalar_shape() {
        let shape = CallSymbol::Author.shape();
        assert_eq!(shape.kind, ShapeKind::Scalar);
        assert_eq!(shape.max_args, Some(1));
        assert!(!shape.repeatable);
    }
}
