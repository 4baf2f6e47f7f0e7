pub mod calls;
pub mod error;
pub mod lexer;
pub mod metadata_json;
pub mod modulefile;
pub mod serializer;
pub mod strict;
pub mod value;

pub use calls::{
    Arg, CallRecorder, CallShape, CallSink, CallSymbol, RecordedCall, ShapeKind, SourceSpan,
    SourceSyntax,
};
pub use error::{ParseError, ParseResult};
pub use metadata_json::parse_metadata_json;
pub use modulefile::parse_modulefile;
pub use serializer::{serializer_for, DslSerializer, JsonSerializer, ValueSerializer};
pub use strict::{parse_metadata, DependencySpec, Metadata, OsSupportSpec};
pub use value::Value;
