use modfile_common::BadNameError;
use modfile_parser::ParseError;
use thiserror::Error;

pub type EditorResult<T> = Result<T, EditorError>;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Bad module name: {0}")]
    BadName(#[from] BadNameError),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Edit out of range: offset {offset}, length {length} in a document of {len} bytes")]
    OutOfRange {
        offset: usize,
        length: usize,
        len: usize,
    },

    #[error("Edit range splits a multi-byte character at {offset}")]
    NotCharBoundary { offset: usize },

    #[error("Entry is no longer tracked by the document")]
    StaleEntry,
}

impl EditorError {
    pub fn invalid_name(message: impl Into<String>) -> Self {
        Self::InvalidName(message.into())
    }
}
