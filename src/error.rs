//! Error types for arcsql
//!
//! Every pass reports one specific error kind together with the path of the
//! node that triggered it.

use crate::stmt::NodePath;
use thiserror::Error;

/// The kind of a pipeline error, independent of its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Lexer or parser failure on raw SQL text
    Syntax,
    /// Missing mandatory child node or broken tree invariant
    Structure,
    /// Placeholder or quoted-identifier syntax violation
    MalformedIdentifier,
    /// Table, column, type or parameter not known
    DictionaryElementMissing,
    /// Identifier resolvable in more than one place
    AmbiguousReference,
    /// Precondition of a synthesis or rewrite not met
    UnsupportedConstruct,
    /// Catalog bookkeeping failure
    Catalog,
    /// I/O or (de)serialization failure
    Io,
    /// Anything else
    Internal,
}

/// The main error type for arcsql
#[derive(Error, Debug)]
pub enum Error {
    // ========== Lexer Errors ==========
    #[error("Lexer error: unexpected character '{0}' at position {1}")]
    UnexpectedCharacter(char, usize),

    #[error("Lexer error: unterminated string literal starting at position {0}")]
    UnterminatedString(usize),

    #[error("Lexer error: unterminated comment starting at position {0}")]
    UnterminatedComment(usize),

    #[error("Lexer error: invalid number format at position {0}")]
    InvalidNumber(usize),

    // ========== Parser Errors ==========
    #[error("Parse error: unexpected token '{found}', expected {expected}")]
    UnexpectedToken { expected: String, found: String },

    #[error("Parse error: unexpected end of input, expected {0}")]
    UnexpectedEof(String),

    // ========== Statement Errors ==========
    #[error("Structure error at {path}: {message}")]
    Structure { path: NodePath, message: String },

    #[error("Malformed identifier at {path}: {message}")]
    MalformedIdentifier { path: NodePath, message: String },

    #[error("Dictionary error at {path}: {message}")]
    DictionaryElementMissing { path: NodePath, message: String },

    #[error("Ambiguous reference at {path}: {message}")]
    AmbiguousReference { path: NodePath, message: String },

    #[error("Unsupported construct at {path}: {message}")]
    UnsupportedConstruct { path: NodePath, message: String },

    #[error("{} structure error(s): {}", .0.len(), join_errors(.0))]
    Multiple(Vec<Error>),

    // ========== Catalog Errors ==========
    #[error("Catalog error: table '{0}' not found")]
    TableNotFound(String),

    #[error("Catalog error: table '{0}' already exists")]
    TableAlreadyExists(String),

    #[error("Catalog error: column '{0}' already exists in table '{1}'")]
    ColumnAlreadyExists(String, String),

    // ========== I/O Errors ==========
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // ========== Internal Errors ==========
    #[error("Internal error: {0}")]
    Internal(String),
}

fn join_errors(errors: &[Error]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    pub fn structure(path: &NodePath, message: impl Into<String>) -> Self {
        Error::Structure {
            path: path.clone(),
            message: message.into(),
        }
    }

    pub fn malformed(path: &NodePath, message: impl Into<String>) -> Self {
        Error::MalformedIdentifier {
            path: path.clone(),
            message: message.into(),
        }
    }

    pub fn missing(path: &NodePath, message: impl Into<String>) -> Self {
        Error::DictionaryElementMissing {
            path: path.clone(),
            message: message.into(),
        }
    }

    pub fn ambiguous(path: &NodePath, message: impl Into<String>) -> Self {
        Error::AmbiguousReference {
            path: path.clone(),
            message: message.into(),
        }
    }

    pub fn unsupported(path: &NodePath, message: impl Into<String>) -> Self {
        Error::UnsupportedConstruct {
            path: path.clone(),
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnexpectedCharacter(..)
            | Error::UnterminatedString(_)
            | Error::UnterminatedComment(_)
            | Error::InvalidNumber(_)
            | Error::UnexpectedToken { .. }
            | Error::UnexpectedEof(_) => ErrorKind::Syntax,
            Error::Structure { .. } | Error::Multiple(_) => ErrorKind::Structure,
            Error::MalformedIdentifier { .. } => ErrorKind::MalformedIdentifier,
            Error::DictionaryElementMissing { .. } => ErrorKind::DictionaryElementMissing,
            Error::AmbiguousReference { .. } => ErrorKind::AmbiguousReference,
            Error::UnsupportedConstruct { .. } => ErrorKind::UnsupportedConstruct,
            Error::TableNotFound(_)
            | Error::TableAlreadyExists(_)
            | Error::ColumnAlreadyExists(..) => ErrorKind::Catalog,
            Error::IoError(_) | Error::Serialization(_) => ErrorKind::Io,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Path of the offending node, for the statement-level kinds
    pub fn path(&self) -> Option<&NodePath> {
        match self {
            Error::Structure { path, .. }
            | Error::MalformedIdentifier { path, .. }
            | Error::DictionaryElementMissing { path, .. }
            | Error::AmbiguousReference { path, .. }
            | Error::UnsupportedConstruct { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Result type alias for arcsql operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::TableNotFound("users".to_string());
        assert_eq!(err.to_string(), "Catalog error: table 'users' not found");

        let err = Error::UnexpectedCharacter('@', 5);
        assert_eq!(
            err.to_string(),
            "Lexer error: unexpected character '@' at position 5"
        );
    }

    #[test]
    fn test_error_path_and_kind() {
        let path = NodePath::root().child("contents").child("where");
        let err = Error::ambiguous(&path, "column 'id' found in 'a' and 'b'");
        assert_eq!(err.kind(), ErrorKind::AmbiguousReference);
        assert_eq!(err.path(), Some(&path));
        assert_eq!(
            err.to_string(),
            "Ambiguous reference at contents.where: column 'id' found in 'a' and 'b'"
        );
    }

    #[test]
    fn test_multiple_errors_display() {
        let root = NodePath::root();
        let err = Error::Multiple(vec![
            Error::structure(&root.child("a"), "first"),
            Error::structure(&root.child("b"), "second"),
        ]);
        assert_eq!(
            err.to_string(),
            "2 structure error(s): Structure error at a: first; Structure error at b: second"
        );
        assert_eq!(err.kind(), ErrorKind::Structure);
    }
}
