//!
//! # Liberty Errors
//!

// Std-Lib
use std::path::PathBuf;

// Crates.io Imports
use serde::{Deserialize, Serialize};

// Local Imports
use crate::lex::TokenType;

/// # Liberty Error Enumeration
#[derive(Debug)]
pub enum LibertyError {
    /// Input file does not exist
    FileNotFound { path: PathBuf },
    /// Input file exists, but could not be read
    FileNotReadable {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Lexer Errors
    Lex {
        msg: String,
        line: usize,
        pos: usize,
    },
    /// Parser Errors
    Parse {
        msg: Option<String>,
        tp: ParseErrorType,
        state: ParserState,
    },
    /// Wrapped errors, generally from other crates
    Boxed(Box<dyn std::error::Error + Send + Sync>),
    /// String message-valued errors
    Str(String),
}
impl LibertyError {
    /// Classify into the [ErrorKind] taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileNotFound { .. } => ErrorKind::FileNotFound,
            Self::FileNotReadable { .. } => ErrorKind::FileNotReadable,
            Self::Lex { .. } => ErrorKind::MalformedFile,
            Self::Parse { tp, .. } => match tp {
                ParseErrorType::UnknownTemplate { .. } => ErrorKind::UnknownTemplate,
                ParseErrorType::StructuralMismatch { .. } => ErrorKind::StructuralMismatch,
                ParseErrorType::Malformed
                | ParseErrorType::InvalidValue
                | ParseErrorType::InvalidToken { .. }
                | ParseErrorType::MissingAttribute => ErrorKind::MalformedFile,
            },
            Self::Boxed(_) | Self::Str(_) => ErrorKind::Other,
        }
    }
    /// Source line number of the error, where known
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Lex { line, .. } => Some(*line),
            Self::Parse { state, .. } => Some(state.line_num),
            _ => None,
        }
    }
    /// Source byte offset of the error, where known
    pub fn pos(&self) -> Option<usize> {
        match self {
            Self::Lex { pos, .. } => Some(*pos),
            Self::Parse { state, .. } => Some(state.pos),
            _ => None,
        }
    }
}

/// # Error Kinds
///
/// The fatal failure classes of a library read.
/// All abort the read, and leave no partial library behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    FileNotFound,
    FileNotReadable,
    /// Unterminated tokens, unbalanced braces, trailing or misplaced content
    MalformedFile,
    /// A table references an undeclared template
    UnknownTemplate,
    /// A table's value count disagrees with its axes
    StructuralMismatch,
    /// Errors from other crates, e.g. serialization
    Other,
}

/// # Parse Error Types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseErrorType {
    /// Generally malformed content: unbalanced groups, misplaced statements
    Malformed,
    /// Reference to an undeclared table template
    UnknownTemplate { name: String },
    /// Table shape does not agree with its values
    StructuralMismatch { expected: usize, found: usize },
    /// Invalid Value, e.g. a non-numeric capacitance
    InvalidValue,
    /// Invalid Token
    InvalidToken { expected: TokenType },
    /// Missing a required attribute, e.g. a timing group without `related_pin`
    MissingAttribute,
}

/// Enumerated parsing contexts, largely for capturing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LibParseContext {
    Library,
    LutTemplate,
    Cell,
    Pin,
    Timing,
    Lut,
}

/// State of the parser, generally exposed when providing error info.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserState {
    pub ctx: Vec<LibParseContext>,
    pub token: String,
    pub line_content: String,
    pub line_num: usize,
    pub pos: usize,
}

impl From<crate::utils::ser::Error> for LibertyError {
    fn from(e: crate::utils::ser::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<std::io::Error> for LibertyError {
    fn from(e: std::io::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<std::fmt::Error> for LibertyError {
    fn from(e: std::fmt::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<String> for LibertyError {
    /// Convert string-based errors by wrapping them
    fn from(e: String) -> Self {
        Self::Str(e)
    }
}
impl From<&str> for LibertyError {
    /// Convert string-based errors by wrapping them
    fn from(e: &str) -> Self {
        Self::Str(e.into())
    }
}
impl std::fmt::Display for LibertyError {
    /// Delegates to the [Debug] implementation
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        std::fmt::Debug::fmt(self, f)
    }
}
impl std::error::Error for LibertyError {}

/// Liberty Library-Wide Result Type
pub type LibResult<T> = Result<T, LibertyError>;
