//! Error types for sqlscript

use std::path::PathBuf;

use thiserror::Error;

/// Result type for sqlscript operations.
pub type ScriptResult<T> = Result<T, ScriptError>;

/// Error type for sqlscript operations.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Open and close tag counts differ within a piece of text.
    #[error(
        "found {opens} open-tag(s) matching '{open}' but {closes} close-tag(s) matching '{close}'; \
         each open-tag needs an associated close-tag"
    )]
    MismatchedTags {
        open: String,
        close: String,
        opens: usize,
        closes: usize,
    },
    /// Multi-line tag without a `name` attribute whose first line is not a name.
    #[error(
        "invalid statement tags provided; multi-line tags without an explicit `__name` \
         attribute must include a name not beginning with '__' on their first line, found:\n{raw}"
    )]
    InvalidTags { raw: String },
    /// Tag attribute value that cannot be coerced to its configured type.
    #[error("invalid value '{value}' for attribute '{key}'; expected {expected}")]
    InvalidAttribute {
        key: String,
        value: String,
        expected: &'static str,
    },
    /// No statement matches an index or name.
    #[error("statement '{id}' not found{}", fmt_names(.names))]
    StatementNotFound { id: String, names: Vec<String> },
    /// A name lookup was attempted while statement names are not distinct.
    #[error("indistinct statement names in '{script}': {}", .duplicates.join(", "))]
    DuplicateTag {
        script: String,
        duplicates: Vec<String>,
    },
    /// A filter pattern is not a valid regex.
    #[error("invalid filter pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    /// Reuse of a filter id that was never recorded.
    #[error("filter id '{id}' does not exist; known ids are: {}", .known.join(", "))]
    UnknownFilter { id: String, known: Vec<String> },
    /// `from_id` and `as_id` provided together.
    #[error("a filter cannot be given `from_id` and `as_id` simultaneously")]
    ConflictingFilterIds,
    /// `filter` called while another filter is active on the same script.
    #[error("script '{0}' is already filtered; exit the active filter first")]
    FilterActive(String),
    /// Tokenizer error.
    #[error("[line {line}, col {col}] Error: {message}")]
    Scan { line: u32, col: u32, message: String },
    /// Script names must carry a `.sql` extension.
    #[error("script name must end in .sql; '{0}' provided")]
    InvalidScriptName(String),
    /// IO error while reading a script or configuration file.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Configuration could not be deserialized.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
    /// The executor failed to run a statement.
    #[error("error executing '{name}': {message}")]
    Execution { name: String, message: String },
    /// A QA statement ran but its assertion did not hold.
    #[error("qa failure in '{name}': {reason}")]
    QaFailure { name: String, reason: String },
}

fn fmt_names(names: &[String]) -> String {
    if names.is_empty() {
        String::new()
    } else {
        format!("; valid names are: {}", names.join(", "))
    }
}

impl ScriptError {
    pub(crate) fn scan(line: u32, col: u32, message: impl Into<String>) -> Self {
        ScriptError::Scan {
            line,
            col,
            message: message.into(),
        }
    }

    pub(crate) fn not_found(id: impl ToString, names: Vec<String>) -> Self {
        ScriptError::StatementNotFound {
            id: id.to_string(),
            names,
        }
    }
}
