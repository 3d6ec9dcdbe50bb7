use deckparse_definitions::DefinitionError;
use std::path::PathBuf;

/// The error taxonomy callers branch on, independent of variant payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    ConfigurationError,
    FileSystemError,
    StrictModeViolation,
    FatalKeywordEncountered,
    DataError,
}

/// A fatal parse or registry error. Every variant raised while reading a
/// deck carries the file and line it was detected at.
#[derive(Debug, thiserror::Error)]
pub enum DeckError {
    #[error("configuration error: {0}")]
    Definition(#[from] DefinitionError),

    #[error("{file}:{line}: configuration error: {message}")]
    Configuration {
        file: String,
        line: u32,
        message: String,
    },

    #[error("cannot open '{}': {source}", .path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file that could not be opened or read while parsing: an INCLUDE
    /// target (located at the directive) or a read failure mid-file.
    #[error("{file}:{line}: cannot read '{}': {source}", .path.display())]
    SourceAccess {
        file: String,
        line: u32,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}:{line}: keyword '{keyword}' not recognized")]
    StrictModeViolation {
        keyword: String,
        file: String,
        line: u32,
    },

    #[error("{file}:{line}: parsing terminated by fatal keyword '{keyword}'")]
    FatalKeyword {
        keyword: String,
        file: String,
        line: u32,
    },

    #[error("{file}:{line}: keyword '{keyword}': {message}")]
    Data {
        keyword: String,
        file: String,
        line: u32,
        message: String,
    },

    #[error("{file}:{line}: include failed: {message}")]
    Include {
        file: String,
        line: u32,
        message: String,
    },
}

impl DeckError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DeckError::Definition(_) | DeckError::Configuration { .. } => {
                ErrorCategory::ConfigurationError
            }
            DeckError::FileSystem { .. } | DeckError::SourceAccess { .. } => {
                ErrorCategory::FileSystemError
            }
            DeckError::StrictModeViolation { .. } => ErrorCategory::StrictModeViolation,
            DeckError::FatalKeyword { .. } => ErrorCategory::FatalKeywordEncountered,
            DeckError::Data { .. } | DeckError::Include { .. } => ErrorCategory::DataError,
        }
    }

    pub fn file_system(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DeckError::FileSystem {
            path: path.into(),
            source,
        }
    }

    pub fn source_access(
        file: &str,
        line: u32,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        DeckError::SourceAccess {
            file: file.to_owned(),
            line,
            path: path.into(),
            source,
        }
    }

    pub fn data(keyword: &str, file: &str, line: u32, message: impl Into<String>) -> Self {
        DeckError::Data {
            keyword: keyword.to_owned(),
            file: file.to_owned(),
            line,
            message: message.into(),
        }
    }

    pub fn configuration(file: &str, line: u32, message: impl Into<String>) -> Self {
        DeckError::Configuration {
            file: file.to_owned(),
            line,
            message: message.into(),
        }
    }

    pub fn include(file: &str, line: u32, message: impl Into<String>) -> Self {
        DeckError::Include {
            file: file.to_owned(),
            line,
            message: message.into(),
        }
    }

    /// The `(file, line)` the error was raised at, when it has one.
    pub fn location(&self) -> Option<(&str, u32)> {
        match self {
            DeckError::Configuration { file, line, .. }
            | DeckError::SourceAccess { file, line, .. }
            | DeckError::StrictModeViolation { file, line, .. }
            | DeckError::FatalKeyword { file, line, .. }
            | DeckError::Data { file, line, .. }
            | DeckError::Include { file, line, .. } => Some((file.as_str(), *line)),
            DeckError::Definition(_) | DeckError::FileSystem { .. } => None,
        }
    }
}
