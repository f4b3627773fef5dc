//! Error types for the devgen-core library.
//!
//! Every failure is reported through [`Error`]. Callers that only care about
//! the coarse category (could the inputs be read and parsed, or did the
//! assembled output fail to format) use [`Error::kind`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for devgen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse failure category surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A package could not be located, read or parsed
    Resolution,
    /// The assembled output could not be formatted or written
    Format,
}

/// Error type for all devgen operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read a source file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the output file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        /// Path to the file that failed to write
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to list a package directory
    #[error("failed to read directory '{path}': {details}")]
    DirectoryRead {
        /// Directory being listed
        path: PathBuf,
        /// Description of the failure
        details: String,
    },

    /// The import path could not be mapped to a directory
    #[error("cannot locate package '{import_path}': {details}")]
    PackageNotFound {
        /// Import path that failed to resolve
        import_path: String,
        /// Why resolution failed
        details: String,
    },

    /// The lexer hit malformed input
    #[error("{path}:{line}: {details}")]
    Lex {
        /// File being tokenized
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// Description of the problem
        details: String,
    },

    /// The parser hit an unexpected token
    #[error("{path}:{line}: {details}")]
    Parse {
        /// File being parsed
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// Description of the problem
        details: String,
    },

    /// The generated source failed to canonicalize
    #[error("failed to format generated source: {0}")]
    Format(String),

    /// An external formatter could not be run or rejected the input
    #[error("formatter '{program}' failed: {details}")]
    Formatter {
        /// Program that was invoked
        program: String,
        /// Stderr or spawn error
        details: String,
    },

    /// An interface method carries no permission tag
    #[error("method {interface}.{method} has no perm tag")]
    MissingPermission {
        /// Interface declaring the method
        interface: String,
        /// Method lacking the tag
        method: String,
    },

    /// The destination differs from freshly generated output
    #[error("'{path}' is out of date, re-run the generator")]
    Stale {
        /// Destination that needs regenerating
        path: PathBuf,
    },

    /// Generic internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new file write error
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a new directory listing error
    pub fn directory_read(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        Self::DirectoryRead {
            path: path.into(),
            details: details.into(),
        }
    }

    /// Creates a new package resolution error
    pub fn package_not_found(import_path: impl Into<String>, details: impl Into<String>) -> Self {
        Self::PackageNotFound {
            import_path: import_path.into(),
            details: details.into(),
        }
    }

    /// Creates a new lexer error
    pub fn lex(path: impl Into<PathBuf>, line: usize, details: impl Into<String>) -> Self {
        Self::Lex {
            path: path.into(),
            line,
            details: details.into(),
        }
    }

    /// Creates a new parser error
    pub fn parse(path: impl Into<PathBuf>, line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            line,
            details: details.into(),
        }
    }

    /// Creates a new formatting error
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Creates a new external formatter error
    pub fn formatter(program: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Formatter {
            program: program.into(),
            details: details.into(),
        }
    }

    /// Creates a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the caller-visible category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileRead { .. }
            | Self::DirectoryRead { .. }
            | Self::PackageNotFound { .. }
            | Self::Lex { .. }
            | Self::Parse { .. }
            | Self::MissingPermission { .. } => ErrorKind::Resolution,
            Self::FileWrite { .. }
            | Self::Format(_)
            | Self::Formatter { .. }
            | Self::Stale { .. }
            | Self::Internal(_) => ErrorKind::Format,
        }
    }
}
