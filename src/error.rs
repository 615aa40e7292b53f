//! Error types for certificate selection and lookup.

use crate::limits::FieldKind;
use crate::selector::SelectorState;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while reading the configuration file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The file does not exist or cannot be opened.
    #[error("config file not found: {path:?}")]
    NotFound {
        /// The path that was opened.
        path: PathBuf,
    },

    /// The file could not be read.
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        /// The path that was read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A line is longer than the reader buffers.
    #[error("line {line} exceeds {limit} bytes")]
    LineTooLong {
        /// 1-based line number.
        line: usize,
        /// The line length bound.
        limit: usize,
    },

    /// A line is not valid UTF-8.
    #[error("line {line} is not valid utf-8")]
    InvalidUtf8 {
        /// 1-based line number.
        line: usize,
    },

    /// A matching line lacks the label, type, URI or credential reference field.
    #[error("line {line} is missing required fields")]
    MissingFields {
        /// 1-based line number.
        line: usize,
    },

    /// A field of a matching line does not fit its bound.
    #[error("line {line}: {field} is too long (limit={limit}, actual={actual})")]
    FieldTooLong {
        /// 1-based line number.
        line: usize,
        /// The offending field.
        field: FieldKind,
        /// The exclusive length bound.
        limit: usize,
        /// The actual length.
        actual: usize,
    },
}

impl ConfigError {
    /// Returns the status kind this error maps to.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::FileNotFound,
            _ => ErrorKind::FileError,
        }
    }
}

/// Errors returned by [`CertSelector`](crate::CertSelector) and
/// [`CertLocator`](crate::CertLocator).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CertSelectorError {
    /// The handle was destroyed and can no longer be used.
    #[error("handle is no longer valid")]
    InvalidHandle,

    /// A required argument is empty.
    #[error("{field} is empty")]
    EmptyArgument {
        /// The empty argument.
        field: FieldKind,
    },

    /// An argument contains one of the configuration delimiters.
    #[error("{field} contains reserved character {ch:?}")]
    ReservedCharacter {
        /// The offending argument.
        field: FieldKind,
        /// The reserved character found.
        ch: char,
    },

    /// An argument does not fit its bound.
    #[error("{field} is too long (limit={limit}, actual={actual})")]
    TooLong {
        /// The offending argument.
        field: FieldKind,
        /// The exclusive length bound.
        limit: usize,
        /// The actual length.
        actual: usize,
    },

    /// The configuration file is missing or malformed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Every ordinal of the group was tried without finding a usable certificate.
    #[error("no usable certificate in group {group:?}")]
    GroupExhausted {
        /// The group that was searched.
        group: String,
    },

    /// No configuration line carries the requested label.
    #[error("no certificate labelled {label:?}")]
    LabelNotFound {
        /// The label that was looked up.
        label: String,
    },

    /// The certificate file named by the configuration does not exist.
    #[error("certificate file not found: {path:?}")]
    CertFileMissing {
        /// The filesystem path derived from the certificate URI.
        path: PathBuf,
    },

    /// The credential of a certificate could not be resolved or does not fit.
    #[error("credential for certificate {label:?} is unavailable")]
    CredentialUnavailable {
        /// The label of the certificate.
        label: String,
    },

    /// The operation is not allowed in the current state.
    #[error("operation not allowed in state {state}")]
    InvalidState {
        /// The state the selector was in.
        state: SelectorState,
    },
}

impl CertSelectorError {
    /// Returns the status kind this error maps to.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidHandle => ErrorKind::BadPointer,
            Self::EmptyArgument { .. } | Self::ReservedCharacter { .. } | Self::TooLong { .. } => {
                ErrorKind::BadArgument
            }
            Self::Config(e) => e.kind(),
            Self::GroupExhausted { .. } | Self::LabelNotFound { .. } | Self::CertFileMissing { .. } => {
                ErrorKind::FileNotFound
            }
            Self::CredentialUnavailable { .. } => ErrorKind::FileError,
            Self::InvalidState { .. } => ErrorKind::GeneralFailure,
        }
    }
}

/// Status taxonomy shared by every fallible operation.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// Unspecified failure, including protocol misuse.
    GeneralFailure,
    /// The handle is invalid.
    BadPointer,
    /// A configuration file exists but is malformed, or a credential is unusable.
    FileError,
    /// A file or a usable certificate was not found.
    FileNotFound,
    /// A caller-supplied argument is invalid.
    BadArgument,
}

impl ErrorKind {
    /// Returns a stable string representation of the kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GeneralFailure => "general_failure",
            Self::BadPointer => "bad_pointer",
            Self::FileError => "file_error",
            Self::FileNotFound => "file_not_found",
            Self::BadArgument => "bad_argument",
        }
    }

    /// Returns the numeric status code; `0` is reserved for success.
    pub const fn code(self) -> u16 {
        match self {
            Self::GeneralFailure => 1,
            Self::BadPointer => 2,
            Self::FileError => 3,
            Self::FileNotFound => 4,
            Self::BadArgument => 5,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_kind() {
        let missing = ConfigError::NotFound {
            path: PathBuf::from("/nope"),
        };
        assert_eq!(missing.kind(), ErrorKind::FileNotFound);
        assert_eq!(
            ConfigError::MissingFields { line: 3 }.kind(),
            ErrorKind::FileError
        );
        assert_eq!(
            CertSelectorError::from(missing).kind(),
            ErrorKind::FileNotFound
        );
    }

    #[test]
    fn test_error_kind_codes() {
        assert_eq!(ErrorKind::GeneralFailure.code(), 1);
        assert_eq!(ErrorKind::BadArgument.code(), 5);
        assert_eq!(ErrorKind::FileNotFound.to_string(), "file_not_found");
    }

    #[test]
    fn test_error_messages() {
        let err = CertSelectorError::ReservedCharacter {
            field: FieldKind::Group,
            ch: '|',
        };
        assert_eq!(err.to_string(), "group contains reserved character '|'");
        assert_eq!(err.kind(), ErrorKind::BadArgument);

        let err = ConfigError::FieldTooLong {
            line: 2,
            field: FieldKind::Uri,
            limit: 128,
            actual: 200,
        };
        assert_eq!(
            err.to_string(),
            "line 2: uri is too long (limit=128, actual=200)"
        );
    }
}
