//! Fixed bounds on every caller- and file-supplied value.
//!
//! All lengths are byte lengths. A value "fits" a limit when it is strictly
//! shorter than the limit, leaving room for the terminator the on-disk and
//! TLS-library formats expect.

use crate::error::CertSelectorError;
use std::fmt;

/// Bound on the config path and on a certificate URI.
pub const PATH_MAX: usize = 128;

/// Bound on a group id, a label and a credential reference.
pub const PARAM_MAX: usize = 64;

/// Bound on a resolved secret, after the trailing newline is removed.
///
/// The credential store's size counts a terminator in a 64-byte field, so
/// 62 bytes is the longest secret accepted.
pub const SECRET_MAX: usize = 63;

/// Maximum length of the engine name. Longer values are truncated.
pub const ENGINE_MAX: usize = 32;

/// Number of ordinals a group may hold.
pub const LIST_MAX: usize = 6;

/// A raw line, newline included, must be shorter than this.
pub const MAX_LINE_LENGTH: usize = 1024;

/// Only this many group tags of a line are compared.
pub const MAX_GROUP_TAGS: usize = 10;

/// The kind of bounded value that was too long.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FieldKind {
    /// Configuration file path.
    ConfigPath,
    /// Group identifier.
    Group,
    /// Certificate label.
    Label,
    /// Certificate URI.
    Uri,
    /// Credential reference.
    CredentialRef,
    /// Resolved secret.
    Secret,
}

impl FieldKind {
    /// Returns a stable string representation of the field kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigPath => "config_path",
            Self::Group => "group",
            Self::Label => "label",
            Self::Uri => "uri",
            Self::CredentialRef => "credential_ref",
            Self::Secret => "secret",
        }
    }

    /// Returns the exclusive length bound for this kind.
    pub const fn limit(self) -> usize {
        match self {
            Self::ConfigPath | Self::Uri => PATH_MAX,
            Self::Group | Self::Label | Self::CredentialRef => PARAM_MAX,
            Self::Secret => SECRET_MAX,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checks that a value of `len` bytes fits the bound of `kind`.
///
/// Returns the limit as the error so callers can build their own error variant.
pub(crate) fn check_fits(kind: FieldKind, len: usize) -> Result<(), usize> {
    let limit = kind.limit();
    if len < limit {
        Ok(())
    } else {
        Err(limit)
    }
}

/// Validates a caller-supplied argument: non-empty, free of `reserved`
/// characters and within the bound of `field`.
pub(crate) fn validate_argument(
    field: FieldKind,
    value: &str,
    reserved: &[char],
) -> Result<(), CertSelectorError> {
    if value.is_empty() {
        return Err(CertSelectorError::EmptyArgument { field });
    }
    if let Some(ch) = value.chars().find(|c| reserved.contains(c)) {
        return Err(CertSelectorError::ReservedCharacter { field, ch });
    }
    check_fits(field, value.len()).map_err(|limit| CertSelectorError::TooLong {
        field,
        limit,
        actual: value.len(),
    })
}

/// Truncates `value` to at most `max` bytes without splitting a character.
pub(crate) fn truncate_on_char_boundary(value: &str, max: usize) -> &str {
    if value.len() <= max {
        return value;
    }
    let mut end = max;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}
