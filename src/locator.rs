//! Lookup of certificate entries in the configuration file.
//!
//! Every lookup re-opens and re-scans the file, so edits to the
//! configuration take effect on the next call without any cache.

use crate::config::{self, CertEntry, RawLine};
use crate::error::ConfigError;
use crate::limits::{LIST_MAX, MAX_LINE_LENGTH};
use crate::prelude::debug;
use std::iter;
use std::path::Path;
use thiserror::Error;

/// Errors produced by a lookup.
#[derive(Debug, Error)]
pub(crate) enum LocateError {
    /// No line matched the request.
    #[error("no matching certificate entry")]
    NotFound,

    /// The file could not be opened or is malformed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Returns the `ordinal`-th entry (0-based, file order) belonging to `group`.
///
/// Ordinals at or above [`LIST_MAX`] are never looked up. Lines before the
/// selected one are only checked for length and encoding; the fields of the
/// selected line must all be present and fit their bounds.
pub(crate) fn locate_in_group(
    config_path: &Path,
    group: &str,
    ordinal: usize,
) -> Result<CertEntry, LocateError> {
    if ordinal >= LIST_MAX {
        return Err(LocateError::NotFound);
    }

    let mut seen = 0;
    let entry = scan(config_path, |line, text| {
        let mut fields = config::fields(text);
        let groups = fields.next()?;
        if !config::group_matches(groups, group) {
            return None;
        }
        if seen < ordinal {
            seen += 1;
            return None;
        }
        Some(config::parse_entry(line, fields))
    })?;
    debug!("group {:?} ordinal {} is {}", group, ordinal, entry.uri());
    Ok(entry)
}

/// Returns the first entry whose label field equals `label`.
pub(crate) fn locate_by_label(config_path: &Path, label: &str) -> Result<CertEntry, LocateError> {
    let entry = scan(config_path, |line, text| {
        let mut fields = config::fields(text).skip(1);
        let candidate = fields.next()?;
        if candidate != label {
            return None;
        }
        Some(config::parse_entry(line, iter::once(candidate).chain(fields)))
    })?;
    debug!("label {:?} is {}", label, entry.uri());
    Ok(entry)
}

// Feeds each line to `visit` until it yields a result. Overlong and non-UTF-8
// lines abort the scan since nothing after them can be trusted to line up.
fn scan<F>(config_path: &Path, mut visit: F) -> Result<CertEntry, LocateError>
where
    F: FnMut(usize, &str) -> Option<Result<CertEntry, ConfigError>>,
{
    let mut reader = config::open(config_path)?;
    while let Some((line, raw)) = reader
        .next_line()
        .map_err(|e| config::read_error(config_path, e))?
    {
        let text = match raw {
            RawLine::Text(text) => text,
            RawLine::TooLong => {
                return Err(ConfigError::LineTooLong {
                    line,
                    limit: MAX_LINE_LENGTH,
                }
                .into())
            }
            RawLine::InvalidUtf8 => return Err(ConfigError::InvalidUtf8 { line }.into()),
        };
        if let Some(result) = visit(line, text) {
            return result.map_err(LocateError::from);
        }
    }
    Err(LocateError::NotFound)
}
