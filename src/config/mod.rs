//! Reading the selector configuration file.
//!
//! The file is line oriented. Each line has at least five comma-separated
//! fields:
//!
//! ```text
//! GROUP1|GROUP2,label,type,file:///path/to/cert.p12,credential-ref
//! ```
//!
//! The first field lists up to ten group tags separated by `|`. Empty fields
//! produced by adjacent delimiters are skipped. Only the trailing newline is
//! stripped; all other whitespace is significant. Fields after the fifth are
//! ignored.

mod properties;

pub(crate) use properties::read_engine;

use crate::constants::{FIELD_DELIMITER, GROUP_DELIMITER};
use crate::error::ConfigError;
use crate::limits::{check_fits, FieldKind, MAX_GROUP_TAGS, MAX_LINE_LENGTH};
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// One certificate entry of the configuration file.
#[derive(Clone, Eq, PartialEq, Zeroize, ZeroizeOnDrop)]
pub(crate) struct CertEntry {
    label: String,
    uri: String,
    credential_ref: String,
}

impl CertEntry {
    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn uri(&self) -> &str {
        &self.uri
    }

    pub(crate) fn credential_ref(&self) -> &str {
        &self.credential_ref
    }
}

impl fmt::Debug for CertEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertEntry")
            .field("label", &self.label)
            .field("uri", &self.uri)
            .field("credential_ref", &"<redacted>")
            .finish()
    }
}

/// A line as produced by [`LineReader`].
#[derive(Debug, Eq, PartialEq)]
pub(crate) enum RawLine<'a> {
    /// Line content without the trailing newline.
    Text(&'a str),
    /// The line did not fit in [`MAX_LINE_LENGTH`] bytes and was discarded.
    TooLong,
    /// The line is not valid UTF-8.
    InvalidUtf8,
}

/// Bounded line reader: a line is never buffered beyond [`MAX_LINE_LENGTH`] bytes.
pub(crate) struct LineReader<R> {
    inner: R,
    number: usize,
    buf: Vec<u8>,
}

impl<R: BufRead> LineReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            number: 0,
            buf: Vec::with_capacity(MAX_LINE_LENGTH),
        }
    }

    /// Returns the next line with its 1-based number, or `None` at end of input.
    pub(crate) fn next_line(&mut self) -> io::Result<Option<(usize, RawLine<'_>)>> {
        self.buf.clear();
        let read = self
            .inner
            .by_ref()
            .take(MAX_LINE_LENGTH as u64)
            .read_until(b'\n', &mut self.buf)?;
        if read == 0 {
            return Ok(None);
        }
        self.number += 1;

        if read >= MAX_LINE_LENGTH {
            if self.buf.last() != Some(&b'\n') {
                self.discard_rest()?;
            }
            return Ok(Some((self.number, RawLine::TooLong)));
        }

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        }
        let line = match std::str::from_utf8(&self.buf) {
            Ok(text) => RawLine::Text(text),
            Err(_) => RawLine::InvalidUtf8,
        };
        Ok(Some((self.number, line)))
    }

    fn discard_rest(&mut self) -> io::Result<()> {
        loop {
            let available = self.inner.fill_buf()?;
            if available.is_empty() {
                return Ok(());
            }
            if let Some(pos) = available.iter().position(|&b| b == b'\n') {
                self.inner.consume(pos + 1);
                return Ok(());
            }
            let len = available.len();
            self.inner.consume(len);
        }
    }
}

impl<R> Drop for LineReader<R> {
    fn drop(&mut self) {
        self.buf.zeroize();
    }
}

/// Opens the configuration file for a fresh scan.
///
/// Any open failure is reported as [`ConfigError::NotFound`].
pub(crate) fn open(path: &Path) -> Result<LineReader<BufReader<File>>, ConfigError> {
    let file = File::open(path).map_err(|_| ConfigError::NotFound {
        path: path.to_path_buf(),
    })?;
    Ok(LineReader::new(BufReader::new(file)))
}

/// Wraps a read failure with the path being scanned.
pub(crate) fn read_error(path: &Path, source: io::Error) -> ConfigError {
    ConfigError::Read {
        path: PathBuf::from(path),
        source,
    }
}

/// Splits a line into its non-empty fields.
pub(crate) fn fields(line: &str) -> impl Iterator<Item = &str> {
    line.split(FIELD_DELIMITER).filter(|f| !f.is_empty())
}

/// Reports whether `group` is one of the first [`MAX_GROUP_TAGS`] tags of `group_field`.
pub(crate) fn group_matches(group_field: &str, group: &str) -> bool {
    group_field
        .split(GROUP_DELIMITER)
        .filter(|tag| !tag.is_empty())
        .take(MAX_GROUP_TAGS)
        .any(|tag| tag == group)
}

/// Builds an entry from the fields following the group field.
pub(crate) fn parse_entry<'a>(
    line: usize,
    mut rest: impl Iterator<Item = &'a str>,
) -> Result<CertEntry, ConfigError> {
    let label = rest.next().ok_or(ConfigError::MissingFields { line })?;
    let _cert_type = rest.next().ok_or(ConfigError::MissingFields { line })?;
    let uri = rest.next().ok_or(ConfigError::MissingFields { line })?;
    check_field(line, FieldKind::Uri, uri)?;
    let credential_ref = rest.next().ok_or(ConfigError::MissingFields { line })?;
    check_field(line, FieldKind::CredentialRef, credential_ref)?;

    Ok(CertEntry {
        label: label.to_owned(),
        uri: uri.to_owned(),
        credential_ref: credential_ref.to_owned(),
    })
}

fn check_field(line: usize, field: FieldKind, value: &str) -> Result<(), ConfigError> {
    check_fits(field, value.len()).map_err(|limit| ConfigError::FieldTooLong {
        line,
        field,
        limit,
        actual: value.len(),
    })
}
