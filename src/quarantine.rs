//! Per-ordinal quarantine of certificates that failed a handshake.
//!
//! A slot remembers the modification time the certificate file had when it
//! was reported bad. The certificate stays skipped while the file keeps that
//! time; any change (typically a renewal) lets it be tried again.

use crate::constants::FILE_SCHEME;
use crate::limits::LIST_MAX;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Returns the filesystem path named by a certificate URI.
pub(crate) fn cert_path(uri: &str) -> &Path {
    Path::new(uri.strip_prefix(FILE_SCHEME).unwrap_or(uri))
}

/// Returns the modification time of `path`, or `None` when it cannot be read.
pub(crate) fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Outcome of checking a candidate against its slot.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum Verdict {
    /// Not quarantined.
    Usable,
    /// Quarantined, but the file changed since; the slot has been cleared.
    Renewed,
    /// Quarantined and unchanged.
    Quarantined,
}

#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub(crate) struct Quarantine {
    slots: [Option<SystemTime>; LIST_MAX],
}

impl Quarantine {
    /// Quarantines `ordinal` at `mtime`; `None` clears the slot instead.
    pub(crate) fn mark(&mut self, ordinal: usize, mtime: Option<SystemTime>) {
        if let Some(slot) = self.slots.get_mut(ordinal) {
            *slot = mtime;
        }
    }

    pub(crate) fn clear(&mut self, ordinal: usize) {
        self.mark(ordinal, None);
    }

    pub(crate) fn is_quarantined(&self, ordinal: usize) -> bool {
        matches!(self.slots.get(ordinal), Some(Some(_)))
    }

    /// Checks a candidate whose file currently has `current` as its modification time.
    pub(crate) fn check(&mut self, ordinal: usize, current: SystemTime) -> Verdict {
        let Some(slot) = self.slots.get_mut(ordinal) else {
            return Verdict::Usable;
        };
        match *slot {
            None => Verdict::Usable,
            Some(bad) if bad == current => Verdict::Quarantined,
            Some(_) => {
                *slot = None;
                Verdict::Renewed
            }
        }
    }
}
