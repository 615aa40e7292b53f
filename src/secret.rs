//! Secret storage and the boundary to the credential store.

use crate::limits::{check_fits, FieldKind, SECRET_MAX};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// A certificate passcode held in a fixed-capacity buffer.
///
/// The buffer never reallocates, is wiped whenever the value is released and
/// when dropped. `Debug` only shows the length. Not `Clone`: the only copy
/// lives in the handle that wipes it.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Secret {
    buf: [u8; SECRET_MAX],
    len: usize,
}

impl Secret {
    pub(crate) const fn new() -> Self {
        Self {
            buf: [0; SECRET_MAX],
            len: 0,
        }
    }

    /// Returns the secret bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Returns the secret as text, or `None` if it is not valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(self.as_bytes()).ok()
    }

    /// Returns the length of the secret in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when no secret is held.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Replaces the held value with `value` minus one trailing newline.
    ///
    /// On failure the buffer is left wiped and the exclusive bound is returned.
    pub(crate) fn fill(&mut self, value: &[u8]) -> Result<(), usize> {
        self.zeroize();
        let value = value.strip_suffix(b"\n").unwrap_or(value);
        check_fits(FieldKind::Secret, value.len())?;
        self.buf[..value.len()].copy_from_slice(value);
        self.len = value.len();
        Ok(())
    }

    /// Returns a guard that wipes this secret when dropped.
    pub(crate) fn wipe_guard(&mut self) -> WipeGuard<'_> {
        WipeGuard {
            secret: self,
            armed: true,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_wiped(&self) -> bool {
        self.len == 0 && self.buf.iter().all(|&b| b == 0)
    }
}

impl Default for Secret {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret").field("len", &self.len).finish()
    }
}

/// Wipes the borrowed secret on scope exit unless disarmed.
pub(crate) struct WipeGuard<'a> {
    secret: &'a mut Secret,
    armed: bool,
}

impl WipeGuard<'_> {
    pub(crate) fn secret(&mut self) -> &mut Secret {
        self.secret
    }

    /// Keeps the secret; used on the one path that hands it to the caller.
    pub(crate) fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for WipeGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.secret.zeroize();
        }
    }
}

/// Errors returned by a [`SecretResolver`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResolveError {
    /// The credential store has no value for the reference.
    #[error("no credential for reference {reference:?}")]
    NotFound {
        /// The reference that was looked up.
        reference: String,
    },

    /// The credential store could not be read.
    #[error("failed to read credential {reference:?}: {source}")]
    Io {
        /// The reference that was looked up.
        reference: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The stored value is larger than the resolver accepts.
    #[error("credential {reference:?} exceeds {limit} bytes")]
    TooLarge {
        /// The reference that was looked up.
        reference: String,
        /// The size bound.
        limit: usize,
    },
}

/// Resolves a credential reference from the configuration file into secret bytes.
///
/// Implementations must not log the returned value. A single trailing newline
/// in the returned bytes is ignored by the caller.
///
/// # Example
///
/// ```
/// use certselector::{ResolveError, SecretResolver};
/// use zeroize::Zeroizing;
///
/// #[derive(Debug)]
/// struct Fixed;
///
/// impl SecretResolver for Fixed {
///     fn resolve(&self, reference: &str) -> Result<Zeroizing<Vec<u8>>, ResolveError> {
///         match reference {
///             "pc1" => Ok(Zeroizing::new(b"pc1pass".to_vec())),
///             _ => Err(ResolveError::NotFound { reference: reference.to_owned() }),
///         }
///     }
/// }
/// ```
pub trait SecretResolver: Send + Sync + 'static {
    /// Returns the secret stored under `reference`.
    fn resolve(&self, reference: &str) -> Result<Zeroizing<Vec<u8>>, ResolveError>;
}

impl<F> SecretResolver for F
where
    F: Fn(&str) -> Result<Zeroizing<Vec<u8>>, ResolveError> + Send + Sync + 'static,
{
    fn resolve(&self, reference: &str) -> Result<Zeroizing<Vec<u8>>, ResolveError> {
        self(reference)
    }
}

/// Upper bound on a credential file read by [`FileSecretResolver`].
pub const MAX_CREDENTIAL_FILE: usize = 4096;

/// Resolver that treats each reference as the path of a file holding the secret.
///
/// Relative references are resolved against the base directory when one is set.
#[derive(Debug, Clone, Default)]
pub struct FileSecretResolver {
    base_dir: Option<PathBuf>,
}

impl FileSecretResolver {
    /// Creates a resolver that uses references as paths unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver that resolves relative references against `base_dir`.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn path_for(&self, reference: &str) -> PathBuf {
        match &self.base_dir {
            Some(base) => base.join(reference),
            None => Path::new(reference).to_path_buf(),
        }
    }
}

impl SecretResolver for FileSecretResolver {
    fn resolve(&self, reference: &str) -> Result<Zeroizing<Vec<u8>>, ResolveError> {
        let path = self.path_for(reference);
        let file = File::open(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ResolveError::NotFound {
                reference: reference.to_owned(),
            },
            _ => ResolveError::Io {
                reference: reference.to_owned(),
                source: e,
            },
        })?;

        // Sized up front so the secret is never copied by a reallocation.
        let mut value = Zeroizing::new(Vec::with_capacity(MAX_CREDENTIAL_FILE + 1));
        file.take(MAX_CREDENTIAL_FILE as u64 + 1)
            .read_to_end(&mut value)
            .map_err(|source| ResolveError::Io {
                reference: reference.to_owned(),
                source,
            })?;
        if value.len() > MAX_CREDENTIAL_FILE {
            return Err(ResolveError::TooLarge {
                reference: reference.to_owned(),
                limit: MAX_CREDENTIAL_FILE,
            });
        }
        Ok(value)
    }
}
