//! Stateless certificate lookup by label.

use crate::config::{self, CertEntry};
use crate::constants::FIELD_DELIMITER;
use crate::error::{CertSelectorError, ConfigError};
use crate::limits::{validate_argument, FieldKind};
use crate::locator::{locate_by_label, LocateError};
use crate::prelude::{debug, error, warn};
use crate::quarantine::{cert_path, modified_time};
use crate::secret::{FileSecretResolver, Secret, SecretResolver};
use crate::CertCredentials;
use std::fmt;
use std::path::{Path, PathBuf};
use zeroize::Zeroize;

/// Looks certificates up by label, without failover or quarantine.
///
/// Each call re-reads the configuration file. The passcode of the last lookup
/// is held until the next lookup or [`CertLocator::destroy`].
pub struct CertLocator {
    live: bool,
    config_path: PathBuf,
    engine: Option<String>,
    secret: Secret,
    current: Option<CertEntry>,
    resolver: Box<dyn SecretResolver>,
}

impl fmt::Debug for CertLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertLocator")
            .field("live", &self.live)
            .field("config_path", &self.config_path)
            .field("engine", &self.engine)
            .field("secret", &self.secret)
            .field("current", &self.current)
            .field("resolver", &"<SecretResolver>")
            .finish()
    }
}

impl CertLocator {
    /// Creates a locator reading passcodes with [`FileSecretResolver`].
    ///
    /// # Errors
    ///
    /// Fails if the config path is empty or too long, or names no file.
    pub fn new(
        config_path: impl Into<PathBuf>,
        properties_path: impl AsRef<Path>,
    ) -> Result<Self, CertSelectorError> {
        Self::with_resolver(config_path, properties_path, FileSecretResolver::new())
    }

    /// Creates a locator that resolves passcodes with `resolver`.
    pub fn with_resolver<R: SecretResolver>(
        config_path: impl Into<PathBuf>,
        properties_path: impl AsRef<Path>,
        resolver: R,
    ) -> Result<Self, CertSelectorError> {
        let config_path = config_path.into();
        validate_argument(FieldKind::ConfigPath, &config_path.to_string_lossy(), &[])?;
        if !config_path.is_file() {
            return Err(CertSelectorError::Config(ConfigError::NotFound {
                path: config_path,
            }));
        }

        let engine = config::read_engine(properties_path.as_ref());
        debug!(
            "certificate locator for {} (engine: {})",
            config_path.display(),
            engine.as_deref().unwrap_or("none")
        );
        Ok(Self {
            live: true,
            config_path,
            engine,
            secret: Secret::new(),
            current: None,
            resolver: Box::new(resolver),
        })
    }

    /// Returns the URI and passcode of the certificate labelled `label`.
    ///
    /// # Errors
    ///
    /// - [`CertSelectorError::InvalidHandle`] after [`CertLocator::destroy`].
    /// - An argument error for an empty, overlong or comma-bearing label.
    /// - [`CertSelectorError::LabelNotFound`] if no line carries the label.
    /// - [`CertSelectorError::CertFileMissing`] if the certificate file does not exist.
    /// - [`CertSelectorError::CredentialUnavailable`] if the passcode cannot be resolved.
    /// - [`CertSelectorError::Config`] if the configuration is missing or malformed.
    pub fn locate_cert(&mut self, label: &str) -> Result<CertCredentials<'_>, CertSelectorError> {
        if !self.live {
            return Err(CertSelectorError::InvalidHandle);
        }
        self.secret.zeroize();
        self.current = None;
        validate_argument(FieldKind::Label, label, &[FIELD_DELIMITER])?;

        let entry = locate_by_label(&self.config_path, label).map_err(|e| match e {
            LocateError::NotFound => {
                debug!("no certificate labelled {:?}", label);
                CertSelectorError::LabelNotFound {
                    label: label.to_owned(),
                }
            }
            LocateError::Config(e) => {
                error!("failed to read {}: {}", self.config_path.display(), e);
                CertSelectorError::Config(e)
            }
        })?;

        let path = cert_path(entry.uri());
        if modified_time(path).is_none() {
            warn!("certificate file {} for {:?} is missing", path.display(), label);
            return Err(CertSelectorError::CertFileMissing {
                path: path.to_path_buf(),
            });
        }

        let resolved = self
            .resolver
            .resolve(entry.credential_ref())
            .map_err(|e| {
                debug!("credential lookup failed: {}", e);
                CertSelectorError::CredentialUnavailable {
                    label: label.to_owned(),
                }
            })?;
        self.secret
            .fill(&resolved)
            .map_err(|_| CertSelectorError::CredentialUnavailable {
                label: label.to_owned(),
            })?;

        debug!("located {} for {:?}", entry.uri(), label);
        let entry = self.current.insert(entry);
        Ok(CertCredentials::new(entry.uri(), &self.secret))
    }

    /// Returns the hardware engine name, if one is configured.
    pub fn engine(&self) -> Option<&str> {
        if !self.live {
            return None;
        }
        self.engine.as_deref()
    }

    /// Wipes the held passcode and invalidates the handle.
    ///
    /// Safe to call more than once; also runs on drop.
    pub fn destroy(&mut self) {
        if !self.live {
            return;
        }
        self.secret.zeroize();
        self.current = None;
        self.engine = None;
        self.live = false;
    }
}

impl Drop for CertLocator {
    fn drop(&mut self) {
        self.destroy();
    }
}
