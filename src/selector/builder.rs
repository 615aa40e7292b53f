use super::CertSelector;
use crate::constants::{DEFAULT_CONFIG_PATH, DEFAULT_PROPERTIES_PATH};
use crate::error::CertSelectorError;
use crate::limits::FieldKind;
use crate::secret::{FileSecretResolver, SecretResolver};
use std::fmt;
use std::path::PathBuf;

/// Builder for [`CertSelector`].
///
/// Only the group is required. The configuration and properties paths default
/// to the system locations and the credential store defaults to
/// [`FileSecretResolver`].
///
/// # Example
///
/// ```no_run
/// use certselector::{CertSelector, FileSecretResolver};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let selector = CertSelector::builder()
///     .group("MTLS")
///     .config_path("/etc/ssl/certsel/certsel.cfg")
///     .secret_resolver(FileSecretResolver::with_base_dir("/etc/ssl/certsel"))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct CertSelectorBuilder {
    config_path: PathBuf,
    properties_path: PathBuf,
    group: Option<String>,
    resolver: Option<Box<dyn SecretResolver>>,
}

impl fmt::Debug for CertSelectorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertSelectorBuilder")
            .field("config_path", &self.config_path)
            .field("properties_path", &self.properties_path)
            .field("group", &self.group)
            .field(
                "resolver",
                &self.resolver.as_ref().map(|_| "<SecretResolver>"),
            )
            .finish()
    }
}

impl Default for CertSelectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CertSelectorBuilder {
    /// Creates a builder with the default paths and no group.
    pub fn new() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            properties_path: PathBuf::from(DEFAULT_PROPERTIES_PATH),
            group: None,
            resolver: None,
        }
    }

    /// Sets the certificate group to select from.
    #[must_use]
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Sets the configuration file path.
    #[must_use]
    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = path.into();
        self
    }

    /// Sets the engine properties file path.
    #[must_use]
    pub fn properties_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.properties_path = path.into();
        self
    }

    /// Sets the credential store used to resolve passcodes.
    #[must_use]
    pub fn secret_resolver<R: SecretResolver>(mut self, resolver: R) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// Builds the selector.
    ///
    /// # Errors
    ///
    /// - [`CertSelectorError::EmptyArgument`], [`CertSelectorError::ReservedCharacter`]
    ///   or [`CertSelectorError::TooLong`] for an invalid group or config path.
    /// - [`CertSelectorError::Config`] if the configuration file is missing or the
    ///   first entry of the group is malformed.
    /// - [`CertSelectorError::GroupExhausted`] if the group has no entry at all.
    pub fn build(self) -> Result<CertSelector, CertSelectorError> {
        let group = self
            .group
            .ok_or(CertSelectorError::EmptyArgument {
                field: FieldKind::Group,
            })?;
        let resolver = self
            .resolver
            .unwrap_or_else(|| Box::new(FileSecretResolver::new()));
        CertSelector::create(self.config_path, &self.properties_path, group, resolver)
    }
}
