//! Stateful certificate selection with failover.
//!
//! A [`CertSelector`] walks the entries of one group of the configuration
//! file in file order. Each connection attempt checks a certificate out with
//! [`CertSelector::get_cert`] and reports the outcome with
//! [`CertSelector::set_curl_status`]. Certificates that fail with a
//! certificate-related error are quarantined until their file changes.
//!
//! The selector is not internally synchronized; `&mut self` on every
//! operation keeps one caller at a time.

mod builder;
mod outcome;
mod state;

pub use builder::CertSelectorBuilder;
pub use outcome::{CurlOutcome, RetryDecision, CURLE_OK};
pub use state::SelectorState;

use crate::config::{self, CertEntry};
use crate::constants::{FIELD_DELIMITER, GROUP_DELIMITER};
use crate::error::CertSelectorError;
use crate::limits::{check_fits, validate_argument, FieldKind, LIST_MAX};
use crate::locator::{locate_in_group, LocateError};
use crate::prelude::{debug, error, info, warn};
use crate::quarantine::{cert_path, modified_time, Quarantine, Verdict};
use crate::secret::{FileSecretResolver, Secret, SecretResolver};
use std::fmt;
use std::path::{Path, PathBuf};
use zeroize::Zeroize;

const LIVE_TAG: u32 = 0x6365_7274;
const RELEASED_TAG: u32 = 0;

/// A certificate URI and its passcode, borrowed from the handle that produced them.
///
/// The borrow ends before the outcome can be reported, and reporting wipes
/// the passcode.
#[derive(Debug, Clone, Copy)]
pub struct CertCredentials<'a> {
    uri: &'a str,
    passcode: &'a Secret,
}

impl<'a> CertCredentials<'a> {
    pub(crate) fn new(uri: &'a str, passcode: &'a Secret) -> Self {
        Self { uri, passcode }
    }

    /// Returns the certificate URI as written in the configuration file.
    pub fn uri(&self) -> &'a str {
        self.uri
    }

    /// Returns the passcode of the certificate.
    pub fn passcode(&self) -> &'a Secret {
        self.passcode
    }
}

// Where the selector is in the group: the ordinal and the entry it names.
#[derive(Debug)]
struct Cursor {
    config_path: PathBuf,
    group: String,
    index: usize,
    candidate: Option<CertEntry>,
}

impl Cursor {
    fn locate(&mut self) -> Result<(), LocateError> {
        self.candidate = None;
        self.candidate = Some(locate_in_group(&self.config_path, &self.group, self.index)?);
        Ok(())
    }

    fn advance(&mut self) -> Result<(), LocateError> {
        self.index += 1;
        self.locate()
    }

    fn rewind(&mut self) -> Result<(), LocateError> {
        self.index = 0;
        self.locate()
    }

    fn reset(&mut self) {
        self.index = 0;
        self.candidate = None;
    }

    // Ends a search that found nothing usable.
    fn give_up(&mut self, err: LocateError) -> CertSelectorError {
        self.reset();
        match err {
            LocateError::NotFound => {
                warn!("no usable certificate left in group {:?}", self.group);
                CertSelectorError::GroupExhausted {
                    group: self.group.clone(),
                }
            }
            LocateError::Config(e) => {
                error!("failed to read {}: {}", self.config_path.display(), e);
                CertSelectorError::Config(e)
            }
        }
    }
}

/// Selects client certificates for one group and fails over between them.
///
/// # Example
///
/// ```no_run
/// use certselector::{CertSelector, RetryDecision};
///
/// # fn connect(_uri: &str, _passcode: &[u8]) -> u32 { 0 }
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut selector = CertSelector::builder().group("MTLS").build()?;
///
/// loop {
///     let creds = selector.get_cert()?;
///     let code = connect(creds.uri(), creds.passcode().as_bytes());
///     if selector.set_curl_status(code, "https://example.com") != RetryDecision::TryAnother {
///         break;
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct CertSelector {
    tag: u32,
    state: SelectorState,
    cursor: Cursor,
    quarantine: Quarantine,
    secret: Secret,
    engine: Option<String>,
    resolver: Box<dyn SecretResolver>,
}

impl fmt::Debug for CertSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertSelector")
            .field("state", &self.state)
            .field("cursor", &self.cursor)
            .field("quarantine", &self.quarantine)
            .field("secret", &self.secret)
            .field("engine", &self.engine)
            .field("resolver", &"<SecretResolver>")
            .finish()
    }
}

impl CertSelector {
    /// Creates a selector for `group` reading passcodes with [`FileSecretResolver`].
    ///
    /// See [`CertSelectorBuilder::build`] for the errors.
    pub fn new(
        config_path: impl Into<PathBuf>,
        properties_path: impl AsRef<Path>,
        group: impl Into<String>,
    ) -> Result<Self, CertSelectorError> {
        Self::create(
            config_path.into(),
            properties_path.as_ref(),
            group.into(),
            Box::new(FileSecretResolver::new()),
        )
    }

    /// Returns a builder with the default paths.
    pub fn builder() -> CertSelectorBuilder {
        CertSelectorBuilder::new()
    }

    pub(crate) fn create(
        config_path: PathBuf,
        properties_path: &Path,
        group: String,
        resolver: Box<dyn SecretResolver>,
    ) -> Result<Self, CertSelectorError> {
        validate_argument(FieldKind::Group, &group, &[FIELD_DELIMITER, GROUP_DELIMITER])?;
        validate_config_path(&config_path)?;

        let mut cursor = Cursor {
            config_path,
            group,
            index: 0,
            candidate: None,
        };
        cursor.locate().map_err(|e| cursor.give_up(e))?;

        let engine = config::read_engine(properties_path);
        info!(
            "certificate selector for group {:?} from {} (engine: {})",
            cursor.group,
            cursor.config_path.display(),
            engine.as_deref().unwrap_or("none")
        );

        Ok(Self {
            tag: LIVE_TAG,
            state: SelectorState::ReadyToGiveCert,
            cursor,
            quarantine: Quarantine::default(),
            secret: Secret::new(),
            engine,
            resolver,
        })
    }

    /// Checks out the next usable certificate of the group.
    ///
    /// Starting at the current ordinal, candidates whose file is missing, that
    /// are quarantined with an unchanged file, or whose passcode cannot be
    /// resolved are skipped. The selected certificate must be reported with
    /// [`CertSelector::set_curl_status`] before the next checkout.
    ///
    /// # Errors
    ///
    /// - [`CertSelectorError::InvalidHandle`] after [`CertSelector::destroy`].
    /// - [`CertSelectorError::InvalidState`] while a checked-out certificate is
    ///   still unreported.
    /// - [`CertSelectorError::GroupExhausted`] when no candidate is usable. The
    ///   next checkout starts over at the first ordinal.
    /// - [`CertSelectorError::Config`] when the configuration became unreadable
    ///   or malformed.
    pub fn get_cert(&mut self) -> Result<CertCredentials<'_>, CertSelectorError> {
        if self.tag != LIVE_TAG {
            error!("get_cert on a destroyed certificate selector");
            return Err(CertSelectorError::InvalidHandle);
        }
        match self.state {
            SelectorState::ReadyToGiveCert | SelectorState::NoCert => {}
            state => {
                error!("get_cert called in state {}", state);
                return Err(CertSelectorError::InvalidState { state });
            }
        }

        let mut guard = self.secret.wipe_guard();
        if let Err(e) = select(
            &mut self.cursor,
            &mut self.quarantine,
            self.resolver.as_ref(),
            guard.secret(),
        ) {
            self.state = SelectorState::ReadyToGiveCert;
            return Err(e);
        }
        guard.disarm();

        let Some(entry) = self.cursor.candidate.as_ref() else {
            return Err(CertSelectorError::InvalidState { state: self.state });
        };
        self.state = SelectorState::ReadyToCheckCert;
        debug!(
            "checked out {} (ordinal {}) for group {:?}",
            entry.uri(),
            self.cursor.index,
            self.cursor.group
        );
        Ok(CertCredentials::new(entry.uri(), &self.secret))
    }

    /// Reports the outcome of a connection made with the checked-out certificate.
    ///
    /// `curl_code` is the transfer result code; `endpoint` only labels log
    /// records. The passcode is wiped on every path, including rejected calls.
    ///
    /// - success clears the certificate's quarantine and makes the first
    ///   ordinal current again;
    /// - a certificate error quarantines it at its current modification time
    ///   and moves to the next ordinal, returning
    ///   [`RetryDecision::TryAnother`], or [`RetryDecision::NoRetry`] with the
    ///   state [`SelectorState::NoCert`] when the group is exhausted;
    /// - any other failure keeps the certificate current.
    ///
    /// Calling it without a checked-out certificate returns
    /// [`RetryDecision::RetryError`].
    pub fn set_curl_status(&mut self, curl_code: u32, endpoint: &str) -> RetryDecision {
        let _wipe = self.secret.wipe_guard();
        if self.tag != LIVE_TAG {
            error!("set_curl_status on a destroyed certificate selector");
            return RetryDecision::RetryError;
        }
        if self.state != SelectorState::ReadyToCheckCert {
            error!("set_curl_status called in state {}", self.state);
            return RetryDecision::RetryError;
        }

        let index = self.cursor.index;
        if index >= LIST_MAX {
            error!("certificate ordinal {} out of range", index);
            return RetryDecision::RetryError;
        }

        match CurlOutcome::classify(curl_code) {
            CurlOutcome::Success => {
                self.quarantine.clear(index);
                if index != 0 {
                    if let Err(e) = self.cursor.rewind() {
                        error!(
                            "cannot restore first certificate of group {:?}: {}",
                            self.cursor.group, e
                        );
                        self.state = SelectorState::NoCert;
                        return RetryDecision::RetryError;
                    }
                }
                self.state = SelectorState::ReadyToGiveCert;
                RetryDecision::NoRetry
            }
            CurlOutcome::CertError => {
                let uri = self.cursor.candidate.as_ref().map(CertEntry::uri);
                error!(
                    "certificate error {} connecting to {} with {}",
                    curl_code,
                    endpoint,
                    uri.unwrap_or("<none>")
                );
                let mtime = uri.and_then(|uri| modified_time(cert_path(uri)));
                self.quarantine.mark(index, mtime);

                match self.cursor.advance() {
                    Ok(()) => {
                        self.state = SelectorState::ReadyToGiveCert;
                        RetryDecision::TryAnother
                    }
                    Err(e) => {
                        if let LocateError::Config(e) = e {
                            error!("failed to read {}: {}", self.cursor.config_path.display(), e);
                        }
                        warn!("no more certificates in group {:?}", self.cursor.group);
                        self.cursor.reset();
                        self.state = SelectorState::NoCert;
                        RetryDecision::NoRetry
                    }
                }
            }
            CurlOutcome::Other => {
                info!(
                    "connection to {} failed with {}, not a certificate error",
                    endpoint, curl_code
                );
                self.state = SelectorState::ReadyToGiveCert;
                RetryDecision::NoRetry
            }
        }
    }

    /// Returns the hardware engine name, if one is configured.
    pub fn engine(&self) -> Option<&str> {
        if self.tag != LIVE_TAG {
            return None;
        }
        self.engine.as_deref()
    }

    /// Returns the current state.
    pub fn state(&self) -> SelectorState {
        self.state
    }

    /// Returns the current ordinal within the group.
    pub fn index(&self) -> usize {
        self.cursor.index
    }

    /// Returns the group this selector serves.
    pub fn group(&self) -> &str {
        &self.cursor.group
    }

    /// Returns the URI of the current candidate, if any.
    pub fn candidate_uri(&self) -> Option<&str> {
        self.cursor.candidate.as_ref().map(CertEntry::uri)
    }

    /// Reports whether `ordinal` is quarantined.
    pub fn is_quarantined(&self, ordinal: usize) -> bool {
        self.quarantine.is_quarantined(ordinal)
    }

    /// Wipes all secret-bearing state and invalidates the handle.
    ///
    /// Safe to call more than once; also runs on drop.
    pub fn destroy(&mut self) {
        if self.tag != LIVE_TAG {
            return;
        }
        self.secret.zeroize();
        self.cursor.reset();
        self.quarantine = Quarantine::default();
        self.engine = None;
        self.state = SelectorState::Unknown;
        self.tag = RELEASED_TAG;
        debug!("certificate selector for group {:?} destroyed", self.cursor.group);
    }

    #[cfg(test)]
    pub(crate) fn secret_is_wiped(&self) -> bool {
        self.secret.is_wiped()
    }
}

impl Drop for CertSelector {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn validate_config_path(path: &Path) -> Result<(), CertSelectorError> {
    let len = path.as_os_str().len();
    if len == 0 {
        return Err(CertSelectorError::EmptyArgument {
            field: FieldKind::ConfigPath,
        });
    }
    check_fits(FieldKind::ConfigPath, len).map_err(|limit| CertSelectorError::TooLong {
        field: FieldKind::ConfigPath,
        limit,
        actual: len,
    })
}

// Moves the cursor to the first usable candidate at or after its ordinal and
// leaves the candidate's passcode in `secret`.
fn select(
    cursor: &mut Cursor,
    quarantine: &mut Quarantine,
    resolver: &dyn SecretResolver,
    secret: &mut Secret,
) -> Result<(), CertSelectorError> {
    if cursor.candidate.is_none() {
        cursor.rewind().map_err(|e| cursor.give_up(e))?;
    }

    loop {
        let index = cursor.index;
        let Some(entry) = cursor.candidate.as_ref() else {
            return Err(cursor.give_up(LocateError::NotFound));
        };

        let path = cert_path(entry.uri());
        let usable = match modified_time(path) {
            None => {
                debug!("certificate file {} is missing", path.display());
                quarantine.clear(index);
                false
            }
            Some(mtime) => match quarantine.check(index, mtime) {
                Verdict::Usable => true,
                Verdict::Renewed => {
                    info!("certificate {} changed, trying it again", entry.uri());
                    true
                }
                Verdict::Quarantined => {
                    debug!("certificate {} is quarantined", entry.uri());
                    false
                }
            },
        };

        if usable {
            match resolver.resolve(entry.credential_ref()) {
                Ok(value) => match secret.fill(&value) {
                    Ok(()) => return Ok(()),
                    Err(limit) => warn!(
                        "passcode for {} exceeds {} bytes, skipping",
                        entry.label(),
                        limit
                    ),
                },
                Err(e) => {
                    debug!("credential lookup failed: {}", e);
                    warn!("no passcode for {}, skipping", entry.label());
                }
            }
        }

        cursor.advance().map_err(|e| cursor.give_up(e))?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::ResolveError;
    use std::fs;
    use tempfile::TempDir;
    use zeroize::Zeroizing;

    fn resolver(reference: &str) -> Result<Zeroizing<Vec<u8>>, ResolveError> {
        match reference {
            "pc1" => Ok(Zeroizing::new(b"pc1pass".to_vec())),
            "pc2" => Ok(Zeroizing::new(b"pc2pass\n".to_vec())),
            _ => Err(ResolveError::NotFound {
                reference: reference.to_owned(),
            }),
        }
    }

    fn fixture() -> (TempDir, CertSelector) {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.p12");
        let second = dir.path().join("second.p12");
        fs::write(&first, b"cert").unwrap();
        fs::write(&second, b"cert").unwrap();
        let config = format!(
            "GRP1,FRST,P12,file://{},pc1\nGRP1,SCND,P12,file://{},pc2\n",
            first.display(),
            second.display()
        );
        let config_path = dir.path().join("certsel.cfg");
        fs::write(&config_path, config).unwrap();

        let selector = CertSelector::builder()
            .group("GRP1")
            .config_path(config_path)
            .properties_path(dir.path().join("hrot.properties"))
            .secret_resolver(resolver)
            .build()
            .unwrap();
        (dir, selector)
    }

    #[test]
    fn test_report_wipes_secret() {
        let (_dir, mut selector) = fixture();
        let creds = selector.get_cert().unwrap();
        assert_eq!(creds.passcode().as_bytes(), b"pc1pass");
        assert!(!selector.secret_is_wiped());

        assert_eq!(selector.set_curl_status(CURLE_OK, "test"), RetryDecision::NoRetry);
        assert!(selector.secret_is_wiped());

        selector.get_cert().unwrap();
        assert!(!selector.secret_is_wiped());
        assert_eq!(selector.set_curl_status(58, "test"), RetryDecision::TryAnother);
        assert!(selector.secret_is_wiped());

        let creds = selector.get_cert().unwrap();
        assert_eq!(creds.passcode().as_bytes(), b"pc2pass");
        assert_eq!(selector.set_curl_status(58, "test"), RetryDecision::NoRetry);
        assert_eq!(selector.state(), SelectorState::NoCert);
        assert!(selector.secret_is_wiped());
    }

    #[test]
    fn test_unrestorable_first_entry_wipes_secret() {
        let (dir, mut selector) = fixture();
        selector.get_cert().unwrap();
        selector.set_curl_status(58, "test");
        selector.get_cert().unwrap();
        fs::remove_file(dir.path().join("certsel.cfg")).unwrap();

        assert_eq!(selector.set_curl_status(CURLE_OK, "test"), RetryDecision::RetryError);
        assert_eq!(selector.state(), SelectorState::NoCert);
        assert!(selector.secret_is_wiped());
    }

    #[test]
    fn test_rejected_report_wipes_secret() {
        let (_dir, mut selector) = fixture();
        selector.get_cert().unwrap();
        selector.set_curl_status(1, "test");
        selector.secret.fill(b"stale").unwrap();
        assert_eq!(selector.set_curl_status(1, "test"), RetryDecision::RetryError);
        assert!(selector.secret_is_wiped());
    }

    #[test]
    fn test_failed_checkout_wipes_secret() {
        let (dir, mut selector) = fixture();
        fs::remove_file(dir.path().join("first.p12")).unwrap();
        fs::remove_file(dir.path().join("second.p12")).unwrap();
        selector.secret.fill(b"stale").unwrap();

        let err = selector.get_cert().unwrap_err();
        assert!(matches!(err, CertSelectorError::GroupExhausted { .. }));
        assert!(selector.secret_is_wiped());
        assert_eq!(selector.index(), 0);
        assert_eq!(selector.candidate_uri(), None);
        assert_eq!(selector.state(), SelectorState::ReadyToGiveCert);
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let (_dir, mut selector) = fixture();
        selector.get_cert().unwrap();
        selector.destroy();
        assert!(selector.secret_is_wiped());
        assert_eq!(selector.candidate_uri(), None);
        assert_eq!(selector.state(), SelectorState::Unknown);
        selector.destroy();

        assert!(matches!(
            selector.get_cert(),
            Err(CertSelectorError::InvalidHandle)
        ));
        assert_eq!(selector.set_curl_status(0, "test"), RetryDecision::RetryError);
        assert_eq!(selector.engine(), None);
    }
}
