#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

//! Client certificate selection with failover for mutual TLS.
//!
//! A configuration file maps certificate *groups* to an ordered list of
//! certificates, each with a reference to its passcode in a credential store.
//! [`CertSelector`] hands out the first usable certificate of a group and,
//! when a connection fails because of the certificate, quarantines it and
//! moves on to the next one. A quarantined certificate becomes eligible again
//! as soon as its file changes on disk, so a renewed certificate is picked up
//! without restarting the process.
//!
//! ## Selecting a certificate
//!
//! ```no_run
//! use certselector::{CertSelector, RetryDecision};
//!
//! # fn perform_request(_uri: &str, _passcode: &[u8]) -> u32 { 0 }
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut selector = CertSelector::new(
//!     "/etc/ssl/certsel/certsel.cfg",
//!     "/etc/ssl/certsel/hrot.properties",
//!     "MTLS",
//! )?;
//!
//! loop {
//!     let creds = selector.get_cert()?;
//!     let code = perform_request(creds.uri(), creds.passcode().as_bytes());
//!     match selector.set_curl_status(code, "https://example.com/api") {
//!         RetryDecision::TryAnother => continue,
//!         _ => break,
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Looking a certificate up by label
//!
//! ```no_run
//! use certselector::CertLocator;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut locator = CertLocator::new(
//!     "/etc/ssl/certsel/certsel.cfg",
//!     "/etc/ssl/certsel/hrot.properties",
//! )?;
//! let creds = locator.locate_cert("DEVICE")?;
//! println!("{}", creds.uri());
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **`logging`** (default): log records through the `log` crate.
//! - **`tracing`**: emit `tracing` events instead.

pub mod cert_locator;
pub mod constants;
pub mod error;
pub mod limits;
pub mod secret;
pub mod selector;

mod config;
mod locator;
mod observability;
mod prelude;
mod quarantine;

// -----------------------------------------------------------------------------
// Re-exports
// -----------------------------------------------------------------------------

pub use crate::cert_locator::CertLocator;
pub use crate::error::{CertSelectorError, ConfigError, ErrorKind};
pub use crate::limits::FieldKind;
pub use crate::secret::{FileSecretResolver, ResolveError, Secret, SecretResolver};
pub use crate::selector::{
    CertCredentials, CertSelector, CertSelectorBuilder, CurlOutcome, RetryDecision,
    SelectorState, CURLE_OK,
};
