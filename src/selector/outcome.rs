//! Classification of connection outcome codes.
//!
//! Codes are the numeric result codes of the transfer library (libcurl's
//! `CURLcode`), where `0` is success.

use std::fmt;

/// Outcome code of a successful transfer.
pub const CURLE_OK: u32 = 0;

// Sorted; searched with `binary_search`.
const CERT_ERRORS: [u32; 10] = [
    35, // SSL_CONNECT_ERROR
    53, // SSL_ENGINE_NOTFOUND
    54, // SSL_ENGINE_SETFAILED
    58, // SSL_CERTPROBLEM
    59, // SSL_CIPHER
    66, // SSL_ENGINE_INITFAILED
    80, // SSL_SHUTDOWN_FAILED
    83, // SSL_ISSUER_ERROR
    90, // SSL_PINNEDPUBKEYNOTMATCH
    91, // SSL_INVALIDCERTSTATUS
];

/// How an outcome code bears on the certificate that was used.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CurlOutcome {
    /// The connection succeeded.
    Success,
    /// The failure implicates the local certificate.
    CertError,
    /// The failure is unrelated to the local certificate.
    Other,
}

impl CurlOutcome {
    /// Classifies an outcome code.
    pub fn classify(code: u32) -> Self {
        if code == CURLE_OK {
            Self::Success
        } else if CERT_ERRORS.binary_search(&code).is_ok() {
            Self::CertError
        } else {
            Self::Other
        }
    }
}

/// What the caller should do after reporting an outcome.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum RetryDecision {
    /// Stop: the connection succeeded, failed for another reason, or no
    /// certificate is left to try.
    NoRetry,
    /// Retry the connection with the next certificate.
    TryAnother,
    /// The report itself was invalid (protocol misuse or internal error).
    RetryError,
}

impl RetryDecision {
    /// Returns a stable string representation of the decision.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoRetry => "no_retry",
            Self::TryAnother => "try_another",
            Self::RetryError => "retry_error",
        }
    }

    /// Returns the numeric decision code.
    pub const fn code(self) -> u16 {
        match self {
            Self::NoRetry => 100,
            Self::TryAnother => 101,
            Self::RetryError => 102,
        }
    }
}

impl fmt::Display for RetryDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
