use std::fmt;

/// Position of a [`CertSelector`](crate::CertSelector) in its checkout/report cycle.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum SelectorState {
    /// Not initialized, or destroyed.
    Unknown,
    /// A certificate may be checked out.
    ReadyToGiveCert,
    /// A certificate is checked out and its outcome must be reported.
    ReadyToCheckCert,
    /// Every candidate of the group has been reported bad.
    ///
    /// Advisory: a later checkout scans the group again from the first ordinal.
    NoCert,
}

impl SelectorState {
    /// Returns a stable string representation of the state.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::ReadyToGiveCert => "ready_to_give_cert",
            Self::ReadyToCheckCert => "ready_to_check_cert",
            Self::NoCert => "no_cert",
        }
    }

    /// Returns the numeric state code.
    pub const fn code(self) -> u16 {
        match self {
            Self::Unknown => 200,
            Self::ReadyToGiveCert => 201,
            Self::ReadyToCheckCert => 202,
            Self::NoCert => 203,
        }
    }
}

impl fmt::Display for SelectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
