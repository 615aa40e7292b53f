//! Crate-internal logging macros.
//!
//! Backend selection:
//! 1) `tracing` feature => `tracing` events
//! 2) `logging` feature => `log` records
//! 3) neither => no-op; the format arguments are still type-checked
//!
//! Secrets never go through these macros. Credential references are only
//! emitted at debug level.

#[allow(unused_macros)]
macro_rules! emit {
    ($level:ident, $($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        { tracing::$level!(target: "certselector", $($arg)*); }

        #[cfg(all(not(feature = "tracing"), feature = "logging"))]
        { log::$level!(target: "certselector", $($arg)*); }

        #[cfg(all(not(feature = "tracing"), not(feature = "logging")))]
        { let _ = format_args!($($arg)*); }
    }};
}

#[allow(unused_macros)]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::observability::emit!(debug, $($arg)*) };
}

#[allow(unused_macros)]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::observability::emit!(info, $($arg)*) };
}

#[allow(unused_macros)]
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::observability::emit!(warn, $($arg)*) };
}

#[allow(unused_macros)]
macro_rules! log_error {
    ($($arg:tt)*) => { $crate::observability::emit!(error, $($arg)*) };
}

pub(crate) use emit;
pub(crate) use log_debug;
pub(crate) use log_error;
pub(crate) use log_info;
pub(crate) use log_warn;
