//! Logic-failure reporting.
//!
//! The original editor distinguishes two failure modes: a `runtime_check` that aborts
//! the process on a violated invariant, and ordinary user-visible errors (bad filename,
//! empty killring, ...) that get displayed in the status line and never unwind anything.
//! We keep that split: [`RuntimeCheckFailure`] is the Rust analogue of
//! `runtime_check_failure`, propagated as an `anyhow::Result` at crate boundaries and
//! intended to terminate the process (the binary crate maps it to exit code 1).

use thiserror::Error;

/// An invariant the core logic assumes always holds was violated.
///
/// Carries a message for logs, but per the original `runtime_check_failure`, callers
/// should not attempt to recover from it programmatically -- there is no information in
/// it worth inspecting beyond the log line already emitted at the call site.
#[derive(Debug, Error)]
#[error("runtime check failed: {0}")]
pub struct RuntimeCheckFailure(pub String);

/// Fails with a [`RuntimeCheckFailure`] if `cond` is false, logging via `tracing::error!`
/// first. Mirrors `runtime_check`/`logic_check` in the original `error.hpp`.
#[macro_export]
macro_rules! logic_check {
    ($cond:expr, $($arg:tt)*) => {
        if !($cond) {
            let msg = format!($($arg)*);
            tracing::error!(target: "core_text::logic_check", "{}", msg);
            return Err(anyhow::Error::new($crate::error::RuntimeCheckFailure(msg)));
        }
    };
}

/// Like [`logic_check!`] but with a fixed message naming only the failing condition,
/// mirroring the original `logic_checkg` (the "g" variants that skip a custom message).
#[macro_export]
macro_rules! logic_checkg {
    ($cond:expr) => {
        $crate::logic_check!($cond, "failed condition: {}", stringify!($cond))
    };
}
