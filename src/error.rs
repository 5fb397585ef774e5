//! Error types raised by registration and dispatch.
//!
//! [`EmitterError`] covers the fatal conditions the emitter itself can
//! raise. These are contract violations on the caller's side, so the
//! offending flow is aborted with the formatted error instead of receiving
//! it as a return value: [`Emitter::add_listener`](crate::Emitter::add_listener)
//! panics on an unknown mode, and a unary handler scheduled against an
//! empty payload aborts its own task at dispatch time (sibling handlers of
//! the same emission keep running and the emission's
//! [`Completion`](crate::Completion) still resolves).

use thiserror::Error;

/// # Fatal conditions on the registration and dispatch paths.
///
/// The third kind of contract violation — a handler downcasting a payload
/// value to the wrong concrete type — happens inside handler code, which
/// the emitter does not protect against; see
/// [`Value::expect_ref`](crate::Value::expect_ref).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmitterError {
    /// Registration mode string matched neither `ON` nor `ONCE`.
    #[error("invalid emit type: {mode}")]
    InvalidMode {
        /// The rejected mode string, as passed by the caller.
        mode: String,
    },

    /// A unary handler was dispatched while the emission carried no payload.
    #[error("handler for \"{event}\" expects a payload value, but the emission carried none")]
    MissingPayload {
        /// Name of the emitted event.
        event: String,
    },
}

impl EmitterError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use evoke::EmitterError;
    ///
    /// let err = EmitterError::InvalidMode { mode: "SOMETIMES".into() };
    /// assert_eq!(err.as_label(), "invalid_mode");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            EmitterError::InvalidMode { .. } => "invalid_mode",
            EmitterError::MissingPayload { .. } => "missing_payload",
        }
    }
}
