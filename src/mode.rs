//! # Registration modes.
//!
//! Two modes, a closed set: [`Mode::On`] persists across emissions,
//! [`Mode::Once`] fires on the next emission of its event and is then
//! discarded. Handlers registered under different modes for the same event
//! name are tracked independently and never share a sequence.
//!
//! The string form accepted by
//! [`Emitter::add_listener`](crate::Emitter::add_listener) is matched
//! case-insensitively against the canonical `"ON"` / `"ONCE"`.

use std::fmt;
use std::str::FromStr;

use crate::error::EmitterError;

/// How a registration survives emissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Fires every time its event is emitted.
    On,
    /// Fires on the next emission of its event; the whole `Once` batch for
    /// that event is discarded together when that emission is scheduled.
    Once,
}

impl Mode {
    /// Submission order within one emission: `On` handlers are scheduled
    /// before `Once` handlers.
    pub(crate) const DISPATCH_ORDER: [Mode; 2] = [Mode::On, Mode::Once];

    /// Canonical upper-case form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::On => "ON",
            Mode::Once => "ONCE",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = EmitterError;

    /// Parses a mode string, ignoring ASCII case.
    ///
    /// # Example
    /// ```
    /// use evoke::Mode;
    ///
    /// assert_eq!("once".parse::<Mode>().unwrap(), Mode::Once);
    /// assert_eq!("On".parse::<Mode>().unwrap(), Mode::On);
    /// assert!("sometimes".parse::<Mode>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("ON") {
            Ok(Mode::On)
        } else if s.eq_ignore_ascii_case("ONCE") {
            Ok(Mode::Once)
        } else {
            Err(EmitterError::InvalidMode {
                mode: s.to_string(),
            })
        }
    }
}
