//! Unified error types for the boiler bridge.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level loop's error handling uniform. All variants are `Copy` so they
//! can be passed through the controller and event sinks without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The controller entered a terminal fault state.
    Safety(SafetyFault),
    /// Configuration is invalid or could not be parsed.
    Config(ConfigError),
    /// A learned-code table could not be parsed.
    Registry(RegistryError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safety(e) => write!(f, "safety: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Registry(e) => write!(f, "registry: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Safety faults
// ---------------------------------------------------------------------------

/// Terminal controller faults.
///
/// Both are permanent: once the controller reports one it never actuates the
/// servo again until the process is restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SafetyFault {
    /// The change quota for the current window was exhausted.
    RateLimitReached,
    /// The button was pressed (with retries) but the boiler never followed.
    PressFailed,
}

impl SafetyFault {
    /// Owner-facing fault text, published verbatim on the fault topic.
    pub const fn message(self) -> &'static str {
        match self {
            Self::RateLimitReached => "rate limit reached",
            Self::PressFailed => "button press failed to change boiler state",
        }
    }
}

impl fmt::Display for SafetyFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl From<SafetyFault> for Error {
    fn from(e: SafetyFault) -> Self {
        Self::Safety(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration document is not valid JSON for [`SystemConfig`](crate::config::SystemConfig).
    Malformed,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed configuration"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Registry errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// The code table is not valid JSON.
    Malformed,
    /// The top-level value is not an object.
    ExpectedObject,
    /// An entry is not an array of the expected number of integers.
    BadEntry,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "bad JSON"),
            Self::ExpectedObject => write!(f, "expected an object"),
            Self::BadEntry => write!(f, "entry is not an array of integers"),
        }
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
