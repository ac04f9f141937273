/// Per-slot result reporting
///
/// Every operation that tries to produce both the action and the use sound
/// reports one [`Outcome`] per slot, bundled in an [`OutcomeResult`].
use std::fmt;

use serde::Serialize;

use crate::error::AudioError;

/// Result of producing a single slot's sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Outcome {
    /// Sound loaded (or handle accepted)
    Ok,

    /// No custom sound configured for this slot. Not a failure.
    Empty,

    /// No matching audio file
    ErrFileNotFound,

    /// The item identifier could not be resolved
    ErrUnknownItem,

    /// The item already has an entry
    ErrAlreadyExists,

    /// Backend or internal failure
    ErrUnknown,
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok)
    }

    /// True for every variant except `Ok` and `Empty`
    pub fn is_error(&self) -> bool {
        !matches!(self, Outcome::Ok | Outcome::Empty)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Ok => write!(f, "ok"),
            Outcome::Empty => write!(f, "empty"),
            Outcome::ErrFileNotFound => write!(f, "file not found"),
            Outcome::ErrUnknownItem => write!(f, "unknown item"),
            Outcome::ErrAlreadyExists => write!(f, "already exists"),
            Outcome::ErrUnknown => write!(f, "unknown error"),
        }
    }
}

impl From<&AudioError> for Outcome {
    fn from(err: &AudioError) -> Self {
        match err {
            AudioError::FileNotFound { .. } => Outcome::ErrFileNotFound,
            _ => Outcome::ErrUnknown,
        }
    }
}

/// Outcome of an operation touching both slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct OutcomeResult {
    pub action: Outcome,
    #[serde(rename = "use")]
    pub use_: Outcome,
}

impl OutcomeResult {
    pub fn new(action: Outcome, use_: Outcome) -> Self {
        Self { action, use_ }
    }

    /// Same outcome for both slots, used for whole-operation failures
    pub fn both(outcome: Outcome) -> Self {
        Self::new(outcome, outcome)
    }

    pub fn action_success(&self) -> bool {
        self.action.is_ok()
    }

    pub fn use_success(&self) -> bool {
        self.use_.is_ok()
    }

    pub fn any_success(&self) -> bool {
        self.action_success() || self.use_success()
    }

    pub fn all_success(&self) -> bool {
        self.action_success() && self.use_success()
    }
}

impl Default for OutcomeResult {
    fn default() -> Self {
        Self::both(Outcome::Ok)
    }
}

impl fmt::Display for OutcomeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "action [{}] use [{}]", self.action, self.use_)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_not_an_error() {
        assert!(!Outcome::Empty.is_error());
        assert!(!Outcome::Empty.is_ok());
        assert!(Outcome::ErrFileNotFound.is_error());
    }

    #[test]
    fn test_any_and_all_success() {
        let partial = OutcomeResult::new(Outcome::Ok, Outcome::ErrFileNotFound);
        assert!(partial.any_success());
        assert!(!partial.all_success());

        let full = OutcomeResult::both(Outcome::Ok);
        assert!(full.all_success());

        let empty = OutcomeResult::both(Outcome::Empty);
        assert!(!empty.any_success());
    }

    #[test]
    fn test_audio_error_mapping() {
        let missing = AudioError::FileNotFound {
            path: "use.wav".to_string(),
        };
        assert_eq!(Outcome::from(&missing), Outcome::ErrFileNotFound);
        assert_eq!(Outcome::from(&AudioError::InvalidHandle), Outcome::ErrUnknown);
    }

    #[test]
    fn test_display() {
        let result = OutcomeResult::new(Outcome::Ok, Outcome::Empty);
        assert_eq!(result.to_string(), "action [ok] use [empty]");
    }
}
