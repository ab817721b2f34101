use serde::{Deserialize, Serialize};
use std::fmt;

/// The disposition of an [`Outcome`](crate::Outcome).
///
/// Leaving `Empty` for `Error` or `Exception` is one-way: errors are never
/// removed, and the first error attached decides which of the two applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum State {
    #[default]
    Empty,
    Result,
    Error,
    Exception,
}

impl State {
    /// State after an error is appended.
    ///
    /// Only an exception wrapper arriving as the very first error enters
    /// `Exception`; once in `Error` or `Exception` the state stays put.
    pub(crate) fn on_error(self, is_exception: bool) -> State {
        match self {
            State::Empty | State::Result if is_exception => State::Exception,
            State::Empty | State::Result => State::Error,
            failed => failed,
        }
    }

    /// State after a value is set. Failed containers ignore values.
    pub(crate) fn on_value(self, is_null: bool) -> State {
        match self {
            State::Empty | State::Result if is_null => State::Empty,
            State::Empty | State::Result => State::Result,
            failed => failed,
        }
    }

    /// `Error` or `Exception`
    pub fn is_failed(&self) -> bool {
        matches!(self, State::Error | State::Exception)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Empty => "empty",
            State::Result => "result",
            State::Error => "error",
            State::Exception => "exception",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_error_decides() {
        assert_eq!(State::Empty.on_error(false), State::Error);
        assert_eq!(State::Empty.on_error(true), State::Exception);
        assert_eq!(State::Result.on_error(true), State::Exception);
    }

    #[test]
    fn test_failed_states_are_sticky() {
        assert_eq!(State::Error.on_error(true), State::Error);
        assert_eq!(State::Exception.on_error(false), State::Exception);
        assert_eq!(State::Error.on_value(false), State::Error);
    }

    #[test]
    fn test_value_transitions() {
        assert_eq!(State::Empty.on_value(false), State::Result);
        assert_eq!(State::Result.on_value(true), State::Empty);
        assert_eq!(State::Empty.on_value(true), State::Empty);
    }
}
