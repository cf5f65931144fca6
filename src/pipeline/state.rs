use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Phase of a run. Phases only move forward, one step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Initialized,
    Scanning,
    Deciding,
    Mutating,
    Done,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot move from {from} to {to}")]
pub struct InvalidTransition {
    pub from: RunState,
    pub to: RunState,
}

impl RunState {
    pub fn next(self) -> Option<RunState> {
        match self {
            Self::Initialized => Some(Self::Scanning),
            Self::Scanning => Some(Self::Deciding),
            Self::Deciding => Some(Self::Mutating),
            Self::Mutating => Some(Self::Done),
            Self::Done => None,
        }
    }

    pub fn advance(&mut self, to: RunState) -> Result<(), InvalidTransition> {
        if self.next() != Some(to) {
            return Err(InvalidTransition { from: *self, to });
        }
        *self = to;
        Ok(())
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Initialized => "initialized",
            Self::Scanning => "scanning",
            Self::Deciding => "deciding",
            Self::Mutating => "mutating",
            Self::Done => "done",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_only() {
        let mut state = RunState::Initialized;
        state.advance(RunState::Scanning).unwrap();
        state.advance(RunState::Deciding).unwrap();

        let err = state.advance(RunState::Scanning).unwrap_err();
        assert_eq!(err.from, RunState::Deciding);
        assert!(state.advance(RunState::Done).is_err());
        assert_eq!(state, RunState::Deciding);

        state.advance(RunState::Mutating).unwrap();
        state.advance(RunState::Done).unwrap();
        assert_eq!(state.next(), None);
    }
}
