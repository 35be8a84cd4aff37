// Copyright (c) 2025 - Cowboy AI, Inc.
//! Job Progress State Machines
//!
//! A machine maps `(stage, input)` to `(next stage, output)` without side
//! effects. [`Tracked`] holds the current stage of one run together with the
//! timestamped transitions that led there.
//!
//! ```rust
//! use chrono::Utc;
//! use igdb_stacks::state_machine::{LoadCommand, LoadStage, LoadStep, StateMachine, Tracked};
//!
//! let mut run = Tracked::new(LoadStage::Pending);
//! let next = run
//!     .apply(LoadCommand::Complete(LoadStep::ResolveCredentials), Utc::now())
//!     .unwrap();
//! assert_eq!(next, Some(LoadStep::FetchAsset));
//! assert!(!LoadStage::Pending.can_transition(&LoadCommand::Finish));
//! ```

pub mod load_progress;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub use load_progress::{LoadCommand, LoadStage, LoadStep};

pub type TransitionResult<S> = Result<S, TransitionError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),
}

/// Pure transition function over a stage type
pub trait StateMachine: Sized + Clone {
    type Input;
    type Output;

    fn transition(&self, input: &Self::Input) -> TransitionResult<(Self, Self::Output)>;

    fn can_transition(&self, input: &Self::Input) -> bool {
        self.transition(input).is_ok()
    }

    /// Inputs accepted from this stage; empty when the stage is terminal
    fn valid_inputs(&self) -> Vec<Self::Input>;
}

/// One applied transition
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<S, I> {
    pub from: S,
    pub to: S,
    pub input: I,
    pub at: DateTime<Utc>,
}

/// Current stage of a run plus every transition applied to it
#[derive(Debug, Clone)]
pub struct Tracked<M: StateMachine> {
    current: M,
    history: Vec<Transition<M, M::Input>>,
}

impl<M: StateMachine> Tracked<M> {
    pub fn new(initial: M) -> Self {
        Self {
            current: initial,
            history: Vec::new(),
        }
    }

    /// Apply `input`; a rejected input leaves stage and history unchanged
    pub fn apply(&mut self, input: M::Input, at: DateTime<Utc>) -> TransitionResult<M::Output> {
        let (to, output) = self.current.transition(&input)?;
        let from = std::mem::replace(&mut self.current, to.clone());
        self.history.push(Transition { from, to, input, at });
        Ok(output)
    }

    pub fn current(&self) -> &M {
        &self.current
    }

    pub fn history(&self) -> &[Transition<M, M::Input>] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(minute: u32) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(&format!("2026-01-19T12:{minute:02}:00Z"))
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_history_records_each_stage_change() {
        let mut run = Tracked::new(LoadStage::Pending);
        run.apply(LoadCommand::Complete(LoadStep::ResolveCredentials), at(0))
            .unwrap();
        run.apply(LoadCommand::Fail(LoadStep::FetchAsset), at(1))
            .unwrap();

        let changes: Vec<(LoadStage, LoadStage)> =
            run.history().iter().map(|t| (t.from, t.to)).collect();
        assert_eq!(
            changes,
            vec![
                (LoadStage::Pending, LoadStage::CredentialsResolved),
                (
                    LoadStage::CredentialsResolved,
                    LoadStage::Failed(LoadStep::FetchAsset)
                ),
            ]
        );
        assert_eq!(run.history()[1].input, LoadCommand::Fail(LoadStep::FetchAsset));
        assert_eq!(run.history()[1].at, at(1));
        assert_eq!(*run.current(), LoadStage::Failed(LoadStep::FetchAsset));
    }

    #[test]
    fn test_rejected_input_leaves_run_unchanged() {
        let mut run = Tracked::new(LoadStage::Pending);
        let err = run.apply(LoadCommand::Finish, at(0)).unwrap_err();

        assert!(matches!(err, TransitionError::PreconditionFailed(_)));
        assert_eq!(*run.current(), LoadStage::Pending);
        assert!(run.history().is_empty());
    }

    #[test]
    fn test_can_transition_follows_valid_inputs() {
        let stage = LoadStage::Connected;
        for input in stage.valid_inputs() {
            assert!(stage.can_transition(&input));
        }
        assert!(!stage.can_transition(&LoadCommand::Complete(LoadStep::Analyze)));
    }
}
