// Copyright (c) 2025 - Cowboy AI, Inc.
//! Data Load Progress State Machine
//!
//! Tracks one run of the data-load job through its fixed protocol.
//!
//! # State Machine Type
//!
//! This is a **Mealy Machine**: the output (the next step to run) depends on
//! both the stage and the command.
//!
//! # Stages
//!
//! ```text
//! Pending → CredentialsResolved → AssetFetched → PayloadParsed → Connected
//!   → TableRecreated → RowsLoaded → Indexed → Analyzed → Completed
//! ```
//!
//! Any non-terminal stage may move to `Failed(step)`. `Completed` and
//! `Failed` are terminal.

use std::fmt;

use super::{StateMachine, TransitionError, TransitionResult};

/// One step of the load protocol, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LoadStep {
    ResolveCredentials,
    FetchAsset,
    ParsePayload,
    Connect,
    RecreateTable,
    InsertRows,
    CreateIndex,
    Analyze,
}

impl LoadStep {
    pub const ALL: [LoadStep; 8] = [
        LoadStep::ResolveCredentials,
        LoadStep::FetchAsset,
        LoadStep::ParsePayload,
        LoadStep::Connect,
        LoadStep::RecreateTable,
        LoadStep::InsertRows,
        LoadStep::CreateIndex,
        LoadStep::Analyze,
    ];

    /// Whether this step changes the target database, even when it fails
    pub fn mutates_database(self) -> bool {
        matches!(
            self,
            LoadStep::RecreateTable
                | LoadStep::InsertRows
                | LoadStep::CreateIndex
                | LoadStep::Analyze
        )
    }
}

impl fmt::Display for LoadStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoadStep::ResolveCredentials => "resolve-credentials",
            LoadStep::FetchAsset => "fetch-asset",
            LoadStep::ParsePayload => "parse-payload",
            LoadStep::Connect => "connect",
            LoadStep::RecreateTable => "recreate-table",
            LoadStep::InsertRows => "insert-rows",
            LoadStep::CreateIndex => "create-index",
            LoadStep::Analyze => "analyze",
        };
        f.write_str(s)
    }
}

/// Progress of one job run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStage {
    #[default]
    Pending,
    CredentialsResolved,
    AssetFetched,
    PayloadParsed,
    Connected,
    TableRecreated,
    RowsLoaded,
    Indexed,
    Analyzed,
    Completed,
    Failed(LoadStep),
}

impl LoadStage {
    /// Step that moves the run out of this stage
    pub fn next_step(self) -> Option<LoadStep> {
        match self {
            LoadStage::Pending => Some(LoadStep::ResolveCredentials),
            LoadStage::CredentialsResolved => Some(LoadStep::FetchAsset),
            LoadStage::AssetFetched => Some(LoadStep::ParsePayload),
            LoadStage::PayloadParsed => Some(LoadStep::Connect),
            LoadStage::Connected => Some(LoadStep::RecreateTable),
            LoadStage::TableRecreated => Some(LoadStep::InsertRows),
            LoadStage::RowsLoaded => Some(LoadStep::CreateIndex),
            LoadStage::Indexed => Some(LoadStep::Analyze),
            LoadStage::Analyzed | LoadStage::Completed | LoadStage::Failed(_) => None,
        }
    }

    fn after(step: LoadStep) -> Self {
        match step {
            LoadStep::ResolveCredentials => LoadStage::CredentialsResolved,
            LoadStep::FetchAsset => LoadStage::AssetFetched,
            LoadStep::ParsePayload => LoadStage::PayloadParsed,
            LoadStep::Connect => LoadStage::Connected,
            LoadStep::RecreateTable => LoadStage::TableRecreated,
            LoadStep::InsertRows => LoadStage::RowsLoaded,
            LoadStep::CreateIndex => LoadStage::Indexed,
            LoadStep::Analyze => LoadStage::Analyzed,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LoadStage::Completed | LoadStage::Failed(_))
    }

    /// Whether the database may already have been changed in this run
    pub fn has_mutated_database(self) -> bool {
        match self {
            LoadStage::Failed(step) => step.mutates_database(),
            LoadStage::Completed => true,
            stage => matches!(
                stage,
                LoadStage::TableRecreated
                    | LoadStage::RowsLoaded
                    | LoadStage::Indexed
                    | LoadStage::Analyzed
            ),
        }
    }
}

/// Progress command (FSM input)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadCommand {
    /// The stage's next step succeeded
    Complete(LoadStep),
    /// The stage's next step failed
    Fail(LoadStep),
    /// Close a fully analyzed run
    Finish,
}

impl StateMachine for LoadStage {
    type Input = LoadCommand;
    /// Next step to run, if any
    type Output = Option<LoadStep>;

    fn transition(&self, input: &Self::Input) -> TransitionResult<(Self, Self::Output)> {
        if self.is_terminal() {
            return Err(TransitionError::InvalidTransition {
                from: format!("{self:?}"),
                to: "any stage".to_string(),
            });
        }

        match input {
            LoadCommand::Finish if *self == LoadStage::Analyzed => {
                Ok((LoadStage::Completed, None))
            }
            LoadCommand::Finish => Err(TransitionError::PreconditionFailed(format!(
                "cannot finish from {self:?}"
            ))),
            LoadCommand::Complete(step) | LoadCommand::Fail(step)
                if self.next_step() != Some(*step) =>
            {
                Err(TransitionError::InvalidTransition {
                    from: format!("{self:?}"),
                    to: format!("after {step}"),
                })
            }
            LoadCommand::Complete(step) => {
                let next = Self::after(*step);
                Ok((next, next.next_step()))
            }
            LoadCommand::Fail(step) => Ok((LoadStage::Failed(*step), None)),
        }
    }

    fn valid_inputs(&self) -> Vec<Self::Input> {
        match (self, self.next_step()) {
            (_, Some(step)) => vec![LoadCommand::Complete(step), LoadCommand::Fail(step)],
            (LoadStage::Analyzed, None) => vec![LoadCommand::Finish],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::Tracked;
    use chrono::Utc;
    use test_case::test_case;

    #[test]
    fn test_full_run_reaches_completed() {
        let mut fsm = Tracked::new(LoadStage::Pending);
        for step in LoadStep::ALL {
            fsm.apply(LoadCommand::Complete(step), Utc::now())
                .unwrap();
        }
        assert_eq!(*fsm.current(), LoadStage::Analyzed);
        fsm.apply(LoadCommand::Finish, Utc::now())
            .unwrap();
        assert_eq!(*fsm.current(), LoadStage::Completed);
        assert_eq!(fsm.history().len(), 9);
    }

    #[test]
    fn test_steps_cannot_be_skipped() {
        let result = LoadStage::CredentialsResolved
            .transition(&LoadCommand::Complete(LoadStep::ParsePayload));
        assert!(matches!(
            result,
            Err(TransitionError::InvalidTransition { .. })
        ));
        assert!(LoadStage::Indexed.transition(&LoadCommand::Finish).is_err());
    }

    #[test_case(LoadStage::Pending, LoadStep::ResolveCredentials, false)]
    #[test_case(LoadStage::AssetFetched, LoadStep::ParsePayload, false)]
    #[test_case(LoadStage::PayloadParsed, LoadStep::Connect, false)]
    #[test_case(LoadStage::Connected, LoadStep::RecreateTable, true)]
    #[test_case(LoadStage::TableRecreated, LoadStep::InsertRows, true)]
    fn test_failure_records_step(stage: LoadStage, step: LoadStep, mutated: bool) {
        let (failed, next) = stage.transition(&LoadCommand::Fail(step)).unwrap();
        assert_eq!(failed, LoadStage::Failed(step));
        assert_eq!(next, None);
        assert_eq!(failed.has_mutated_database(), mutated);
    }

    #[test]
    fn test_terminal_stages_reject_input() {
        let failed = LoadStage::Failed(LoadStep::FetchAsset);
        assert!(failed.transition(&LoadCommand::Finish).is_err());
        assert!(failed.valid_inputs().is_empty());
        assert!(LoadStage::Completed
            .transition(&LoadCommand::Complete(LoadStep::Analyze))
            .is_err());
    }

    #[test]
    fn test_no_mutation_before_connect() {
        let mut stage = LoadStage::Pending;
        for step in LoadStep::ALL.iter().take_while(|s| !s.mutates_database()) {
            assert!(!stage.has_mutated_database());
            stage = stage.transition(&LoadCommand::Complete(*step)).unwrap().0;
        }
        assert_eq!(stage, LoadStage::Connected);
        assert!(!stage.has_mutated_database());
    }
}
