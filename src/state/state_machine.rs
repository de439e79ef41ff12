use std::time::Instant;

use thiserror::Error;

/// The two modes the board can be in.
///
/// Authoring is where content is created and edited; play is where cells are
/// revealed and completed. There are no other states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardPhase {
    /// Editing state: dimensions, categories, and cells can be changed.
    Author,
    /// Presentation state: cells are revealed and marked completed.
    Play,
}

/// Events that can be applied to the state machine. Transitions are
/// user-triggered, never time-driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardEvent {
    /// Start playing the authored board.
    EnterPlay,
    /// Return to authoring.
    ExitPlay,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event arrived.
    pub from: BoardPhase,
    /// The event that cannot be applied from this phase.
    pub event: BoardEvent,
}

/// Errors that can occur when planning a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    AlreadyPending,
    /// The requested transition is not valid from the current phase.
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// Phase changed since the plan was created.
    PhaseMismatch {
        /// Phase when the plan was created.
        expected: BoardPhase,
        /// Current phase.
        actual: BoardPhase,
    },
    /// Version changed since the plan was created.
    VersionMismatch {
        /// Version the plan would have produced.
        expected: usize,
        /// Version the apply would produce now.
        actual: usize,
    },
}

/// Errors that can occur when aborting a planned transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned transition, allocated from a per-machine
/// counter.
pub type PlanId = u64;

/// A transition that has been validated but not yet applied. The transition
/// work (persist, reconcile) runs between plan and apply; aborting leaves
/// the phase untouched.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Phase the state machine is currently in.
    pub from: BoardPhase,
    /// Phase the state machine will transition to.
    pub to: BoardPhase,
    /// Event that triggered this transition.
    pub event: BoardEvent,
    /// Version number after applying this transition.
    pub version_next: usize,
    /// Timestamp when this plan was created.
    pub pending_since: Instant,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase.
    pub phase: BoardPhase,
    /// Version number (increments on each applied transition).
    pub version: usize,
    /// Target phase of the pending transition, if one is planned.
    pub pending: Option<BoardPhase>,
}

/// Two-state machine governing the authoring / play mode of the board.
#[derive(Debug, Clone)]
pub struct BoardStateMachine {
    phase: BoardPhase,
    version: usize,
    next_plan_id: PlanId,
    pending: Option<Plan>,
}

impl Default for BoardStateMachine {
    fn default() -> Self {
        Self {
            phase: BoardPhase::Author,
            version: 0,
            next_plan_id: 1,
            pending: None,
        }
    }
}

impl BoardStateMachine {
    /// Create a new state machine starting in authoring mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> BoardPhase {
        self.phase
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
            pending: self.pending.as_ref().map(|plan| plan.to),
        }
    }

    /// Plan a transition by validating that the event can be applied from
    /// the current phase. Returns a [`Plan`] to later apply or abort.
    pub fn plan(&mut self, event: BoardEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let next = self
            .compute_transition(event)
            .map_err(PlanError::InvalidTransition)?;

        let plan = Plan {
            id: self.next_plan_id,
            from: self.phase,
            to: next,
            event,
            version_next: self.version + 1,
            pending_since: Instant::now(),
        };
        self.next_plan_id += 1;
        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Apply a planned transition, moving the machine to the next phase.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<BoardPhase, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected,
                got: plan_id,
            });
        }

        if self.phase != plan.from {
            return Err(ApplyError::PhaseMismatch {
                expected: plan.from,
                actual: self.phase,
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.phase = plan.to;
        self.version = plan.version_next;

        Ok(self.phase)
    }

    /// Abort a planned transition without applying it.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    fn compute_transition(&self, event: BoardEvent) -> Result<BoardPhase, InvalidTransition> {
        match (self.phase, event) {
            (BoardPhase::Author, BoardEvent::EnterPlay) => Ok(BoardPhase::Play),
            (BoardPhase::Play, BoardEvent::ExitPlay) => Ok(BoardPhase::Author),
            (from, event) => Err(InvalidTransition { from, event }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut BoardStateMachine, event: BoardEvent) -> BoardPhase {
        let plan = sm.plan(event).unwrap();
        sm.apply(plan.id).unwrap()
    }

    #[test]
    fn initial_state_is_author() {
        let sm = BoardStateMachine::new();
        assert_eq!(sm.phase(), BoardPhase::Author);
    }

    #[test]
    fn full_cycle_between_author_and_play() {
        let mut sm = BoardStateMachine::new();
        assert_eq!(apply(&mut sm, BoardEvent::EnterPlay), BoardPhase::Play);
        assert_eq!(apply(&mut sm, BoardEvent::ExitPlay), BoardPhase::Author);
        assert_eq!(apply(&mut sm, BoardEvent::EnterPlay), BoardPhase::Play);
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        let mut sm = BoardStateMachine::new();
        let err = sm.plan(BoardEvent::ExitPlay).unwrap_err();
        match err {
            PlanError::InvalidTransition(invalid) => {
                assert_eq!(invalid.from, BoardPhase::Author);
                assert_eq!(invalid.event, BoardEvent::ExitPlay);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        apply(&mut sm, BoardEvent::EnterPlay);
        let err = sm.plan(BoardEvent::EnterPlay).unwrap_err();
        assert!(matches!(err, PlanError::InvalidTransition(_)));
    }

    #[test]
    fn planning_while_pending_is_rejected() {
        let mut sm = BoardStateMachine::new();
        sm.plan(BoardEvent::EnterPlay).unwrap();
        assert_eq!(
            sm.plan(BoardEvent::EnterPlay).unwrap_err(),
            PlanError::AlreadyPending
        );
    }

    #[test]
    fn abort_clears_pending_without_changing_phase() {
        let mut sm = BoardStateMachine::new();
        let plan = sm.plan(BoardEvent::EnterPlay).unwrap();
        sm.abort(plan.id).unwrap();
        assert_eq!(sm.phase(), BoardPhase::Author);
        assert_eq!(sm.snapshot().pending, None);
        // A fresh plan succeeds after the abort.
        sm.plan(BoardEvent::EnterPlay).unwrap();
    }

    #[test]
    fn apply_with_wrong_plan_id_keeps_the_plan_pending() {
        let mut sm = BoardStateMachine::new();
        let plan = sm.plan(BoardEvent::EnterPlay).unwrap();
        let err = sm.apply(plan.id + 1).unwrap_err();
        assert!(matches!(err, ApplyError::IdMismatch { .. }));
        assert_eq!(sm.snapshot().pending, Some(BoardPhase::Play));
        sm.apply(plan.id).unwrap();
    }

    #[test]
    fn versions_increment_per_applied_transition() {
        let mut sm = BoardStateMachine::new();
        apply(&mut sm, BoardEvent::EnterPlay);
        apply(&mut sm, BoardEvent::ExitPlay);
        assert_eq!(sm.snapshot().version, 2);
    }
}
