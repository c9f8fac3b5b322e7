//! Application state machine for the select → extract → show flow.
//!
//! ```text
//!   Idle ──SelectInput──▶ Idle
//!   Idle ──StartExtraction (input selected)──▶ Processing
//!   Processing ──ExtractionSucceeded──▶ Success
//!   Processing ──ExtractionFailed──▶ Error
//!   Success | Error ──Reset──▶ Idle
//! ```
//!
//! [`transition`] is a pure function. [`StateMachine`] owns the single
//! [`AppState`] and applies events through it; a rejected event leaves the
//! state exactly as it was. There is no `StartExtraction` edge out of
//! `Processing`, which is what keeps a second extraction from starting while
//! one is in flight.

use crate::error::IllegalTransition;
use crate::model::StatementRecord;
use crate::pipeline::input::SelectedInput;
use serde::Serialize;
use std::fmt;

/// Where the interaction currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Phase {
    /// Waiting for a file, or for the user to start with the selected file.
    #[default]
    Idle,
    /// One extraction is in flight.
    Processing,
    /// A validated record is available.
    Success,
    /// The last extraction failed; only its message is kept.
    Error,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::Processing => "processing",
            Phase::Success => "showing a result",
            Phase::Error => "showing an error",
        };
        f.write_str(s)
    }
}

/// The single source of truth for one session.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AppState {
    pub phase: Phase,
    pub selected_input: Option<SelectedInput>,
    /// Present only in [`Phase::Success`].
    pub result: Option<StatementRecord>,
    /// Present only in [`Phase::Error`].
    pub error_message: Option<String>,
}

impl AppState {
    /// True when `StartExtraction` would be accepted.
    pub fn can_start(&self) -> bool {
        self.phase == Phase::Idle && self.selected_input.is_some()
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone)]
pub enum Event {
    SelectInput(SelectedInput),
    StartExtraction,
    ExtractionSucceeded(StatementRecord),
    ExtractionFailed(String),
    Reset,
}

impl Event {
    /// Human-readable event name for logs and rejection messages.
    pub fn name(&self) -> &'static str {
        match self {
            Event::SelectInput(_) => "select input",
            Event::StartExtraction => "start extraction",
            Event::ExtractionSucceeded(_) => "extraction succeeded",
            Event::ExtractionFailed(_) => "extraction failed",
            Event::Reset => "reset",
        }
    }
}

/// Compute the state that follows `state` on `event`.
pub fn transition(state: &AppState, event: Event) -> Result<AppState, IllegalTransition> {
    match (state.phase, event) {
        (Phase::Idle, Event::SelectInput(input)) => Ok(AppState {
            phase: Phase::Idle,
            selected_input: Some(input),
            result: None,
            error_message: None,
        }),
        (Phase::Idle, Event::StartExtraction) if state.selected_input.is_some() => Ok(AppState {
            phase: Phase::Processing,
            selected_input: state.selected_input.clone(),
            result: None,
            error_message: None,
        }),
        (Phase::Processing, Event::ExtractionSucceeded(record)) => Ok(AppState {
            phase: Phase::Success,
            selected_input: state.selected_input.clone(),
            result: Some(record),
            error_message: None,
        }),
        (Phase::Processing, Event::ExtractionFailed(message)) => Ok(AppState {
            phase: Phase::Error,
            selected_input: state.selected_input.clone(),
            result: None,
            error_message: Some(message),
        }),
        (Phase::Success | Phase::Error, Event::Reset) => Ok(AppState::default()),
        (from, event) => Err(IllegalTransition {
            from,
            event: event.name(),
        }),
    }
}

/// Owner of the [`AppState`].
#[derive(Debug, Default)]
pub struct StateMachine {
    state: AppState,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest snapshot.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Apply `event`. On rejection the state is left untouched.
    pub fn dispatch(&mut self, event: Event) -> Result<&AppState, IllegalTransition> {
        let next = transition(&self.state, event)?;
        self.state = next;
        Ok(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn input() -> SelectedInput {
        SelectedInput {
            path: PathBuf::from("/tmp/statement.pdf"),
            file_name: "statement.pdf".into(),
            size_bytes: 1024,
        }
    }

    fn record() -> StatementRecord {
        StatementRecord {
            issuer_name: "Chase".into(),
            card_variant: "Freedom".into(),
            card_last4: "4321".into(),
            billing_cycle: "Jan".into(),
            due_date: "Feb 1".into(),
            total_balance: 1.0,
            transactions: vec![],
        }
    }

    fn processing() -> StateMachine {
        let mut m = StateMachine::new();
        m.dispatch(Event::SelectInput(input())).unwrap();
        m.dispatch(Event::StartExtraction).unwrap();
        m
    }

    #[test]
    fn initial_state_is_idle_and_empty() {
        let m = StateMachine::new();
        assert_eq!(m.phase(), Phase::Idle);
        assert_eq!(*m.state(), AppState::default());
        assert!(!m.state().can_start());
    }

    #[test]
    fn select_then_start_enters_processing() {
        let m = processing();
        assert_eq!(m.phase(), Phase::Processing);
        assert_eq!(m.state().selected_input, Some(input()));
        assert!(m.state().result.is_none());
        assert!(m.state().error_message.is_none());
    }

    #[test]
    fn start_without_input_is_rejected() {
        let mut m = StateMachine::new();
        let err = m.dispatch(Event::StartExtraction).unwrap_err();
        assert_eq!(err.from, Phase::Idle);
        assert_eq!(*m.state(), AppState::default());
    }

    #[test]
    fn second_start_while_processing_is_rejected() {
        let mut m = processing();
        let before = m.state().clone();
        assert!(m.dispatch(Event::StartExtraction).is_err());
        assert_eq!(*m.state(), before);
    }

    #[test]
    fn success_stores_result() {
        let mut m = processing();
        m.dispatch(Event::ExtractionSucceeded(record())).unwrap();
        assert_eq!(m.phase(), Phase::Success);
        assert_eq!(m.state().result, Some(record()));
        assert!(m.state().error_message.is_none());
    }

    #[test]
    fn failure_stores_message_only() {
        let mut m = processing();
        m.dispatch(Event::ExtractionFailed("boom".into())).unwrap();
        assert_eq!(m.phase(), Phase::Error);
        assert_eq!(m.state().error_message.as_deref(), Some("boom"));
        assert!(m.state().result.is_none());
    }

    #[test]
    fn reset_returns_to_initial_state() {
        let mut ok = processing();
        ok.dispatch(Event::ExtractionSucceeded(record())).unwrap();
        ok.dispatch(Event::Reset).unwrap();
        assert_eq!(*ok.state(), AppState::default());

        let mut failed = processing();
        failed.dispatch(Event::ExtractionFailed("x".into())).unwrap();
        failed.dispatch(Event::Reset).unwrap();
        assert_eq!(*failed.state(), AppState::default());
    }

    #[test]
    fn completion_events_outside_processing_are_rejected() {
        let mut m = StateMachine::new();
        assert!(m.dispatch(Event::ExtractionSucceeded(record())).is_err());
        assert!(m.dispatch(Event::ExtractionFailed("x".into())).is_err());
        assert!(m.dispatch(Event::Reset).is_err());
        assert_eq!(*m.state(), AppState::default());
    }

    #[test]
    fn select_outside_idle_is_rejected() {
        let mut m = processing();
        m.dispatch(Event::ExtractionSucceeded(record())).unwrap();
        let before = m.state().clone();
        let err = m.dispatch(Event::SelectInput(input())).unwrap_err();
        assert_eq!(err.event, "select input");
        assert_eq!(*m.state(), before);
    }

    #[test]
    fn reselect_replaces_input() {
        let mut m = StateMachine::new();
        m.dispatch(Event::SelectInput(input())).unwrap();
        let other = SelectedInput {
            file_name: "other.pdf".into(),
            ..input()
        };
        m.dispatch(Event::SelectInput(other.clone())).unwrap();
        assert_eq!(m.state().selected_input, Some(other));
        assert_eq!(m.phase(), Phase::Idle);
    }

    #[test]
    fn transition_is_pure() {
        let s = AppState::default();
        let next = transition(&s, Event::SelectInput(input())).unwrap();
        assert_eq!(s, AppState::default());
        assert_eq!(next.selected_input, Some(input()));
    }
}
