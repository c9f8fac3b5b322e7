//! Session: the coordinating owner of the state machine.
//!
//! A [`Session`] turns user intents (select a file, start, reset) into state
//! machine events and runs the extraction in between. It is the only thing
//! that mutates the [`AppState`]; views get `&AppState` snapshots through
//! [`Session::state`] or a [`SessionObserver`].
//!
//! ## Starting is synchronous, finishing is not
//!
//! [`Session::start_extraction`] moves Idle → Processing immediately and
//! hands back a [`PendingExtraction`]. [`Session::complete`] then awaits the
//! two suspension points (file read, service call) and records the outcome.
//! [`Session::extract`] does both. The session is borrowed mutably for the
//! whole extraction, so a second one cannot begin until the first finishes.
//!
//! A [`PendingExtraction`] only completes on the session that issued it.
//! There is no cancel edge: dropping the token without calling
//! [`Session::complete`] leaves the session in `Processing` for good, and a
//! new session is needed.

use crate::client::ExtractionClient;
use crate::config::ExtractionConfig;
use crate::error::{ExtractionError, IllegalTransition, SelectionError};
use crate::model::StatementRecord;
use crate::pipeline::encode::encode_document;
use crate::pipeline::input::{select_input, SelectedInput};
use crate::progress::{NoopObserver, Observer};
use crate::state::{AppState, Event, Phase, StateMachine};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Proof that the session entered `Processing` for `input`.
#[derive(Debug)]
#[must_use = "pass this to Session::complete to finish the extraction"]
pub struct PendingExtraction {
    session_id: u64,
    input: SelectedInput,
}

impl PendingExtraction {
    pub fn input(&self) -> &SelectedInput {
        &self.input
    }
}

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// One user session: a state machine plus the client that feeds it.
pub struct Session {
    id: u64,
    machine: StateMachine,
    client: ExtractionClient,
    observer: Observer,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", self.machine.state())
            .field("client", &self.client)
            .finish()
    }
}

impl Session {
    pub fn new(config: ExtractionConfig) -> Result<Self, ExtractionError> {
        Ok(Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            machine: StateMachine::new(),
            client: ExtractionClient::new(config)?,
            observer: Arc::new(NoopObserver),
        })
    }

    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = observer;
        self
    }

    /// Latest state snapshot.
    pub fn state(&self) -> &AppState {
        self.machine.state()
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    /// The record of the last successful extraction, if showing one.
    pub fn result(&self) -> Option<&StatementRecord> {
        self.machine.state().result.as_ref()
    }

    /// Choose the file to extract from.
    ///
    /// Non-PDF, missing or unreadable files raise a notice and leave the
    /// state untouched. Only allowed while idle.
    pub fn select_file(&mut self, path: impl AsRef<Path>) -> Result<(), SelectionError> {
        if self.phase() != Phase::Idle {
            return Err(self.notice(SelectionError::Busy {
                phase: self.phase(),
            }));
        }

        let input = select_input(path).map_err(|e| self.notice(e))?;
        info!("Selected {}", input.file_name);
        self.dispatch(Event::SelectInput(input))
            .map_err(|e| SelectionError::Busy { phase: e.from })
    }

    /// Enter `Processing` with the selected file.
    ///
    /// Rejected, with no state change, unless the session is idle and a file
    /// is selected. The returned token must reach [`complete`](Self::complete):
    /// there is no way back from `Processing` without it.
    pub fn start_extraction(&mut self) -> Result<PendingExtraction, IllegalTransition> {
        self.dispatch(Event::StartExtraction)?;
        let input = self
            .machine
            .state()
            .selected_input
            .clone()
            .ok_or(IllegalTransition {
                from: Phase::Processing,
                event: "start extraction",
            })?;
        Ok(PendingExtraction {
            session_id: self.id,
            input,
        })
    }

    /// Run the extraction started by `pending` and record the outcome.
    ///
    /// Every failure becomes `Phase::Error` with the error's message. No
    /// retry is attempted. A token issued by another session, or one that no
    /// longer matches the processing input, is rejected before any I/O.
    pub async fn complete(
        &mut self,
        pending: PendingExtraction,
    ) -> Result<&AppState, IllegalTransition> {
        let state = self.machine.state();
        if pending.session_id != self.id
            || state.phase != Phase::Processing
            || state.selected_input.as_ref() != Some(&pending.input)
        {
            return Err(IllegalTransition {
                from: state.phase,
                event: "complete extraction",
            });
        }

        let outcome = self.run(&pending.input).await;
        let event = match outcome {
            Ok(record) => Event::ExtractionSucceeded(record),
            Err(e) => {
                warn!("Extraction of {} failed: {}", pending.input.file_name, e);
                Event::ExtractionFailed(e.to_string())
            }
        };
        if let Err(e) = self.dispatch(event) {
            // Only reachable if the state was changed behind the pending token.
            warn!("Dropped extraction outcome: {}", e);
        }
        Ok(self.machine.state())
    }

    /// [`start_extraction`](Self::start_extraction) followed by
    /// [`complete`](Self::complete).
    pub async fn extract(&mut self) -> Result<&AppState, IllegalTransition> {
        let pending = self.start_extraction()?;
        self.complete(pending).await
    }

    /// Return to the initial idle state from `Success` or `Error`.
    pub fn reset(&mut self) -> Result<(), IllegalTransition> {
        self.dispatch(Event::Reset)
    }

    async fn run(&self, input: &SelectedInput) -> Result<StatementRecord, ExtractionError> {
        // Credential first: a missing key wins over a vanished file.
        self.client.config().require_api_key()?;
        let document = encode_document(&input.path).await?;
        self.client.extract(&document).await
    }

    fn dispatch(&mut self, event: Event) -> Result<(), IllegalTransition> {
        let name = event.name();
        match self.machine.dispatch(event) {
            Ok(state) => {
                debug!("{} → {:?}", name, state.phase);
                self.observer.on_state_change(state);
                Ok(())
            }
            Err(e) => {
                debug!("Rejected: {}", e);
                Err(e)
            }
        }
    }

    fn notice(&self, notice: SelectionError) -> SelectionError {
        warn!("{}", notice);
        self.observer.on_notice(&notice);
        notice
    }
}
