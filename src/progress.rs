//! Observer trait for session phase changes.
//!
//! Inject an [`Arc<dyn SessionObserver>`] via [`crate::Session::with_observer`]
//! to be told every time the session's state changes, e.g. to redraw a
//! terminal view or drive a spinner.
//!
//! # Example
//!
//! ```rust
//! use statement_parser::{AppState, Phase, SessionObserver};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct CountingObserver {
//!     changes: AtomicUsize,
//! }
//!
//! impl SessionObserver for CountingObserver {
//!     fn on_state_change(&self, state: &AppState) {
//!         self.changes.fetch_add(1, Ordering::SeqCst);
//!         if state.phase == Phase::Error {
//!             eprintln!("failed: {:?}", state.error_message);
//!         }
//!     }
//! }
//! ```

use crate::error::SelectionError;
use crate::state::AppState;
use std::sync::Arc;

/// Receives session events. All methods default to no-ops.
pub trait SessionObserver: Send + Sync {
    /// Called after every accepted transition with the new snapshot.
    fn on_state_change(&self, state: &AppState) {
        let _ = state;
    }

    /// Called when a chosen file is rejected. The state is unchanged.
    fn on_notice(&self, notice: &SelectionError) {
        let _ = notice;
    }
}

/// Observer that ignores everything. The default for a new session.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Convenience alias for the type stored in [`crate::Session`].
pub type Observer = Arc<dyn SessionObserver>;
