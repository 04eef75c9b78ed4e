//! Echo suppression for inbound board events.
//!
//! The board platform notifies about every change on a board, including the
//! changes this engine just made. Reprocessing those as user edits would
//! bounce state back and forth forever. The suppressor compares the event
//! timestamp against the project's `last_miro_outbound_at`: anything at or
//! inside the window after the engine's own write is presumed to be that
//! write echoing back.
//!
//! The window is a fixed heuristic. It has no adaptive component, and under
//! high clock skew between the worker and the platform's event timestamps a
//! genuine user edit made just after an outbound write can be discarded.
//! That approximation is accepted; widen or narrow via `with_window` only
//! with care.

use chrono::{DateTime, Duration, Utc};

/// Default echo window after an outbound write.
const ECHO_WINDOW_SECS: i64 = 10;

/// Decides whether an inbound event is the engine's own write echoing back.
#[derive(Debug, Clone)]
pub struct EchoSuppressor {
    window: Duration,
}

impl EchoSuppressor {
    pub fn new() -> Self {
        Self {
            window: Duration::seconds(ECHO_WINDOW_SECS),
        }
    }

    pub fn with_window(window: Duration) -> Self {
        Self { window }
    }

    /// True when the event occurred at or before `last_outbound_at + window`.
    ///
    /// With no recorded outbound write there is nothing to echo, so the
    /// event is always genuine.
    pub fn is_echo(
        &self,
        event_at: DateTime<Utc>,
        last_outbound_at: Option<DateTime<Utc>>,
    ) -> bool {
        match last_outbound_at {
            Some(outbound) => event_at <= outbound + self.window,
            None => false,
        }
    }
}

impl Default for EchoSuppressor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn event_inside_window_is_echo() {
        let suppressor = EchoSuppressor::new();
        assert!(suppressor.is_echo(at(5), Some(at(0))));
        assert!(suppressor.is_echo(at(0), Some(at(0))));
        // An event timestamped before the write (clock skew) is still ours.
        assert!(suppressor.is_echo(at(-3), Some(at(0))));
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let suppressor = EchoSuppressor::new();
        assert!(suppressor.is_echo(at(10), Some(at(0))));
        assert!(!suppressor.is_echo(at(11), Some(at(0))));
    }

    #[test]
    fn event_with_no_outbound_history_is_genuine() {
        let suppressor = EchoSuppressor::new();
        assert!(!suppressor.is_echo(at(5), None));
    }

    #[test]
    fn custom_window_is_respected() {
        let suppressor = EchoSuppressor::with_window(Duration::seconds(2));
        assert!(suppressor.is_echo(at(2), Some(at(0))));
        assert!(!suppressor.is_echo(at(3), Some(at(0))));
    }
}
