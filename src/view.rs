//! Render-side application state.
//!
//! One explicit object owns what is on screen; the computational core stays
//! a pure function of its inputs. Each fetch-then-render cycle is tagged
//! with a monotonically increasing request id, and a completion that lost
//! the race to a newer request is dropped instead of overwriting the
//! display — a slow stale response can never clobber a fresher one.

use tracing::debug;

use crate::errors::DashboardError;

/// Ticket for one fetch-then-render cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(u64);

#[derive(Debug, Default)]
pub struct ViewState {
    latest: u64,
    content: Option<String>,
    error: Option<String>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new cycle, superseding every cycle begun before it.
    pub fn begin(&mut self) -> RequestId {
        self.latest += 1;
        RequestId(self.latest)
    }

    /// Apply a finished cycle. Returns false when the result was stale and
    /// dropped. A success replaces the content wholly and clears the error
    /// area; a failure fills the error area and leaves the previous content
    /// untouched — the display is never left half-updated.
    pub fn apply(&mut self, id: RequestId, result: Result<String, DashboardError>) -> bool {
        if id.0 != self.latest {
            debug!(
                "discarding stale render: request {} superseded by {}",
                id.0, self.latest
            );
            return false;
        }
        match result {
            Ok(content) => {
                self.content = Some(content);
                self.error = None;
            }
            Err(e) => {
                self.error = Some(e.to_string());
            }
        }
        true
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_results_are_dropped() {
        let mut view = ViewState::new();
        let old = view.begin();
        let new = view.begin();

        assert!(view.apply(new, Ok("fresh".into())));
        // The slow response from the superseded request arrives late.
        assert!(!view.apply(old, Ok("stale".into())));
        assert_eq!(view.content(), Some("fresh"));
    }

    #[test]
    fn failure_keeps_previous_content_and_fills_the_error_area() {
        let mut view = ViewState::new();
        let first = view.begin();
        view.apply(first, Ok("table".into()));

        let second = view.begin();
        view.apply(
            second,
            Err(DashboardError::EmptySeries("2026-01-28".into())),
        );

        assert_eq!(view.content(), Some("table"));
        assert_eq!(view.error(), Some("no trading data for 2026-01-28"));
    }

    #[test]
    fn success_clears_a_previous_error() {
        let mut view = ViewState::new();
        let a = view.begin();
        view.apply(a, Err(DashboardError::MissingParameter("symbol".into())));
        assert!(view.error().is_some());

        let b = view.begin();
        view.apply(b, Ok("ok".into()));
        assert!(view.error().is_none());
        assert_eq!(view.content(), Some("ok"));
    }
}
