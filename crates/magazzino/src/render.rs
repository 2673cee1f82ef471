//! View seams between the orchestrators and whatever hosts them.
//!
//! The library never draws anything itself: the chat surface and the
//! task-progress surfaces each get a trait, and the frontend decides what
//! a placeholder, a progress bar or a refresh actually look like.

use std::time::Duration;

use crate::models::events::{PerformanceMetrics, RetrievedResult};

/// Visual treatment for a status line. Picking one carries no business
/// logic; the sink decides how each looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusStyle {
    Info,
    Success,
    Error,
}

/// Receiver for task-progress state transitions.
///
/// Implementations must be idempotent: repeated calls with the same
/// arguments leave the same visible state.
pub trait StatusSink {
    /// Update the status line. `indeterminate` overrides `percent` with a
    /// continuously animated indicator.
    fn render(
        &mut self,
        message: &str,
        style: StatusStyle,
        percent: Option<u8>,
        indeterminate: bool,
    );

    /// Elapsed-time tick, 1-second granularity. Display only.
    fn tick(&mut self, _elapsed_secs: u64) {}

    /// Disable or re-enable the surface's controls.
    fn set_busy(&mut self, _busy: bool) {}

    /// Ask the host to refresh its data view after `delay`, so newly
    /// ingested content becomes visible.
    fn schedule_refresh(&mut self, _delay: Duration) {}
}

/// A successful assistant answer with its attachments.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub references: Vec<RetrievedResult>,
    pub metrics: Option<PerformanceMetrics>,
}

/// Receiver for chat-surface state transitions.
///
/// There is at most one placeholder at a time: `show_placeholder` creates
/// it, `update_placeholder` replaces its text in place, and it is removed
/// before any final answer or error is rendered.
pub trait ChatView {
    /// Optimistic echo of the user's own input.
    fn echo_user(&mut self, text: &str);

    fn show_placeholder(&mut self, message: &str);

    fn update_placeholder(&mut self, message: &str);

    fn clear_placeholder(&mut self);

    fn render_answer(&mut self, answer: &Answer);

    fn render_error(&mut self, message: &str);

    /// Disable or re-enable the surface's controls; re-enabling restores
    /// focus to the input.
    fn set_busy(&mut self, busy: bool);

    /// Relabel the submit affordance while idea-regeneration mode is
    /// active.
    fn set_regenerate(&mut self, _active: bool) {}
}
