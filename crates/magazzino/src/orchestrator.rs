//! Per-surface drivers for one full request/response interaction.
//!
//! Each orchestrator owns the busy/idle state of its input surface,
//! issues the request, selects streaming or polling delivery, feeds the
//! view, and hands the controls back on every exit path.

pub mod chat;
pub mod ingest;

/// Interaction state of one input surface. Exactly one operation may be
/// in flight per surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfaceState {
    #[default]
    Idle,
    Submitting,
    Streaming,
    Polling,
}

impl SurfaceState {
    pub fn is_busy(&self) -> bool {
        !matches!(self, SurfaceState::Idle)
    }
}

/// What a submission attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The interaction ran to a terminal state, success or rendered error.
    Completed,
    /// Rejected by the entry guard: surface busy or input blank. Nothing
    /// was sent and no state changed.
    Rejected,
}
