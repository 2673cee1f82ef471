//! Fixed-interval polling for long-running server-side jobs.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::time::{self, MissedTickBehavior};
use tracing::warn;

use crate::client::MagazzinoClient;
use crate::models::progress::{percent, ProgressReport};
use crate::render::{StatusSink, StatusStyle};

/// Poll cadence used by the ingestion surfaces.
pub const INGEST_POLL_INTERVAL: Duration = Duration::from_millis(1500);

const STATUS_CHECK_FAILED: &str = "Status check failed.";
const COMPLETED: &str = "Processing complete.";

/// How a polled task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success { message: String },
    Failed { message: String },
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            TaskOutcome::Success { message } | TaskOutcome::Failed { message } => message,
        }
    }
}

/// Polls a progress endpoint at a fixed cadence until the task reports a
/// terminal state.
///
/// `run` borrows the poller for the whole task, so one poller drives at
/// most one loop at a time; starting a new poll for the same logical task
/// means the previous loop already returned or its future was dropped.
/// Each poll's request is awaited before the next tick fires and missed
/// ticks are delayed, so polls never overlap.
pub struct TaskPoller<'a> {
    client: &'a MagazzinoClient,
    progress_path: &'a str,
    interval: Duration,
}

impl<'a> TaskPoller<'a> {
    pub fn new(client: &'a MagazzinoClient, progress_path: &'a str, interval: Duration) -> Self {
        Self {
            client,
            progress_path,
            interval,
        }
    }

    /// Run the poll loop to completion.
    ///
    /// While the task reports processing, each poll forwards
    /// `(message, percent, indeterminate)` to the sink with info styling.
    /// The terminal poll stops the loop and renders with success or error
    /// styling depending on the payload's error field. A transport or
    /// decode failure on any poll stops the loop immediately and reports
    /// failure — a failed poll is never retried.
    ///
    /// A companion 1-second ticker drives `sink.tick` for elapsed-time
    /// display; it lives and dies with the loop.
    pub async fn run<P, S>(&self, sink: &mut S) -> TaskOutcome
    where
        P: ProgressReport + DeserializeOwned,
        S: StatusSink,
    {
        let mut poll = time::interval(self.interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut clock = time::interval(Duration::from_secs(1));
        clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // consume the immediate first tick of both; the first poll fires
        // one full period in
        poll.tick().await;
        clock.tick().await;

        let mut elapsed: u64 = 0;
        loop {
            tokio::select! {
                _ = poll.tick() => {
                    let report: P = match self.client.get_json(self.progress_path).await {
                        Ok(report) => report,
                        Err(err) => {
                            warn!(%err, path = self.progress_path, "progress poll failed");
                            sink.render(STATUS_CHECK_FAILED, StatusStyle::Error, None, false);
                            return TaskOutcome::Failed {
                                message: STATUS_CHECK_FAILED.to_string(),
                            };
                        }
                    };

                    if report.is_processing() {
                        let pct = report
                            .counts()
                            .map(|(processed, total)| percent(processed, total));
                        sink.render(
                            &report.progress_message(),
                            StatusStyle::Info,
                            pct,
                            report.indeterminate(),
                        );
                    } else if let Some(error) = report.error() {
                        let message = error.to_string();
                        sink.render(&message, StatusStyle::Error, None, false);
                        return TaskOutcome::Failed { message };
                    } else {
                        let message = report
                            .message()
                            .filter(|m| !m.is_empty())
                            .unwrap_or(COMPLETED)
                            .to_string();
                        sink.render(&message, StatusStyle::Success, Some(100), false);
                        return TaskOutcome::Success { message };
                    }
                }
                _ = clock.tick() => {
                    elapsed += 1;
                    sink.tick(elapsed);
                }
            }
        }
    }
}
