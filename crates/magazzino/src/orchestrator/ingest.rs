use std::time::Duration;

use serde::de::DeserializeOwned;

use super::{Submission, SurfaceState};
use crate::client::{endpoint, DocumentUpload, MagazzinoClient};
use crate::errors::ClientError;
use crate::models::progress::{FeedProgress, ProgressReport, SyncProgress, VideoProgress};
use crate::poller::{TaskOutcome, TaskPoller, INGEST_POLL_INTERVAL};
use crate::render::{StatusSink, StatusStyle};

/// Delay before the view refresh that follows a successful ingestion.
pub const REFRESH_DELAY: Duration = Duration::from_millis(1500);

/// Drives the content-ingestion surface: channel and feed ingestion,
/// document upload, WordPress sync and the protection restores.
///
/// One operation at a time across the whole surface, mirroring the admin
/// panel where starting any job disables every form. Ingestions that add
/// content schedule a view refresh on success so the new material shows
/// up; a terminal error hands the form back instead.
pub struct IngestOrchestrator<'a> {
    client: &'a MagazzinoClient,
    state: SurfaceState,
    poll_interval: Duration,
}

impl<'a> IngestOrchestrator<'a> {
    pub fn new(client: &'a MagazzinoClient) -> Self {
        Self {
            client,
            state: SurfaceState::Idle,
            poll_interval: INGEST_POLL_INTERVAL,
        }
    }

    /// Override the poll cadence. Tests use a fast one.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    /// Ingest every video of a YouTube channel: start the job, then poll
    /// video progress until it completes.
    pub async fn ingest_channel<S: StatusSink>(
        &mut self,
        sink: &mut S,
        channel_url: &str,
    ) -> Submission {
        let url = channel_url.trim().to_string();
        if self.state.is_busy() || url.is_empty() {
            return Submission::Rejected;
        }

        self.begin(sink, "Starting channel processing...");
        let outcome = match self.client.start_channel_ingest(&url).await {
            Ok(_) => {
                self.state = SurfaceState::Polling;
                self.poll::<VideoProgress, S>(sink, endpoint::VIDEOS_PROGRESS).await
            }
            Err(err) => self.render_start_failure(sink, &err),
        };
        self.finish(sink, &outcome, true);
        Submission::Completed
    }

    /// Ingest the articles of an RSS feed.
    pub async fn ingest_feed<S: StatusSink>(&mut self, sink: &mut S, rss_url: &str) -> Submission {
        let url = rss_url.trim().to_string();
        if self.state.is_busy() || url.is_empty() {
            return Submission::Rejected;
        }

        self.begin(sink, "Starting feed processing...");
        let outcome = match self.client.start_feed_ingest(&url).await {
            Ok(_) => {
                self.state = SurfaceState::Polling;
                self.poll::<FeedProgress, S>(sink, endpoint::RSS_PROGRESS).await
            }
            Err(err) => self.render_start_failure(sink, &err),
        };
        self.finish(sink, &outcome, true);
        Submission::Completed
    }

    /// Upload documents. The upload itself is synchronous; the server
    /// answers with a plain envelope, no progress to poll.
    pub async fn upload_documents<S: StatusSink>(
        &mut self,
        sink: &mut S,
        files: Vec<DocumentUpload>,
    ) -> Submission {
        if self.state.is_busy() || files.is_empty() {
            return Submission::Rejected;
        }

        self.begin(sink, "Uploading documents...");
        let outcome = match self.client.upload_documents(files).await {
            Ok(ack) => {
                let message = ack
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "Documents uploaded.".to_string());
                sink.render(&message, StatusStyle::Success, Some(100), false);
                TaskOutcome::Success { message }
            }
            Err(err) => self.render_start_failure(sink, &err),
        };
        self.finish(sink, &outcome, true);
        Submission::Completed
    }

    /// Synchronize WordPress content, observed through its own progress
    /// endpoint. The settings page stays put afterwards, so no refresh.
    pub async fn sync_wordpress<S: StatusSink>(&mut self, sink: &mut S) -> Submission {
        if self.state.is_busy() {
            return Submission::Rejected;
        }

        self.begin(sink, "Starting WordPress sync...");
        let outcome = match self.client.start_wordpress_sync().await {
            Ok(_) => {
                self.state = SurfaceState::Polling;
                self.poll::<SyncProgress, S>(sink, endpoint::WORDPRESS_PROGRESS).await
            }
            Err(err) => self.render_start_failure(sink, &err),
        };
        self.finish(sink, &outcome, false);
        Submission::Completed
    }

    /// Restore the database backup; the index rebuild that follows is
    /// observed through the reindex progress endpoint.
    pub async fn restore_database<S: StatusSink>(&mut self, sink: &mut S) -> Submission {
        if self.state.is_busy() {
            return Submission::Rejected;
        }

        self.begin(sink, "Restoring database backup...");
        let outcome = match self.client.start_database_restore().await {
            Ok(_) => {
                self.state = SurfaceState::Polling;
                self.poll::<SyncProgress, S>(sink, endpoint::REINDEX_PROGRESS).await
            }
            Err(err) => self.render_start_failure(sink, &err),
        };
        self.finish(sink, &outcome, false);
        Submission::Completed
    }

    /// Full restore. The application restarts, so there is nothing to
    /// poll: report the acknowledgement and hand the surface back.
    pub async fn restore_full<S: StatusSink>(&mut self, sink: &mut S) -> Submission {
        if self.state.is_busy() {
            return Submission::Rejected;
        }

        self.begin(sink, "Starting full restore...");
        let outcome = match self.client.start_full_restore().await {
            Ok(ack) => {
                let message = ack
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "Full restore started; the application is restarting.".to_string());
                sink.render(&message, StatusStyle::Success, None, false);
                TaskOutcome::Success { message }
            }
            Err(err) => self.render_start_failure(sink, &err),
        };
        self.finish(sink, &outcome, false);
        Submission::Completed
    }

    fn begin<S: StatusSink>(&mut self, sink: &mut S, message: &str) {
        self.state = SurfaceState::Submitting;
        sink.set_busy(true);
        sink.render(message, StatusStyle::Info, None, true);
    }

    async fn poll<P, S>(&self, sink: &mut S, progress_path: &'static str) -> TaskOutcome
    where
        P: ProgressReport + DeserializeOwned,
        S: StatusSink,
    {
        TaskPoller::new(self.client, progress_path, self.poll_interval)
            .run::<P, S>(sink)
            .await
    }

    fn render_start_failure<S: StatusSink>(&self, sink: &mut S, err: &ClientError) -> TaskOutcome {
        let message = err.user_message();
        sink.render(&message, StatusStyle::Error, None, false);
        TaskOutcome::Failed { message }
    }

    fn finish<S: StatusSink>(&mut self, sink: &mut S, outcome: &TaskOutcome, refresh: bool) {
        if refresh && outcome.is_success() {
            sink.schedule_refresh(REFRESH_DELAY);
        }
        self.state = SurfaceState::Idle;
        sink.set_busy(false);
    }
}
