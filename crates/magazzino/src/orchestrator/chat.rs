use futures::StreamExt;
use tracing::debug;

use super::{Submission, SurfaceState};
use crate::client::MagazzinoClient;
use crate::errors::ClientResult;
use crate::models::events::{blocked_reason, ApiFailure, SearchOutcome, StreamEvent};
use crate::models::turn::ConversationTurn;
use crate::render::{Answer, ChatView};
use crate::session::ChatSession;

/// Placeholder text shown while a reply is pending.
const PROCESSING: &str = "Processing...";

/// Drives the chat surface end to end: query submission, event-stream
/// consumption, history upkeep, and control re-enablement on every exit
/// path.
pub struct ChatOrchestrator<'a> {
    client: &'a MagazzinoClient,
    session: ChatSession,
    state: SurfaceState,
    ideas_mode: bool,
}

impl<'a> ChatOrchestrator<'a> {
    pub fn new(client: &'a MagazzinoClient) -> Self {
        Self {
            client,
            session: ChatSession::new(),
            state: SurfaceState::Idle,
            ideas_mode: false,
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn in_ideas_mode(&self) -> bool {
        self.ideas_mode
    }

    /// Clear the conversation history.
    pub fn reset_session(&mut self) {
        self.session.clear();
    }

    /// Leave idea-regeneration mode; submissions return to normal sends.
    pub fn exit_ideas_mode<V: ChatView>(&mut self, view: &mut V) {
        self.ideas_mode = false;
        view.set_regenerate(false);
    }

    /// Submit the input surface. While idea-regeneration mode is active,
    /// plain submission is redirected to a regeneration instead of a
    /// normal send.
    pub async fn submit<V: ChatView>(&mut self, view: &mut V, input: &str) -> Submission {
        if self.ideas_mode {
            return self.generate_ideas(view).await;
        }
        self.send(view, input).await
    }

    /// Send one query.
    ///
    /// Rejected while the surface is busy or for blank input; otherwise
    /// the user's text is echoed immediately, a placeholder tracks the
    /// server's status events, and the surface returns to idle with
    /// controls re-enabled whatever happens. Only a genuinely successful
    /// answer is recorded to history.
    pub async fn send<V: ChatView>(&mut self, view: &mut V, input: &str) -> Submission {
        let query = input.trim().to_string();
        if self.state.is_busy() || query.is_empty() {
            return Submission::Rejected;
        }

        self.state = SurfaceState::Submitting;
        view.set_busy(true);
        view.echo_user(&query);
        view.show_placeholder(PROCESSING);
        self.session.record(ConversationTurn::user(query.as_str()));

        if let Err(err) = self.drive_stream(view, &query).await {
            view.clear_placeholder();
            view.render_error(&err.user_message());
        }

        self.state = SurfaceState::Idle;
        view.set_busy(false);
        Submission::Completed
    }

    async fn drive_stream<V: ChatView>(&mut self, view: &mut V, query: &str) -> ClientResult<()> {
        let history = self.session.context_for_request();
        let mut events = self.client.search(query, history).await?;
        self.state = SurfaceState::Streaming;

        while let Some(event) = events.next().await {
            match event? {
                StreamEvent::Status(status) => {
                    if !status.message.is_empty() {
                        view.update_placeholder(&status.message);
                    }
                }
                StreamEvent::Result(outcome) => {
                    view.clear_placeholder();
                    let answer = outcome.answer.as_deref().filter(|_| outcome.success);
                    match answer {
                        Some(answer) => self.render_answer(view, answer, &outcome),
                        None => {
                            let failure = ApiFailure {
                                message: outcome.message.clone(),
                                error_code: outcome.error_code.clone(),
                            };
                            view.render_error(&failure.display_message());
                        }
                    }
                }
                StreamEvent::ErrorFinal(failure) => {
                    view.clear_placeholder();
                    view.render_error(&failure.display_message());
                }
                StreamEvent::Message(payload) => {
                    debug!(?payload, "unnamed stream event");
                }
            }
        }
        Ok(())
    }

    fn render_answer<V: ChatView>(
        &mut self,
        view: &mut V,
        answer: &str,
        outcome: &SearchOutcome,
    ) {
        // A withheld answer renders as an error and never reaches history.
        if let Some(reason) = blocked_reason(answer) {
            let reason = if reason.is_empty() { "unknown reason" } else { reason };
            view.render_error(&format!("Answer withheld ({reason}). Please try again."));
            return;
        }

        self.session.record(ConversationTurn::assistant(answer));
        view.render_answer(&Answer {
            text: answer.to_string(),
            references: outcome.retrieved_results.clone(),
            metrics: outcome.performance_metrics.clone(),
        });
    }

    /// Fetch a fresh idea batch. On success the surface switches to the
    /// regenerate affordance until [`Self::exit_ideas_mode`] is called.
    pub async fn generate_ideas<V: ChatView>(&mut self, view: &mut V) -> Submission {
        if self.state.is_busy() {
            return Submission::Rejected;
        }

        self.state = SurfaceState::Submitting;
        view.set_busy(true);
        view.show_placeholder("Looking for new ideas...");

        let result = self.client.generate_ideas().await;
        view.clear_placeholder();
        match result {
            Ok(envelope) if envelope.success => {
                let body = envelope.body().unwrap_or("No ideas available yet.").to_string();
                view.render_answer(&Answer {
                    text: body,
                    references: Vec::new(),
                    metrics: envelope.performance_metrics.clone(),
                });
                self.ideas_mode = true;
                view.set_regenerate(true);
            }
            Ok(envelope) => {
                let failure = ApiFailure {
                    message: envelope.message.clone(),
                    error_code: None,
                };
                view.render_error(&failure.display_message());
            }
            Err(err) => view.render_error(&err.user_message()),
        }

        self.state = SurfaceState::Idle;
        view.set_busy(false);
        Submission::Completed
    }
}
