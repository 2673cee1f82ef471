//! Session-owned mutable state: the conversation history and the widget
//! token cache. Both live exactly as long as the hosting surface and are
//! never persisted.

use crate::client::MagazzinoClient;
use crate::errors::ClientResult;
use crate::models::turn::ConversationTurn;

/// Most turns kept locally; beyond this the oldest are dropped.
pub const MAX_HISTORY_TURNS: usize = 50;

/// Most recent prior turns sent as context with each new query.
pub const CONTEXT_TURNS: usize = 6;

/// Client-held conversation state. Created on session start, cleared on
/// explicit reset.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    turns: Vec<ConversationTurn>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn, dropping the oldest beyond [`MAX_HISTORY_TURNS`].
    pub fn record(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
        if self.turns.len() > MAX_HISTORY_TURNS {
            let excess = self.turns.len() - MAX_HISTORY_TURNS;
            self.turns.drain(..excess);
        }
    }

    /// Context for the next request: up to [`CONTEXT_TURNS`] of the most
    /// recent turns, not counting the turn just recorded for the outgoing
    /// query itself.
    pub fn context_for_request(&self) -> &[ConversationTurn] {
        let prior = &self.turns[..self.turns.len().saturating_sub(1)];
        let start = prior.len().saturating_sub(CONTEXT_TURNS);
        &prior[start..]
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

/// Lazily fetched, session-cached widget bearer token.
///
/// The embedded widget exchanges its public customer id for a JWT once
/// and reuses it for every subsequent search call. The cache is owned by
/// one surface and borrowed mutably, so two fetches for the same session
/// cannot race.
#[derive(Debug, Clone)]
pub struct WidgetTokenCache {
    customer_id: String,
    token: Option<String>,
}

impl WidgetTokenCache {
    pub fn new(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            token: None,
        }
    }

    /// Return the cached token, fetching it on first use.
    pub async fn get_or_fetch(&mut self, client: &MagazzinoClient) -> ClientResult<String> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }
        let token = client.widget_token(&self.customer_id).await?;
        self.token = Some(token.clone());
        Ok(token)
    }

    /// Drop the cached token, forcing a refetch on next use.
    pub fn invalidate(&mut self) {
        self.token = None;
    }
}
