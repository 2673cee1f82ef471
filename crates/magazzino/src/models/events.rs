use serde::Deserialize;
use serde_json::Value;

/// Prefix the backend puts on an answer the generation layer withheld.
/// The text after the marker is the reason.
const BLOCKED_MARKER: &str = "BLOCKED:";

/// A decoded server-sent event.
///
/// The search endpoint names a small fixed vocabulary; frames with any
/// other (or no) event name decode as `Message`. At most one terminal
/// event is expected per stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Progress text for the in-flight request.
    Status(StatusUpdate),
    /// Terminal: the search outcome, successful or not.
    Result(SearchOutcome),
    /// Terminal: the server gave up and says why.
    ErrorFinal(ApiFailure),
    /// A frame outside the known vocabulary, passed through undecoded.
    Message(Value),
}

impl StreamEvent {
    /// Terminal events end the streaming interaction.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Result(_) | StreamEvent::ErrorFinal(_))
    }

    /// Decode one frame into a typed event.
    ///
    /// Returns `None` when the payload does not match the shape its event
    /// name requires; the caller treats that like any other undecodable
    /// frame.
    pub fn decode(event_type: &str, data: Value) -> Option<StreamEvent> {
        match event_type {
            "status" => serde_json::from_value(data).ok().map(StreamEvent::Status),
            "result" => serde_json::from_value(data).ok().map(StreamEvent::Result),
            "error_final" => serde_json::from_value(data)
                .ok()
                .map(StreamEvent::ErrorFinal),
            _ => Some(StreamEvent::Message(data)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub message: String,
}

/// Payload of the terminal `result` event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchOutcome {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub retrieved_results: Vec<RetrievedResult>,
    #[serde(default)]
    pub performance_metrics: Option<PerformanceMetrics>,
    /// Failure text when `success` is false.
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
}

/// Payload of the terminal `error_final` event. Also used for a `result`
/// that signals failure, which carries the same fields.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ApiFailure {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
}

impl ApiFailure {
    /// Server-supplied text, falling back to the error code.
    pub fn display_message(&self) -> String {
        match (&self.message, &self.error_code) {
            (Some(message), _) if !message.is_empty() => message.clone(),
            (_, Some(code)) => format!("Error: {code}"),
            _ => "Error: unknown".to_string(),
        }
    }
}

/// One entry of the `result` event's reference list. The metadata shape
/// varies by source type (video, document, article, page), so it stays a
/// raw value and the view picks the fields it knows.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RetrievedResult {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub metadata: Value,
}

/// Stage timings attached to the final payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PerformanceMetrics {
    #[serde(default)]
    pub total_duration_ms: Option<f64>,
    #[serde(default)]
    pub embedding_duration_ms: Option<f64>,
    #[serde(default)]
    pub retrieval_duration_ms: Option<f64>,
    #[serde(default)]
    pub reranking_duration_ms: Option<f64>,
    #[serde(default)]
    pub llm_generation_duration_ms: Option<f64>,
    #[serde(default)]
    pub llm_model_used: Option<String>,
    #[serde(default)]
    pub retrieved_chunks_count: Option<u64>,
}

/// Extract the reason from a moderation-withheld answer, if the answer
/// carries the sentinel marker. An empty reason is possible and left to
/// the caller to replace.
pub fn blocked_reason(answer: &str) -> Option<&str> {
    answer.strip_prefix(BLOCKED_MARKER)
}
