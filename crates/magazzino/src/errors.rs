use thiserror::Error;

/// Failures surfaced by the client pipeline.
///
/// Per-frame decode failures are not represented here: the stream parser
/// logs and skips undecodable frames without ever failing the stream.
/// Everything else converges on a single user-visible error path in the
/// orchestrators, which always hand the input surface back.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The response body does not have the shape the endpoint promises,
    /// e.g. a search reply that is not an event stream.
    #[error("unexpected content type: {0}")]
    UnexpectedContentType(String),

    /// A successfully delivered response that explicitly signals failure.
    #[error("{message}")]
    Api {
        message: String,
        error_code: Option<String>,
    },

    /// The event stream ended without a terminal event.
    #[error("the server response ended before a result arrived")]
    IncompleteResponse,

    #[error("undecodable payload: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Message suitable for direct display.
    ///
    /// Connection and timeout failures get a friendlier hint, since they
    /// usually mean the backend is busy with a long job rather than gone.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Transport(err) if err.is_timeout() || err.is_connect() => {
                "The server is taking too long to respond. It may be overloaded, please retry."
                    .to_string()
            }
            other => other.to_string(),
        }
    }
}
