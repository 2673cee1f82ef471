use serde::Deserialize;

/// Normalized view over a polled progress payload.
///
/// Each task kind reports progress with its own field names; the poller
/// and renderer only ever see this trait.
pub trait ProgressReport {
    fn is_processing(&self) -> bool;

    /// Raw server message for this poll, if any.
    fn message(&self) -> Option<&str>;

    /// The current step cannot report a proportion; show a continuous
    /// animation instead of a percentage.
    fn indeterminate(&self) -> bool {
        false
    }

    /// `(processed, total)` when proportion-complete can be computed.
    fn counts(&self) -> Option<(u64, u64)> {
        None
    }

    /// Terminal error text. Only meaningful when `is_processing` is false.
    fn error(&self) -> Option<&str> {
        None
    }

    /// Message for an in-flight poll. Payloads that carry counts compose
    /// one when the server sent no text.
    fn progress_message(&self) -> String {
        match self.message() {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => "Processing...".to_string(),
        }
    }
}

/// Integer percent for a progress bar, rounded and clamped to 0..=100.
pub fn percent(processed: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (processed as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CurrentVideo {
    #[serde(default)]
    pub index: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub title: Option<String>,
}

/// `GET /api/videos/progress`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoProgress {
    #[serde(default)]
    pub is_processing: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub indeterminate_step: bool,
    #[serde(default)]
    pub current_video: Option<CurrentVideo>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ProgressReport for VideoProgress {
    fn is_processing(&self) -> bool {
        self.is_processing
    }

    fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    fn indeterminate(&self) -> bool {
        self.indeterminate_step
    }

    fn counts(&self) -> Option<(u64, u64)> {
        self.current_video
            .as_ref()
            .filter(|video| video.total > 0)
            .map(|video| (video.index, video.total))
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn progress_message(&self) -> String {
        if let Some(message) = self.message() {
            if !message.is_empty() {
                return message.to_string();
            }
        }
        match &self.current_video {
            Some(video) if video.total > 0 => format!(
                "({}/{}) {}",
                video.index,
                video.total,
                video.title.as_deref().unwrap_or("video...")
            ),
            _ => "Processing...".to_string(),
        }
    }
}

/// `GET /api/rss/progress`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedProgress {
    #[serde(default)]
    pub is_processing: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub indeterminate_step: bool,
    #[serde(default)]
    pub page_processed_articles: Option<u64>,
    #[serde(default)]
    pub page_total_articles: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ProgressReport for FeedProgress {
    fn is_processing(&self) -> bool {
        self.is_processing
    }

    fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    fn indeterminate(&self) -> bool {
        self.indeterminate_step
    }

    fn counts(&self) -> Option<(u64, u64)> {
        match (self.page_processed_articles, self.page_total_articles) {
            (processed, Some(total)) if total > 0 => Some((processed.unwrap_or(0), total)),
            _ => None,
        }
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Shape shared by the WordPress sync and reindex progress endpoints:
/// a processing flag and a message, no per-item counts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SyncProgress {
    #[serde(default)]
    pub is_processing: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub indeterminate_step: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl ProgressReport for SyncProgress {
    fn is_processing(&self) -> bool {
        self.is_processing
    }

    fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    fn indeterminate(&self) -> bool {
        self.indeterminate_step
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
