use std::time::Duration;

use bat::WrappingMode;
use cliclack::spinner;
use console::style;
use magazzino::models::events::{PerformanceMetrics, RetrievedResult};
use magazzino::render::{Answer, ChatView, StatusSink, StatusStyle};
use serde_json::Value;

/// Terminal view for the chat surface and the task-progress surfaces,
/// built on cliclack's spinner and bat's markdown printer.
pub struct TerminalView {
    spinner: Option<cliclack::ProgressBar>,
    /// Last status line, so identical renders don't redraw.
    status: String,
}

impl TerminalView {
    pub fn new() -> Self {
        Self {
            spinner: None,
            status: String::new(),
        }
    }

    fn show(&mut self, message: &str) {
        match &self.spinner {
            Some(active) => active.set_message(message),
            None => {
                let active = spinner();
                active.start(message);
                self.spinner = Some(active);
            }
        }
    }

    fn stop(&mut self, message: &str) {
        if let Some(active) = self.spinner.take() {
            active.stop(message);
        } else if !message.is_empty() {
            println!("{message}");
        }
        self.status.clear();
    }

    fn fail(&mut self, message: &str) {
        if let Some(active) = self.spinner.take() {
            active.error(style(message).red().to_string());
        } else {
            println!("{} {}", style("✗").red().bold(), style(message).red());
        }
        self.status.clear();
    }
}

fn print_markdown(content: &str) {
    bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print()
        .unwrap();
    println!();
}

fn reference_line(reference: &RetrievedResult) -> String {
    let metadata = &reference.metadata;
    let source_type = metadata
        .get("source_type")
        .and_then(Value::as_str)
        .unwrap_or("");
    let (label, title_field) = match source_type {
        "video" => ("Video", "video_title"),
        "document" => ("Doc", "original_filename"),
        "article" => ("Article", "article_title"),
        "page" => ("Page", "page_title"),
        _ => ("Source", ""),
    };
    let title = metadata
        .get(title_field)
        .and_then(Value::as_str)
        .unwrap_or("n/a");
    match reference.distance {
        Some(distance) => format!("{label}: {title} (dist {distance:.4})"),
        None => format!("{label}: {title}"),
    }
}

fn metrics_line(metrics: &PerformanceMetrics) -> String {
    let mut parts = Vec::new();
    if let Some(total) = metrics.total_duration_ms {
        parts.push(format!("total {total:.0}ms"));
    }
    if let Some(retrieval) = metrics.retrieval_duration_ms {
        parts.push(format!("retrieval {retrieval:.0}ms"));
    }
    if let Some(generation) = metrics.llm_generation_duration_ms {
        parts.push(format!("generation {generation:.0}ms"));
    }
    if let Some(model) = &metrics.llm_model_used {
        parts.push(format!("model {model}"));
    }
    if let Some(chunks) = metrics.retrieved_chunks_count {
        parts.push(format!("{chunks} chunks"));
    }
    parts.join(" | ")
}

impl ChatView for TerminalView {
    fn echo_user(&mut self, text: &str) {
        println!("{} {}", style(">").cyan().bold(), text);
    }

    fn show_placeholder(&mut self, message: &str) {
        self.show(message);
    }

    fn update_placeholder(&mut self, message: &str) {
        self.show(message);
    }

    fn clear_placeholder(&mut self) {
        self.stop("");
    }

    fn render_answer(&mut self, answer: &Answer) {
        print_markdown(&answer.text);
        if !answer.references.is_empty() {
            println!(
                "{}",
                style(format!("References ({})", answer.references.len())).bold().dim()
            );
            for reference in &answer.references {
                println!("  {}", style(reference_line(reference)).dim());
            }
        }
        if let Some(metrics) = &answer.metrics {
            let line = metrics_line(metrics);
            if !line.is_empty() {
                println!("{}", style(line).dim());
            }
        }
    }

    fn render_error(&mut self, message: &str) {
        self.fail(message);
    }

    fn set_busy(&mut self, _busy: bool) {
        // terminal input is naturally modal; nothing to disable
    }

    fn set_regenerate(&mut self, active: bool) {
        if active {
            println!(
                "{}",
                style("Submit again to regenerate ideas, /done to leave idea mode.").dim()
            );
        }
    }
}

impl StatusSink for TerminalView {
    fn render(
        &mut self,
        message: &str,
        style_class: StatusStyle,
        percent: Option<u8>,
        indeterminate: bool,
    ) {
        match style_class {
            StatusStyle::Info => {
                let line = match percent.filter(|_| !indeterminate) {
                    Some(pct) => format!("{message} ({pct}%)"),
                    None => message.to_string(),
                };
                if line != self.status {
                    self.show(&line);
                    self.status = line;
                }
            }
            StatusStyle::Success => {
                self.stop(&style(message).green().to_string());
            }
            StatusStyle::Error => {
                self.fail(message);
            }
        }
    }

    fn tick(&mut self, elapsed_secs: u64) {
        if let Some(active) = &self.spinner {
            if !self.status.is_empty() {
                active.set_message(format!("{} ({elapsed_secs}s)", self.status));
            }
        }
    }

    fn schedule_refresh(&mut self, _delay: Duration) {
        println!(
            "{}",
            style("New content ingested — it will show up on the next dashboard load.").dim()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reference_lines_pick_title_by_source_type() {
        let reference = RetrievedResult {
            text: None,
            distance: Some(0.1234),
            metadata: json!({"source_type": "video", "video_title": "Episode 1"}),
        };
        assert_eq!(reference_line(&reference), "Video: Episode 1 (dist 0.1234)");

        let reference = RetrievedResult {
            text: None,
            distance: None,
            metadata: json!({"source_type": "document", "original_filename": "notes.pdf"}),
        };
        assert_eq!(reference_line(&reference), "Doc: notes.pdf");

        let reference = RetrievedResult {
            text: None,
            distance: None,
            metadata: json!({}),
        };
        assert_eq!(reference_line(&reference), "Source: n/a");
    }

    #[test]
    fn metrics_line_skips_missing_stages() {
        let metrics = PerformanceMetrics {
            total_duration_ms: Some(1500.0),
            embedding_duration_ms: None,
            retrieval_duration_ms: Some(120.0),
            reranking_duration_ms: None,
            llm_generation_duration_ms: None,
            llm_model_used: Some("gemini-1.5-pro".to_string()),
            retrieved_chunks_count: Some(8),
        };
        assert_eq!(
            metrics_line(&metrics),
            "total 1500ms | retrieval 120ms | model gemini-1.5-pro | 8 chunks"
        );
    }
}
