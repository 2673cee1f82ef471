#![allow(dead_code)]

use std::time::Duration;

use magazzino::render::{Answer, ChatView, StatusSink, StatusStyle};

/// Chat view that records every call for assertions.
#[derive(Default)]
pub struct RecordingView {
    pub echoes: Vec<String>,
    pub placeholder: Option<String>,
    pub placeholder_updates: Vec<String>,
    pub answers: Vec<Answer>,
    pub errors: Vec<String>,
    pub busy_calls: Vec<bool>,
    pub regenerate: Option<bool>,
}

impl ChatView for RecordingView {
    fn echo_user(&mut self, text: &str) {
        self.echoes.push(text.to_string());
    }

    fn show_placeholder(&mut self, message: &str) {
        self.placeholder = Some(message.to_string());
    }

    fn update_placeholder(&mut self, message: &str) {
        self.placeholder = Some(message.to_string());
        self.placeholder_updates.push(message.to_string());
    }

    fn clear_placeholder(&mut self) {
        self.placeholder = None;
    }

    fn render_answer(&mut self, answer: &Answer) {
        self.answers.push(answer.clone());
    }

    fn render_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn set_busy(&mut self, busy: bool) {
        self.busy_calls.push(busy);
    }

    fn set_regenerate(&mut self, active: bool) {
        self.regenerate = Some(active);
    }
}

/// Status sink that records every call for assertions.
#[derive(Default)]
pub struct RecordingSink {
    pub rendered: Vec<(String, StatusStyle, Option<u8>, bool)>,
    pub ticks: Vec<u64>,
    pub busy_calls: Vec<bool>,
    pub refreshes: Vec<Duration>,
}

impl StatusSink for RecordingSink {
    fn render(
        &mut self,
        message: &str,
        style: StatusStyle,
        percent: Option<u8>,
        indeterminate: bool,
    ) {
        self.rendered
            .push((message.to_string(), style, percent, indeterminate));
    }

    fn tick(&mut self, elapsed_secs: u64) {
        self.ticks.push(elapsed_secs);
    }

    fn set_busy(&mut self, busy: bool) {
        self.busy_calls.push(busy);
    }

    fn schedule_refresh(&mut self, delay: Duration) {
        self.refreshes.push(delay);
    }
}
