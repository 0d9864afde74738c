//! Status bar showing the latest notification

use chrono::{DateTime, Local};
use ratatui::{
    layout::Rect,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::console::{Notice, NoticeLevel};
use crate::tui::ui::Styles;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusType {
    Info,
    Success,
    Error,
    Loading,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub message: String,
    pub status_type: StatusType,
    pub timestamp: DateTime<Local>,
}

impl StatusMessage {
    pub fn new(message: impl Into<String>, status_type: StatusType) -> Self {
        Self {
            message: message.into(),
            status_type,
            timestamp: Local::now(),
        }
    }
}

impl From<Notice> for StatusMessage {
    fn from(notice: Notice) -> Self {
        let status_type = match notice.level {
            NoticeLevel::Info => StatusType::Info,
            NoticeLevel::Success => StatusType::Success,
            NoticeLevel::Error => StatusType::Error,
        };
        Self::new(notice.message, status_type)
    }
}

/// Status display component
pub struct StatusDisplay {
    pub current_message: Option<StatusMessage>,
    pub message_history: Vec<StatusMessage>,
    pub max_history: usize,
    pub show_timestamp: bool,
    pub auto_clear_timeout: Option<std::time::Duration>,
}

impl Default for StatusDisplay {
    fn default() -> Self {
        Self {
            current_message: None,
            message_history: Vec::new(),
            max_history: 100,
            show_timestamp: false,
            auto_clear_timeout: None,
        }
    }
}

impl StatusDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timestamps(mut self) -> Self {
        self.show_timestamp = true;
        self
    }

    pub fn with_auto_clear(mut self, timeout: std::time::Duration) -> Self {
        self.auto_clear_timeout = Some(timeout);
        self
    }

    pub fn set_message(&mut self, message: StatusMessage) {
        self.archive_current();
        self.current_message = Some(message);
    }

    pub fn set_info(&mut self, message: impl Into<String>) {
        self.set_message(StatusMessage::new(message, StatusType::Info));
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.set_message(StatusMessage::new(message, StatusType::Error));
    }

    pub fn set_loading(&mut self, message: impl Into<String>) {
        self.set_message(StatusMessage::new(message, StatusType::Loading));
    }

    pub fn notify(&mut self, notice: Notice) {
        self.set_message(notice.into());
    }

    pub fn clear(&mut self) {
        self.archive_current();
    }

    fn archive_current(&mut self) {
        if let Some(current) = self.current_message.take() {
            self.message_history.push(current);
            if self.message_history.len() > self.max_history {
                self.message_history.remove(0);
            }
        }
    }

    pub fn get_current(&self) -> Option<&StatusMessage> {
        self.current_message.as_ref()
    }

    pub fn get_history(&self) -> &[StatusMessage] {
        &self.message_history
    }

    /// Errors stay until replaced; everything else clears after the timeout
    pub fn should_auto_clear(&self) -> bool {
        if let (Some(timeout), Some(message)) = (self.auto_clear_timeout, &self.current_message) {
            if message.status_type == StatusType::Error {
                return false;
            }
            let elapsed = Local::now().signed_duration_since(message.timestamp);
            return elapsed.to_std().unwrap_or_default() > timeout;
        }
        false
    }

    /// Render with the given hint line used when there is no message
    pub fn render(&self, f: &mut Frame, area: Rect, idle_text: &str) {
        let (content, style) = match &self.current_message {
            Some(message) => {
                let style = match message.status_type {
                    StatusType::Info => Styles::info(),
                    StatusType::Success => Styles::success(),
                    StatusType::Error => Styles::error(),
                    StatusType::Loading => Styles::warning(),
                };
                (self.format_message(message), style)
            }
            None => (idle_text.to_string(), Styles::inactive()),
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Styles::inactive_border());

        f.render_widget(Paragraph::new(content).style(style).block(block), area);
    }

    fn format_message(&self, message: &StatusMessage) -> String {
        let prefix = match message.status_type {
            StatusType::Info => "ℹ",
            StatusType::Success => "✓",
            StatusType::Error => "✗",
            StatusType::Loading => "⟳",
        };

        if self.show_timestamp {
            format!(
                "{} [{}] {}",
                prefix,
                message.timestamp.format("%H:%M:%S"),
                message.message
            )
        } else {
            format!("{} {}", prefix, message.message)
        }
    }
}
