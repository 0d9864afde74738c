//! Form field component for user input

use ratatui::{
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::tui::ui::Styles;

/// Type of form field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFieldType {
    Text,
    /// Text rendered masked
    Secret,
    /// Displayed only
    ReadOnly,
    /// One of a fixed set of options
    Choice,
}

/// Individual form field
#[derive(Debug, Clone)]
pub struct FormField {
    pub label: String,
    pub value: String,
    pub placeholder: String,
    pub field_type: FormFieldType,
    pub is_focused: bool,
    /// Cursor position in characters
    pub cursor_position: usize,
    /// `(value, label)` pairs of a choice field
    pub options: Vec<(String, String)>,
    pub validation_error: Option<String>,
}

impl FormField {
    pub fn new(label: &str, field_type: FormFieldType) -> Self {
        Self {
            label: label.to_string(),
            value: String::new(),
            placeholder: String::new(),
            field_type,
            is_focused: false,
            cursor_position: 0,
            options: Vec::new(),
            validation_error: None,
        }
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = placeholder.to_string();
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.set_value(value);
        self
    }

    pub fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor_position = self.value.chars().count();
    }

    pub fn set_options(&mut self, options: Vec<(String, String)>) {
        self.options = options;
    }

    pub fn set_focus(&mut self, focused: bool) {
        self.is_focused = focused;
    }

    pub fn accepts_text(&self) -> bool {
        matches!(self.field_type, FormFieldType::Text | FormFieldType::Secret)
    }

    fn byte_index(&self, chars: usize) -> usize {
        self.value
            .char_indices()
            .nth(chars)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    /// Returns true when the value changed
    pub fn insert_char(&mut self, c: char) -> bool {
        if !self.accepts_text() {
            return false;
        }
        let at = self.byte_index(self.cursor_position);
        self.value.insert(at, c);
        self.cursor_position += 1;
        true
    }

    pub fn delete_char(&mut self) -> bool {
        if !self.accepts_text() || self.cursor_position == 0 {
            return false;
        }
        self.cursor_position -= 1;
        let at = self.byte_index(self.cursor_position);
        self.value.remove(at);
        true
    }

    pub fn delete_char_forward(&mut self) -> bool {
        if !self.accepts_text() || self.cursor_position >= self.value.chars().count() {
            return false;
        }
        let at = self.byte_index(self.cursor_position);
        self.value.remove(at);
        true
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_position < self.value.chars().count() {
            self.cursor_position += 1;
        }
    }

    pub fn move_cursor_to_start(&mut self) {
        self.cursor_position = 0;
    }

    pub fn move_cursor_to_end(&mut self) {
        self.cursor_position = self.value.chars().count();
    }

    /// Step through the options of a choice field; returns true when the
    /// value changed
    pub fn cycle_option(&mut self, forward: bool) -> bool {
        if self.field_type != FormFieldType::Choice || self.options.is_empty() {
            return false;
        }
        let len = self.options.len();
        let next = match self.options.iter().position(|(v, _)| *v == self.value) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None if forward => 0,
            None => len - 1,
        };
        let value = self.options[next].0.clone();
        let changed = value != self.value;
        self.set_value(&value);
        changed
    }

    fn display_text(&self) -> String {
        match self.field_type {
            FormFieldType::Secret => "*".repeat(self.value.chars().count()),
            FormFieldType::Choice => self
                .options
                .iter()
                .find(|(v, _)| *v == self.value)
                .map(|(_, label)| label.clone())
                .unwrap_or_else(|| self.value.clone()),
            _ => self.value.clone(),
        }
    }

    /// Render the form field
    pub fn render(&self, f: &mut Frame, area: Rect) {
        let show_placeholder = self.value.is_empty() && !self.placeholder.is_empty();
        let display_text = if show_placeholder {
            self.placeholder.clone()
        } else {
            self.display_text()
        };

        let border_style = if self.is_focused {
            Styles::active_border()
        } else if self.validation_error.is_some() {
            Styles::error()
        } else {
            Styles::inactive_border()
        };

        let title = match &self.validation_error {
            Some(error) => format!("{} - {}", self.label, error),
            None if self.field_type == FormFieldType::Choice && self.is_focused => {
                format!("{} (↑/↓)", self.label)
            }
            None => self.label.clone(),
        };

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style);

        let text_style = if show_placeholder || self.field_type == FormFieldType::ReadOnly {
            Styles::inactive()
        } else {
            Styles::default()
        };

        let paragraph = Paragraph::new(display_text).style(text_style).block(block);
        f.render_widget(paragraph, area);

        if self.is_focused && self.accepts_text() {
            let before: String = self.value.chars().take(self.cursor_position).collect();
            let offset = if self.field_type == FormFieldType::Secret {
                self.cursor_position
            } else {
                before.width()
            };
            let cursor_x = area.x + 1 + offset as u16;
            let cursor_y = area.y + 1;
            if cursor_x < area.x + area.width.saturating_sub(1) {
                f.set_cursor(cursor_x, cursor_y);
            }
        }
    }

    /// Render a suggestion list under the field
    pub fn render_suggestions(
        &self,
        f: &mut Frame,
        area: Rect,
        suggestions: &[String],
        selected: Option<usize>,
    ) {
        if suggestions.is_empty() || area.height < 3 {
            return;
        }
        let items: Vec<ListItem> = suggestions
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let style = if Some(i) == selected {
                    Styles::selected()
                } else {
                    Style::default()
                };
                ListItem::new(name.clone()).style(style)
            })
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Styles::active_border());
        let mut state = ListState::default();
        state.select(selected);
        f.render_stateful_widget(List::new(items).block(block), area, &mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editing_multibyte_text() {
        let mut field = FormField::new("Username", FormFieldType::Text).with_value("名字");
        assert_eq!(field.cursor_position, 2);
        field.move_cursor_left();
        assert!(field.insert_char('x'));
        assert_eq!(field.value, "名x字");
        assert!(field.delete_char());
        field.move_cursor_to_end();
        assert!(field.delete_char());
        assert_eq!(field.value, "名");
        assert!(!field.delete_char_forward());
    }

    #[test]
    fn test_read_only_ignores_input() {
        let mut field = FormField::new("App", FormFieldType::ReadOnly).with_value("orders");
        assert!(!field.insert_char('x'));
        assert!(!field.delete_char());
        assert_eq!(field.value, "orders");
    }

    #[test]
    fn test_cycle_option() {
        let mut field = FormField::new("Action", FormFieldType::Choice);
        field.set_options(vec![
            ("r".into(), "Read".into()),
            ("w".into(), "Write".into()),
            ("rw".into(), "Read & write".into()),
        ]);
        assert!(field.cycle_option(true));
        assert_eq!(field.value, "r");
        field.cycle_option(false);
        assert_eq!(field.value, "rw");
        assert_eq!(field.display_text(), "Read & write");
        assert!(!field.insert_char('x'));
    }
}
