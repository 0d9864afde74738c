//! Help popup with per-section keyboard reference

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::tui::ui::{centered_rect, Styles};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpSection {
    Overview,
    Lists,
    Dialogs,
    Shortcuts,
}

impl HelpSection {
    pub const ALL: [HelpSection; 4] = [
        HelpSection::Overview,
        HelpSection::Lists,
        HelpSection::Dialogs,
        HelpSection::Shortcuts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HelpSection::Overview => "Overview",
            HelpSection::Lists => "Lists & Paging",
            HelpSection::Dialogs => "Create / Edit",
            HelpSection::Shortcuts => "Keyboard Shortcuts",
        }
    }
}

pub struct HelpScreen {
    pub current_section: usize,
    pub section_state: ListState,
    pub scroll_offset: usize,
}

impl Default for HelpScreen {
    fn default() -> Self {
        let mut section_state = ListState::default();
        section_state.select(Some(0));
        Self {
            current_section: 0,
            section_state,
            scroll_offset: 0,
        }
    }
}

impl HelpScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&self) -> HelpSection {
        HelpSection::ALL[self.current_section]
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::BackTab => {
                if self.current_section > 0 {
                    self.current_section -= 1;
                    self.scroll_offset = 0;
                }
            }
            KeyCode::Down | KeyCode::Tab => {
                if self.current_section + 1 < HelpSection::ALL.len() {
                    self.current_section += 1;
                    self.scroll_offset = 0;
                }
            }
            KeyCode::PageUp => self.scroll_offset = self.scroll_offset.saturating_sub(10),
            KeyCode::PageDown => self.scroll_offset += 10,
            KeyCode::Home => self.scroll_offset = 0,
            _ => {}
        }
        self.section_state.select(Some(self.current_section));
    }

    fn section_content(&self) -> Vec<Line<'static>> {
        match self.section() {
            HelpSection::Overview => vec![
                Line::from(Span::styled("permctl - user & app permission console", Styles::title())),
                Line::from(""),
                Line::from("Two tabs manage the server's console accounts:"),
                Line::from("• App Permissions - which user may read/write which app"),
                Line::from("• Users - console accounts and their namespace keys"),
                Line::from(""),
                Line::from("Changes are sent to the server immediately. Lists refresh"),
                Line::from("after every successful change."),
            ],
            HelpSection::Lists => vec![
                Line::from(Span::styled("Lists & Paging", Styles::title())),
                Line::from(""),
                Line::from(Span::styled("Filters:", Styles::info())),
                Line::from("• Tab or / - Focus the filter inputs"),
                Line::from("• Enter - Search from the first page"),
                Line::from("• Esc - Back to the table"),
                Line::from(""),
                Line::from(Span::styled("Paging:", Styles::info())),
                Line::from("The pager appears when there are more rows than fit on a page"),
                Line::from("(10 permissions or 9 users)."),
                Line::from("• ←/→ or Page Up/Down - Previous/next page"),
                Line::from("• r - Re-run the current search"),
            ],
            HelpSection::Dialogs => vec![
                Line::from(Span::styled("Create / Edit", Styles::title())),
                Line::from(""),
                Line::from("Every field of a dialog is required. Missing fields are"),
                Line::from("highlighted and nothing is sent until all are filled."),
                Line::from(""),
                Line::from(Span::styled("In a dialog:", Styles::info())),
                Line::from("• Tab/Shift+Tab - Next/previous field"),
                Line::from("• ↑/↓ - Change a choice, or pick a username suggestion"),
                Line::from("• Enter - Submit"),
                Line::from("• Esc - Cancel and discard the form"),
                Line::from(""),
                Line::from("A rejected submission keeps the dialog open with the"),
                Line::from("server's message so you can fix it or cancel."),
            ],
            HelpSection::Shortcuts => vec![
                Line::from(Span::styled("Keyboard Shortcuts Reference", Styles::title())),
                Line::from(""),
                Line::from("┌─────────────┬─────────────────────────────────┐"),
                Line::from("│ 1 / 2       │ App Permissions / Users tab     │"),
                Line::from("│ ↑/↓         │ Select row                      │"),
                Line::from("│ n           │ New entry                       │"),
                Line::from("│ Enter / e   │ Edit selected row               │"),
                Line::from("│ d           │ Delete selected row             │"),
                Line::from("│ r           │ Refresh                         │"),
                Line::from("│ F1 or ?     │ Toggle help                     │"),
                Line::from("│ q / Ctrl+C  │ Quit                            │"),
                Line::from("└─────────────┴─────────────────────────────────┘"),
            ],
        }
    }

    /// Draw as a popup over `area`
    pub fn draw(&mut self, f: &mut Frame, area: Rect) {
        let popup = centered_rect(80, 70, area);
        f.render_widget(Clear, popup);

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(25), Constraint::Percentage(75)])
            .split(popup);

        let items: Vec<ListItem> = HelpSection::ALL
            .iter()
            .enumerate()
            .map(|(i, section)| {
                let style = if i == self.current_section {
                    Styles::selected()
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(Span::styled(section.as_str(), style)))
            })
            .collect();
        let sections = List::new(items).block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Styles::active_border()),
        );
        f.render_stateful_widget(sections, chunks[0], &mut self.section_state);

        let lines: Vec<Line> = self
            .section_content()
            .into_iter()
            .skip(self.scroll_offset)
            .collect();
        let content = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(format!("Help - {} (Esc to close)", self.section().as_str()))
                    .borders(Borders::ALL)
                    .border_style(Styles::active_border()),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(content, chunks[1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    #[test]
    fn test_section_navigation_stays_in_range() {
        let mut help = HelpScreen::new();
        help.handle_key(KeyEvent::new(KeyCode::Up, KeyModifiers::NONE));
        assert_eq!(help.section(), HelpSection::Overview);
        for _ in 0..10 {
            help.handle_key(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE));
        }
        assert_eq!(help.section(), HelpSection::Shortcuts);
        help.handle_key(KeyEvent::new(KeyCode::PageDown, KeyModifiers::NONE));
        assert_eq!(help.scroll_offset, 10);
    }
}
