//! Table of the rows on the current page of a resource list

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::console::resource::{Resource, TableRow};
use crate::console::ListState as PageState;
use crate::locale::Locale;
use crate::tui::ui::{pad_to_width, Styles};

const SEPARATOR: &str = " | ";

/// Selection state of the table
#[derive(Debug, Default)]
pub struct DataTable {
    pub state: ListState,
}

impl DataTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.state.selected()
    }

    /// Keep the selection inside `len` rows
    pub fn clamp(&mut self, len: usize) {
        let selected = match (len, self.state.selected()) {
            (0, _) => None,
            (_, None) => Some(0),
            (len, Some(i)) => Some(i.min(len - 1)),
        };
        self.state.select(selected);
    }

    pub fn navigate_up(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let selected = self.state.selected().unwrap_or(0);
        self.state
            .select(Some(if selected == 0 { len - 1 } else { selected - 1 }));
    }

    pub fn navigate_down(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let selected = self.state.selected().unwrap_or(0);
        self.state.select(Some((selected + 1) % len));
    }

    /// Render header, rows and selection. The title carries loading state
    /// and, when more than one page exists, the current page.
    pub fn render<R: Resource>(
        &mut self,
        f: &mut Frame,
        area: Rect,
        title: &str,
        list: &PageState<R>,
        locale: &Locale,
        focused: bool,
    ) {
        let columns = R::Item::columns();
        let header: Vec<String> = columns
            .iter()
            .map(|c| locale.get(c.label_key()).to_string())
            .collect();
        let rows: Vec<Vec<String>> = list
            .items()
            .iter()
            .map(|item| columns.iter().map(|c| item.cell(*c, locale)).collect())
            .collect();
        self.clamp(rows.len());

        let inner_width = area.width.saturating_sub(2) as usize;
        let widths = column_widths(&header, &rows, inner_width);

        let line = |cells: &[String], style: Style| {
            let mut spans = Vec::new();
            for (i, (cell, width)) in cells.iter().zip(&widths).enumerate() {
                if i > 0 {
                    spans.push(Span::styled(SEPARATOR, style));
                }
                spans.push(Span::styled(pad_to_width(cell, *width), style));
            }
            Line::from(spans)
        };

        let mut items = vec![ListItem::new(line(&header, Styles::title()))];
        if rows.is_empty() && !list.is_loading() {
            items.push(ListItem::new(Span::styled(locale.get("empty"), Styles::inactive())));
        }
        let selected = self.state.selected();
        for (i, row) in rows.iter().enumerate() {
            let style = if focused && Some(i) == selected {
                Styles::selected()
            } else {
                Style::default()
            };
            items.push(ListItem::new(line(row, style)));
        }

        let mut title = title.to_string();
        if list.is_loading() {
            title = format!("{} - {}", title, locale.get("loading"));
        }
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(if focused {
                Styles::active_border()
            } else {
                Styles::inactive_border()
            });

        // the header occupies row 0 of the list, shift the selection past it
        let mut render_state = ListState::default();
        if focused {
            render_state.select(selected.map(|i| i + 1));
        }
        f.render_stateful_widget(List::new(items).block(block), area, &mut render_state);
    }
}

/// Natural column widths, shrunk proportionally when they do not fit
pub fn column_widths(header: &[String], rows: &[Vec<String>], available: usize) -> Vec<usize> {
    let mut widths: Vec<usize> = header.iter().map(|h| h.width()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.width());
            }
        }
    }
    let separators = SEPARATOR.len() * widths.len().saturating_sub(1);
    let budget = available.saturating_sub(separators);
    let natural: usize = widths.iter().sum();
    if natural > budget && natural > 0 {
        for w in widths.iter_mut() {
            *w = (*w * budget / natural).max(3);
        }
    }
    widths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_selection() {
        let mut table = DataTable::new();
        table.clamp(3);
        assert_eq!(table.selected_index(), Some(0));
        table.navigate_up(3);
        assert_eq!(table.selected_index(), Some(2));
        table.clamp(1);
        assert_eq!(table.selected_index(), Some(0));
        table.clamp(0);
        assert_eq!(table.selected_index(), None);
    }

    #[test]
    fn test_column_widths_shrink_to_fit() {
        let header = vec!["Username".to_string(), "App".to_string()];
        let rows = vec![vec!["a-very-long-user-name".to_string(), "orders".to_string()]];
        assert_eq!(column_widths(&header, &rows, 80), vec![21, 6]);

        let narrow = column_widths(&header, &rows, 20);
        assert!(narrow.iter().sum::<usize>() + 3 <= 20);
    }
}
