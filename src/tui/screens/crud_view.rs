//! Search bar, table, pager and modals of one resource list

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::console::forms::{EntryForm, FieldKind, FieldSpec};
use crate::console::resource::SearchFilter;
use crate::console::{CrudScreen, Effect, Field, Resource};
use crate::locale::Locale;
use crate::models::{Action, Module};
use crate::tui::components::{DataTable, FormField, FormFieldType};
use crate::tui::ui::{popup_rect, Styles};

/// What the app must do after a key was handled by the view
pub enum ViewAction<R: Resource> {
    None,
    Run(Effect<R>),
    /// The username lookup field changed
    LookupInput(String),
}

/// Data the view needs from the app while handling keys or drawing
pub struct ViewContext<'a> {
    pub locale: &'a Locale,
    pub apps: &'a [String],
    pub suggestions: &'a [String],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Filters(usize),
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DialogMode {
    Create,
    Edit,
}

/// Widget state of the open dialog
struct DialogView {
    mode: DialogMode,
    fields: Vec<(Field, FieldKind, FormField)>,
    current: usize,
    suggestion: Option<usize>,
}

fn choice_options(kind: FieldKind, ctx: &ViewContext<'_>) -> Vec<(String, String)> {
    match kind {
        FieldKind::Apps => ctx.apps.iter().map(|a| (a.clone(), a.clone())).collect(),
        FieldKind::Modules => Module::ALL
            .iter()
            .map(|m| (m.as_str().to_string(), ctx.locale.module_text(*m)))
            .collect(),
        FieldKind::Actions => Action::ALL
            .iter()
            .map(|a| (a.as_str().to_string(), ctx.locale.action_text(*a)))
            .collect(),
        _ => Vec::new(),
    }
}

impl DialogView {
    fn build(mode: DialogMode, specs: Vec<FieldSpec>, ctx: &ViewContext<'_>) -> Self {
        let fields: Vec<_> = specs
            .into_iter()
            .map(|spec| {
                let field_type = match spec.kind {
                    FieldKind::Text | FieldKind::Lookup => FormFieldType::Text,
                    FieldKind::Secret => FormFieldType::Secret,
                    FieldKind::ReadOnly => FormFieldType::ReadOnly,
                    FieldKind::Apps | FieldKind::Modules | FieldKind::Actions => {
                        FormFieldType::Choice
                    }
                };
                let mut widget = FormField::new(ctx.locale.get(spec.field.label_key()), field_type)
                    .with_placeholder(ctx.locale.get(spec.field.placeholder_key()))
                    .with_value(&spec.value);
                widget.set_options(choice_options(spec.kind, ctx));
                (spec.field, spec.kind, widget)
            })
            .collect();
        let current = fields
            .iter()
            .position(|(_, kind, _)| kind.is_editable())
            .unwrap_or(0);
        let mut view = Self {
            mode,
            fields,
            current,
            suggestion: None,
        };
        view.update_focus();
        view
    }

    fn update_focus(&mut self) {
        for (i, (_, _, widget)) in self.fields.iter_mut().enumerate() {
            widget.set_focus(i == self.current);
        }
    }

    /// Move to the next (or previous) editable field
    fn step(&mut self, forward: bool) {
        let len = self.fields.len();
        for offset in 1..=len {
            let i = if forward {
                (self.current + offset) % len
            } else {
                (self.current + len - offset) % len
            };
            if self.fields[i].1.is_editable() {
                self.current = i;
                break;
            }
        }
        self.suggestion = None;
        self.update_focus();
    }

    fn refresh_options(&mut self, ctx: &ViewContext<'_>) {
        for (_, kind, widget) in self.fields.iter_mut() {
            if *kind == FieldKind::Apps {
                widget.set_options(choice_options(*kind, ctx));
            }
        }
    }

    fn current_kind(&self) -> FieldKind {
        self.fields[self.current].1
    }
}

pub struct CrudView<R: Resource> {
    pub screen: CrudScreen<R>,
    focus: Focus,
    filters: Vec<(Field, FormField)>,
    table: DataTable,
    dialog: Option<DialogView>,
}

impl<R: Resource> CrudView<R> {
    pub fn new(locale: &Locale) -> Self {
        let filters = R::Filter::fields()
            .iter()
            .map(|field| {
                (
                    *field,
                    FormField::new(locale.get(field.label_key()), FormFieldType::Text)
                        .with_placeholder(locale.get(field.placeholder_key())),
                )
            })
            .collect();
        Self {
            screen: CrudScreen::new(),
            focus: Focus::Table,
            filters,
            table: DataTable::new(),
            dialog: None,
        }
    }

    /// Whether keys should go to a text input or modal rather than global shortcuts
    pub fn captures_input(&self) -> bool {
        self.screen.modal_open() || matches!(self.focus, Focus::Filters(_))
    }

    pub fn selected_item(&self) -> Option<R::Item> {
        self.table
            .selected_index()
            .and_then(|i| self.screen.list.items().get(i))
            .cloned()
    }

    /// True while the create dialog's lookup field is focused
    pub fn lookup_active(&self) -> bool {
        self.dialog.as_ref().is_some_and(|d| {
            d.mode == DialogMode::Create && d.current_kind() == FieldKind::Lookup
        })
    }

    /// Follow the core state: keep the selection on a row and drop dialog
    /// widgets once the dialog closed
    pub fn sync(&mut self) {
        self.table.clamp(self.screen.list.items().len());
        let open = match self.dialog.as_ref().map(|d| d.mode) {
            Some(DialogMode::Create) => self.screen.create.is_open(),
            Some(DialogMode::Edit) => self.screen.edit.is_open(),
            None => return,
        };
        if !open {
            self.dialog = None;
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, ctx: &ViewContext<'_>) -> ViewAction<R> {
        if self.screen.list.pending_delete().is_some() {
            return self.handle_confirm_key(key);
        }
        if self.dialog.is_some() {
            return self.handle_dialog_key(key, ctx);
        }
        match self.focus {
            Focus::Filters(i) => self.handle_filter_key(i, key),
            Focus::Table => self.handle_table_key(key, ctx),
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> ViewAction<R> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                match self.screen.confirm_delete() {
                    Some(effect) => ViewAction::Run(effect),
                    None => ViewAction::None,
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.screen.decline_delete();
                ViewAction::None
            }
            _ => ViewAction::None,
        }
    }

    fn handle_table_key(&mut self, key: KeyEvent, ctx: &ViewContext<'_>) -> ViewAction<R> {
        let len = self.screen.list.items().len();
        let list = &self.screen.list;
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.table.navigate_up(len),
            KeyCode::Down | KeyCode::Char('j') => self.table.navigate_down(len),
            KeyCode::Left | KeyCode::PageUp if list.page_no() > 1 => {
                let page = list.page_no() - 1;
                return ViewAction::Run(self.screen.change_page(page));
            }
            KeyCode::Right | KeyCode::PageDown
                if list.pager_visible() && list.page_no() < list.total_pages() =>
            {
                let page = list.page_no() + 1;
                return ViewAction::Run(self.screen.change_page(page));
            }
            KeyCode::Char('r') => return ViewAction::Run(self.screen.refresh()),
            KeyCode::Char('n') | KeyCode::Char('a') => {
                self.screen.open_create();
                self.dialog = Some(DialogView::build(
                    DialogMode::Create,
                    self.screen.create.form().fields(),
                    ctx,
                ));
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(item) = self.selected_item() {
                    self.screen.open_edit(&item);
                    self.dialog = Some(DialogView::build(
                        DialogMode::Edit,
                        self.screen.edit.form().fields(),
                        ctx,
                    ));
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(item) = self.selected_item() {
                    self.screen.request_delete(item);
                }
            }
            KeyCode::Tab | KeyCode::Char('/') => self.focus_filter(0),
            _ => {}
        }
        ViewAction::None
    }

    fn focus_filter(&mut self, index: usize) {
        self.focus = Focus::Filters(index);
        for (i, (_, widget)) in self.filters.iter_mut().enumerate() {
            widget.set_focus(i == index);
        }
    }

    fn focus_table(&mut self) {
        self.focus = Focus::Table;
        for (_, widget) in self.filters.iter_mut() {
            widget.set_focus(false);
        }
    }

    fn handle_filter_key(&mut self, index: usize, key: KeyEvent) -> ViewAction<R> {
        let count = self.filters.len();
        let (field, widget) = &mut self.filters[index];
        let changed = match key.code {
            KeyCode::Char(c) => widget.insert_char(c),
            KeyCode::Backspace => widget.delete_char(),
            KeyCode::Delete => widget.delete_char_forward(),
            KeyCode::Left => {
                widget.move_cursor_left();
                false
            }
            KeyCode::Right => {
                widget.move_cursor_right();
                false
            }
            KeyCode::Home => {
                widget.move_cursor_to_start();
                false
            }
            KeyCode::End => {
                widget.move_cursor_to_end();
                false
            }
            KeyCode::Tab => {
                if index + 1 < count {
                    self.focus_filter(index + 1);
                } else {
                    self.focus_table();
                }
                return ViewAction::None;
            }
            KeyCode::BackTab => {
                if index > 0 {
                    self.focus_filter(index - 1);
                } else {
                    self.focus_table();
                }
                return ViewAction::None;
            }
            KeyCode::Enter => {
                self.focus_table();
                return ViewAction::Run(self.screen.query());
            }
            KeyCode::Esc => {
                self.focus_table();
                return ViewAction::None;
            }
            _ => false,
        };
        if changed {
            let (field, value) = (*field, widget.value.clone());
            self.screen.list.set_filter(field, &value);
        }
        ViewAction::None
    }

    fn dialog_edit(&mut self, mode: DialogMode, field: Field, value: &str) {
        match mode {
            DialogMode::Create => self.screen.create.edit(field, value),
            DialogMode::Edit => self.screen.edit.edit(field, value),
        }
    }

    fn handle_dialog_key(&mut self, key: KeyEvent, ctx: &ViewContext<'_>) -> ViewAction<R> {
        let submitting = match self.dialog.as_ref().map(|d| d.mode) {
            Some(DialogMode::Create) => self.screen.create.is_submitting(),
            Some(DialogMode::Edit) => self.screen.edit.is_submitting(),
            None => return ViewAction::None,
        };
        if submitting {
            return ViewAction::None;
        }
        let Some(dialog) = self.dialog.as_mut() else {
            return ViewAction::None;
        };
        dialog.refresh_options(ctx);
        let mode = dialog.mode;

        match key.code {
            KeyCode::Esc => {
                match mode {
                    DialogMode::Create => self.screen.create.close(),
                    DialogMode::Edit => self.screen.edit.close(),
                }
                self.dialog = None;
                return ViewAction::None;
            }
            KeyCode::Tab => {
                dialog.step(true);
                return ViewAction::None;
            }
            KeyCode::BackTab => {
                dialog.step(false);
                return ViewAction::None;
            }
            KeyCode::Enter => {
                let effect = match mode {
                    DialogMode::Create => self.screen.submit_create(ctx.locale),
                    DialogMode::Edit => self.screen.submit_edit(ctx.locale),
                };
                return match effect {
                    Some(effect) => ViewAction::Run(effect),
                    None => ViewAction::None,
                };
            }
            _ => {}
        }

        let kind = dialog.current_kind();
        let lookup = kind == FieldKind::Lookup;
        let (field, _, widget) = &mut dialog.fields[dialog.current];
        let field = *field;
        let changed = match key.code {
            KeyCode::Up | KeyCode::Down if kind.is_choice() => {
                widget.cycle_option(key.code == KeyCode::Down)
            }
            KeyCode::Up | KeyCode::Down if lookup && !ctx.suggestions.is_empty() => {
                let len = ctx.suggestions.len();
                let next = match (dialog.suggestion, key.code) {
                    (None, KeyCode::Down) => 0,
                    (None, _) => len - 1,
                    (Some(i), KeyCode::Down) => (i + 1) % len,
                    (Some(i), _) => (i + len - 1) % len,
                };
                dialog.suggestion = Some(next);
                widget.set_value(&ctx.suggestions[next]);
                // choosing a suggestion must not trigger another lookup
                let value = widget.value.clone();
                self.dialog_edit(mode, field, &value);
                return ViewAction::None;
            }
            KeyCode::Char(c) => widget.insert_char(c),
            KeyCode::Backspace => widget.delete_char(),
            KeyCode::Delete => widget.delete_char_forward(),
            KeyCode::Left => {
                widget.move_cursor_left();
                false
            }
            KeyCode::Right => {
                widget.move_cursor_right();
                false
            }
            KeyCode::Home => {
                widget.move_cursor_to_start();
                false
            }
            KeyCode::End => {
                widget.move_cursor_to_end();
                false
            }
            _ => false,
        };
        if !changed {
            return ViewAction::None;
        }
        let value = widget.value.clone();
        dialog.suggestion = None;
        self.dialog_edit(mode, field, &value);
        if lookup {
            ViewAction::LookupInput(value)
        } else {
            ViewAction::None
        }
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, ctx: &ViewContext<'_>) {
        let list = &self.screen.list;
        let pager_height = if list.pager_visible() { 1 } else { 0 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(pager_height),
            ])
            .split(area);

        let filter_count = self.filters.len() as u32;
        let filter_areas = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(
                (0..filter_count)
                    .map(|_| Constraint::Ratio(1, filter_count.max(1)))
                    .collect::<Vec<_>>(),
            )
            .split(chunks[0]);
        for ((_, widget), area) in self.filters.iter().zip(filter_areas.iter()) {
            widget.render(f, *area);
        }

        let title = format!(
            "{} ({})",
            ctx.locale.get(R::TITLE_KEY),
            self.screen.list.total_count()
        );
        let focused = self.focus == Focus::Table && !self.screen.modal_open();
        self.table
            .render(f, chunks[1], &title, &self.screen.list, ctx.locale, focused);

        let list = &self.screen.list;
        if list.pager_visible() {
            let pager = Line::from(vec![
                Span::styled("◀ ", Styles::inactive()),
                Span::raw(format!("{} / {}", list.page_no(), list.total_pages())),
                Span::styled(" ▶", Styles::inactive()),
            ]);
            f.render_widget(Paragraph::new(pager).alignment(ratatui::layout::Alignment::Right), chunks[2]);
        }

        if let Some(dialog) = self.dialog.as_mut() {
            dialog.refresh_options(ctx);
        }
        if self.dialog.is_some() {
            self.render_dialog(f, area, ctx);
        }
        if let Some(item) = self.screen.list.pending_delete() {
            render_confirm::<R>(f, area, ctx.locale, &R::describe(item));
        }
    }

    fn render_dialog(&mut self, f: &mut Frame, area: Rect, ctx: &ViewContext<'_>) {
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        let (title_key, errors, failure, submitting) = match dialog.mode {
            DialogMode::Create => (
                R::CREATE_TITLE_KEY,
                self.screen.create.errors(),
                self.screen.create.failure(),
                self.screen.create.is_submitting(),
            ),
            DialogMode::Edit => (
                R::EDIT_TITLE_KEY,
                self.screen.edit.errors(),
                self.screen.edit.failure(),
                self.screen.edit.is_submitting(),
            ),
        };

        let height = dialog.fields.len() as u16 * 3 + 4;
        let popup = popup_rect(60, height, area);
        f.render_widget(Clear, popup);
        let mut title = ctx.locale.get(title_key).to_string();
        if submitting {
            title = format!("{} - {}", title, ctx.locale.get("loading"));
        }
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Styles::active_border());
        let inner = block.inner(popup);
        f.render_widget(block, popup);

        let mut constraints: Vec<Constraint> =
            dialog.fields.iter().map(|_| Constraint::Length(3)).collect();
        constraints.push(Constraint::Min(1));
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        for (i, (field, _, widget)) in dialog.fields.iter_mut().enumerate() {
            widget.validation_error = errors.get(*field).map(str::to_string);
            widget.render(f, rows[i]);
        }

        let footer = match failure {
            Some(message) => Line::from(Span::styled(message.to_string(), Styles::error())),
            None => Line::from(Span::styled(
                "Enter: submit | Tab: next field | Esc: cancel",
                Styles::inactive(),
            )),
        };
        f.render_widget(
            Paragraph::new(footer).wrap(Wrap { trim: true }),
            rows[dialog.fields.len()],
        );

        // suggestions float below the lookup field
        let current = dialog.current;
        if dialog.mode == DialogMode::Create && dialog.current_kind() == FieldKind::Lookup {
            let anchor = rows[current];
            let height = (ctx.suggestions.len() as u16 + 2).min(8);
            let below = Rect::new(
                anchor.x,
                anchor.y + anchor.height,
                anchor.width,
                height.min(area.bottom().saturating_sub(anchor.y + anchor.height)),
            );
            let (_, _, widget) = &dialog.fields[current];
            widget.render_suggestions(f, below, ctx.suggestions, dialog.suggestion);
        }
    }
}

fn render_confirm<R: Resource>(f: &mut Frame, area: Rect, locale: &Locale, target: &str) {
    let popup = popup_rect(50, 7, area);
    f.render_widget(Clear, popup);
    let text = vec![
        Line::from(locale.get(R::DELETE_TIP_KEY).to_string()),
        Line::from(Span::styled(target.to_string(), Styles::title())),
        Line::from(""),
        Line::from(Span::styled("y/Enter: confirm | n/Esc: cancel", Styles::inactive())),
    ];
    let block = Block::default()
        .title(locale.get(R::DELETE_TITLE_KEY).to_string())
        .borders(Borders::ALL)
        .border_style(Styles::error());
    f.render_widget(Paragraph::new(text).block(block).wrap(Wrap { trim: true }), popup);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{Outcome, Permissions, Users};
    use crate::models::{Page, User, UserAppPermission};
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text<R: Resource>(view: &mut CrudView<R>, ctx: &ViewContext<'_>, text: &str) {
        for c in text.chars() {
            view.handle_key(key(KeyCode::Char(c)), ctx);
        }
    }

    #[test]
    fn test_create_dialog_through_keys() {
        let locale = Locale::en_us();
        let apps = vec!["orders".to_string(), "billing".to_string()];
        let ctx = ViewContext {
            locale: &locale,
            apps: &apps,
            suggestions: &[],
        };
        let mut view = CrudView::<Permissions>::new(&locale);
        view.handle_key(key(KeyCode::Char('n')), &ctx);
        assert!(view.lookup_active());

        let mut last = None;
        for c in "ali".chars() {
            if let ViewAction::LookupInput(value) = view.handle_key(key(KeyCode::Char(c)), &ctx) {
                last = Some(value);
            }
        }
        assert_eq!(last.as_deref(), Some("ali"));

        view.handle_key(key(KeyCode::Tab), &ctx);
        view.handle_key(key(KeyCode::Down), &ctx);
        view.handle_key(key(KeyCode::Tab), &ctx);
        view.handle_key(key(KeyCode::Down), &ctx);
        view.handle_key(key(KeyCode::Tab), &ctx);
        view.handle_key(key(KeyCode::Up), &ctx);

        match view.handle_key(key(KeyCode::Enter), &ctx) {
            ViewAction::Run(Effect::Create(draft)) => {
                assert_eq!(
                    draft,
                    UserAppPermission::new("ali", "orders", Module::Config, Action::ReadWrite)
                );
            }
            _ => panic!("expected a create effect"),
        }
        // input is ignored while submitting
        assert!(matches!(view.handle_key(key(KeyCode::Esc), &ctx), ViewAction::None));
        assert!(view.screen.create.is_submitting());

        let refresh = view.screen.apply(Outcome::Created(Ok("ok".into())), &locale);
        assert!(refresh.is_some());
        view.sync();
        assert!(!view.captures_input());
    }

    #[test]
    fn test_filter_enter_queries_first_page() {
        let locale = Locale::en_us();
        let ctx = ViewContext {
            locale: &locale,
            apps: &[],
            suggestions: &[],
        };
        let mut view = CrudView::<Users>::new(&locale);
        view.handle_key(key(KeyCode::Char('/')), &ctx);
        assert!(view.captures_input());
        type_text(&mut view, &ctx, "bo");
        match view.handle_key(key(KeyCode::Enter), &ctx) {
            ViewAction::Run(Effect::Search(req)) => {
                assert_eq!(req.criteria.filter.username, "bo");
                assert_eq!(req.criteria.page_no, 1);
            }
            _ => panic!("expected a search"),
        }
    }

    #[test]
    fn test_delete_needs_confirmation() {
        let locale = Locale::en_us();
        let ctx = ViewContext {
            locale: &locale,
            apps: &[],
            suggestions: &[],
        };
        let mut view = CrudView::<Users>::new(&locale);
        let req = view.screen.list.mount();
        view.screen.list.search_settled(
            req.seq,
            Ok(Page::new(vec![User::new("bob", "")], 1)),
            &locale,
        );
        view.table.clamp(1);

        view.handle_key(key(KeyCode::Char('d')), &ctx);
        assert!(view.captures_input());
        assert!(matches!(view.handle_key(key(KeyCode::Char('n')), &ctx), ViewAction::None));
        assert!(view.screen.list.pending_delete().is_none());

        view.handle_key(key(KeyCode::Char('d')), &ctx);
        match view.handle_key(key(KeyCode::Char('y')), &ctx) {
            ViewAction::Run(Effect::Delete(user)) => assert_eq!(user.username, "bob"),
            _ => panic!("expected a delete"),
        }
    }
}
