//! Main TUI application state and logic

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    text::{Line, Span},
    widgets::{Block, Borders, Tabs},
    Frame, Terminal,
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use super::components::StatusDisplay;
use super::events::AppEvent;
use super::screens::{CrudView, HelpScreen, ViewAction, ViewContext};
use super::ui::Styles;
use crate::console::{execute, Effect, Outcome, Permissions, Resource, Users, UsernameLookup};
use crate::gateway::{ConsoleGateway, DirectoryGateway, Gateway};
use crate::locale::Locale;

const TICK: Duration = Duration::from_millis(50);
const STATUS_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Permissions,
    Users,
}

/// Main TUI application state
pub struct App {
    locale: Locale,
    gateway: Arc<dyn ConsoleGateway>,
    tx: UnboundedSender<AppEvent>,
    rx: UnboundedReceiver<AppEvent>,

    pub tab: Tab,
    pub permissions: CrudView<Permissions>,
    pub users: CrudView<Users>,
    /// Apps offered by the permission create dialog
    apps: Vec<String>,
    lookup: UsernameLookup,

    pub status: StatusDisplay,
    help: HelpScreen,
    pub show_help: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(gateway: Arc<dyn ConsoleGateway>, locale: Locale, debounce: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            permissions: CrudView::new(&locale),
            users: CrudView::new(&locale),
            locale,
            gateway,
            tx,
            rx,
            tab: Tab::Permissions,
            apps: Vec::new(),
            lookup: UsernameLookup::new(debounce),
            status: StatusDisplay::new()
                .with_timestamps()
                .with_auto_clear(STATUS_TIMEOUT),
            help: HelpScreen::new(),
            show_help: false,
            should_quit: false,
        }
    }

    /// Load both lists and the app choices; each lands as soon as it arrives
    pub fn mount(&mut self) {
        self.status.set_loading(self.locale.get("loading").to_string());
        let perms = self.permissions.screen.mount();
        self.spawn(perms, AppEvent::Permissions);
        let users = self.users.screen.mount();
        self.spawn(users, AppEvent::Users);

        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let apps = gateway.list_apps().await.map_err(|e| e.to_string());
            // the receiver is gone only once the app has quit
            let _ = tx.send(AppEvent::Apps(apps));
        });
    }

    /// Wait for input no longer than the next due username lookup
    fn poll_timeout(&self, now: Instant) -> Duration {
        self.lookup
            .next_due()
            .map(|due| due.saturating_duration_since(now).min(TICK))
            .unwrap_or(TICK)
    }

    fn spawn<R>(&self, effect: Effect<R>, wrap: fn(Outcome<R>) -> AppEvent)
    where
        R: Resource,
        dyn ConsoleGateway: Gateway<R>,
    {
        debug!("Spawning {} {}", R::NAME, effect.describe());
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = execute::<R, dyn ConsoleGateway>(gateway.as_ref(), effect).await;
            let _ = tx.send(wrap(outcome));
        });
    }

    fn spawn_lookup(&self, seq: u64, fragment: String) {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = gateway
                .search_usernames(&fragment)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(AppEvent::Lookup { seq, result });
        });
    }

    /// Run the main application loop
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        self.mount();

        loop {
            terminal.draw(|f| self.draw(f))?;

            if event::poll(self.poll_timeout(Instant::now()))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }

            while let Ok(event) = self.rx.try_recv() {
                self.handle_app_event(event);
            }

            if let Some(req) = self.lookup.poll(Instant::now()) {
                self.spawn_lookup(req.seq, req.fragment);
            }

            if self.status.should_auto_clear() {
                self.status.clear();
            }

            if self.should_quit {
                info!("Quitting");
                break;
            }
        }

        Ok(())
    }

    fn captures_input(&self) -> bool {
        match self.tab {
            Tab::Permissions => self.permissions.captures_input(),
            Tab::Users => self.users.captures_input(),
        }
    }

    /// Handle keyboard input events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.show_help {
            match key.code {
                KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?') | KeyCode::Char('q') => {
                    self.show_help = false
                }
                _ => self.help.handle_key(key),
            }
            return;
        }

        if !self.captures_input() {
            match key.code {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                    return;
                }
                KeyCode::F(1) | KeyCode::Char('?') => {
                    self.show_help = true;
                    return;
                }
                KeyCode::Char('1') => {
                    self.tab = Tab::Permissions;
                    return;
                }
                KeyCode::Char('2') => {
                    self.tab = Tab::Users;
                    return;
                }
                _ => {}
            }
        }

        let ctx = ViewContext {
            locale: &self.locale,
            apps: &self.apps,
            suggestions: self.lookup.suggestions(),
        };
        match self.tab {
            Tab::Permissions => {
                let action = self.permissions.handle_key(key, &ctx);
                self.run_view_action(action, AppEvent::Permissions);
            }
            Tab::Users => {
                let action = self.users.handle_key(key, &ctx);
                self.run_view_action(action, AppEvent::Users);
            }
        }
        self.after_update();
    }

    fn run_view_action<R>(&mut self, action: ViewAction<R>, wrap: fn(Outcome<R>) -> AppEvent)
    where
        R: Resource,
        dyn ConsoleGateway: Gateway<R>,
    {
        match action {
            ViewAction::None => {}
            ViewAction::Run(effect) => self.spawn(effect, wrap),
            ViewAction::LookupInput(fragment) => self.lookup.input(&fragment, Instant::now()),
        }
    }

    /// Feed a finished background call back into the screens
    pub fn handle_app_event(&mut self, event: AppEvent) {
        debug!("Received {} event", event.name());
        match event {
            AppEvent::Permissions(outcome) => {
                if let Some(next) = self.permissions.screen.apply(outcome, &self.locale) {
                    self.spawn(next, AppEvent::Permissions);
                }
            }
            AppEvent::Users(outcome) => {
                if let Some(next) = self.users.screen.apply(outcome, &self.locale) {
                    self.spawn(next, AppEvent::Users);
                }
            }
            AppEvent::Lookup { seq, result } => self.lookup.settled(seq, result),
            AppEvent::Apps(Ok(apps)) => {
                info!("Loaded {} apps", apps.len());
                self.apps = apps;
            }
            AppEvent::Apps(Err(message)) => {
                warn!("Failed to load apps: {}", message);
                self.status.set_error(message);
            }
        }
        self.after_update();
    }

    fn after_update(&mut self) {
        self.permissions.sync();
        self.users.sync();
        if !self.permissions.screen.create.is_open() && self.lookup.is_active() {
            self.lookup.reset();
        }
        let notices = [
            self.permissions.screen.list.take_notice(),
            self.users.screen.list.take_notice(),
        ];
        for notice in notices.into_iter().flatten() {
            self.status.notify(notice);
        }
    }

    /// Draw the UI
    pub fn draw(&mut self, f: &mut Frame) {
        let size = f.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(3),
            ])
            .split(size);

        let titles: Vec<Line> = [
            (1, Permissions::TITLE_KEY),
            (2, Users::TITLE_KEY),
        ]
        .iter()
        .map(|(n, key)| Line::from(Span::raw(format!("{} {}", n, self.locale.get(key)))))
        .collect();
        let selected = match self.tab {
            Tab::Permissions => 0,
            Tab::Users => 1,
        };
        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title("permctl"))
            .select(selected)
            .highlight_style(Styles::active_tab());
        f.render_widget(tabs, chunks[0]);

        let ctx = ViewContext {
            locale: &self.locale,
            apps: &self.apps,
            suggestions: self.lookup.suggestions(),
        };
        match self.tab {
            Tab::Permissions => self.permissions.render(f, chunks[1], &ctx),
            Tab::Users => self.users.render(f, chunks[1], &ctx),
        }

        let hint = "1/2: switch tab | n: new | Enter: edit | d: delete | /: filter | ?: help | q: quit";
        self.status.render(f, chunks[2], hint);

        if self.show_help {
            self.help.draw(f, size);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::gateway::{Call, GatewayError, MemoryGateway};
    use crate::models::{
        NewUser, Page, PermissionFilter, SearchCriteria, User, UserAppPermission, UserFilter,
        UserUpdate,
    };

    /// Answers everything except the app list, which never returns
    struct StalledApps(MemoryGateway);

    #[async_trait]
    impl Gateway<Permissions> for StalledApps {
        async fn search(
            &self,
            criteria: &SearchCriteria<PermissionFilter>,
        ) -> Result<Page<UserAppPermission>, GatewayError> {
            Gateway::<Permissions>::search(&self.0, criteria).await
        }
        async fn create(&self, draft: &UserAppPermission) -> Result<String, GatewayError> {
            Gateway::<Permissions>::create(&self.0, draft).await
        }
        async fn update(&self, patch: &UserAppPermission) -> Result<String, GatewayError> {
            Gateway::<Permissions>::update(&self.0, patch).await
        }
        async fn delete(&self, item: &UserAppPermission) -> Result<String, GatewayError> {
            Gateway::<Permissions>::delete(&self.0, item).await
        }
    }

    #[async_trait]
    impl Gateway<Users> for StalledApps {
        async fn search(
            &self,
            criteria: &SearchCriteria<UserFilter>,
        ) -> Result<Page<User>, GatewayError> {
            Gateway::<Users>::search(&self.0, criteria).await
        }
        async fn create(&self, draft: &NewUser) -> Result<String, GatewayError> {
            Gateway::<Users>::create(&self.0, draft).await
        }
        async fn update(&self, patch: &UserUpdate) -> Result<String, GatewayError> {
            Gateway::<Users>::update(&self.0, patch).await
        }
        async fn delete(&self, item: &User) -> Result<String, GatewayError> {
            Gateway::<Users>::delete(&self.0, item).await
        }
    }

    #[async_trait]
    impl DirectoryGateway for StalledApps {
        async fn search_usernames(&self, fragment: &str) -> Result<Vec<String>, GatewayError> {
            self.0.search_usernames(fragment).await
        }
        async fn list_apps(&self) -> Result<Vec<String>, GatewayError> {
            std::future::pending().await
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn settle(app: &mut App) {
        // the memory gateway answers immediately; give spawned tasks a turn
        for _ in 0..20 {
            tokio::task::yield_now().await;
            while let Ok(event) = app.rx.try_recv() {
                app.handle_app_event(event);
            }
        }
    }

    fn demo_app() -> (App, Arc<MemoryGateway>) {
        let gateway = Arc::new(MemoryGateway::seeded());
        let app = App::new(gateway.clone(), Locale::en_us(), Duration::ZERO);
        (app, gateway)
    }

    #[tokio::test]
    async fn test_mount_loads_lists_and_apps() {
        let (mut app, _) = demo_app();
        app.mount();
        settle(&mut app).await;

        assert_eq!(app.permissions.screen.list.items().len(), 10);
        assert!(!app.users.screen.list.items().is_empty());
        assert_eq!(app.apps.len(), 4);
    }

    #[tokio::test]
    async fn test_lists_load_while_apps_are_pending() {
        let gateway = Arc::new(StalledApps(MemoryGateway::seeded()));
        let mut app = App::new(gateway, Locale::en_us(), Duration::ZERO);
        app.mount();
        settle(&mut app).await;

        assert_eq!(app.permissions.screen.list.items().len(), 10);
        assert!(!app.users.screen.list.items().is_empty());
        assert!(app.apps.is_empty());
    }

    #[test]
    fn test_poll_timeout_follows_pending_lookup() {
        let gateway = Arc::new(MemoryGateway::seeded());
        let mut app = App::new(gateway, Locale::en_us(), Duration::from_millis(20));
        let now = Instant::now();
        assert_eq!(app.poll_timeout(now), TICK);

        app.lookup.input("al", now);
        assert_eq!(app.poll_timeout(now), Duration::from_millis(20));
        assert_eq!(app.poll_timeout(now + Duration::from_millis(30)), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_global_keys_respect_focus() {
        let (mut app, _) = demo_app();
        app.handle_key_event(key(KeyCode::Char('2')));
        assert_eq!(app.tab, Tab::Users);

        // while typing in a filter, digits and 'q' are text
        app.handle_key_event(key(KeyCode::Char('/')));
        app.handle_key_event(key(KeyCode::Char('q')));
        app.handle_key_event(key(KeyCode::Char('1')));
        assert!(!app.should_quit);
        assert_eq!(app.tab, Tab::Users);
        assert_eq!(app.users.screen.list.filter().username, "q1");

        app.handle_key_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_delete_round_trip_refreshes_list() {
        let (mut app, gateway) = demo_app();
        app.mount();
        settle(&mut app).await;
        let before = app.permissions.screen.list.total_count();

        app.handle_key_event(key(KeyCode::Char('d')));
        app.handle_key_event(key(KeyCode::Char('y')));
        settle(&mut app).await;

        assert!(gateway
            .calls()
            .await
            .iter()
            .any(|call| matches!(call, Call::DeletePermission { .. })));
        assert_eq!(app.permissions.screen.list.total_count(), before - 1);
        assert!(app.status.get_current().is_some());
    }
}
