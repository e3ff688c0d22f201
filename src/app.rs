use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, ListState, Paragraph},
};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::catalog::{CatalogProvider, Listing, MovieDetails, NotFoundPolicy};
use crate::config::Config;
use crate::error::Result;
use crate::feed::{Feed, Phase};
use crate::ui::{DetailsPane, render_browse_view, render_details_view, widgets};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View {
    Browse,
    Details,
    Help,
}

pub enum AppMessage {
    DetailsLoaded(Box<MovieDetails>),
    DetailsMissing(u64),
    DetailsError(u64, String),
}

pub struct App {
    pub config: Config,
    pub running: bool,
    pub view: View,
    pub previous_view: View,
    pub accent: Color,
    pub tick: usize,

    pub provider: Arc<dyn CatalogProvider + Send + Sync>,
    pub feed: Feed,
    pub browse_state: ListState,
    pub details: DetailsPane,

    pub msg_tx: mpsc::UnboundedSender<AppMessage>,
    pub msg_rx: mpsc::UnboundedReceiver<AppMessage>,
}

impl App {
    pub fn new(config: Config, provider: Arc<dyn CatalogProvider + Send + Sync>) -> Self {
        let accent = widgets::parse_accent_color(&config.ui.accent_color);
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();

        let feed = Feed::new(
            provider.clone(),
            config.ui.default_listing,
            config.ui.scroll_threshold,
        );

        Self {
            config,
            running: true,
            view: View::Browse,
            previous_view: View::Browse,
            accent,
            tick: 0,

            provider,
            feed,
            browse_state: ListState::default(),
            details: DetailsPane::Closed,

            msg_tx,
            msg_rx,
        }
    }

    pub async fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        self.feed.start();

        while self.running {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
            self.process_feed();
            self.process_messages();
            self.tick = self.tick.wrapping_add(1);
        }

        self.feed.teardown();
        Ok(())
    }

    /// Fold finished page fetches into the list.
    fn process_feed(&mut self) {
        if self.feed.process_events() == 0 {
            return;
        }

        if self.browse_state.selected().is_none() && !self.feed.view().items.is_empty() {
            self.browse_state.select(Some(0));
        }

        // The list grew under a selection that may still sit on the sentinel.
        // Failed pages wait for the next scroll or an explicit retry.
        if *self.feed.state().phase() == Phase::Idle {
            self.feed.on_scroll(self.browse_state.selected());
        }
    }

    fn process_messages(&mut self) {
        while let Ok(msg) = self.msg_rx.try_recv() {
            let waiting_for = match self.details {
                DetailsPane::Loading(id) => Some(id),
                _ => None,
            };

            match msg {
                AppMessage::DetailsLoaded(details) => {
                    if waiting_for == Some(details.movie.id) {
                        info!(id = details.movie.id, title = %details.movie.title, "Loaded movie details");
                        self.details = DetailsPane::Loaded(details);
                    }
                }
                AppMessage::DetailsMissing(id) => {
                    if waiting_for == Some(id) {
                        self.details = DetailsPane::NotFound(id);
                    }
                }
                AppMessage::DetailsError(id, err) => {
                    error!(id, error = %err, "Details fetch failed");
                    if waiting_for == Some(id) {
                        self.details = DetailsPane::Failed(id, err);
                    }
                }
            }
        }
    }

    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(frame.area());

        let main_area = chunks[0];
        let help_area = chunks[1];

        let underlying = if self.view == View::Help {
            self.previous_view
        } else {
            self.view
        };

        match underlying {
            View::Details => render_details_view(
                frame,
                main_area,
                &self.details,
                self.config.ui.poster_size,
                &self.config.catalog.image_base_url,
                self.tick,
                self.accent,
            ),
            _ => render_browse_view(
                frame,
                main_area,
                self.feed.listing(),
                self.feed.view(),
                &mut self.browse_state,
                self.tick,
                self.accent,
            ),
        }

        let hints: &[(&str, &str)] = match self.view {
            View::Browse => &[
                ("j/k", "navigate"),
                ("Enter", "details"),
                ("t", "toggle listing"),
                ("r", "retry"),
                ("?", "help"),
                ("q", "quit"),
            ],
            View::Details => &[("Esc", "back"), ("r", "retry"), ("?", "help"), ("q", "quit")],
            View::Help => &[("Esc", "close")],
        };
        frame.render_widget(widgets::help_bar(hints), help_area);

        if self.view == View::Help {
            self.render_help(frame);
        }
    }

    fn render_help(&self, frame: &mut Frame) {
        let area = centered_rect(50, 50, frame.area());

        let bindings = [
            ("j / Down", "Next movie"),
            ("k / Up", "Previous movie"),
            ("Enter / l", "Open details"),
            ("Esc", "Back"),
            ("t", "Popular / Top Rated"),
            ("r", "Retry failed load"),
            ("?", "Toggle help"),
            ("q", "Quit"),
        ];

        let lines: Vec<Line> = bindings
            .iter()
            .map(|(key, action)| {
                Line::from(vec![
                    Span::styled(
                        format!("{:<12}", key),
                        Style::default().fg(self.accent).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(*action),
                ])
            })
            .collect();

        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(lines).block(widgets::titled_block("Help", self.accent)),
            area,
        );
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                self.handle_key(key);
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.running = false;
            return;
        }

        match self.view {
            View::Browse => self.handle_browse_input(key.code),
            View::Details => self.handle_details_input(key.code),
            View::Help => self.handle_help_input(key.code),
        }
    }

    fn handle_browse_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') => {
                self.running = false;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(-1);
            }
            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => {
                self.open_details();
            }
            KeyCode::Char('t') => {
                self.switch_listing(self.feed.listing().next());
            }
            KeyCode::Char('r') => {
                self.feed.retry();
            }
            KeyCode::Char('?') => {
                self.toggle_help();
            }
            _ => {}
        }
    }

    fn handle_details_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') => {
                self.running = false;
            }
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('h') | KeyCode::Left => {
                self.view = View::Browse;
            }
            KeyCode::Char('r') => {
                if let DetailsPane::Failed(id, _) = self.details {
                    self.load_details(id);
                }
            }
            KeyCode::Char('?') => {
                self.toggle_help();
            }
            _ => {}
        }
    }

    fn handle_help_input(&mut self, key: KeyCode) {
        if matches!(key, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            self.toggle_help();
        }
    }

    fn toggle_help(&mut self) {
        if self.view == View::Help {
            self.view = self.previous_view;
        } else {
            self.previous_view = self.view;
            self.view = View::Help;
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.feed.view().items.len();
        if len == 0 {
            return;
        }

        let current = self.browse_state.selected().unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(len - 1);
        self.browse_state.select(Some(next));

        self.feed.on_scroll(Some(next));
    }

    fn open_details(&mut self) {
        let Some(idx) = self.browse_state.selected() else {
            return;
        };
        let Some(id) = self.feed.view().items.get(idx).map(|m| m.id) else {
            return;
        };

        debug!(id, "Opening details");
        self.view = View::Details;
        self.load_details(id);
    }

    fn load_details(&mut self, id: u64) {
        self.details = DetailsPane::Loading(id);

        let provider = self.provider.clone();
        let tx = self.msg_tx.clone();
        tokio::spawn(async move {
            let msg = match provider.fetch_details(id, NotFoundPolicy::Absent).await {
                Ok(Some(details)) => AppMessage::DetailsLoaded(Box::new(details)),
                Ok(None) => AppMessage::DetailsMissing(id),
                Err(e) => AppMessage::DetailsError(id, e.user_message_for("movie details")),
            };
            let _ = tx.send(msg);
        });
    }

    fn switch_listing(&mut self, listing: Listing) {
        info!(from = %self.feed.listing(), to = %listing, "Switching listing");
        self.feed.teardown();
        self.feed = Feed::new(self.provider.clone(), listing, self.config.ui.scroll_threshold);
        self.browse_state = ListState::default();
        self.feed.start();
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

pub fn init_terminal() -> io::Result<DefaultTerminal> {
    Ok(ratatui::init())
}

pub fn restore_terminal() -> io::Result<()> {
    ratatui::restore();
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::catalog::{Movie, MoviePage};
    use crate::error::Error;

    struct FixedCatalog {
        page_calls: AtomicUsize,
        details_calls: AtomicUsize,
        empty: bool,
    }

    fn movie(id: u64) -> Movie {
        Movie {
            id,
            title: format!("Movie {}", id),
            original_title: format!("Movie {}", id),
            overview: "Overview".to_string(),
            poster_path: None,
            backdrop_path: None,
            vote_average: 5.0,
            vote_count: 1,
            release_date: "2010-10-10".to_string(),
            popularity: 1.0,
            genre_ids: Vec::new(),
            original_language: "en".to_string(),
            adult: false,
        }
    }

    #[async_trait::async_trait]
    impl CatalogProvider for FixedCatalog {
        async fn fetch_page(&self, _listing: Listing, page: u32) -> Result<MoviePage> {
            self.page_calls.fetch_add(1, Ordering::SeqCst);
            if self.empty {
                return Ok(MoviePage {
                    page,
                    results: Vec::new(),
                    total_pages: 0,
                    total_results: 0,
                });
            }
            let base = u64::from(page) * 10;
            Ok(MoviePage {
                page,
                results: (base..base + 3).map(movie).collect(),
                total_pages: 3,
                total_results: 9,
            })
        }

        async fn fetch_details(&self, id: u64, _policy: NotFoundPolicy) -> Result<Option<MovieDetails>> {
            self.details_calls.fetch_add(1, Ordering::SeqCst);
            if id == 10 {
                Ok(None)
            } else {
                Err(Error::Upstream {
                    status: 503,
                    status_text: "Service Unavailable".to_string(),
                })
            }
        }
    }

    fn catalog(empty: bool) -> Arc<FixedCatalog> {
        Arc::new(FixedCatalog {
            page_calls: AtomicUsize::new(0),
            details_calls: AtomicUsize::new(0),
            empty,
        })
    }

    fn test_app() -> (App, Arc<FixedCatalog>) {
        let catalog = catalog(false);
        let mut config = Config::default();
        config.ui.scroll_threshold = 1;
        (App::new(config, catalog.clone()), catalog)
    }

    async fn drain_feed(app: &mut App) {
        let event = app.feed.next_event().await.unwrap();
        app.feed.apply(event);
    }

    #[tokio::test]
    async fn test_first_page_selects_first_row() {
        let (mut app, catalog) = test_app();
        app.feed.start();
        for _ in 0..100 {
            tokio::task::yield_now().await;
            app.process_feed();
            if !app.feed.view().items.is_empty() {
                break;
            }
        }

        assert_eq!(app.feed.view().items.len(), 3);
        assert_eq!(app.browse_state.selected(), Some(0));
        // Row 0 of 3 is outside the sentinel, so nothing else was requested
        assert!(!app.feed.view().is_loading);
        assert_eq!(catalog.page_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_scrolling_to_bottom_loads_next_page() {
        let (mut app, catalog) = test_app();
        app.feed.start();
        drain_feed(&mut app).await;
        app.browse_state.select(Some(0));

        app.handle_browse_input(KeyCode::Down);
        assert!(app.feed.view().is_loading);
        app.handle_browse_input(KeyCode::Down);
        assert_eq!(app.browse_state.selected(), Some(2));

        drain_feed(&mut app).await;
        assert_eq!(app.feed.view().items.len(), 6);
        assert_eq!(catalog.page_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_details_not_found_and_stale_replies() {
        let (mut app, _) = test_app();
        app.feed.start();
        drain_feed(&mut app).await;
        app.browse_state.select(Some(0));

        app.handle_browse_input(KeyCode::Enter);
        assert_eq!(app.view, View::Details);
        assert!(matches!(app.details, DetailsPane::Loading(10)));

        // A reply for some other movie is ignored
        app.msg_tx.send(AppMessage::DetailsMissing(99)).unwrap();
        app.process_messages();
        assert!(matches!(app.details, DetailsPane::Loading(10)));

        let msg = app.msg_rx.recv().await.unwrap();
        app.msg_tx.send(msg).unwrap();
        app.process_messages();
        assert!(matches!(app.details, DetailsPane::NotFound(10)));
    }

    #[tokio::test]
    async fn test_switch_listing_starts_fresh_feed() {
        let (mut app, catalog) = test_app();
        app.feed.start();
        drain_feed(&mut app).await;

        app.handle_browse_input(KeyCode::Char('t'));
        assert_eq!(app.feed.listing(), Listing::TopRated);
        assert!(app.feed.view().items.is_empty());
        assert!(app.feed.view().is_loading);
        assert_eq!(app.browse_state.selected(), None);

        drain_feed(&mut app).await;
        assert_eq!(app.feed.view().items.len(), 3);
        assert_eq!(catalog.page_calls.load(Ordering::SeqCst), 2);
    }

    async fn settle_details(app: &mut App) {
        let msg = app.msg_rx.recv().await.unwrap();
        app.msg_tx.send(msg).unwrap();
        app.process_messages();
    }

    fn screen(app: &mut App) -> String {
        let backend = ratatui::backend::TestBackend::new(80, 12);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[tokio::test]
    async fn test_failed_details_retry_with_r() {
        let (mut app, catalog) = test_app();
        app.feed.start();
        drain_feed(&mut app).await;
        app.browse_state.select(Some(1));

        app.handle_browse_input(KeyCode::Enter);
        settle_details(&mut app).await;
        let DetailsPane::Failed(id, message) = &app.details else {
            panic!("expected a failed details pane, got {:?}", app.details);
        };
        assert_eq!(*id, 11);
        assert!(message.starts_with("Failed to load movie details"));
        assert!(message.contains("503 Service Unavailable"));
        assert!(message.ends_with("Press r to retry."));

        app.handle_details_input(KeyCode::Char('r'));
        assert!(matches!(app.details, DetailsPane::Loading(11)));
        settle_details(&mut app).await;
        assert!(matches!(app.details, DetailsPane::Failed(11, _)));
        assert_eq!(catalog.details_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_r_outside_failure_does_not_refetch_details() {
        let (mut app, catalog) = test_app();
        app.feed.start();
        drain_feed(&mut app).await;
        app.browse_state.select(Some(0));

        app.handle_browse_input(KeyCode::Enter);
        settle_details(&mut app).await;
        assert!(matches!(app.details, DetailsPane::NotFound(10)));

        app.handle_details_input(KeyCode::Char('r'));
        assert!(matches!(app.details, DetailsPane::NotFound(10)));
        assert_eq!(catalog.details_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_listing_shows_no_movies_found() {
        let mut app = App::new(Config::default(), catalog(true));
        app.feed.start();
        drain_feed(&mut app).await;

        assert!(app.feed.state().is_exhausted());
        assert!(app.feed.view().items.is_empty());
        assert!(screen(&mut app).contains("No movies found."));
    }

    #[test]
    fn test_help_toggle_restores_view() {
        let mut app = App::new(Config::default(), catalog(false));
        app.view = View::Details;
        app.handle_details_input(KeyCode::Char('?'));
        assert_eq!(app.view, View::Help);
        app.handle_help_input(KeyCode::Esc);
        assert_eq!(app.view, View::Details);
    }
}
