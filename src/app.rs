use std::io::stdout;
use std::path::PathBuf;
use std::sync::mpsc::{self, TryRecvError};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::Position;
use ratatui::Terminal;
use tracing::{debug, info, warn};

use crate::assets::AssetIndex;
use crate::cli::Cli;
use crate::contact::{ContactPanel, ContactRelay, ContactStatus, PanelEvent, RelayError};
use crate::content::Portfolio;
use crate::gallery::{GalleryConfig, GalleryGrid};
use crate::listeners::{KeyListeners, Layer};
use crate::page::Page;
use crate::renderer::{self, Screen, ThumbHit};
use crate::scroll_lock::ScrollLock;
use crate::terminal::TerminalSession;
use crate::viewer::{ClickOutcome, ImageViewer, LightboxLayout};
use crate::watcher::{ContentWatcher, WatchEvent};

const NOTICE_TTL: Duration = Duration::from_secs(4);

/// Main application state and run loop.
pub struct App {
    pub content_path: PathBuf,
    pub owner: String,
    pub tagline: String,
    pub gallery: GalleryGrid,
    pub page: Page,
    pub viewer: ImageViewer,
    pub scroll_lock: ScrollLock,
    pub listeners: KeyListeners,
    pub contact: ContactPanel,
    pub relay: ContactRelay,
    pub assets: AssetIndex,
    pub watch: bool,
    pub running: bool,
    notice: Option<(String, Instant)>,
    pending_submit: Option<mpsc::Receiver<Result<(), RelayError>>>,
    /// Hit areas measured by the last draw.
    thumb_hits: Vec<ThumbHit>,
    lightbox: Option<LightboxLayout>,
}

impl App {
    /// Build a new `App` from parsed CLI arguments.
    pub fn new(cli: &Cli) -> Result<Self> {
        let portfolio = Portfolio::load(&cli.content)
            .with_context(|| format!("loading {}", cli.content.display()))?;
        let assets = AssetIndex::scan(&cli.asset_root());
        let relay = ContactRelay::new(cli.relay_endpoint.clone(), cli.access_key.clone())
            .context("building contact relay client")?;

        debug!(endpoint = relay.endpoint(), "contact relay configured");

        let mut app = Self::from_portfolio(portfolio, cli.gallery_config(), assets, relay);
        app.content_path = cli.content.clone();
        app.watch = cli.watch;
        Ok(app)
    }

    /// Assemble an `App` around already-loaded content.
    pub fn from_portfolio(
        portfolio: Portfolio,
        config: GalleryConfig,
        assets: AssetIndex,
        relay: ContactRelay,
    ) -> Self {
        let scroll_lock = ScrollLock::new();
        let listeners = KeyListeners::new();
        let viewer = ImageViewer::new(scroll_lock.clone(), listeners.clone());
        let owner = portfolio.owner.clone();
        let tagline = portfolio.tagline.clone();

        Self {
            content_path: PathBuf::new(),
            owner,
            tagline,
            gallery: GalleryGrid::new(portfolio.into_shared(), config),
            page: Page::new(),
            viewer,
            scroll_lock,
            listeners,
            contact: ContactPanel::new(),
            relay,
            assets,
            watch: false,
            running: true,
            notice: None,
            pending_submit: None,
            thumb_hits: Vec::new(),
            lightbox: None,
        }
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    fn set_notice(&mut self, text: impl Into<String>) {
        self.notice = Some((text.into(), Instant::now()));
    }

    fn focused_thumb_count(&self) -> usize {
        self.gallery
            .card(self.page.focused_card)
            .map(|card| card.thumbnails.len())
            .unwrap_or(0)
    }

    /// Thumbnail click on `card`: route through the gallery guard, then open
    /// the viewer on the request it produced.
    pub fn open_thumbnail(&mut self, card: usize, index: usize) {
        if !self.gallery.on_thumbnail_click(card, index) {
            self.set_notice("this project has no screenshots");
            return;
        }
        if let Some(request) = self.gallery.take_pending() {
            if let Err(e) = self.viewer.open(request.project, request.index) {
                warn!(error = %e, "viewer refused to open");
                self.set_notice(e.to_string());
            }
        }
    }

    fn open_link(&mut self, live: bool) {
        let Some(project) = self.gallery.project(self.page.focused_card) else {
            return;
        };
        let (url, label) = if live {
            (project.live_url.clone(), "live")
        } else {
            (project.code_url.clone(), "code")
        };

        match url {
            Some(url) => {
                info!(%url, "opening link");
                if let Err(e) = open::that(&url) {
                    warn!(%url, error = %e, "could not open link");
                    self.set_notice(format!("could not open {}", url));
                }
            }
            None => self.set_notice(format!("no {} link for this project", label)),
        }
    }

    fn submit_contact(&mut self) {
        if self.pending_submit.is_some() {
            return;
        }
        if let Err(e) = self.contact.form.validate() {
            self.contact.status = ContactStatus::Failed(e.to_string());
            return;
        }
        self.contact.status = ContactStatus::Sending;
        self.pending_submit = Some(self.relay.submit_in_background(self.contact.form.clone()));
    }

    fn poll_submission(&mut self) {
        let Some(rx) = self.pending_submit.as_ref() else {
            return;
        };
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err(RelayError::BadResponse(
                "submission worker stopped".to_string(),
            )),
        };
        self.pending_submit = None;
        self.contact.finish(outcome, Local::now());
    }

    /// Reload the content file, keeping the page position where possible.
    pub fn reload(&mut self) {
        match Portfolio::load(&self.content_path) {
            Ok(portfolio) => {
                self.owner = portfolio.owner.clone();
                self.tagline = portfolio.tagline.clone();
                self.gallery.replace_projects(portfolio.into_shared());
                let thumbs = self.focused_thumb_count();
                self.page.clamp(self.gallery.len(), thumbs);
                self.set_notice("content reloaded");
            }
            Err(e) => {
                warn!(path = %self.content_path.display(), error = %e, "reload failed");
                self.set_notice(format!("reload failed: {}", e));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// Route a key press to whichever layer holds the topmost listener.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.running = false;
            return;
        }

        match self.listeners.top() {
            Some(Layer::Lightbox) => {
                if self.viewer.handle_key(key) {
                    debug!(state = ?self.viewer.state(), "viewer key");
                }
            }
            Some(Layer::ContactForm) => match self.contact.handle_key(key) {
                PanelEvent::Submit => self.submit_contact(),
                PanelEvent::Closed | PanelEvent::None => {}
            },
            None => self.handle_page_key(key),
        }
    }

    fn handle_page_key(&mut self, key: KeyEvent) {
        let cards = self.gallery.len();
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.running = false,
            KeyCode::Char('j') | KeyCode::PageDown => {
                self.page.scroll_by(1, cards, &self.scroll_lock);
            }
            KeyCode::Char('k') | KeyCode::PageUp => {
                self.page.scroll_by(-1, cards, &self.scroll_lock);
            }
            KeyCode::Char('g') | KeyCode::Home => self.page.scroll_to_top(&self.scroll_lock),
            KeyCode::Char('G') | KeyCode::End => {
                self.page.scroll_to_bottom(cards, &self.scroll_lock)
            }
            KeyCode::Down => self.page.focus_next_card(cards, &self.scroll_lock),
            KeyCode::Up => self.page.focus_prev_card(cards, &self.scroll_lock),
            KeyCode::Right | KeyCode::Char('l') => {
                let thumbs = self.focused_thumb_count();
                self.page.focus_next_thumb(thumbs);
            }
            KeyCode::Left | KeyCode::Char('h') => {
                let thumbs = self.focused_thumb_count();
                self.page.focus_prev_thumb(thumbs);
            }
            KeyCode::Enter => self.open_thumbnail(self.page.focused_card, self.page.focused_thumb),
            KeyCode::Char('o') => self.open_link(true),
            KeyCode::Char('c') => self.open_link(false),
            KeyCode::Char('m') => self.contact.begin_editing(&self.listeners),
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let pos = Position::new(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.viewer.is_open() {
                    if let Some(layout) = self.lightbox.clone() {
                        if self.viewer.handle_click(pos, &layout) == ClickOutcome::Closed {
                            self.lightbox = None;
                        }
                    }
                    return;
                }
                let hit = self
                    .thumb_hits
                    .iter()
                    .find(|hit| hit.area.contains(pos))
                    .copied();
                if let Some(hit) = hit {
                    self.page.focus_thumbnail(hit.card, hit.index);
                    self.open_thumbnail(hit.card, hit.index);
                }
            }
            MouseEventKind::ScrollDown => {
                self.page.scroll_by(1, self.gallery.len(), &self.scroll_lock);
            }
            MouseEventKind::ScrollUp => {
                self.page.scroll_by(-1, self.gallery.len(), &self.scroll_lock);
            }
            _ => {}
        }
    }

    // -----------------------------------------------------------------------
    // Run loop
    // -----------------------------------------------------------------------

    fn draw<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        if let Some((_, at)) = self.notice {
            if at.elapsed() >= NOTICE_TTL {
                self.notice = None;
            }
        }

        let mut output = renderer::RenderOutput::default();
        {
            let screen = Screen {
                owner: &self.owner,
                tagline: &self.tagline,
                gallery: &self.gallery,
                page: &self.page,
                viewer: &self.viewer,
                assets: &self.assets,
                contact: &self.contact,
                notice: self.notice.as_ref().map(|(text, _)| text.as_str()),
            };
            terminal.draw(|frame| {
                output = renderer::render_ui(frame, &screen);
            })?;
        }

        self.page.visible_cards = output.visible_cards;
        self.thumb_hits = output.thumbnails;
        self.lightbox = output.lightbox;
        Ok(())
    }

    fn event_loop<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        watch_rx: Option<&mpsc::Receiver<WatchEvent>>,
    ) -> Result<()> {
        while self.running {
            self.draw(terminal)?;

            // --- Handle input events ---
            if event::poll(Duration::from_millis(100))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }

            // --- Check for content changes (non-blocking) ---
            if let Some(rx) = watch_rx {
                let mut changed = false;
                while let Ok(event) = rx.try_recv() {
                    match event {
                        WatchEvent::ContentChanged => changed = true,
                        WatchEvent::Error(e) => warn!(error = %e, "content watcher error"),
                    }
                }
                if changed {
                    debug!("content file changed");
                    self.reload();
                }
            }

            self.poll_submission();
            self.contact.tick(Local::now());
        }
        Ok(())
    }

    /// Run the main TUI event loop.
    pub fn run(&mut self) -> Result<()> {
        // 1. Optional content watcher. Kept alive for the whole loop.
        let watcher = if self.watch {
            Some(ContentWatcher::new(&self.content_path)?)
        } else {
            None
        };
        let watch_rx = watcher.as_ref().map(|(_, rx)| rx);

        // 2. Set up the terminal. The session restores it when dropped,
        //    including while unwinding a panic.
        let session = TerminalSession::enter(stdout())?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

        // 3. Main loop.
        let result = self.event_loop(&mut terminal, watch_rx);

        // 4. Cleanup.
        drop(terminal);
        drop(session);

        result?;

        debug!(
            acquired = self.scroll_lock.acquisitions(),
            released = self.scroll_lock.releases(),
            holders = self.scroll_lock.holders(),
            listeners = self.listeners.count(),
            lightbox_listeners = self.listeners.count_for(Layer::Lightbox),
            "session finished"
        );

        println!(
            "{} projects, lightbox opened {} times",
            self.gallery.len(),
            self.scroll_lock.acquisitions()
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crossterm::event::KeyEventState;
    use ratatui::backend::TestBackend;

    use crate::viewer::ViewerState;

    const SAMPLE: &str = r#"{
        "owner": "Devesh",
        "projects": [
            {
                "id": "balone",
                "title": "Balloon Dekor",
                "screenshots": [
                    { "src": "/a.png" }, { "src": "/b.png" },
                    { "src": "/c.png" }, { "src": "/d.png" }
                ]
            },
            { "id": "bare", "title": "No Shots" },
            { "id": "loanyfy", "title": "Loanyfy", "screenshots": [ { "src": "/l.png" } ] }
        ]
    }"#;

    fn app() -> App {
        let portfolio = Portfolio::from_json(SAMPLE).unwrap();
        let relay = ContactRelay::new("http://127.0.0.1:9/submit", None).unwrap();
        App::from_portfolio(
            portfolio,
            GalleryConfig::default(),
            AssetIndex::scan(Path::new("/no/such/assets")),
            relay,
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn draw(app: &mut App) {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        app.draw(&mut terminal).unwrap();
    }

    #[test]
    fn test_enter_opens_focused_thumbnail() {
        let mut app = app();
        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(
            app.viewer.state(),
            ViewerState::Open {
                project_id: "balone".to_string(),
                index: 2
            }
        );
        assert!(app.scroll_lock.is_locked());
        assert_eq!(app.listeners.top(), Some(Layer::Lightbox));
    }

    #[test]
    fn test_keys_route_to_viewer_while_open() {
        let mut app = app();
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.viewer.index(), Some(1));
        // Page focus is untouched by viewer navigation.
        assert_eq!(app.page.focused_thumb, 0);

        app.handle_key(key(KeyCode::Esc));
        assert!(!app.viewer.is_open());
        assert!(!app.scroll_lock.is_locked());
        assert_eq!(app.listeners.count(), 0);
    }

    #[test]
    fn test_page_scroll_suppressed_while_open() {
        let mut app = app();
        app.page.visible_cards = 1;
        app.handle_key(key(KeyCode::Enter));
        app.handle_mouse(MouseEvent {
            kind: MouseEventKind::ScrollDown,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(app.page.scroll, 0);

        app.handle_key(key(KeyCode::Esc));
        app.handle_key(key(KeyCode::Char('j')));
        assert_eq!(app.page.scroll, 1);
    }

    #[test]
    fn test_project_without_screenshots_does_not_open() {
        let mut app = app();
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Enter));
        assert!(!app.viewer.is_open());
        assert!(app.notice.is_some());
        assert_eq!(app.scroll_lock.acquisitions(), 0);
    }

    #[test]
    fn test_contact_form_captures_keys() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('m')));
        assert_eq!(app.listeners.top(), Some(Layer::ContactForm));

        app.handle_key(key(KeyCode::Char('q')));
        assert!(app.running);
        assert_eq!(app.contact.form.name, "q");

        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.listeners.count(), 0);
        app.handle_key(key(KeyCode::Char('q')));
        assert!(!app.running);
    }

    #[test]
    fn test_invalid_contact_form_fails_without_sending() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('m')));
        app.handle_key(KeyEvent {
            code: KeyCode::Char('s'),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        });
        assert!(matches!(app.contact.status, ContactStatus::Failed(_)));
        assert!(app.pending_submit.is_none());
    }

    #[test]
    fn test_click_thumbnail_then_backdrop() {
        let mut app = app();
        draw(&mut app);
        let hit = app.thumb_hits[1];
        app.handle_mouse(click(hit.area.x + 1, hit.area.y + 1));
        assert_eq!(app.viewer.index(), Some(1));
        assert_eq!(app.page.focused_thumb, 1);

        draw(&mut app);
        let panel = app.lightbox.as_ref().unwrap().panel;
        // Inside the panel: consumed, stays open.
        app.handle_mouse(click(panel.x + 2, panel.y + 2));
        assert!(app.viewer.is_open());
        // Top-left corner is backdrop.
        app.handle_mouse(click(0, 0));
        assert!(!app.viewer.is_open());
        assert!(!app.scroll_lock.is_locked());
    }

    #[test]
    fn test_window_shrinks_while_viewer_open() {
        let mut app = app();
        app.handle_key(key(KeyCode::Enter));
        for (width, height) in [(120, 40), (13, 4), (2, 2), (1, 1), (20, 6)] {
            let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
            app.draw(&mut terminal).unwrap();
            assert!(app.lightbox.is_some());
        }
        app.handle_mouse(click(0, 0));
        assert!(!app.viewer.is_open());
    }

    #[test]
    fn test_ctrl_c_quits_from_any_layer() {
        let mut app = app();
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        });
        assert!(!app.running);
    }

    #[test]
    fn test_teardown_releases_lock() {
        let mut app = app();
        app.handle_key(key(KeyCode::Enter));
        let lock = app.scroll_lock.clone();
        let listeners = app.listeners.clone();
        drop(app);
        assert!(!lock.is_locked());
        assert_eq!(listeners.count(), 0);
    }

    #[test]
    fn test_reload_keeps_open_viewer_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portfolio.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let mut app = app();
        app.content_path = path.clone();
        app.handle_key(key(KeyCode::Enter));
        std::fs::write(&path, r#"{ "projects": [ { "id": "solo", "title": "Solo" } ] }"#)
            .unwrap();
        app.reload();

        assert_eq!(app.gallery.len(), 1);
        assert!(app.viewer.is_open());
        app.handle_key(key(KeyCode::Right));
        assert!(app.viewer.index().is_some());
    }
}
