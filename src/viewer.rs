//! Screenshot lightbox.
//!
//! The viewer is either `Closed` or `Open(project, index)`. An open session
//! holds a page scroll lock and a keyboard listener; both are released when
//! the session is dropped, whichever way the viewer closes.

use std::rc::Rc;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Position, Rect};
use thiserror::Error;
use tracing::debug;

use crate::content::{ProjectRecord, Screenshot};
use crate::gallery::AspectRatio;
use crate::listeners::{KeyListeners, Layer, ListenerGuard};
use crate::scroll_lock::{ScrollLock, ScrollLockGuard};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewerError {
    #[error("project \"{0}\" has no screenshots to show")]
    NoScreenshots(String),
}

/// Why the viewer closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseReason {
    Button,
    Backdrop,
    Escape,
}

/// Navigation and close requests understood by an open viewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerAction {
    Next,
    Prev,
    JumpTo(usize),
    Close(CloseReason),
}

/// Snapshot of the state machine, for callers that only need to compare.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewerState {
    Closed,
    Open { project_id: String, index: usize },
}

/// Result of routing a mouse click through the lightbox.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Viewer was closed; nothing was hit.
    Ignored,
    /// A control inside the panel took the click.
    Consumed,
    /// The click landed on the backdrop and closed the viewer.
    Closed,
}

struct Session {
    project: Rc<ProjectRecord>,
    index: usize,
    _scroll: ScrollLockGuard,
    _keys: ListenerGuard,
}

pub struct ImageViewer {
    session: Option<Session>,
    scroll_lock: ScrollLock,
    listeners: KeyListeners,
}

impl ImageViewer {
    pub fn new(scroll_lock: ScrollLock, listeners: KeyListeners) -> Self {
        Self {
            session: None,
            scroll_lock,
            listeners,
        }
    }

    /// `Closed -> Open(project, index)`, with `index` clamped into range.
    ///
    /// Opening while already open replaces the current session; its lock and
    /// listener are released before the new ones are taken.
    pub fn open(&mut self, project: Rc<ProjectRecord>, index: usize) -> Result<(), ViewerError> {
        let len = project.screenshots.len();
        if len == 0 {
            return Err(ViewerError::NoScreenshots(project.id.clone()));
        }

        self.session = None;
        let index = index.min(len - 1);
        debug!(project = %project.id, index, "viewer opened");
        self.session = Some(Session {
            project,
            index,
            _scroll: self.scroll_lock.acquire(),
            _keys: self.listeners.attach(Layer::Lightbox),
        });
        Ok(())
    }

    pub fn close(&mut self, reason: CloseReason) {
        if let Some(session) = self.session.take() {
            debug!(project = %session.project.id, ?reason, "viewer closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn state(&self) -> ViewerState {
        match &self.session {
            None => ViewerState::Closed,
            Some(s) => ViewerState::Open {
                project_id: s.project.id.clone(),
                index: s.index,
            },
        }
    }

    pub fn project(&self) -> Option<&ProjectRecord> {
        self.session.as_ref().map(|s| s.project.as_ref())
    }

    pub fn index(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.index)
    }

    pub fn current(&self) -> Option<&Screenshot> {
        let session = self.session.as_ref()?;
        session.project.screenshots.get(session.index)
    }

    /// Apply one action. Returns `true` when the state changed.
    pub fn apply(&mut self, action: ViewerAction) -> bool {
        if let ViewerAction::Close(reason) = action {
            let was_open = self.is_open();
            self.close(reason);
            return was_open;
        }

        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let len = session.project.screenshots.len();
        let next = match action {
            ViewerAction::Next => (session.index + 1) % len,
            ViewerAction::Prev => (session.index + len - 1) % len,
            ViewerAction::JumpTo(k) if k < len => k,
            ViewerAction::JumpTo(k) => {
                debug!(k, len, "out-of-range jump ignored");
                session.index
            }
            ViewerAction::Close(_) => unreachable!("handled above"),
        };

        let changed = next != session.index;
        session.index = next;
        if changed {
            debug!(index = next, "viewer moved");
        }
        changed
    }

    /// Map a key press to an action. Returns `true` when the key belonged to
    /// the viewer.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if !self.is_open() {
            return false;
        }
        let len = self.project().map(|p| p.screenshots.len()).unwrap_or(0);

        let action = match key.code {
            KeyCode::Right | KeyCode::Char('l') => ViewerAction::Next,
            KeyCode::Left | KeyCode::Char('h') => ViewerAction::Prev,
            KeyCode::Esc => ViewerAction::Close(CloseReason::Escape),
            KeyCode::Home => ViewerAction::JumpTo(0),
            KeyCode::End => ViewerAction::JumpTo(len.saturating_sub(1)),
            KeyCode::Char(c @ '1'..='9') => {
                ViewerAction::JumpTo(c.to_digit(10).unwrap_or(1) as usize - 1)
            }
            _ => return false,
        };
        self.apply(action);
        true
    }

    /// Route a left click at `pos`. Controls consume their clicks; only a
    /// click outside the panel reaches the backdrop.
    pub fn handle_click(&mut self, pos: Position, layout: &LightboxLayout) -> ClickOutcome {
        if !self.is_open() {
            return ClickOutcome::Ignored;
        }

        if layout.close.contains(pos) {
            self.close(CloseReason::Button);
            return ClickOutcome::Closed;
        }
        if layout.prev.contains(pos) {
            self.apply(ViewerAction::Prev);
            return ClickOutcome::Consumed;
        }
        if layout.next.contains(pos) {
            self.apply(ViewerAction::Next);
            return ClickOutcome::Consumed;
        }
        if let Some(&(_, k)) = layout.thumbnails.iter().find(|(r, _)| r.contains(pos)) {
            self.apply(ViewerAction::JumpTo(k));
            return ClickOutcome::Consumed;
        }
        if layout.panel.contains(pos) {
            return ClickOutcome::Consumed;
        }

        self.close(CloseReason::Backdrop);
        ClickOutcome::Closed
    }

    /// Geometry of the open lightbox inside `area`.
    pub fn layout(&self, area: Rect, aspect: AspectRatio) -> Option<LightboxLayout> {
        let session = self.session.as_ref()?;
        Some(LightboxLayout::compute(
            area,
            aspect,
            session.project.screenshots.len(),
            session.index,
        ))
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

const MAX_PANEL_WIDTH: u16 = 110;
const CAPTION_ROWS: u16 = 1;
const STRIP_ROWS: u16 = 3;
const MIN_THUMB_WIDTH: u16 = 5;
const MAX_THUMB_WIDTH: u16 = 18;
const MIN_PANEL_WIDTH: u16 = 12;
const MIN_PANEL_HEIGHT: u16 = 2 + CAPTION_ROWS + STRIP_ROWS + 1;

/// Hit targets of the lightbox. Shared by the renderer and click routing so
/// both agree on where everything is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LightboxLayout {
    pub panel: Rect,
    pub image: Rect,
    pub caption: Rect,
    pub strip: Rect,
    pub close: Rect,
    pub prev: Rect,
    pub next: Rect,
    /// `(area, screenshot index)` for each thumbnail that fits.
    pub thumbnails: Vec<(Rect, usize)>,
}

impl LightboxLayout {
    pub fn compute(area: Rect, aspect: AspectRatio, shots: usize, index: usize) -> Self {
        let chrome_rows = 2 + CAPTION_ROWS + STRIP_ROWS;
        let max_width = area.width.saturating_sub(4).min(MAX_PANEL_WIDTH);
        let max_height = area.height.saturating_sub(2);

        let mut image_w = max_width.saturating_sub(2);
        let mut image_h = aspect.rows_for_width(image_w);
        let available = max_height.saturating_sub(chrome_rows).max(1);
        if image_h > available {
            image_h = available;
            image_w = aspect.width_for_rows(image_h).min(max_width.saturating_sub(2));
        }

        let panel = centered(area, image_w + 2, image_h + chrome_rows);
        let inner = Rect::new(
            panel.x + 1,
            panel.y + 1,
            panel.width.saturating_sub(2),
            panel.height.saturating_sub(2),
        );

        let image = Rect::new(inner.x, inner.y, inner.width, image_h.min(inner.height));
        let caption = Rect::new(inner.x, image.bottom(), inner.width, CAPTION_ROWS);
        let strip = Rect::new(inner.x, caption.bottom(), inner.width, STRIP_ROWS);

        let close = Rect::new(panel.right().saturating_sub(5), panel.y, 3, 1);
        let mid = image.y + image.height / 2;
        let prev = Rect::new(image.x, mid, 3.min(image.width), 1);
        let next = Rect::new(image.right().saturating_sub(3), mid, 3.min(image.width), 1);

        // Every rect stays inside `area`, however small the terminal gets.
        let clip = |r: Rect| r.intersection(area);
        let strip = clip(strip);
        Self {
            panel: clip(panel),
            image: clip(image),
            caption: clip(caption),
            strip,
            close: clip(close),
            prev: clip(prev),
            next: clip(next),
            thumbnails: thumbnail_slots(strip, shots, index)
                .into_iter()
                .map(|(r, k)| (clip(r), k))
                .filter(|(r, _)| !r.is_empty())
                .collect(),
        }
    }

    /// Whether the panel is big enough to draw its frame and controls.
    pub fn is_drawable(&self) -> bool {
        self.panel.width >= MIN_PANEL_WIDTH && self.panel.height >= MIN_PANEL_HEIGHT
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

/// Lay thumbnails out left to right. When they do not all fit, show the
/// window of thumbnails that keeps the active one visible.
fn thumbnail_slots(strip: Rect, shots: usize, index: usize) -> Vec<(Rect, usize)> {
    if shots == 0 || strip.width < MIN_THUMB_WIDTH {
        return Vec::new();
    }

    let width = (strip.width / shots as u16).clamp(MIN_THUMB_WIDTH, MAX_THUMB_WIDTH);
    let fits = ((strip.width / width) as usize).min(shots);
    let start = if index < fits { 0 } else { index + 1 - fits };

    (start..start + fits)
        .enumerate()
        .map(|(slot, k)| {
            let x = strip.x + slot as u16 * width;
            (Rect::new(x, strip.y, width, strip.height), k)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
