//! Project gallery: one card per project, and the hand-off of thumbnail
//! clicks to whoever owns the image viewer.

use std::rc::Rc;

use clap::ValueEnum;
use tracing::{debug, warn};

use crate::content::{ProjectRecord, Screenshot};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Shape of the screenshot frame in cards and in the lightbox.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum AspectRatio {
    /// 16:10
    #[default]
    Desktop,
    /// 16:9
    Wide,
    /// 4:3
    Classic,
}

impl AspectRatio {
    pub fn ratio(self) -> (u16, u16) {
        match self {
            AspectRatio::Desktop => (16, 10),
            AspectRatio::Wide => (16, 9),
            AspectRatio::Classic => (4, 3),
        }
    }

    /// Rows needed for a frame `width` columns wide. Terminal cells are about
    /// twice as tall as they are wide, hence the halving.
    pub fn rows_for_width(self, width: u16) -> u16 {
        let (w, h) = self.ratio();
        let rows = (width as u32 * h as u32) / (w as u32 * 2);
        rows.max(1) as u16
    }

    /// Columns that fit a frame `height` rows tall.
    pub fn width_for_rows(self, height: u16) -> u16 {
        let (w, h) = self.ratio();
        let cols = (height as u32 * w as u32 * 2) / h as u32;
        cols.min(u16::MAX as u32).max(1) as u16
    }

    pub fn label(self) -> &'static str {
        match self {
            AspectRatio::Desktop => "16:10",
            AspectRatio::Wide => "16:9",
            AspectRatio::Classic => "4:3",
        }
    }
}

/// Display options that used to differ between gallery variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GalleryConfig {
    pub max_chips_shown: usize,
    pub thumbnail_count: usize,
    pub aspect_ratio: AspectRatio,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            max_chips_shown: 6,
            thumbnail_count: 4,
            aspect_ratio: AspectRatio::Desktop,
        }
    }
}

// ---------------------------------------------------------------------------
// Card view model
// ---------------------------------------------------------------------------

/// What one card shows, after the config limits are applied.
pub struct CardView<'a> {
    pub project: &'a ProjectRecord,
    pub visible_chips: &'a [String],
    pub hidden_chips: usize,
    pub thumbnails: &'a [Screenshot],
    pub hidden_thumbnails: usize,
    /// `false` for projects without screenshots: the strip is drawn disabled.
    pub gallery_enabled: bool,
    /// Cards alternate which side the screenshots sit on.
    pub shots_on_left: bool,
}

/// A thumbnail click waiting to be turned into an open viewer.
#[derive(Clone, Debug)]
pub struct OpenRequest {
    pub project: Rc<ProjectRecord>,
    pub index: usize,
}

// ---------------------------------------------------------------------------
// GalleryGrid
// ---------------------------------------------------------------------------

pub struct GalleryGrid {
    projects: Vec<Rc<ProjectRecord>>,
    config: GalleryConfig,
    pending: Option<OpenRequest>,
}

impl GalleryGrid {
    pub fn new(projects: Vec<Rc<ProjectRecord>>, config: GalleryConfig) -> Self {
        Self {
            projects,
            config,
            pending: None,
        }
    }

    pub fn config(&self) -> GalleryConfig {
        self.config
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn project(&self, card: usize) -> Option<&Rc<ProjectRecord>> {
        self.projects.get(card)
    }

    /// Swap in freshly loaded records. A pending request keeps its own
    /// reference to the old record.
    pub fn replace_projects(&mut self, projects: Vec<Rc<ProjectRecord>>) {
        debug!(count = projects.len(), "gallery records replaced");
        self.projects = projects;
    }

    /// Build the view model for card `card`.
    pub fn card(&self, card: usize) -> Option<CardView<'_>> {
        let project = self.projects.get(card)?.as_ref();

        let chip_limit = self.config.max_chips_shown.min(project.chips.len());
        let thumb_limit = self.config.thumbnail_count.min(project.screenshots.len());

        Some(CardView {
            project,
            visible_chips: &project.chips[..chip_limit],
            hidden_chips: project.chips.len() - chip_limit,
            thumbnails: &project.screenshots[..thumb_limit],
            hidden_thumbnails: project.screenshots.len() - thumb_limit,
            gallery_enabled: project.has_screenshots(),
            shots_on_left: card % 2 == 1,
        })
    }

    /// Record a click on thumbnail `index` of card `card` as the pending
    /// open request.
    ///
    /// Returns `false`, recording nothing, when the card does not exist or
    /// its project has no screenshots: such projects are never offered to
    /// the viewer.
    pub fn on_thumbnail_click(&mut self, card: usize, index: usize) -> bool {
        let Some(project) = self.projects.get(card) else {
            return false;
        };
        if !project.has_screenshots() {
            warn!(project = %project.id, "thumbnail click on project without screenshots");
            return false;
        }

        debug!(project = %project.id, index, "thumbnail clicked");
        self.pending = Some(OpenRequest {
            project: Rc::clone(project),
            index,
        });
        true
    }

    /// Take the pending open request, if any.
    pub fn take_pending(&mut self) -> Option<OpenRequest> {
        self.pending.take()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn project(id: &str, chips: usize, shots: usize) -> Rc<ProjectRecord> {
        Rc::new(ProjectRecord {
            id: id.to_string(),
            live_url: None,
            code_url: None,
            title: id.to_uppercase(),
            subtitle: String::new(),
            badge: String::new(),
            code_lines: Vec::new(),
            chips: (0..chips).map(|i| format!("chip{}", i)).collect(),
            screenshots: (0..shots)
                .map(|i| Screenshot::new(format!("/{}{}.png", id, i), format!("shot {}", i)))
                .collect(),
        })
    }

    #[test]
    fn test_empty_gallery() {
        let grid = GalleryGrid::new(Vec::new(), GalleryConfig::default());
        assert!(grid.is_empty());
        assert!(grid.card(0).is_none());
    }

    #[test]
    fn test_card_applies_limits() {
        let config = GalleryConfig {
            max_chips_shown: 3,
            thumbnail_count: 2,
            aspect_ratio: AspectRatio::Wide,
        };
        let grid = GalleryGrid::new(vec![project("a", 5, 4)], config);
        let card = grid.card(0).unwrap();

        assert_eq!(card.visible_chips.len(), 3);
        assert_eq!(card.hidden_chips, 2);
        assert_eq!(card.thumbnails.len(), 2);
        assert_eq!(card.hidden_thumbnails, 2);
        assert!(card.gallery_enabled);
        assert!(!card.shots_on_left);
    }

    #[test]
    fn test_card_without_screenshots_is_disabled() {
        let grid = GalleryGrid::new(
            vec![project("a", 1, 1), project("bare", 1, 0)],
            GalleryConfig::default(),
        );
        let card = grid.card(1).unwrap();
        assert!(!card.gallery_enabled);
        assert!(card.thumbnails.is_empty());
        assert!(card.shots_on_left);
    }

    #[test]
    fn test_thumbnail_click_records_pending_request() {
        let mut grid = GalleryGrid::new(vec![project("a", 0, 4)], GalleryConfig::default());
        assert!(grid.on_thumbnail_click(0, 2));

        let request = grid.take_pending().unwrap();
        assert_eq!(request.project.id, "a");
        assert_eq!(request.index, 2);
        assert!(grid.take_pending().is_none());
    }

    #[test]
    fn test_thumbnail_click_refused_without_screenshots() {
        let mut grid = GalleryGrid::new(vec![project("bare", 0, 0)], GalleryConfig::default());
        assert!(!grid.on_thumbnail_click(0, 0));
        assert!(grid.take_pending().is_none());
        assert!(!grid.on_thumbnail_click(7, 0));
    }

    #[test]
    fn test_aspect_rows() {
        assert_eq!(AspectRatio::Desktop.rows_for_width(32), 10);
        assert_eq!(AspectRatio::Wide.rows_for_width(32), 9);
        assert_eq!(AspectRatio::Classic.rows_for_width(32), 12);
        assert_eq!(AspectRatio::Desktop.width_for_rows(10), 32);
        assert_eq!(AspectRatio::Desktop.rows_for_width(0), 1);
    }
}
