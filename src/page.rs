//! The page under the lightbox: a vertically scrolling list of project cards
//! and the keyboard focus within it.

use std::collections::HashMap;

use tracing::debug;

use crate::scroll_lock::ScrollLock;

#[derive(Debug, Default)]
pub struct Page {
    /// Index of the first card drawn at the top of the viewport.
    pub scroll: usize,
    /// Card that has keyboard focus.
    pub focused_card: usize,
    /// Thumbnail with keyboard focus inside the focused card.
    pub focused_thumb: usize,
    /// Cards that fit in the viewport, as measured by the last draw.
    pub visible_cards: usize,
    /// Last thumbnail shown by each card that has lost focus.
    remembered: HashMap<usize, usize>,
}

impl Page {
    pub fn new() -> Self {
        Self {
            visible_cards: 1,
            ..Self::default()
        }
    }

    /// Scroll by `delta` cards. Ignored while the scroll lock is held.
    /// Returns `true` if the page moved.
    pub fn scroll_by(&mut self, delta: isize, card_count: usize, lock: &ScrollLock) -> bool {
        if lock.is_locked() {
            debug!(delta, "page scroll suppressed by scroll lock");
            return false;
        }
        let max_scroll = card_count.saturating_sub(self.visible_cards.max(1));
        let target = if delta < 0 {
            self.scroll.saturating_sub(delta.unsigned_abs())
        } else {
            self.scroll.saturating_add(delta as usize).min(max_scroll)
        };
        let moved = target != self.scroll;
        self.scroll = target;
        moved
    }

    pub fn scroll_to_top(&mut self, lock: &ScrollLock) {
        let scroll = self.scroll as isize;
        self.scroll_by(-scroll, usize::MAX, lock);
    }

    pub fn scroll_to_bottom(&mut self, card_count: usize, lock: &ScrollLock) {
        self.scroll_by(card_count as isize, card_count, lock);
    }

    pub fn focus_next_card(&mut self, card_count: usize, lock: &ScrollLock) {
        if self.focused_card + 1 < card_count {
            self.switch_card(self.focused_card + 1);
        }
        self.ensure_visible(card_count, lock);
    }

    pub fn focus_prev_card(&mut self, card_count: usize, lock: &ScrollLock) {
        if self.focused_card > 0 {
            self.switch_card(self.focused_card - 1);
        }
        self.ensure_visible(card_count, lock);
    }

    /// Focus `thumb` inside `card`, e.g. after a click on it.
    pub fn focus_thumbnail(&mut self, card: usize, thumb: usize) {
        if card != self.focused_card {
            self.switch_card(card);
        }
        self.focused_thumb = thumb;
    }

    /// Thumbnail `card` shows: the focused one, or the one it showed last.
    pub fn thumb_for(&self, card: usize) -> usize {
        if card == self.focused_card {
            self.focused_thumb
        } else {
            self.remembered.get(&card).copied().unwrap_or(0)
        }
    }

    fn switch_card(&mut self, card: usize) {
        self.remembered.insert(self.focused_card, self.focused_thumb);
        self.focused_card = card;
        self.focused_thumb = self.remembered.remove(&card).unwrap_or(0);
    }

    /// Move thumbnail focus right, wrapping inside the card's strip.
    pub fn focus_next_thumb(&mut self, thumb_count: usize) {
        if thumb_count > 0 {
            self.focused_thumb = (self.focused_thumb + 1) % thumb_count;
        }
    }

    pub fn focus_prev_thumb(&mut self, thumb_count: usize) {
        if thumb_count > 0 {
            self.focused_thumb = (self.focused_thumb + thumb_count - 1) % thumb_count;
        }
    }

    /// Scroll so the focused card is on screen.
    pub fn ensure_visible(&mut self, card_count: usize, lock: &ScrollLock) {
        let visible = self.visible_cards.max(1);
        if self.focused_card < self.scroll {
            let delta = self.focused_card as isize - self.scroll as isize;
            self.scroll_by(delta, card_count, lock);
        } else if self.focused_card >= self.scroll + visible {
            let delta = (self.focused_card + 1 - visible) as isize - self.scroll as isize;
            self.scroll_by(delta, card_count, lock);
        }
    }

    /// Keep focus and scroll inside a gallery that may have shrunk.
    pub fn clamp(&mut self, card_count: usize, thumb_count: usize) {
        self.focused_card = self.focused_card.min(card_count.saturating_sub(1));
        self.focused_thumb = self.focused_thumb.min(thumb_count.saturating_sub(1));
        self.scroll = self.scroll.min(card_count.saturating_sub(1));
        self.remembered.retain(|&card, _| card < card_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_clamps_to_range() {
        let lock = ScrollLock::new();
        let mut page = Page::new();
        page.visible_cards = 2;

        assert!(page.scroll_by(1, 5, &lock));
        assert!(page.scroll_by(10, 5, &lock));
        assert_eq!(page.scroll, 3);
        assert!(page.scroll_by(-10, 5, &lock));
        assert_eq!(page.scroll, 0);
        assert!(!page.scroll_by(-1, 5, &lock));
    }

    #[test]
    fn test_scroll_suppressed_while_locked() {
        let lock = ScrollLock::new();
        let mut page = Page::new();

        let guard = lock.acquire();
        assert!(!page.scroll_by(1, 5, &lock));
        assert_eq!(page.scroll, 0);

        drop(guard);
        assert!(page.scroll_by(1, 5, &lock));
        assert_eq!(page.scroll, 1);
    }

    #[test]
    fn test_focus_moves_scroll() {
        let lock = ScrollLock::new();
        let mut page = Page::new();
        page.visible_cards = 2;

        page.focus_next_card(4, &lock);
        assert_eq!(page.scroll, 0);
        page.focus_next_card(4, &lock);
        assert_eq!(page.focused_card, 2);
        assert_eq!(page.scroll, 1);

        page.focus_next_card(4, &lock);
        page.focus_next_card(4, &lock);
        assert_eq!(page.focused_card, 3);
        assert_eq!(page.scroll, 2);

        page.focus_prev_card(4, &lock);
        page.focus_prev_card(4, &lock);
        page.focus_prev_card(4, &lock);
        assert_eq!(page.focused_card, 0);
        assert_eq!(page.scroll, 0);
    }

    #[test]
    fn test_thumb_focus_wraps() {
        let mut page = Page::new();
        page.focus_prev_thumb(3);
        assert_eq!(page.focused_thumb, 2);
        page.focus_next_thumb(3);
        assert_eq!(page.focused_thumb, 0);
        page.focus_next_thumb(0);
        assert_eq!(page.focused_thumb, 0);
    }

    #[test]
    fn test_cards_remember_their_thumbnail() {
        let lock = ScrollLock::new();
        let mut page = Page::new();
        page.focus_next_thumb(4);
        page.focus_next_thumb(4);

        page.focus_next_card(3, &lock);
        assert_eq!(page.focused_thumb, 0);
        assert_eq!(page.thumb_for(0), 2);
        assert_eq!(page.thumb_for(2), 0);

        page.focus_prev_card(3, &lock);
        assert_eq!(page.focused_thumb, 2);
    }

    #[test]
    fn test_focus_thumbnail_switches_card() {
        let mut page = Page::new();
        page.focus_next_thumb(3);
        page.focus_thumbnail(2, 1);
        assert_eq!(page.focused_card, 2);
        assert_eq!(page.focused_thumb, 1);
        assert_eq!(page.thumb_for(0), 1);

        page.clamp(1, 3);
        assert_eq!(page.thumb_for(2), 0);
    }

    #[test]
    fn test_top_and_bottom() {
        let lock = ScrollLock::new();
        let mut page = Page::new();
        page.scroll_to_bottom(6, &lock);
        assert_eq!(page.scroll, 5);
        page.scroll_to_top(&lock);
        assert_eq!(page.scroll, 0);
    }

    #[test]
    fn test_clamp_after_shrink() {
        let mut page = Page::new();
        page.focused_card = 5;
        page.focused_thumb = 3;
        page.scroll = 4;
        page.clamp(2, 1);
        assert_eq!(page.focused_card, 1);
        assert_eq!(page.focused_thumb, 0);
        assert_eq!(page.scroll, 1);
    }
}
