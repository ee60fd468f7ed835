//! Ratatui renderer for the portfolio page and the lightbox overlay.
//!
//! This module is purely presentational. It takes references to application
//! state and renders into a Ratatui `Frame`.  It owns no state; the hit areas
//! it reports back are what mouse clicks are routed against.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::assets::AssetIndex;
use crate::contact::{ContactPanel, ContactStatus, FormField};
use crate::content::{CodeLine, CodeStyle, ProjectRecord, Screenshot};
use crate::gallery::{AspectRatio, CardView, GalleryGrid};
use crate::page::Page;
use crate::viewer::{ImageViewer, LightboxLayout};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const HEADER_HEIGHT: u16 = 3;
const CARD_HEIGHT: u16 = 16;
const CONTACT_HEIGHT: u16 = 9;
const CARD_STRIP_ROWS: u16 = 3;
const MIN_CARD_THUMB: u16 = 8;
const MAX_CARD_THUMB: u16 = 20;

// ---------------------------------------------------------------------------
// Inputs / outputs
// ---------------------------------------------------------------------------

/// Everything one frame needs.
pub struct Screen<'a> {
    pub owner: &'a str,
    pub tagline: &'a str,
    pub gallery: &'a GalleryGrid,
    pub page: &'a Page,
    pub viewer: &'a ImageViewer,
    pub assets: &'a AssetIndex,
    pub contact: &'a ContactPanel,
    pub notice: Option<&'a str>,
}

/// A card thumbnail drawn on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThumbHit {
    pub area: Rect,
    pub card: usize,
    pub index: usize,
}

/// Geometry measured while drawing.
#[derive(Debug, Default)]
pub struct RenderOutput {
    pub visible_cards: usize,
    pub thumbnails: Vec<ThumbHit>,
    pub lightbox: Option<LightboxLayout>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a code highlight class to a colour.
fn color_for_style(style: CodeStyle) -> Color {
    match style {
        CodeStyle::Keyword => Color::Magenta,
        CodeStyle::Identifier => Color::Green,
        CodeStyle::Punctuation => Color::Gray,
        CodeStyle::Key => Color::DarkGray,
        CodeStyle::Literal => Color::Yellow,
        CodeStyle::Text => Color::White,
        CodeStyle::Bracket => Color::Cyan,
    }
}

/// Cut `text` to at most `width` display columns, ending in `…` when cut.
fn fit(text: &str, width: usize) -> String {
    if UnicodeWidthStr::width(text) <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

fn code_line(line: &CodeLine) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::with_capacity(line.segments.len() + 1);
    if line.indent > 0 {
        spans.push(Span::raw("  ".repeat(line.indent as usize)));
    }
    for segment in &line.segments {
        let mut style = Style::default().fg(color_for_style(segment.style));
        if segment.style == CodeStyle::Keyword {
            style = style.add_modifier(Modifier::BOLD);
        }
        spans.push(Span::styled(segment.text.clone(), style));
    }
    Line::from(spans)
}

fn chip_line(card: &CardView<'_>) -> Line<'static> {
    let chip = Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD);

    let mut spans: Vec<Span<'static>> = Vec::new();
    for name in card.visible_chips {
        spans.push(Span::styled(format!(" {} ", name), chip));
        spans.push(Span::raw(" "));
    }
    if card.hidden_chips > 0 {
        spans.push(Span::styled(
            format!(" +{} ", card.hidden_chips),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
    }
    Line::from(spans)
}

fn link_line(project: &ProjectRecord) -> Line<'static> {
    let on = Style::default()
        .fg(Color::White)
        .bg(Color::Blue)
        .add_modifier(Modifier::BOLD);
    let off = Style::default().fg(Color::DarkGray);

    let mut spans = Vec::new();
    if project.live_url.is_some() {
        spans.push(Span::styled(" o Live ↗ ", on));
        spans.push(Span::raw(" "));
    }
    if project.code_url.is_some() {
        spans.push(Span::styled(" c Code </> ", on));
    }
    if spans.is_empty() {
        spans.push(Span::styled("no public links", off));
    }
    Line::from(spans)
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

fn render_header(frame: &mut Frame, area: Rect, screen: &Screen<'_>) {
    let owner = if screen.owner.is_empty() {
        "Portfolio"
    } else {
        screen.owner
    };

    let title_line = Line::from(vec![
        Span::styled(
            " folio ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            owner.to_string(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
    ]);

    let tagline_line = Line::from(Span::styled(
        format!(" {}", screen.tagline),
        Style::default().fg(Color::DarkGray),
    ));

    let section_line = Line::from(vec![
        Span::styled(
            " Project Spotlight ",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        ),
        Span::styled(
            format!("  {} projects", screen.gallery.len()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let text = Text::from(vec![title_line, tagline_line, section_line]);
    frame.render_widget(Paragraph::new(text), area);
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

fn render_code_panel(frame: &mut Frame, area: Rect, card: &CardView<'_>) {
    let project = card.project;
    let mut lines: Vec<Line<'static>> = Vec::new();

    if !project.subtitle.is_empty() {
        lines.push(Line::from(Span::styled(
            project.subtitle.clone(),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    // Leave room for the chip and link rows at the bottom.
    let code_rows = (area.height as usize).saturating_sub(lines.len() + 3);
    lines.extend(project.code_lines.iter().take(code_rows).map(code_line));
    if project.code_lines.len() > code_rows {
        lines.push(Line::from(Span::styled(
            "  …",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let body = Rect::new(area.x, area.y, area.width, area.height.saturating_sub(2));
    frame.render_widget(Paragraph::new(Text::from(lines)), body);

    let footer = Rect::new(
        area.x,
        area.bottom().saturating_sub(2),
        area.width,
        2.min(area.height),
    );
    let footer_text = Text::from(vec![chip_line(card), link_line(project)]);
    frame.render_widget(Paragraph::new(footer_text), footer);
}

/// Draw a screenshot placeholder: the terminal cannot show the image itself,
/// so the frame carries its file name and whether it resolves on disk.
fn render_shot_frame(
    frame: &mut Frame,
    area: Rect,
    shot: Option<&Screenshot>,
    assets: &AssetIndex,
    aspect: AspectRatio,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {} ", aspect.label()),
            Style::default().fg(Color::DarkGray),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width as usize;
    let lines = match shot {
        None => vec![Line::from(Span::styled(
            "no screenshots",
            Style::default().fg(Color::DarkGray),
        ))],
        Some(shot) => {
            let status = if assets.contains(shot.src()) {
                Span::styled("▣ image", Style::default().fg(Color::Green))
            } else {
                Span::styled("image unavailable", Style::default().fg(Color::Red))
            };
            vec![
                Line::from(Span::styled(
                    fit(shot.file_name(), width),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(status),
            ]
        }
    };

    let pad = inner.height.saturating_sub(lines.len() as u16) / 2;
    let mut padded: Vec<Line<'static>> = vec![Line::default(); pad as usize];
    padded.extend(lines);
    frame.render_widget(
        Paragraph::new(Text::from(padded)).alignment(Alignment::Center),
        inner,
    );
}

fn render_card_strip(
    frame: &mut Frame,
    area: Rect,
    card_index: usize,
    card: &CardView<'_>,
    focused_thumb: Option<usize>,
    hits: &mut Vec<ThumbHit>,
) {
    if !card.gallery_enabled {
        let disabled = Paragraph::new(Line::from(Span::styled(
            "gallery unavailable",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::CROSSED_OUT),
        )))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        frame.render_widget(disabled, area);
        return;
    }

    let count = card.thumbnails.len() as u16 + u16::from(card.hidden_thumbnails > 0);
    let width = (area.width / count.max(1)).clamp(MIN_CARD_THUMB, MAX_CARD_THUMB);

    for (i, shot) in card.thumbnails.iter().enumerate() {
        let x = area.x + i as u16 * width;
        if x + width > area.right() {
            break;
        }
        let slot = Rect::new(x, area.y, width, area.height);
        let active = focused_thumb == Some(i);
        let border = if active {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let label = format!("{} {}", i + 1, shot.file_name());
        let thumb = Paragraph::new(fit(&label, width.saturating_sub(2) as usize))
            .style(if active {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::Gray)
            })
            .block(Block::default().borders(Borders::ALL).border_style(border));
        frame.render_widget(thumb, slot);
        hits.push(ThumbHit {
            area: slot,
            card: card_index,
            index: i,
        });
    }

    if card.hidden_thumbnails > 0 {
        let x = area.x + card.thumbnails.len() as u16 * width;
        if x + 4 <= area.right() {
            let more = Rect::new(x, area.y + 1, (area.right() - x).min(width), 1);
            frame.render_widget(
                Paragraph::new(Span::styled(
                    format!(" +{}", card.hidden_thumbnails),
                    Style::default().fg(Color::DarkGray),
                )),
                more,
            );
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn render_shots_panel(
    frame: &mut Frame,
    area: Rect,
    card_index: usize,
    card: &CardView<'_>,
    (shown, focused): (usize, bool),
    assets: &AssetIndex,
    aspect: AspectRatio,
    hits: &mut Vec<ThumbHit>,
) {
    let frame_rows = aspect
        .rows_for_width(area.width)
        .min(area.height.saturating_sub(CARD_STRIP_ROWS + 1))
        .max(3);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(frame_rows),
            Constraint::Length(1),
            Constraint::Length(CARD_STRIP_ROWS),
            Constraint::Min(0),
        ])
        .split(area);

    let shown = shown.min(card.project.screenshots.len().saturating_sub(1));
    let shot = card.project.screenshots.get(shown);
    render_shot_frame(frame, chunks[0], shot, assets, aspect);

    if let Some(shot) = shot {
        frame.render_widget(
            Paragraph::new(Span::styled(
                fit(shot.caption(), chunks[1].width as usize),
                Style::default().fg(Color::Gray),
            )),
            chunks[1],
        );
    }

    let focused_thumb = focused.then_some(shown);
    render_card_strip(frame, chunks[2], card_index, card, focused_thumb, hits);
}

fn render_card(
    frame: &mut Frame,
    area: Rect,
    card_index: usize,
    card: &CardView<'_>,
    screen: &Screen<'_>,
    hits: &mut Vec<ThumbHit>,
) {
    let focused = screen.page.focused_card == card_index;

    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(Span::styled(
            format!(" {} ", card.project.title),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ));
    if !card.project.badge.is_empty() {
        block = block.title(
            Line::from(Span::styled(
                format!(" {} ", card.project.badge),
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ))
            .right_aligned(),
        );
    }
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .spacing(2)
        .split(inner);
    let (shots_area, code_area) = if card.shots_on_left {
        (halves[0], halves[1])
    } else {
        (halves[1], halves[0])
    };

    render_code_panel(frame, code_area, card);
    render_shots_panel(
        frame,
        shots_area,
        card_index,
        card,
        (screen.page.thumb_for(card_index), focused),
        screen.assets,
        screen.gallery.config().aspect_ratio,
        hits,
    );
}

fn render_gallery(frame: &mut Frame, area: Rect, screen: &Screen<'_>, out: &mut RenderOutput) {
    out.visible_cards = ((area.height / CARD_HEIGHT) as usize).max(1);

    if screen.gallery.is_empty() {
        let empty = Paragraph::new(vec![
            Line::default(),
            Line::from(Span::styled(
                "No projects yet.",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(empty, area);
        return;
    }

    let first = screen.page.scroll;
    let last = (first + out.visible_cards).min(screen.gallery.len());
    for (slot, card_index) in (first..last).enumerate() {
        let y = area.y + slot as u16 * CARD_HEIGHT;
        let height = CARD_HEIGHT.min(area.bottom().saturating_sub(y));
        if height < 4 {
            break;
        }
        if let Some(card) = screen.gallery.card(card_index) {
            let card_area = Rect::new(area.x, y, area.width, height);
            render_card(frame, card_area, card_index, &card, screen, &mut out.thumbnails);
        }
    }
}

// ---------------------------------------------------------------------------
// Contact panel
// ---------------------------------------------------------------------------

fn render_contact(frame: &mut Frame, area: Rect, panel: &ContactPanel) {
    let label_style = |field: FormField| {
        if panel.field == field {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };

    let mut lines: Vec<Line<'static>> = Vec::new();
    for field in [FormField::Name, FormField::Email] {
        let cursor = if panel.field == field { "_" } else { "" };
        lines.push(Line::from(vec![
            Span::styled(format!(" {:<8}", field.label()), label_style(field)),
            Span::styled(
                format!("{}{}", panel.form.field(field), cursor),
                Style::default().fg(Color::White),
            ),
        ]));
    }
    lines.push(Line::from(Span::styled(
        format!(" {:<8}", FormField::Message.label()),
        label_style(FormField::Message),
    )));
    let cursor = if panel.field == FormField::Message { "_" } else { "" };
    for (i, text) in format!("{}{}", panel.form.message, cursor)
        .lines()
        .enumerate()
    {
        if i >= 3 {
            break;
        }
        lines.push(Line::from(Span::styled(
            format!("   {}", text),
            Style::default().fg(Color::White),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(Span::styled(
            " Get in touch ",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ))
        .title_bottom(Span::styled(
            " Tab next field · Ctrl+S send · Esc close ",
            Style::default().fg(Color::DarkGray),
        ));

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .block(block)
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn contact_status_span(status: &ContactStatus) -> Option<Span<'static>> {
    match status {
        ContactStatus::Idle => None,
        ContactStatus::Sending => Some(Span::styled(
            "  sending message…",
            Style::default().fg(Color::Yellow),
        )),
        ContactStatus::Sent { at } => Some(Span::styled(
            format!("  ✓ message sent at {}", at.format("%H:%M")),
            Style::default().fg(Color::Green),
        )),
        ContactStatus::Failed(reason) => Some(Span::styled(
            format!("  ✗ {}", reason),
            Style::default().fg(Color::Red),
        )),
    }
}

// ---------------------------------------------------------------------------
// Legend
// ---------------------------------------------------------------------------

fn render_legend(frame: &mut Frame, area: Rect, screen: &Screen<'_>) {
    let hints = if screen.viewer.is_open() {
        " ←/→ browse · 1-9 jump · Esc close"
    } else if screen.contact.is_editing() {
        " editing message"
    } else {
        " q quit · ↑/↓ project · ←/→ thumbnail · Enter view · o live · c code · m message · j/k scroll"
    };

    let mut spans = vec![Span::styled(hints, Style::default().fg(Color::DarkGray))];
    if let Some(status) = contact_status_span(&screen.contact.status) {
        spans.push(status);
    }
    if let Some(notice) = screen.notice {
        spans.push(Span::styled(
            format!("  [!] {}", notice),
            Style::default().fg(Color::Yellow),
        ));
    }

    let total = screen.gallery.len();
    if total > 0 {
        spans.push(Span::styled(
            format!("  [{}/{}]", screen.page.focused_card + 1, total),
            Style::default().fg(Color::Cyan),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ---------------------------------------------------------------------------
// Lightbox
// ---------------------------------------------------------------------------

fn render_lightbox(
    frame: &mut Frame,
    area: Rect,
    viewer: &ImageViewer,
    assets: &AssetIndex,
    aspect: AspectRatio,
) -> Option<LightboxLayout> {
    let project = viewer.project()?;
    let index = viewer.index()?;
    let layout = viewer.layout(area, aspect)?;
    let len = project.screenshots.len();

    // Backdrop: dim whatever the page drew.
    frame.buffer_mut().set_style(
        area,
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM),
    );
    if !layout.is_drawable() {
        return Some(layout);
    }

    frame.render_widget(Clear, layout.panel);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            format!(" {} ", project.title),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));
    frame.render_widget(block, layout.panel);

    frame.render_widget(
        Paragraph::new(Span::styled(
            "[x]",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        layout.close,
    );

    let shot = viewer.current();
    render_shot_frame(frame, layout.image, shot, assets, aspect);

    let control = Style::default()
        .fg(Color::Black)
        .bg(Color::White)
        .add_modifier(Modifier::BOLD);
    frame.render_widget(Paragraph::new(Span::styled(" ‹ ", control)), layout.prev);
    frame.render_widget(Paragraph::new(Span::styled(" › ", control)), layout.next);

    if let Some(shot) = shot {
        let counter = format!(" {}/{} ", index + 1, len);
        let room = (layout.caption.width as usize).saturating_sub(counter.len() + 1);
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(
                    format!("{:<width$}", fit(shot.caption(), room), width = room),
                    Style::default().fg(Color::White),
                ),
                Span::styled(counter, Style::default().fg(Color::Cyan)),
            ])),
            layout.caption,
        );
    }

    for (slot, k) in &layout.thumbnails {
        let active = *k == index;
        let style = if active {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let name = project
            .screenshots
            .get(*k)
            .map(|s| s.file_name())
            .unwrap_or("");
        let label = format!("{} {}", k + 1, name);
        frame.render_widget(
            Paragraph::new(fit(&label, slot.width.saturating_sub(2) as usize))
                .style(style)
                .block(Block::default().borders(Borders::ALL).border_style(style)),
            *slot,
        );
    }

    Some(layout)
}

// ---------------------------------------------------------------------------
// Main render entry point
// ---------------------------------------------------------------------------

/// Top-level render function.  Draws the page, then the contact panel and
/// the lightbox on top of it when they are active.
pub fn render_ui(frame: &mut Frame, screen: &Screen<'_>) -> RenderOutput {
    let size = frame.area();
    let mut out = RenderOutput::default();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT), // header
            Constraint::Min(1),                // cards
            Constraint::Length(1),             // legend
        ])
        .split(size);

    render_header(frame, chunks[0], screen);
    render_gallery(frame, chunks[1], screen, &mut out);
    render_legend(frame, chunks[2], screen);

    if screen.contact.is_editing() {
        let height = CONTACT_HEIGHT.min(chunks[1].height);
        let area = Rect::new(
            chunks[1].x,
            chunks[1].bottom().saturating_sub(height),
            chunks[1].width,
            height,
        );
        render_contact(frame, area, screen.contact);
    }

    out.lightbox = render_lightbox(
        frame,
        size,
        screen.viewer,
        screen.assets,
        screen.gallery.config().aspect_ratio,
    );

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::rc::Rc;

    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use crate::content::CodeSegment;
    use crate::gallery::GalleryConfig;
    use crate::listeners::KeyListeners;
    use crate::scroll_lock::ScrollLock;

    fn project(id: &str, shots: usize) -> Rc<ProjectRecord> {
        Rc::new(ProjectRecord {
            id: id.to_string(),
            live_url: Some("https://example.com".to_string()),
            code_url: None,
            title: format!("{} title", id),
            subtitle: "live • colorful".to_string(),
            badge: "MERN".to_string(),
            code_lines: vec![CodeLine {
                indent: 0,
                segments: vec![
                    CodeSegment::new("const", CodeStyle::Keyword),
                    CodeSegment::new(" project", CodeStyle::Identifier),
                ],
            }],
            chips: vec!["React".to_string(), "Node.js".to_string()],
            screenshots: (0..shots)
                .map(|i| Screenshot::new(format!("/{}{}.png", id, i), format!("Caption {}", i)))
                .collect(),
        })
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    fn draw(gallery: &GalleryGrid, viewer: &ImageViewer) -> (Terminal<TestBackend>, RenderOutput) {
        draw_page(gallery, viewer, &Page::new(), 120, 40)
    }

    fn draw_page(
        gallery: &GalleryGrid,
        viewer: &ImageViewer,
        page: &Page,
        width: u16,
        height: u16,
    ) -> (Terminal<TestBackend>, RenderOutput) {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        let assets = AssetIndex::scan(Path::new("/no/such/assets"));
        let contact = ContactPanel::new();
        let screen = Screen {
            owner: "Devesh",
            tagline: "Frontend developer",
            gallery,
            page,
            viewer,
            assets: &assets,
            contact: &contact,
            notice: None,
        };
        let mut out = RenderOutput::default();
        terminal
            .draw(|frame| {
                out = render_ui(frame, &screen);
            })
            .unwrap();
        (terminal, out)
    }

    #[test]
    fn test_color_for_style() {
        assert_eq!(color_for_style(CodeStyle::Keyword), Color::Magenta);
        assert_eq!(color_for_style(CodeStyle::Literal), Color::Yellow);
        assert_eq!(color_for_style(CodeStyle::Bracket), Color::Cyan);
    }

    #[test]
    fn test_fit() {
        assert_eq!(fit("short", 10), "short");
        assert_eq!(fit("balone-admin.png", 8), "balone-…");
        assert_eq!(fit("abc", 0), "");
    }

    #[test]
    fn test_code_line_indent_and_spans() {
        let line = CodeLine {
            indent: 1,
            segments: vec![CodeSegment::new("name", CodeStyle::Key)],
        };
        let rendered = code_line(&line);
        assert_eq!(rendered.spans.len(), 2);
        assert_eq!(rendered.spans[0].content, "  ");
    }

    #[test]
    fn test_empty_gallery_renders_empty_state() {
        let gallery = GalleryGrid::new(Vec::new(), GalleryConfig::default());
        let viewer = ImageViewer::new(ScrollLock::new(), KeyListeners::new());
        let (terminal, out) = draw(&gallery, &viewer);

        let text = buffer_text(&terminal);
        assert!(text.contains("Project Spotlight"));
        assert!(text.contains("No projects yet."));
        assert!(out.thumbnails.is_empty());
        assert!(out.lightbox.is_none());
    }

    #[test]
    fn test_cards_report_thumbnail_hits() {
        let gallery = GalleryGrid::new(
            vec![project("balone", 3), project("bare", 0)],
            GalleryConfig::default(),
        );
        let viewer = ImageViewer::new(ScrollLock::new(), KeyListeners::new());
        let (terminal, out) = draw(&gallery, &viewer);

        let text = buffer_text(&terminal);
        assert!(text.contains("balone title"));
        assert!(text.contains("gallery unavailable"));
        assert!(text.contains("image unavailable"));
        assert_eq!(out.visible_cards, 2);
        assert_eq!(out.thumbnails.len(), 3);
        assert!(out.thumbnails.iter().all(|hit| hit.card == 0));
    }

    #[test]
    fn test_open_lightbox_draws_caption_and_counter() {
        let gallery = GalleryGrid::new(vec![project("balone", 4)], GalleryConfig::default());
        let mut viewer = ImageViewer::new(ScrollLock::new(), KeyListeners::new());
        viewer.open(project("balone", 4), 2).unwrap();
        let (terminal, out) = draw(&gallery, &viewer);

        let text = buffer_text(&terminal);
        assert!(text.contains("Caption 2"));
        assert!(text.contains("3/4"));
        assert!(text.contains("[x]"));
        let layout = out.lightbox.unwrap();
        assert_eq!(layout.thumbnails.len(), 4);
    }

    fn slot_for(layout: &LightboxLayout, k: usize) -> Rect {
        layout
            .thumbnails
            .iter()
            .find(|(_, i)| *i == k)
            .map(|(r, _)| *r)
            .unwrap()
    }

    #[test]
    fn test_active_lightbox_thumbnail_is_marked() {
        let gallery = GalleryGrid::new(vec![project("balone", 4)], GalleryConfig::default());
        let mut viewer = ImageViewer::new(ScrollLock::new(), KeyListeners::new());
        viewer.open(project("balone", 4), 0).unwrap();

        let (terminal, out) = draw(&gallery, &viewer);
        let layout = out.lightbox.unwrap();
        let buffer = terminal.backend().buffer();
        let first = slot_for(&layout, 0);
        let second = slot_for(&layout, 1);
        assert_eq!(buffer[(first.x, first.y)].fg, Color::Yellow);
        assert!(buffer[(first.x, first.y)].modifier.contains(Modifier::BOLD));
        assert_eq!(buffer[(second.x, second.y)].fg, Color::DarkGray);

        viewer.apply(crate::viewer::ViewerAction::Next);
        let (terminal, out) = draw(&gallery, &viewer);
        let layout = out.lightbox.unwrap();
        let buffer = terminal.backend().buffer();
        let first = slot_for(&layout, 0);
        let second = slot_for(&layout, 1);
        assert_eq!(buffer[(second.x, second.y)].fg, Color::Yellow);
        assert!(buffer[(second.x, second.y)].modifier.contains(Modifier::BOLD));
        assert_eq!(buffer[(first.x, first.y)].fg, Color::DarkGray);
    }

    #[test]
    fn test_open_lightbox_in_tiny_terminals() {
        let aspects = [AspectRatio::Desktop, AspectRatio::Wide, AspectRatio::Classic];
        for aspect in aspects {
            let config = GalleryConfig {
                aspect_ratio: aspect,
                ..GalleryConfig::default()
            };
            for shots in [1, 4, 30] {
                let gallery = GalleryGrid::new(vec![project("balone", shots)], config);
                let mut viewer = ImageViewer::new(ScrollLock::new(), KeyListeners::new());
                viewer.open(project("balone", shots), shots - 1).unwrap();
                for width in 1..=24 {
                    for height in 1..=8 {
                        let (_, out) = draw_page(&gallery, &viewer, &Page::new(), width, height);
                        assert!(out.lightbox.is_some());
                    }
                }
            }
        }
    }

    #[test]
    fn test_unfocused_card_keeps_its_screenshot() {
        let gallery = GalleryGrid::new(
            vec![project("balone", 4), project("bare", 0)],
            GalleryConfig::default(),
        );
        let viewer = ImageViewer::new(ScrollLock::new(), KeyListeners::new());
        let lock = ScrollLock::new();
        let mut page = Page::new();
        page.visible_cards = 2;
        page.focus_next_thumb(4);
        page.focus_next_thumb(4);
        page.focus_next_card(2, &lock);

        let (terminal, _) = draw_page(&gallery, &viewer, &page, 120, 40);
        let text = buffer_text(&terminal);
        assert!(text.contains("Caption 2"));
        assert!(!text.contains("Caption 0"));
    }
}
