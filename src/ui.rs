//! Terminal presentation of the canvas.

use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use tiny_skia::Pixmap;

use crate::driver::{AnimationDriver, CanvasSize, PlaybackState};
use crate::style::StyleSettings;
use crate::surface::PixmapSurface;
use crate::visualizers;

/// Each cell shows two canvas pixels: the upper half in the foreground
/// color, the lower half in the background color.
const UPPER_HALF: char = '▀';

const HELP: &str = "space play  n/p mode  1-8 select  t theme  +/- sens  [/] int  \
                    f full  h hide  s source  d detach  q quit";

/// Blits a pixmap into a buffer area, nearest-neighbour scaled.
pub struct PixmapView<'a> {
    pixmap: &'a Pixmap,
}

impl<'a> PixmapView<'a> {
    pub fn new(pixmap: &'a Pixmap) -> Self {
        Self { pixmap }
    }

    // Premultiplied channels are the pixel composited over black.
    fn sample(&self, x: u32, y: u32) -> Color {
        match self.pixmap.pixel(x, y) {
            Some(p) => Color::Rgb(p.red(), p.green(), p.blue()),
            None => Color::Black,
        }
    }
}

impl Widget for PixmapView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        let (pw, ph) = (self.pixmap.width() as u64, self.pixmap.height() as u64);
        let rows = area.height as u64 * 2;
        for cy in 0..area.height {
            for cx in 0..area.width {
                let x = (cx as u64 * pw / area.width as u64) as u32;
                let top = ((cy as u64 * 2) * ph / rows) as u32;
                let bottom = ((cy as u64 * 2 + 1) * ph / rows) as u32;
                let fg = self.sample(x, top);
                let bg = self.sample(x, bottom);
                if let Some(cell) = buf.cell_mut((area.x + cx, area.y + cy)) {
                    cell.set_char(UPPER_HALF);
                    cell.set_fg(fg);
                    cell.set_bg(bg);
                }
            }
        }
    }
}

/// Where the canvas and the status line go on a screen of this size.
pub fn layout(screen: Rect, settings: &StyleSettings) -> (Rect, Option<Rect>) {
    if settings.fullscreen {
        return (screen, None);
    }
    let (body, status) = if settings.controls_visible {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(screen);
        (chunks[0], Some(chunks[1]))
    } else {
        (screen, None)
    };
    (frame_block("").inner(body), status)
}

/// Logical canvas size for a cell area: one pixel per column, two per row.
pub fn canvas_size(area: Rect, pixel_ratio: f32) -> CanvasSize {
    CanvasSize::new(area.width as f32, area.height as f32 * 2.0, pixel_ratio)
}

fn frame_block(title: &str) -> Block<'_> {
    Block::default().title(title).borders(Borders::ALL)
}

pub fn draw(f: &mut Frame, driver: &AnimationDriver<PixmapSurface>) {
    let settings = driver.style().settings();
    let screen = f.area();
    let (canvas, status) = layout(screen, settings);

    if !settings.fullscreen {
        let border = if driver.state() == PlaybackState::Running {
            Color::Cyan
        } else {
            Color::DarkGray
        };
        let body = if status.is_some() {
            Rect {
                height: screen.height.saturating_sub(1),
                ..screen
            }
        } else {
            screen
        };
        let title = format!(" Style: {} ", visualizers::for_mode(settings.active_mode).name());
        f.render_widget(
            frame_block(&title).border_style(Style::default().fg(border)),
            body,
        );
    }

    if let Some(pixmap) = driver.surface().pixmap() {
        f.render_widget(PixmapView::new(pixmap), canvas);
    }

    if let Some(area) = status {
        f.render_widget(Paragraph::new(status_line(driver)), area);
    }
}

pub fn status_line(driver: &AnimationDriver<PixmapSurface>) -> Line<'static> {
    let settings = driver.style().settings();
    let state = match driver.state() {
        PlaybackState::Idle => "idle",
        PlaybackState::Suspended => "paused",
        PlaybackState::Running => "playing",
    };
    let stats = driver.stats();
    let dim = Style::default().fg(Color::DarkGray);
    Line::from(vec![
        Span::styled(format!(" {state} "), Style::default().fg(Color::Black).bg(Color::Cyan)),
        Span::raw(format!(
            " {} | {} | sens {:.1} | int {:.1} | {} frames ({} skipped) ",
            driver.source_label().unwrap_or("no source"),
            settings.color_theme.name(),
            settings.sensitivity,
            settings.intensity,
            stats.drawn,
            stats.throttled,
        )),
        Span::styled(HELP, dim),
    ])
}
