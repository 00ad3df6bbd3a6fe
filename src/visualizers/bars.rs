use super::{DrawContext, ModeState, Visualizer, glow};
use tiny_skia::{PathBuilder, Rect};

/// Horizontal space left between neighbouring bars.
pub const GUTTER: f32 = 2.0;
/// Full-scale bar height as a fraction of the canvas, at intensity 1.
pub const HEIGHT_CEILING: f32 = 0.8;
/// Bars taller than this fraction of the canvas get a glow pass.
const GLOW_THRESHOLD: f32 = 0.1;

pub struct BarVisualizer;

impl Visualizer for BarVisualizer {
    fn name(&self) -> &str {
        "Frequency Bars"
    }

    fn draw(&self, cx: &mut DrawContext<'_>, _state: &mut ModeState) {
        if cx.is_degenerate() {
            return;
        }

        let n = cx.bins.len();
        let intensity = cx.intensity();
        let slot = cx.width / n as f32;

        for i in 0..n {
            let level = cx.level(i);
            let bar_height = (level * cx.height * HEIGHT_CEILING * intensity).min(cx.height);
            if !(bar_height > 0.0) {
                continue;
            }

            // Whole-pixel columns; narrow canvases still get one pixel per bar.
            let x = (i as f32 * slot).floor();
            let right = ((i + 1) as f32 * slot).floor();
            let bar_width = (right - x - GUTTER).max(1.0);
            let y = cx.height - bar_height;
            let Some(rect) = Rect::from_xywh(x, y, bar_width, bar_height) else {
                continue;
            };
            let color = cx.color(i, (0.55 + 0.45 * level).min(1.0));

            if bar_height > cx.height * GLOW_THRESHOLD {
                let outline = PathBuilder::from_rect(rect);
                glow(cx.surface, &outline, 2.0 * intensity, color);
            }
            cx.surface.fill_rect(rect, color);
        }
    }
}
