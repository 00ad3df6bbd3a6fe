use super::{DrawContext, ModeState, Visualizer, circle};
use crate::surface::Fill;
use std::f32::consts::{FRAC_PI_2, TAU};

/// Bins driving the three discs, innermost first.
const DISC_BINS: [usize; 3] = [0, 42, 84];
const DISC_BASE: [f32; 3] = [0.1, 0.18, 0.26];
const DISC_ALPHA: [f32; 3] = [0.6, 0.4, 0.2];

pub struct PulseVisualizer;

impl Visualizer for PulseVisualizer {
    fn name(&self) -> &str {
        "Pulse"
    }

    fn draw(&self, cx: &mut DrawContext<'_>, _state: &mut ModeState) {
        if cx.is_degenerate() {
            return;
        }

        let n = cx.bins.len();
        let intensity = cx.intensity();
        let (center_x, center_y) = cx.center();
        let side = cx.min_side();
        let swell = side * 0.12 * intensity;

        // Outermost first so the brighter inner discs sit on top.
        for ring in (0..DISC_BINS.len()).rev() {
            let bin = DISC_BINS[ring].min(n - 1);
            let radius = side * DISC_BASE[ring] * intensity + cx.level(bin) * swell;
            if let Some(disc) = circle(center_x, center_y, radius) {
                let fill = Fill::Solid(cx.color(bin, DISC_ALPHA[ring]));
                cx.surface.fill_path(&disc, &fill);
            }
        }

        let perimeter = side * DISC_BASE[2] * intensity + swell;
        for i in 0..n {
            let angle = i as f32 / n as f32 * TAU - FRAC_PI_2;
            let radius = perimeter + cx.level(i) * side * 0.1 * intensity;
            let (sin, cos) = angle.sin_cos();
            let (x, y) = (center_x + cos * radius, center_y + sin * radius);
            if let Some(dot) = circle(x, y, 1.5 * intensity) {
                let fill = Fill::Solid(cx.color(i, 0.8));
                cx.surface.fill_path(&dot, &fill);
            }
        }
    }
}
