use super::{DrawContext, ModeState, Visualizer, circle, segment};
use crate::surface::Fill;
use std::f32::consts::{FRAC_PI_2, TAU};

pub struct CircleVisualizer;

impl Visualizer for CircleVisualizer {
    fn name(&self) -> &str {
        "Radial Circle"
    }

    fn draw(&self, cx: &mut DrawContext<'_>, _state: &mut ModeState) {
        if cx.is_degenerate() {
            return;
        }

        let n = cx.bins.len();
        let intensity = cx.intensity();
        let (center_x, center_y) = cx.center();
        let side = cx.min_side();
        let inner_radius = side * 0.15 * intensity;
        let reach = side * 0.3 * intensity;

        if let Some(ring) = circle(center_x, center_y, side * 0.45 * intensity) {
            let color = cx.color(0, 0.25);
            cx.surface.stroke_path(&ring, intensity, color);
        }
        if let Some(disk) = circle(center_x, center_y, inner_radius * 0.9) {
            let fill = Fill::Solid(cx.color(0, 0.2 * intensity));
            cx.surface.fill_path(&disk, &fill);
        }

        for i in 0..n {
            let length = cx.level(i) * reach;
            if !(length > 0.0) {
                continue;
            }
            let angle = i as f32 / n as f32 * TAU - FRAC_PI_2;
            let (sin, cos) = angle.sin_cos();
            let Some(spoke) = segment(
                center_x + cos * inner_radius,
                center_y + sin * inner_radius,
                center_x + cos * (inner_radius + length),
                center_y + sin * (inner_radius + length),
            ) else {
                continue;
            };
            let color = cx.color(i, 0.9);
            cx.surface.stroke_path(&spoke, 2.0 * intensity, color);
        }
    }
}
