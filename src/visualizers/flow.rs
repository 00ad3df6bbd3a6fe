use super::{DrawContext, ModeState, Visualizer, circle, polyline};
use crate::style::rgba;
use crate::surface::Fill;
use rand::rngs::StdRng;
use std::f32::consts::TAU;
use tiny_skia::{PathBuilder, Point, Rect};

/// Rotation per frame at silence, in radians.
const BASE_DRIFT: f32 = 0.002;
/// Extra rotation per frame at full average level.
const ENERGY_DRIFT: f32 = 0.02;

pub struct FlowVisualizer;

impl Visualizer for FlowVisualizer {
    fn name(&self) -> &str {
        "Polar Flow"
    }

    fn init_state(&self, _width: f32, _height: f32, _rng: &mut StdRng) -> ModeState {
        ModeState::Phase(0.0)
    }

    fn draw(&self, cx: &mut DrawContext<'_>, state: &mut ModeState) {
        if cx.is_degenerate() {
            return;
        }
        let ModeState::Phase(rotation) = state else {
            return;
        };

        let n = cx.bins.len();
        let intensity = cx.intensity();
        let (center_x, center_y) = cx.center();
        let side = cx.min_side();

        if let Some(rect) = Rect::from_xywh(0.0, 0.0, cx.width, cx.height) {
            let background = Fill::Radial {
                center: Point::from_xy(center_x, center_y),
                radius: cx.width.max(cx.height) * 0.6,
                inner: cx.color(0, 0.15 * intensity),
                outer: rgba(0.0, 0.0, 0.0, 0.0),
            };
            cx.surface.fill_path(&PathBuilder::from_rect(rect), &background);
        }

        let base_radius = side * 0.15 * intensity;
        let reach = side * 0.3 * intensity;
        let mut total = 0.0;
        let positions: Vec<(f32, f32)> = (0..n)
            .map(|i| {
                let level = cx.level(i);
                total += level;
                let angle = i as f32 / n as f32 * TAU + *rotation;
                let radius = base_radius + level * reach;
                (center_x + angle.cos() * radius, center_y + angle.sin() * radius)
            })
            .collect();

        if let Some(web) = polyline(&positions, true) {
            let color = cx.color(0, 0.5);
            cx.surface.stroke_path(&web, intensity, color);
        }
        for (i, &(x, y)) in positions.iter().enumerate() {
            let radius = (2.0 + cx.level(i) * 3.0) * intensity;
            if let Some(dot) = circle(x, y, radius) {
                let fill = Fill::Solid(cx.color(i, 0.85));
                cx.surface.fill_path(&dot, &fill);
            }
        }

        let average = total / n as f32;
        *rotation = (*rotation + BASE_DRIFT + average * ENERGY_DRIFT).rem_euclid(TAU);
    }
}
