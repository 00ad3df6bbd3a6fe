use super::{DrawContext, ModeState, Visualizer};
use crate::surface::Fill;
use tiny_skia::PathBuilder;

pub struct SpectrumVisualizer;

/// Append a Catmull-Rom spline through `points` as cubic Bezier segments.
/// The first point is assumed to be the current pen position.
fn smooth_through(pb: &mut PathBuilder, points: &[(f32, f32)]) {
    let last = points.len() - 1;
    for i in 0..last {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(last)];
        pb.cubic_to(
            p1.0 + (p2.0 - p0.0) / 6.0,
            p1.1 + (p2.1 - p0.1) / 6.0,
            p2.0 - (p3.0 - p1.0) / 6.0,
            p2.1 - (p3.1 - p1.1) / 6.0,
            p2.0,
            p2.1,
        );
    }
}

impl Visualizer for SpectrumVisualizer {
    fn name(&self) -> &str {
        "Spectrum Curve"
    }

    fn draw(&self, cx: &mut DrawContext<'_>, _state: &mut ModeState) {
        if cx.is_degenerate() {
            return;
        }

        let n = cx.bins.len();
        let intensity = cx.intensity();
        let mid_y = cx.height / 2.0;
        let scale = mid_y * 0.9 * intensity;

        // A single bin still spans the full width.
        let heights: Vec<f32> = if n == 1 {
            vec![cx.level(0) * scale; 2]
        } else {
            (0..n).map(|i| cx.level(i) * scale).collect()
        };
        let step = cx.width / (heights.len() - 1) as f32;

        let upper: Vec<(f32, f32)> = heights
            .iter()
            .enumerate()
            .map(|(i, h)| (i as f32 * step, mid_y - h))
            .collect();
        let lower: Vec<(f32, f32)> = heights
            .iter()
            .enumerate()
            .rev()
            .map(|(i, h)| (i as f32 * step, mid_y + h))
            .collect();

        let mut pb = PathBuilder::new();
        pb.move_to(upper[0].0, upper[0].1);
        smooth_through(&mut pb, &upper);
        pb.line_to(lower[0].0, lower[0].1);
        smooth_through(&mut pb, &lower);
        pb.close();
        let Some(path) = pb.finish() else {
            return;
        };

        let fill = Fill::Solid(cx.color(0, 0.35 * intensity));
        cx.surface.fill_path(&path, &fill);
        let edge = cx.color(n / 2, 0.9);
        cx.surface.stroke_path(&path, 1.5 * intensity, edge);
    }
}
