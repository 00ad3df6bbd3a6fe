use super::{DrawContext, ModeState, Visualizer, glow, polyline, with_alpha};

/// Peak deflection from the centre line, as a fraction of canvas height.
const AMPLITUDE: f32 = 0.4;

pub struct WaveVisualizer;

impl Visualizer for WaveVisualizer {
    fn name(&self) -> &str {
        "Mirrored Wave"
    }

    fn draw(&self, cx: &mut DrawContext<'_>, _state: &mut ModeState) {
        if cx.is_degenerate() {
            return;
        }

        let n = cx.bins.len();
        let intensity = cx.intensity();
        let sensitivity = cx.settings().sensitivity;
        let mid_y = cx.height / 2.0;
        let amplitude = cx.height * AMPLITUDE * intensity;
        let step = cx.width / (n.max(2) - 1) as f32;

        let mut line = Vec::with_capacity(n);
        let mut reflection = Vec::with_capacity(n);
        for (i, &bin) in cx.bins.iter().enumerate() {
            let offset = (bin as f32 - 128.0) / 128.0 * sensitivity * amplitude;
            let x = i as f32 * step;
            line.push((x, mid_y - offset));
            reflection.push((x, mid_y + offset));
        }

        let color = cx.color(n / 2, 0.9);
        let stroke_width = 2.0 * intensity;

        if let Some(path) = polyline(&reflection, false) {
            cx.surface
                .stroke_path(&path, stroke_width, with_alpha(color, color.alpha() * 0.5));
        }
        if let Some(path) = polyline(&line, false) {
            glow(cx.surface, &path, stroke_width, color);
            cx.surface.stroke_path(&path, stroke_width, color);
        }
    }
}
