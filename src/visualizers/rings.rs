use super::{DrawContext, ModeState, Visualizer, circle, glow, polyline};
use crate::surface::Fill;
use rand::rngs::StdRng;
use std::f32::consts::TAU;

pub const RING_COUNT: usize = 5;
const SPIN: f32 = 0.01;

pub struct RingsVisualizer;

impl Visualizer for RingsVisualizer {
    fn name(&self) -> &str {
        "Frequency Rings"
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

        let intensity = cx.intensity();
        let (center_x, center_y) = cx.center();
        let side = cx.min_side();
        // Trailing bins that do not fill a whole group are left out.
        let group = cx.bins.len() / RING_COUNT;

        if group > 0 {
            let mut vertices = Vec::with_capacity(group);
            for ring in 0..RING_COUNT {
                let base_radius = side * (0.1 + 0.075 * ring as f32) * intensity;
                let direction = if ring % 2 == 0 { 1.0 } else { -1.0 };
                let spin = *rotation * direction * (1.0 + ring as f32 * 0.2);

                vertices.clear();
                for j in 0..group {
                    let bin = ring * group + j;
                    let angle = j as f32 / group as f32 * TAU + spin;
                    let radius = base_radius + cx.level(bin) * side * 0.06 * intensity;
                    let (sin, cos) = angle.sin_cos();
                    vertices.push((center_x + cos * radius, center_y + sin * radius));
                }

                if let Some(outline) = polyline(&vertices, true) {
                    let color = cx.color(ring * group, 0.8 - ring as f32 * 0.1);
                    cx.surface.stroke_path(&outline, 1.5 * intensity, color);
                }
            }
        }

        let orb_radius = side * 0.05 * intensity * (1.0 + cx.level(0));
        if let Some(orb) = circle(center_x, center_y, orb_radius) {
            let color = cx.color(0, 0.9);
            glow(cx.surface, &orb, orb_radius * 0.5, color);
            cx.surface.fill_path(&orb, &Fill::Solid(color));
        }

        *rotation = (*rotation + SPIN).rem_euclid(TAU);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::VisualMode;
    use crate::surface::DrawOp;
    use crate::visualizers::test_support::{record, style};

    #[test]
    fn five_rings_of_equal_size() {
        let style = style(VisualMode::Rings);
        let (ops, _) = record(VisualMode::Rings, &style, &[100; 52], 300, 300, 1);
        let rings: Vec<usize> = ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::StrokePath { points, width, .. } if (*width - 1.5).abs() < 1e-6 => {
                    Some(points.len())
                }
                _ => None,
            })
            .collect();
        // 52 bins make groups of 10; a closed path repeats no point.
        assert_eq!(rings, vec![10; RING_COUNT]);
    }

    #[test]
    fn orb_pulses_with_the_first_bin() {
        let orb = |first: u8| {
            let mut bins = [0u8; 20];
            bins[0] = first;
            let style = style(VisualMode::Rings);
            let (ops, _) = record(VisualMode::Rings, &style, &bins, 200, 200, 1);
            match ops.last() {
                Some(DrawOp::FillPath { bounds, .. }) => bounds.width(),
                other => panic!("unexpected {other:?}"),
            }
        };
        assert!((orb(0) - 20.0).abs() < 0.5);
        assert!((orb(255) - 40.0).abs() < 0.5);
    }

    fn ring_strokes(ops: &[DrawOp]) -> usize {
        ops.iter()
            .filter(|op| {
                matches!(op, DrawOp::StrokePath { width, .. } if (*width - 1.5).abs() < 1e-6)
            })
            .count()
    }

    #[test]
    fn tiny_snapshots_only_draw_the_orb() {
        let style = style(VisualMode::Rings);
        let (ops, state) = record(VisualMode::Rings, &style, &[10; 3], 100, 100, 2);
        assert_eq!(ring_strokes(&ops), 0);
        assert!(matches!(state, ModeState::Phase(p) if (p - 2.0 * SPIN).abs() < 1e-6));
    }

    #[test]
    fn single_vertex_groups_draw_no_ring() {
        // 7 bins make groups of one; a one-point outline is not a ring.
        let style = style(VisualMode::Rings);
        let (ops, _) = record(VisualMode::Rings, &style, &[200; 7], 100, 100, 1);
        assert_eq!(ring_strokes(&ops), 0);
        assert!(matches!(ops.last(), Some(DrawOp::FillPath { .. })));
    }
}
