use rand::rngs::StdRng;
use tiny_skia::{Color, Path, PathBuilder};

use crate::style::{StyleController, StyleSettings, VisualMode, rgba};
use crate::surface::Surface;

pub mod bars;
pub mod circle;
pub mod flow;
pub mod particles;
pub mod pulse;
pub mod rings;
pub mod spectrum;
pub mod wave;

pub use particles::{Particle, ParticleField};

/// Per-mode animated data kept by the driver between frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ModeState {
    #[default]
    Stateless,
    Particles(ParticleField),
    /// Rotation accumulator in radians.
    Phase(f32),
}

/// Everything one frame of one mode may read, plus the surface it draws on.
pub struct DrawContext<'a> {
    pub surface: &'a mut dyn Surface,
    pub bins: &'a [u8],
    pub width: f32,
    pub height: f32,
    pub style: &'a StyleController,
}

impl DrawContext<'_> {
    pub fn settings(&self) -> &StyleSettings {
        self.style.settings()
    }

    pub fn intensity(&self) -> f32 {
        self.style.settings().intensity
    }

    /// Bin magnitude on a 0..=1 scale, times sensitivity.
    pub fn level(&self, index: usize) -> f32 {
        self.bins.get(index).copied().unwrap_or(0) as f32 / 255.0
            * self.style.settings().sensitivity
    }

    pub fn color(&self, index: usize, alpha: f32) -> Color {
        self.style.color_for(index, alpha)
    }

    pub fn min_side(&self) -> f32 {
        self.width.min(self.height)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }

    /// True when there is nothing sensible to draw.
    pub fn is_degenerate(&self) -> bool {
        self.bins.is_empty() || !(self.width >= 1.0 && self.height >= 1.0)
    }
}

pub trait Visualizer: Send + Sync {
    fn name(&self) -> &str;

    /// Fresh state for a canvas of the given size.
    fn init_state(&self, _width: f32, _height: f32, _rng: &mut StdRng) -> ModeState {
        ModeState::Stateless
    }

    fn draw(&self, cx: &mut DrawContext<'_>, state: &mut ModeState);
}

static BARS: bars::BarVisualizer = bars::BarVisualizer;
static WAVE: wave::WaveVisualizer = wave::WaveVisualizer;
static CIRCLE: circle::CircleVisualizer = circle::CircleVisualizer;
static PARTICLES: particles::ParticleVisualizer = particles::ParticleVisualizer;
static SPECTRUM: spectrum::SpectrumVisualizer = spectrum::SpectrumVisualizer;
static FLOW: flow::FlowVisualizer = flow::FlowVisualizer;
static PULSE: pulse::PulseVisualizer = pulse::PulseVisualizer;
static RINGS: rings::RingsVisualizer = rings::RingsVisualizer;

pub fn for_mode(mode: VisualMode) -> &'static dyn Visualizer {
    match mode {
        VisualMode::Bars => &BARS,
        VisualMode::Wave => &WAVE,
        VisualMode::Circle => &CIRCLE,
        VisualMode::Particles => &PARTICLES,
        VisualMode::Spectrum => &SPECTRUM,
        VisualMode::Flow => &FLOW,
        VisualMode::Pulse => &PULSE,
        VisualMode::Rings => &RINGS,
    }
}

// --- Path helpers ---

pub(crate) fn polyline(points: &[(f32, f32)], closed: bool) -> Option<Path> {
    if points.len() < 2 {
        return None;
    }
    let (&(x0, y0), rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(x0, y0);
    for &(x, y) in rest {
        pb.line_to(x, y);
    }
    if closed {
        pb.close();
    }
    pb.finish()
}

pub(crate) fn segment(x1: f32, y1: f32, x2: f32, y2: f32) -> Option<Path> {
    polyline(&[(x1, y1), (x2, y2)], false)
}

pub(crate) fn circle(cx: f32, cy: f32, radius: f32) -> Option<Path> {
    PathBuilder::from_circle(cx, cy, radius)
}

pub(crate) fn with_alpha(color: Color, alpha: f32) -> Color {
    rgba(color.red(), color.green(), color.blue(), alpha)
}

/// Soft halo: two wide translucent strokes under the real one.
pub(crate) fn glow(surface: &mut dyn Surface, path: &Path, width: f32, color: Color) {
    let a = color.alpha();
    surface.stroke_path(path, width * 3.0, with_alpha(color, a * 0.12));
    surface.stroke_path(path, width * 1.8, with_alpha(color, a * 0.25));
}

#[cfg(test)]
pub(crate) mod test_support {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::surface::{DrawOp, RecordingSurface};

    pub fn style(mode: VisualMode) -> StyleController {
        StyleController::new(StyleSettings {
            active_mode: mode,
            ..StyleSettings::default()
        })
    }

    /// Draws `frames` frames of `mode` onto a fresh recording surface.
    pub fn record(
        mode: VisualMode,
        style: &StyleController,
        bins: &[u8],
        width: u32,
        height: u32,
        frames: usize,
    ) -> (Vec<DrawOp>, ModeState) {
        let visualizer = for_mode(mode);
        let mut rng = StdRng::seed_from_u64(7);
        let mut state = visualizer.init_state(width as f32, height as f32, &mut rng);
        let mut surface = RecordingSurface::new(width, height);
        for _ in 0..frames {
            let mut cx = DrawContext {
                surface: &mut surface,
                bins,
                width: width as f32,
                height: height as f32,
                style,
            };
            visualizer.draw(&mut cx, &mut state);
        }
        (surface.take_ops(), state)
    }
}
