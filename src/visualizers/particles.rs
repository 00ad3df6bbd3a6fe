use super::{DrawContext, ModeState, Visualizer, circle};
use crate::surface::Fill;
use rand::prelude::*;
use tiny_skia::PathBuilder;

pub const PARTICLE_COUNT: usize = 100;
/// Particles closer than this (in pixels) are linked by a line.
pub const LINK_DISTANCE: f32 = 100.0;
/// Links are batched into this many opacity bands, one stroke per band.
pub const LINK_BANDS: usize = 6;
/// Speed at silence, in pixels per frame.
const CRUISE_SPEED: f32 = 0.5;
/// Extra speed at full level.
const BOOST: f32 = 4.0;
const MAX_SPEED: f32 = 6.0;
/// Share of the previous speed kept each frame.
const DAMPING: f32 = 0.85;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub velocity_x: f32,
    pub velocity_y: f32,
    /// Palette slot, resolved through the active theme at draw time.
    pub base_color: usize,
    pub alpha: f32,
}

/// Fixed-size particle population laid out for one canvas size.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleField {
    particles: Vec<Particle>,
    width: f32,
    height: f32,
}

impl ParticleField {
    pub fn new(width: f32, height: f32, rng: &mut StdRng) -> Self {
        let particles = (0..PARTICLE_COUNT)
            .map(|i| Particle {
                x: random_below(rng, width),
                y: random_below(rng, height),
                size: rng.random_range(1.0..3.0),
                velocity_x: rng.random_range(-1.0..1.0),
                velocity_y: rng.random_range(-1.0..1.0),
                base_color: i,
                alpha: 0.5,
            })
            .collect();

        Self {
            particles,
            width,
            height,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn dimensions(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// Advance one frame. Particle `i` listens to bin `i mod N`.
    pub fn update(&mut self, bins: &[u8], sensitivity: f32) {
        for (i, p) in self.particles.iter_mut().enumerate() {
            let level = match bins.len() {
                0 => 0.0,
                n => bins[i % n] as f32 / 255.0 * sensitivity,
            };
            let speed = p.velocity_x.hypot(p.velocity_y);
            let (dir_x, dir_y) = if speed > 1e-6 {
                (p.velocity_x / speed, p.velocity_y / speed)
            } else {
                (1.0, 0.0)
            };
            let target = CRUISE_SPEED + level * BOOST;
            let speed = (speed * DAMPING + target * (1.0 - DAMPING)).clamp(0.0, MAX_SPEED);
            p.velocity_x = dir_x * speed;
            p.velocity_y = dir_y * speed;
            p.x = wrap(p.x + p.velocity_x, self.width);
            p.y = wrap(p.y + p.velocity_y, self.height);
            p.alpha = (0.25 + level * 0.75).clamp(0.0, 1.0);
        }
    }
}

fn random_below(rng: &mut StdRng, limit: f32) -> f32 {
    if limit > 0.0 {
        rng.random_range(0.0..limit)
    } else {
        0.0
    }
}

/// Wrap `value` into `[0, limit)`.
fn wrap(value: f32, limit: f32) -> f32 {
    if !(limit > 0.0) {
        return 0.0;
    }
    let wrapped = value.rem_euclid(limit);
    if wrapped.is_finite() && wrapped < limit {
        wrapped
    } else {
        0.0
    }
}

pub struct ParticleVisualizer;

impl Visualizer for ParticleVisualizer {
    fn name(&self) -> &str {
        "Particle Field"
    }

    fn init_state(&self, width: f32, height: f32, rng: &mut StdRng) -> ModeState {
        ModeState::Particles(ParticleField::new(width, height, rng))
    }

    fn draw(&self, cx: &mut DrawContext<'_>, state: &mut ModeState) {
        if cx.is_degenerate() {
            return;
        }
        let ModeState::Particles(field) = state else {
            return;
        };

        let sensitivity = cx.settings().sensitivity;
        let intensity = cx.intensity();
        field.update(cx.bins, sensitivity);

        // Quadratic in the particle count, which stays at PARTICLE_COUNT.
        let particles = field.particles();
        let mut bands: Vec<PathBuilder> = (0..LINK_BANDS).map(|_| PathBuilder::new()).collect();
        for (i, a) in particles.iter().enumerate() {
            for b in &particles[i + 1..] {
                let distance = (a.x - b.x).hypot(a.y - b.y);
                if !(distance < LINK_DISTANCE) {
                    continue;
                }
                let closeness = 1.0 - distance / LINK_DISTANCE;
                let band = ((closeness * LINK_BANDS as f32) as usize).min(LINK_BANDS - 1);
                bands[band].move_to(a.x, a.y);
                bands[band].line_to(b.x, b.y);
            }
        }
        for (band, pb) in bands.into_iter().enumerate() {
            let Some(links) = pb.finish() else {
                continue;
            };
            // Opacity of the band's midpoint distance.
            let alpha = (band as f32 + 0.5) / LINK_BANDS as f32 * 0.5 * intensity;
            let color = cx.color(band, alpha);
            cx.surface.stroke_path(&links, 1.0, color);
        }

        for (i, p) in particles.iter().enumerate() {
            let radius = p.size * (1.0 + cx.level(i % cx.bins.len())) * intensity;
            if let Some(dot) = circle(p.x, p.y, radius) {
                let fill = Fill::Solid(cx.color(p.base_color, p.alpha));
                cx.surface.fill_path(&dot, &fill);
            }
        }
    }
}
