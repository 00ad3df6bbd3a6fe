//! Frame loop state machine.
//!
//! The host calls [`AnimationDriver::tick`] on every refresh opportunity and
//! keeps doing so while the returned outcome asks to be re-armed. Nothing in
//! here blocks or fails.

use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tiny_skia::Color;
use tracing::{debug, info, trace};

use crate::spectrum::{FrequencySnapshot, SpectrumSource};
use crate::style::{StyleController, StyleSettings, VisualMode};
use crate::surface::Surface;
use crate::visualizers::{self, DrawContext, ModeState};

pub const DEFAULT_TARGET_FPS: u32 = 60;

/// Translucent black laid over the previous frame, leaving trails.
pub fn trail_fade() -> Color {
    Color::from_rgba8(0, 0, 0, 51)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No source attached.
    Idle,
    /// Source attached, playback paused or ended.
    Suspended,
    /// Playback active; frames are drawn at the target rate.
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A live frame was drawn.
    Drawn,
    /// Too early for the next frame; nothing drawn.
    Throttled,
    /// A single frozen frame was drawn while not running.
    Still,
    /// Nothing to do until the next state change.
    Parked,
}

impl FrameOutcome {
    /// Whether the host should request another tick.
    pub fn rearm(self) -> bool {
        matches!(self, FrameOutcome::Drawn | FrameOutcome::Throttled)
    }

    pub fn drew(self) -> bool {
        matches!(self, FrameOutcome::Drawn | FrameOutcome::Still)
    }
}

/// Caps draws at a target rate whatever the refresh cadence.
///
/// Deadlines sit on a fixed grid, so a tick landing slightly early still
/// counts as long as it is within `slack` of the deadline. Falling more than
/// one interval behind re-anchors the grid instead of bursting.
#[derive(Debug, Clone)]
pub struct FrameThrottle {
    interval: Duration,
    slack: Duration,
    next_due: Option<Instant>,
}

impl FrameThrottle {
    pub fn new(target_fps: u32) -> Self {
        let interval = Duration::from_secs(1) / target_fps.max(1);
        Self {
            interval,
            slack: interval / 8,
            next_due: None,
        }
    }

    pub fn ready(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now + self.slack < due => false,
            Some(due) => {
                let mut next = due + self.interval;
                if next <= now {
                    next = now + self.interval;
                }
                self.next_due = Some(next);
                true
            }
            None => {
                self.next_due = Some(now + self.interval);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.next_due = None;
    }
}

/// Canvas dimensions: logical size times the device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub logical_width: f32,
    pub logical_height: f32,
    pub pixel_ratio: f32,
}

impl CanvasSize {
    pub fn new(logical_width: f32, logical_height: f32, pixel_ratio: f32) -> Self {
        Self {
            logical_width,
            logical_height,
            pixel_ratio,
        }
    }

    pub fn pixel_width(&self) -> u32 {
        scale(self.logical_width, self.pixel_ratio)
    }

    pub fn pixel_height(&self) -> u32 {
        scale(self.logical_height, self.pixel_ratio)
    }
}

fn scale(logical: f32, ratio: f32) -> u32 {
    let pixels = (logical * ratio).round();
    if pixels.is_finite() && pixels > 0.0 {
        pixels as u32
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub drawn: u64,
    pub throttled: u64,
    pub stills: u64,
}

#[derive(Debug, Default)]
struct ModeSlot {
    state: ModeState,
    /// Canvas size the state was built for; `None` until first use.
    built_for: Option<(u32, u32)>,
}

pub struct AnimationDriver<S: Surface> {
    surface: S,
    style: StyleController,
    source: Option<Box<dyn SpectrumSource>>,
    snapshot: Option<FrequencySnapshot>,
    state: PlaybackState,
    throttle: FrameThrottle,
    slots: [ModeSlot; VisualMode::ALL.len()],
    rng: StdRng,
    still_pending: bool,
    stats: FrameStats,
}

impl<S: Surface> AnimationDriver<S> {
    pub fn new(surface: S, settings: StyleSettings, target_fps: u32) -> Self {
        Self {
            surface,
            style: StyleController::new(settings),
            source: None,
            snapshot: None,
            state: PlaybackState::Idle,
            throttle: FrameThrottle::new(target_fps),
            slots: Default::default(),
            rng: StdRng::seed_from_u64(rand::random()),
            still_pending: false,
            stats: FrameStats::default(),
        }
    }

    /// Fix the seed used to lay out particle fields.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn style(&self) -> &StyleController {
        &self.style
    }

    /// Settings changes take effect on the next drawn frame.
    pub fn style_mut(&mut self) -> &mut StyleController {
        &mut self.style
    }

    pub fn snapshot(&self) -> Option<&FrequencySnapshot> {
        self.snapshot.as_ref()
    }

    pub fn source_label(&self) -> Option<&str> {
        self.source.as_deref().map(|s| s.label())
    }

    pub fn mode_state(&self, mode: VisualMode) -> &ModeState {
        &self.slots[mode.index()].state
    }

    /// Number of modes currently holding state.
    pub fn initialized_modes(&self) -> usize {
        self.slots.iter().filter(|s| s.built_for.is_some()).count()
    }

    // --- Transitions ---

    /// Replace the current source. Playback starts suspended.
    pub fn attach(&mut self, source: Box<dyn SpectrumSource>) {
        let sample_count = source.sample_count();
        info!(source = source.label(), sample_count, "attaching spectrum source");
        self.snapshot = Some(FrequencySnapshot::new(sample_count));
        self.source = Some(source);
        self.discard_mode_states();
        self.throttle.reset();
        self.state = PlaybackState::Suspended;
        self.still_pending = true;
    }

    pub fn detach(&mut self) {
        if self.source.is_none() {
            return;
        }
        info!("detaching spectrum source");
        self.source = None;
        self.snapshot = None;
        self.discard_mode_states();
        self.state = PlaybackState::Idle;
        self.still_pending = true;
    }

    pub fn set_playing(&mut self, playing: bool) {
        match (self.state, playing) {
            (PlaybackState::Suspended, true) => {
                if let Some(source) = self.source.as_deref_mut().filter(|s| s.is_finished()) {
                    info!(source = source.label(), "rewinding finished source");
                    source.rewind();
                }
                info!("playback running");
                self.throttle.reset();
                self.state = PlaybackState::Running;
            }
            (PlaybackState::Running, false) => self.suspend(),
            (PlaybackState::Idle, true) => debug!("play ignored: no source attached"),
            _ => {}
        }
    }

    /// Host notification that the backing store is now `width` x `height` pixels.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        if (width, height) == (self.surface.width(), self.surface.height()) {
            return;
        }
        debug!(width, height, "canvas resized");
        self.surface.resize(width, height);
        // Pixel-space state from the old size is meaningless now.
        self.discard_mode_states();
        if self.state != PlaybackState::Running {
            self.still_pending = true;
        }
    }

    pub fn on_canvas_resize(&mut self, size: CanvasSize) {
        self.on_resize(size.pixel_width(), size.pixel_height());
    }

    fn suspend(&mut self) {
        info!("playback suspended");
        self.state = PlaybackState::Suspended;
        self.still_pending = true;
    }

    fn discard_mode_states(&mut self) {
        for slot in &mut self.slots {
            *slot = ModeSlot::default();
        }
    }

    // --- Frames ---

    pub fn tick(&mut self, now: Instant) -> FrameOutcome {
        match self.state {
            PlaybackState::Running => {
                if !self.throttle.ready(now) {
                    self.stats.throttled += 1;
                    trace!("frame throttled");
                    return FrameOutcome::Throttled;
                }
                self.draw_frame(true);
                self.stats.drawn += 1;
                if self.source.as_deref().is_some_and(|s| s.is_finished()) {
                    info!("end of stream");
                    self.suspend();
                    // The frame just drawn is the frozen one.
                    self.still_pending = false;
                }
                FrameOutcome::Drawn
            }
            PlaybackState::Suspended | PlaybackState::Idle if self.still_pending => {
                self.still_pending = false;
                if self.state == PlaybackState::Idle {
                    self.surface.clear();
                } else {
                    self.draw_frame(false);
                }
                self.stats.stills += 1;
                FrameOutcome::Still
            }
            PlaybackState::Suspended | PlaybackState::Idle => FrameOutcome::Parked,
        }
    }

    fn draw_frame(&mut self, live: bool) {
        if live {
            if let (Some(source), Some(snapshot)) =
                (self.source.as_deref_mut(), self.snapshot.as_mut())
            {
                snapshot.refresh(source);
            }
            self.style.advance_hue();
        }

        // Dimensions are read fresh every frame.
        let (width, height) = (self.surface.width(), self.surface.height());
        if width == 0 || height == 0 {
            return;
        }

        if live {
            self.surface.fade(trail_fade());
        } else {
            self.surface.clear();
        }

        let mode = self.style.settings().active_mode;
        let visualizer = visualizers::for_mode(mode);
        let slot = &mut self.slots[mode.index()];
        if slot.built_for != Some((width, height)) {
            debug!(mode = visualizer.name(), width, height, "initialising mode state");
            slot.state = visualizer.init_state(width as f32, height as f32, &mut self.rng);
            slot.built_for = Some((width, height));
        }

        let bins = self.snapshot.as_ref().map(|s| s.bins()).unwrap_or(&[]);
        let mut cx = DrawContext {
            surface: &mut self.surface,
            bins,
            width: width as f32,
            height: height as f32,
            style: &self.style,
        };
        if live {
            visualizer.draw(&mut cx, &mut slot.state);
        } else {
            // A still frame re-renders without advancing the mode.
            let mut frozen = slot.state.clone();
            visualizer.draw(&mut cx, &mut frozen);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::{FlatSource, SyntheticSource};
    use crate::surface::{DrawOp, RecordingSurface};
    use crate::visualizers::particles::PARTICLE_COUNT;

    fn driver(width: u32, height: u32, mode: VisualMode) -> AnimationDriver<RecordingSurface> {
        let settings = StyleSettings {
            active_mode: mode,
            ..StyleSettings::default()
        };
        AnimationDriver::new(RecordingSurface::new(width, height), settings, 60).with_seed(3)
    }

    fn running(width: u32, height: u32, mode: VisualMode) -> AnimationDriver<RecordingSurface> {
        let mut d = driver(width, height, mode);
        d.attach(Box::new(SyntheticSource::new(128)));
        d.set_playing(true);
        d
    }

    #[test]
    fn throttle_caps_240hz_ticks_at_60_draws() {
        let mut throttle = FrameThrottle::new(60);
        let start = Instant::now();
        let tick = Duration::from_secs(1) / 240;
        let draws = (0..240)
            .filter(|k| throttle.ready(start + tick * *k))
            .count();
        assert!((59..=61).contains(&draws), "{draws} draws");
    }

    #[test]
    fn throttle_recovers_after_a_stall() {
        let mut throttle = FrameThrottle::new(60);
        let start = Instant::now();
        assert!(throttle.ready(start));
        assert!(throttle.ready(start + Duration::from_secs(2)));
        // No burst of catch-up frames.
        assert!(!throttle.ready(start + Duration::from_secs(2) + Duration::from_millis(1)));
    }

    #[test]
    fn driver_draws_sixty_of_240_ticks() {
        let mut d = running(64, 64, VisualMode::Bars);
        let start = Instant::now();
        let tick = Duration::from_secs(1) / 240;
        let drawn = (0..240)
            .map(|k| d.tick(start + tick * k))
            .filter(|o| *o == FrameOutcome::Drawn)
            .count();
        assert!((59..=61).contains(&drawn));
        assert_eq!(d.stats().drawn + d.stats().throttled, 240);
    }

    #[test]
    fn state_machine_transitions() {
        let mut d = driver(32, 32, VisualMode::Bars);
        assert_eq!(d.state(), PlaybackState::Idle);
        d.set_playing(true);
        assert_eq!(d.state(), PlaybackState::Idle);

        d.attach(Box::new(FlatSource::silent(16)));
        assert_eq!(d.state(), PlaybackState::Suspended);
        d.set_playing(true);
        assert_eq!(d.state(), PlaybackState::Running);
        d.set_playing(false);
        assert_eq!(d.state(), PlaybackState::Suspended);
        d.set_playing(true);
        d.detach();
        assert_eq!(d.state(), PlaybackState::Idle);
        assert!(d.snapshot().is_none());
    }

    #[test]
    fn paused_driver_draws_one_still_then_parks() {
        let mut d = running(32, 32, VisualMode::Bars);
        let now = Instant::now();
        assert_eq!(d.tick(now), FrameOutcome::Drawn);
        d.set_playing(false);
        assert_eq!(d.tick(now), FrameOutcome::Still);
        for _ in 0..10 {
            let outcome = d.tick(now);
            assert_eq!(outcome, FrameOutcome::Parked);
            assert!(!outcome.rearm());
        }
        assert_eq!(d.stats().stills, 1);
    }

    #[test]
    fn still_frame_reuses_the_last_snapshot() {
        let mut d = running(32, 32, VisualMode::Bars);
        d.tick(Instant::now());
        let before = d.snapshot().cloned();
        d.set_playing(false);
        d.tick(Instant::now());
        assert_eq!(d.snapshot().cloned(), before);
    }

    #[test]
    fn detach_clears_once() {
        let mut d = running(32, 32, VisualMode::Bars);
        d.tick(Instant::now());
        d.detach();
        d.surface_mut().take_ops();
        assert_eq!(d.tick(Instant::now()), FrameOutcome::Still);
        assert_eq!(d.surface().ops(), &[DrawOp::Clear]);
        assert_eq!(d.tick(Instant::now()), FrameOutcome::Parked);
    }

    #[test]
    fn live_frames_fade_before_drawing() {
        let mut d = running(32, 32, VisualMode::Bars);
        d.tick(Instant::now());
        assert_eq!(d.surface().ops().first(), Some(&DrawOp::Fade(trail_fade())));
    }

    #[test]
    fn degenerate_canvas_draws_nothing() {
        let mut d = running(0, 0, VisualMode::Particles);
        let start = Instant::now();
        for k in 0..10 {
            assert_eq!(d.tick(start + Duration::from_millis(20 * k)), FrameOutcome::Drawn);
        }
        assert!(d.surface().ops().is_empty());
        assert_eq!(d.initialized_modes(), 0);
    }

    #[test]
    fn resize_rebuilds_particles_inside_the_new_canvas() {
        let mut d = running(100, 100, VisualMode::Particles);
        let start = Instant::now();
        d.tick(start);
        d.on_resize(50, 50);
        d.tick(start + Duration::from_millis(20));
        let ModeState::Particles(field) = d.mode_state(VisualMode::Particles) else {
            panic!("particle state expected");
        };
        assert_eq!(field.dimensions(), (50.0, 50.0));
        assert_eq!(field.particles().len(), PARTICLE_COUNT);
        for p in field.particles() {
            assert!((0.0..50.0).contains(&p.x) && (0.0..50.0).contains(&p.y));
        }
    }

    #[test]
    fn particle_count_is_stable_across_frames() {
        let mut d = running(200, 120, VisualMode::Particles);
        let start = Instant::now();
        for k in 0..500 {
            d.tick(start + Duration::from_millis(17 * k));
            d.surface_mut().take_ops();
        }
        let ModeState::Particles(field) = d.mode_state(VisualMode::Particles) else {
            panic!("particle state expected");
        };
        assert_eq!(field.particles().len(), PARTICLE_COUNT);
    }

    #[test]
    fn mode_switching_keeps_state_bounded() {
        let mut d = running(120, 80, VisualMode::Bars);
        let start = Instant::now();
        for k in 0..1000u32 {
            let mode = VisualMode::from_index(k as usize);
            d.style_mut().set_active_mode(mode);
            d.tick(start + Duration::from_millis(17) * k);
            d.surface_mut().take_ops();
        }
        assert!(d.initialized_modes() <= VisualMode::ALL.len());
        let ModeState::Particles(field) = d.mode_state(VisualMode::Particles) else {
            panic!("particle state expected");
        };
        assert_eq!(field.particles().len(), PARTICLE_COUNT);
    }

    #[test]
    fn switching_away_keeps_other_mode_state() {
        let mut d = running(120, 80, VisualMode::Particles);
        let start = Instant::now();
        d.tick(start);
        let before = d.mode_state(VisualMode::Particles).clone();
        d.style_mut().set_active_mode(VisualMode::Bars);
        d.tick(start + Duration::from_millis(20));
        let ModeState::Particles(kept) = d.mode_state(VisualMode::Particles) else {
            panic!("particle state expected");
        };
        let ModeState::Particles(before) = before else {
            unreachable!();
        };
        assert_eq!(kept, &before);
    }

    #[test]
    fn attach_discards_stale_state_and_resizes_snapshot() {
        let mut d = running(64, 64, VisualMode::Rings);
        d.tick(Instant::now());
        assert_eq!(d.initialized_modes(), 1);
        d.attach(Box::new(FlatSource::new(32, 9)));
        assert_eq!(d.initialized_modes(), 0);
        assert_eq!(d.snapshot().map(|s| s.len()), Some(32));
        assert_eq!(d.state(), PlaybackState::Suspended);
    }

    #[test]
    fn end_of_stream_suspends() {
        let mut d = driver(32, 32, VisualMode::Wave);
        d.attach(Box::new(SyntheticSource::new(16).with_length(3, false)));
        d.set_playing(true);
        let start = Instant::now();
        for k in 0..3u32 {
            assert_eq!(d.tick(start + Duration::from_millis(20) * k), FrameOutcome::Drawn);
        }
        assert_eq!(d.state(), PlaybackState::Suspended);
        assert_eq!(d.tick(start + Duration::from_secs(1)), FrameOutcome::Parked);
    }

    #[test]
    fn playing_a_finished_track_starts_it_over() {
        let mut d = driver(32, 32, VisualMode::Bars);
        d.attach(Box::new(SyntheticSource::new(64).with_length(3, false)));
        d.set_playing(true);
        let start = Instant::now();
        for k in 0..3u32 {
            d.tick(start + Duration::from_millis(20) * k);
        }
        assert_eq!(d.state(), PlaybackState::Suspended);

        d.set_playing(true);
        assert_eq!(d.tick(start + Duration::from_secs(1)), FrameOutcome::Drawn);
        assert_eq!(d.state(), PlaybackState::Running);
        let loudest = d.snapshot().and_then(|s| s.bins().iter().copied().max());
        assert!(loudest.is_some_and(|b| b > 0));
    }

    #[test]
    fn still_frames_leave_mode_state_alone() {
        for mode in [VisualMode::Particles, VisualMode::Flow, VisualMode::Rings] {
            let mut d = running(120, 80, mode);
            d.tick(Instant::now());
            d.set_playing(false);
            let before = d.mode_state(mode).clone();
            assert_eq!(d.tick(Instant::now()), FrameOutcome::Still);
            assert_eq!(d.mode_state(mode), &before, "{mode:?}");
        }
    }

    #[test]
    fn hue_advances_once_per_live_frame() {
        let mut d = running(16, 16, VisualMode::Circle);
        let start = Instant::now();
        for k in 0..5u32 {
            d.tick(start + Duration::from_millis(20) * k);
        }
        assert!((d.style().hue() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn canvas_size_applies_the_pixel_ratio() {
        let size = CanvasSize::new(320.0, 100.5, 2.0);
        assert_eq!((size.pixel_width(), size.pixel_height()), (640, 201));
        assert_eq!(CanvasSize::new(-3.0, f32::NAN, 1.0).pixel_width(), 0);
        let mut d = driver(1, 1, VisualMode::Bars);
        d.on_canvas_resize(size);
        assert_eq!((d.surface().width(), d.surface().height()), (640, 201));
    }
}
