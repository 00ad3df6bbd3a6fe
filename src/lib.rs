//! Real-time spectrum visualization engine.
//!
//! A [`driver::AnimationDriver`] pulls byte magnitudes from a
//! [`spectrum::SpectrumSource`] once per frame and hands them to the active
//! [`visualizers::Visualizer`], which draws onto a [`surface::Surface`].

pub mod capture;
pub mod config;
pub mod controls;
pub mod driver;
pub mod logging;
pub mod spectrum;
pub mod style;
pub mod surface;
pub mod ui;
pub mod visualizers;

pub use driver::{AnimationDriver, CanvasSize, FrameOutcome, PlaybackState};
pub use spectrum::{FrequencySnapshot, SpectrumSource};
pub use style::{ColorTheme, StyleController, StyleSettings, VisualMode};
pub use surface::{PixmapSurface, RecordingSurface, Surface};
