use clap::ValueEnum;
use tiny_skia::Color;

/// Degrees the shared hue counter advances per drawn frame.
pub const HUE_STEP: f32 = 1.0;

// Cyan, magenta, lime, yellow.
const NEON_ACCENTS: [u32; 4] = [0x00ffff, 0xff00ff, 0x39ff14, 0xffff00];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorTheme {
    Monochrome,
    #[default]
    Rainbow,
    Neon,
    Pastel,
}

impl ColorTheme {
    pub const ALL: [ColorTheme; 4] = [
        ColorTheme::Monochrome,
        ColorTheme::Rainbow,
        ColorTheme::Neon,
        ColorTheme::Pastel,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ColorTheme::Monochrome => "Monochrome",
            ColorTheme::Rainbow => "Rainbow",
            ColorTheme::Neon => "Neon",
            ColorTheme::Pastel => "Pastel",
        }
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum VisualMode {
    #[default]
    Bars,
    Wave,
    Circle,
    Particles,
    Spectrum,
    Flow,
    Pulse,
    Rings,
}

impl VisualMode {
    pub const ALL: [VisualMode; 8] = [
        VisualMode::Bars,
        VisualMode::Wave,
        VisualMode::Circle,
        VisualMode::Particles,
        VisualMode::Spectrum,
        VisualMode::Flow,
        VisualMode::Pulse,
        VisualMode::Rings,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Mode at `index`, wrapping past the end of the list.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn prev(self) -> Self {
        Self::from_index(self.index() + Self::ALL.len() - 1)
    }
}

/// Live-adjustable settings read by the driver and every visualizer.
///
/// Fields are independent of each other. Sensitivity and intensity are not
/// range-checked here; the host decides what range it offers.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSettings {
    pub sensitivity: f32,
    pub intensity: f32,
    pub color_theme: ColorTheme,
    pub active_mode: VisualMode,
    pub controls_visible: bool,
    pub fullscreen: bool,
}

impl Default for StyleSettings {
    fn default() -> Self {
        Self {
            sensitivity: 1.0,
            intensity: 1.0,
            color_theme: ColorTheme::default(),
            active_mode: VisualMode::default(),
            controls_visible: true,
            fullscreen: false,
        }
    }
}

/// Owns the settings and the rotating hue counter shared by all modes.
#[derive(Debug, Clone, Default)]
pub struct StyleController {
    settings: StyleSettings,
    hue: f32,
}

impl StyleController {
    pub fn new(settings: StyleSettings) -> Self {
        Self { settings, hue: 0.0 }
    }

    pub fn settings(&self) -> &StyleSettings {
        &self.settings
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.settings.sensitivity = sensitivity;
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.settings.intensity = intensity;
    }

    pub fn set_color_theme(&mut self, theme: ColorTheme) {
        self.settings.color_theme = theme;
    }

    pub fn set_active_mode(&mut self, mode: VisualMode) {
        self.settings.active_mode = mode;
    }

    pub fn set_controls_visible(&mut self, visible: bool) {
        self.settings.controls_visible = visible;
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        self.settings.fullscreen = fullscreen;
    }

    pub fn hue(&self) -> f32 {
        self.hue
    }

    pub fn set_hue(&mut self, hue: f32) {
        self.hue = hue.rem_euclid(360.0);
    }

    /// Called once per drawn frame, whichever mode is active.
    pub fn advance_hue(&mut self) {
        self.hue = (self.hue + HUE_STEP) % 360.0;
    }

    /// Themed color for bin `index` at the given alpha.
    pub fn color_for(&self, index: usize, alpha: f32) -> Color {
        match self.settings.color_theme {
            ColorTheme::Monochrome => rgba(1.0, 1.0, 1.0, alpha),
            ColorTheme::Rainbow => {
                let hue = (self.hue + (index % 36) as f32 * 10.0) % 360.0;
                hsl(hue, 1.0, 0.5, alpha)
            }
            ColorTheme::Neon => {
                let hex = NEON_ACCENTS[index % NEON_ACCENTS.len()];
                // The accent's alpha is a two-digit hex suffix, so it is
                // quantized to a byte.
                let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
                Color::from_rgba8((hex >> 16) as u8, (hex >> 8) as u8, hex as u8, a)
            }
            ColorTheme::Pastel => {
                let hue = (self.hue + (index % 12) as f32 * 30.0) % 360.0;
                hsl(hue, 0.7, 0.8, alpha)
            }
        }
    }
}

/// Clamping color constructor; non-finite input yields transparent.
pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Color {
    Color::from_rgba(
        r.clamp(0.0, 1.0),
        g.clamp(0.0, 1.0),
        b.clamp(0.0, 1.0),
        a.clamp(0.0, 1.0),
    )
    .unwrap_or(Color::TRANSPARENT)
}

/// HSL to RGB. `hue` in degrees, saturation and lightness in 0..=1.
pub fn hsl(hue: f32, saturation: f32, lightness: f32, alpha: f32) -> Color {
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = lightness - c / 2.0;
    rgba(r + m, g + m, b + m, alpha)
}
