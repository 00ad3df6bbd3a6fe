//! Key bindings.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::style::{StyleController, VisualMode};

/// Step for the sensitivity and intensity keys.
pub const SETTING_STEP: f32 = 0.1;
pub const SETTING_MIN: f32 = 0.1;
pub const SETTING_MAX: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Quit,
    TogglePlayback,
    NextMode,
    PrevMode,
    SelectMode(VisualMode),
    NextTheme,
    AdjustSensitivity(f32),
    AdjustIntensity(f32),
    ToggleFullscreen,
    ToggleControls,
    /// Switch between live capture and the sample track.
    SwapSource,
    /// Detach the source, or re-attach it when detached.
    ToggleAttached,
}

pub fn action_for(key: &KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let action = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char(' ') => Action::TogglePlayback,
        KeyCode::Char('n') | KeyCode::Tab => Action::NextMode,
        KeyCode::Char('p') | KeyCode::BackTab => Action::PrevMode,
        KeyCode::Char(c @ '1'..='8') => Action::SelectMode(VisualMode::from_index(
            c as usize - '1' as usize,
        )),
        KeyCode::Char('t') => Action::NextTheme,
        KeyCode::Char('+') | KeyCode::Char('=') => Action::AdjustSensitivity(SETTING_STEP),
        KeyCode::Char('-') => Action::AdjustSensitivity(-SETTING_STEP),
        KeyCode::Char(']') => Action::AdjustIntensity(SETTING_STEP),
        KeyCode::Char('[') => Action::AdjustIntensity(-SETTING_STEP),
        KeyCode::Char('f') => Action::ToggleFullscreen,
        KeyCode::Char('h') => Action::ToggleControls,
        KeyCode::Char('s') => Action::SwapSource,
        KeyCode::Char('d') => Action::ToggleAttached,
        _ => return None,
    };
    Some(action)
}

/// Apply an action that only touches style settings.
///
/// Returns `false` for actions the host has to handle itself.
pub fn apply_style(action: Action, style: &mut StyleController) -> bool {
    let settings = style.settings().clone();
    match action {
        Action::NextMode => style.set_active_mode(settings.active_mode.next()),
        Action::PrevMode => style.set_active_mode(settings.active_mode.prev()),
        Action::SelectMode(mode) => style.set_active_mode(mode),
        Action::NextTheme => style.set_color_theme(settings.color_theme.next()),
        Action::AdjustSensitivity(delta) => {
            style.set_sensitivity(step(settings.sensitivity, delta))
        }
        Action::AdjustIntensity(delta) => style.set_intensity(step(settings.intensity, delta)),
        Action::ToggleFullscreen => style.set_fullscreen(!settings.fullscreen),
        Action::ToggleControls => style.set_controls_visible(!settings.controls_visible),
        Action::Quit | Action::TogglePlayback | Action::SwapSource | Action::ToggleAttached => {
            return false;
        }
    }
    true
}

// Rounded to one decimal so repeated steps do not drift.
fn step(value: f32, delta: f32) -> f32 {
    ((value + delta) * 10.0).round().clamp(SETTING_MIN * 10.0, SETTING_MAX * 10.0) / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{ColorTheme, StyleSettings};
    use crossterm::event::KeyModifiers;

    fn press(code: KeyCode) -> Option<Action> {
        action_for(&KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn number_keys_select_modes() {
        assert_eq!(press(KeyCode::Char('1')), Some(Action::SelectMode(VisualMode::Bars)));
        assert_eq!(press(KeyCode::Char('8')), Some(Action::SelectMode(VisualMode::Rings)));
        assert_eq!(press(KeyCode::Char('9')), None);
    }

    #[test]
    fn releases_are_ignored() {
        let mut key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        assert_eq!(action_for(&key), None);
    }

    #[test]
    fn mode_keys_wrap_around() {
        let mut style = StyleController::new(StyleSettings::default());
        assert!(apply_style(Action::PrevMode, &mut style));
        assert_eq!(style.settings().active_mode, VisualMode::Rings);
        assert!(apply_style(Action::NextMode, &mut style));
        assert_eq!(style.settings().active_mode, VisualMode::Bars);
    }

    #[test]
    fn settings_are_clamped_to_the_offered_range() {
        let mut style = StyleController::new(StyleSettings::default());
        for _ in 0..30 {
            apply_style(Action::AdjustIntensity(SETTING_STEP), &mut style);
            apply_style(Action::AdjustSensitivity(-SETTING_STEP), &mut style);
        }
        assert_eq!(style.settings().intensity, 2.0);
        assert_eq!(style.settings().sensitivity, 0.1);
    }

    #[test]
    fn steps_do_not_accumulate_error() {
        let mut style = StyleController::new(StyleSettings::default());
        for _ in 0..3 {
            apply_style(Action::AdjustSensitivity(SETTING_STEP), &mut style);
        }
        assert_eq!(style.settings().sensitivity, 1.3);
    }

    #[test]
    fn toggles_and_theme() {
        let mut style = StyleController::new(StyleSettings::default());
        apply_style(Action::ToggleFullscreen, &mut style);
        apply_style(Action::ToggleControls, &mut style);
        apply_style(Action::NextTheme, &mut style);
        let settings = style.settings();
        assert!(settings.fullscreen);
        assert!(!settings.controls_visible);
        assert_eq!(settings.color_theme, ColorTheme::Neon);
    }

    #[test]
    fn host_actions_are_left_alone() {
        let mut style = StyleController::new(StyleSettings::default());
        assert!(!apply_style(Action::SwapSource, &mut style));
        assert!(!apply_style(Action::Quit, &mut style));
        assert_eq!(style.settings(), &StyleSettings::default());
    }
}
