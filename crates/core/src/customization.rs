use crate::profile::{
    READING_AND_LANGUAGE, SelectionState, VISION_AND_SCREEN_READER, WRITING_AND_EXPRESSION,
};
use std::fmt;
use std::str::FromStr;
use tokio::sync::watch;

/// Profiles that unlock the display customization panel.
pub const CUSTOMIZABLE_PROFILES: [&str; 3] = [
    WRITING_AND_EXPRESSION,
    VISION_AND_SCREEN_READER,
    READING_AND_LANGUAGE,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontFamily {
    #[default]
    Sans,
    Serif,
    Mono,
}

impl fmt::Display for FontFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FontFamily::Sans => "sans",
            FontFamily::Serif => "serif",
            FontFamily::Mono => "mono",
        };
        f.write_str(s)
    }
}

impl FromStr for FontFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sans" | "sans-serif" => Ok(FontFamily::Sans),
            "serif" => Ok(FontFamily::Serif),
            "mono" | "monospace" => Ok(FontFamily::Mono),
            other => Err(format!("unknown font family '{other}', expected sans, serif or mono")),
        }
    }
}

/// A bounded, stepped control such as a slider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slider {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl Slider {
    /// Clamps into range and snaps to the nearest step.
    pub fn clamp(&self, value: f32) -> f32 {
        let clamped = value.clamp(self.min, self.max);
        let steps = ((clamped - self.min) / self.step).round();
        // Rounding to two decimals keeps 1.4 from turning into 1.4000001.
        let snapped = self.min + steps * self.step;
        ((snapped * 100.0).round() / 100.0).clamp(self.min, self.max)
    }
}

pub const FONT_SIZE: Slider = Slider { min: 0.8, max: 2.0, step: 0.1 };
pub const LINE_HEIGHT: Slider = Slider { min: 1.5, max: 2.5, step: 0.1 };
pub const SPEECH_RATE: Slider = Slider { min: 0.5, max: 2.0, step: 0.1 };

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CustomizationSettings {
    /// Relative to the base font size.
    pub font_size: f32,
    pub line_height: f32,
    pub font_family: FontFamily,
}

impl Default for CustomizationSettings {
    fn default() -> Self {
        Self {
            font_size: 1.0,
            line_height: 1.6,
            font_family: FontFamily::Sans,
        }
    }
}

/// A change to one customization field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingChange {
    FontSize(f32),
    LineHeight(f32),
    FontFamily(FontFamily),
}

/// Holds the display preferences and decides when their controls are offered.
pub struct DisplayCustomizationStore {
    settings: CustomizationSettings,
    selection: watch::Receiver<SelectionState>,
}

impl DisplayCustomizationStore {
    pub fn new(selection: watch::Receiver<SelectionState>) -> Self {
        Self {
            settings: CustomizationSettings::default(),
            selection,
        }
    }

    pub fn settings(&self) -> CustomizationSettings {
        self.settings
    }

    /// Merges one field. Values are stored as given; range checks belong to the caller.
    pub fn update(&mut self, change: SettingChange) -> CustomizationSettings {
        match change {
            SettingChange::FontSize(v) => self.settings.font_size = v,
            SettingChange::LineHeight(v) => self.settings.line_height = v,
            SettingChange::FontFamily(v) => self.settings.font_family = v,
        }
        tracing::debug!("Customization updated: {:?}", self.settings);
        self.settings
    }

    pub fn controls_visible(&self, has_response: bool) -> bool {
        controls_visible(has_response, &self.selection.borrow())
    }
}

/// Controls are shown only for a response and a selection that asks for them.
pub fn controls_visible(has_response: bool, selection: &SelectionState) -> bool {
    has_response && selection.intersects(&CUSTOMIZABLE_PROFILES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{MATH_AND_NUMERACY, ProfileSelectionEngine, STANDARD};

    #[test]
    fn test_visibility_follows_selection() {
        let mut engine = ProfileSelectionEngine::new();
        let store = DisplayCustomizationStore::new(engine.subscribe());

        assert!(!store.controls_visible(true), "hidden for Standard");

        engine.toggle(VISION_AND_SCREEN_READER);
        assert!(store.controls_visible(true));
        assert!(!store.controls_visible(false), "hidden without a response");

        engine.toggle(STANDARD);
        assert!(!store.controls_visible(true));
    }

    #[test]
    fn test_only_the_three_display_profiles_unlock_controls() {
        let mut engine = ProfileSelectionEngine::new();
        let store = DisplayCustomizationStore::new(engine.subscribe());

        engine.toggle(MATH_AND_NUMERACY);
        assert!(!store.controls_visible(true));

        engine.toggle(WRITING_AND_EXPRESSION);
        assert!(store.controls_visible(true));
    }

    #[test]
    fn test_update_merges_a_single_field() {
        let engine = ProfileSelectionEngine::new();
        let mut store = DisplayCustomizationStore::new(engine.subscribe());

        let settings = store.update(SettingChange::FontSize(1.4));
        assert_eq!(settings.font_size, 1.4);
        assert_eq!(settings.line_height, 1.6);
        assert_eq!(settings.font_family, FontFamily::Sans);

        let settings = store.update(SettingChange::FontFamily(FontFamily::Serif));
        assert_eq!(settings.font_size, 1.4);
        assert_eq!(settings.font_family, FontFamily::Serif);
    }

    #[test]
    fn test_out_of_range_values_are_stored_as_given() {
        let engine = ProfileSelectionEngine::new();
        let mut store = DisplayCustomizationStore::new(engine.subscribe());
        assert_eq!(store.update(SettingChange::LineHeight(9.0)).line_height, 9.0);
    }

    #[test]
    fn test_slider_clamps_and_snaps() {
        assert_eq!(FONT_SIZE.clamp(0.1), 0.8);
        assert_eq!(FONT_SIZE.clamp(3.0), 2.0);
        assert_eq!(FONT_SIZE.clamp(1.43), 1.4);
        assert_eq!(LINE_HEIGHT.clamp(1.96), 2.0);
        assert_eq!(SPEECH_RATE.clamp(0.74), 0.7);
    }

    #[test]
    fn test_font_family_parsing() {
        assert_eq!("Serif".parse::<FontFamily>(), Ok(FontFamily::Serif));
        assert_eq!("monospace".parse::<FontFamily>(), Ok(FontFamily::Mono));
        assert!("comic".parse::<FontFamily>().is_err());
    }
}
