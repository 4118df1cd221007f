//! User preferences
//!
//! Persisted in LocalStorage, separate from tuning (which ships with the page).

use serde::{Deserialize, Serialize};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Preset named by a `quality=` query parameter, e.g. `?quality=high`
    pub fn from_query(search: &str) -> Option<Self> {
        search
            .trim_start_matches('?')
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "quality")
            .and_then(|(_, value)| Self::from_str(value))
    }

    /// Triangle fan segments per full circle
    pub fn circle_segments(&self) -> u32 {
        match self {
            QualityPreset::Low => 12,
            QualityPreset::Medium => 24,
            QualityPreset::High => 48,
        }
    }

    /// Whether lit bumpers get an outer glow ring
    pub fn bumper_glow(&self) -> bool {
        !matches!(self, QualityPreset::Low)
    }
}

/// Viewer preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Page ===
    /// Nudge page content with the rubber displacement
    pub rubber_offset: bool,

    // === Table ===
    /// Draw label markers on bumpers
    pub show_labels: bool,

    // === Accessibility ===
    /// Reduced motion (no content nudging, no glow)
    pub reduced_motion: bool,
    /// High contrast palette
    pub high_contrast: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            rubber_offset: true,
            show_labels: true,
            reduced_motion: false,
            high_contrast: false,
        }
    }
}

impl Settings {
    /// Apply a quality preset (updates quality-dependent settings)
    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;

        // Low preset drops label markers to save triangles
        if preset == QualityPreset::Low {
            self.show_labels = false;
        }
    }

    /// Effective content nudge (respects reduced_motion)
    pub fn effective_rubber_offset(&self) -> bool {
        self.rubber_offset && !self.reduced_motion
    }

    /// Effective bumper glow (respects reduced_motion)
    pub fn effective_glow(&self) -> bool {
        self.quality.bumper_glow() && !self.reduced_motion
    }

    /// Parse stored JSON, falling back to defaults
    pub fn from_json_or_default(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Discarding stored settings: {}", e);
                Self::default()
            }
        }
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "folio_sim_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                log::info!("Loaded settings from LocalStorage");
                return Self::from_json_or_default(&json);
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_detail() {
        assert!(QualityPreset::Low.circle_segments() < QualityPreset::Medium.circle_segments());
        assert!(QualityPreset::Medium.circle_segments() < QualityPreset::High.circle_segments());
        assert_eq!(QualityPreset::from_str("MED"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::from_str("ultra"), None);
    }

    #[test]
    fn test_reduced_motion_wins() {
        let settings = Settings {
            reduced_motion: true,
            ..Settings::default()
        };
        assert!(!settings.effective_rubber_offset());
        assert!(!settings.effective_glow());
        assert!(Settings::default().effective_rubber_offset());
    }

    #[test]
    fn test_low_preset_drops_labels() {
        let mut settings = Settings::default();
        settings.apply_preset(QualityPreset::Low);
        assert_eq!(settings.quality, QualityPreset::Low);
        assert!(!settings.show_labels);

        settings.apply_preset(QualityPreset::High);
        assert_eq!(settings.quality, QualityPreset::High);
    }

    #[test]
    fn test_preset_from_query() {
        assert_eq!(QualityPreset::from_query("?quality=high"), Some(QualityPreset::High));
        assert_eq!(
            QualityPreset::from_query("?lang=en&quality=Low&x=1"),
            Some(QualityPreset::Low)
        );
        assert_eq!(QualityPreset::from_query("?quality=ultra"), None);
        assert_eq!(QualityPreset::from_query(""), None);
        assert_eq!(QualityPreset::from_query("?qualityx=high"), None);
        assert_eq!(QualityPreset::Medium.as_str(), "Medium");
    }

    #[test]
    fn test_stored_json_fallbacks() {
        let partial = Settings::from_json_or_default(r#"{"quality":"High"}"#);
        assert_eq!(partial.quality, QualityPreset::High);
        assert!(partial.show_labels);

        assert_eq!(Settings::from_json_or_default("{not json"), Settings::default());
    }
}
