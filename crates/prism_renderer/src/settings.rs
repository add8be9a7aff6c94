//! Render configuration.

use prism_core::Color;
use serde::{Deserialize, Serialize};

/// Per-frame shading switches and constants.
///
/// Every field has a default, so a settings file only needs to list the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Monte-Carlo ambient instead of the flat ambient term
    pub global_illumination: bool,
    /// Hemisphere samples per shaded point when GI is on
    pub gi_samples: u32,
    pub reflections: bool,
    /// Mirror bounces below this depth are traced
    pub max_reflection_depth: u32,
    /// Flat ambient factor multiplied by albedo when GI is off
    pub ambient: f32,
    /// Radiance returned by rays that escape the scene
    pub sky_color: Color,
    pub gamma: f32,
    /// Pixels per executor batch
    pub tasks_per_batch: usize,
    pub shadows: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            global_illumination: false,
            gi_samples: 32,
            reflections: true,
            max_reflection_depth: 3,
            ambient: 0.05,
            sky_color: Color::new(0.2, 0.3, 0.5),
            gamma: 2.2,
            tasks_per_batch: 20,
            shadows: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = RenderSettings::default();
        assert!(!settings.global_illumination);
        assert_eq!(settings.tasks_per_batch, 20);
        assert_eq!(settings.gamma, 2.2);
    }

    #[test]
    fn test_partial_json() {
        let settings: RenderSettings =
            serde_json::from_str(r#"{ "global_illumination": true, "gi_samples": 8 }"#).unwrap();
        assert!(settings.global_illumination);
        assert_eq!(settings.gi_samples, 8);
        assert_eq!(settings.max_reflection_depth, 3);
    }
}
