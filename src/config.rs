use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::plot::hit_pairs::{PairPlotOptions, PredictionPlotOptions};

/// Rendering configuration; every field has a default so a config file only
/// lists what it changes.
///
/// ```json
/// { "width": 1200, "height": 1200, "prediction": { "threshold": 0.8 } }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Pixels per inch; converts marker sizes and line widths from points.
    pub dpi: f64,
    pub pairs: PairPlotOptions,
    pub prediction: PredictionPlotOptions,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            dpi: 100.0,
            pairs: PairPlotOptions::default(),
            prediction: PredictionPlotOptions::default(),
        }
    }
}

/// Read a JSON config file, or fall back to defaults when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> Result<RenderConfig> {
    let Some(path) = path else {
        return Ok(RenderConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: RenderConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    log::debug!("Loaded render config from {}: {config:?}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn defaults_without_file() {
        let config = load_config(None).unwrap();
        assert_eq!(config, RenderConfig::default());
        assert_eq!(config.prediction.threshold, 0.5);
        assert_eq!(config.prediction.line_width, 0.1);
    }

    #[test]
    fn partial_file_overrides_only_listed_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("render.json");
        std::fs::write(
            &path,
            r#"{"width": 1200, "prediction": {"threshold": 0.8, "color_scheme": {"false_positive": [1, 0, 1, 1]}}}"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.width, 1200);
        assert_eq!(config.height, 800);
        assert_eq!(config.prediction.threshold, 0.8);
        assert_eq!(config.prediction.color_scheme.false_positive.b, 1.0);
        assert_eq!(config.pairs, PairPlotOptions::default());
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("render.json");
        std::fs::write(&path, "{ width: }").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }
}
