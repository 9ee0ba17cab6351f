use crate::types::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file. A missing file falls back to
    /// built-in defaults so the demo runs without any setup.
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = Config::load("/nonexistent/beacon-range.yaml").unwrap();
        assert_eq!(cfg.depth.period, 5);
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let cfg: Config = serde_yaml::from_str("depth:\n  period: 3\n").unwrap();
        assert_eq!(cfg.depth.period, 3);
        assert_eq!(cfg.camera.focal_length_px, 600.0);
    }
}
