//! Optional TOML configuration.
//!
//! ```toml
//! # ecn.toml
//!
//! [thresholds]
//! r2_min = 0.99
//! max_slope_delta = 0.6
//!
//! [ranges]
//! Cer = [30, 50]   # add a window
//! PC = [28, 44]    # replace a built-in window
//! ```
//!
//! Values given on the command line win over the file.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::domain::{RangeWindow, Thresholds};
use crate::error::AppError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub thresholds: Thresholds,
    pub ranges: BTreeMap<String, RangeWindow>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::new(2, format!("Failed to read config '{}': {e}", path.display())))?;
        Self::parse(&text)
            .map_err(|e| AppError::new(2, format!("Invalid config '{}': {e}", path.display())))
    }

    pub fn parse(text: &str) -> Result<Self, AppError> {
        let config: FileConfig =
            toml::from_str(text).map_err(|e| AppError::new(2, e.to_string()))?;
        validate_ranges(&config.ranges)?;
        Ok(config)
    }
}

pub fn validate_thresholds(t: &Thresholds) -> Result<(), AppError> {
    if !(t.r2_min.is_finite() && t.r2_min > 0.0 && t.r2_min <= 1.0) {
        return Err(AppError::new(2, format!("Invalid r2_min {} (must be in (0, 1]).", t.r2_min)));
    }
    if !(t.max_slope_delta.is_finite() && t.max_slope_delta >= 0.0) {
        return Err(AppError::new(
            2,
            format!("Invalid max_slope_delta {} (must be finite and >= 0).", t.max_slope_delta),
        ));
    }
    Ok(())
}

fn validate_ranges(ranges: &BTreeMap<String, RangeWindow>) -> Result<(), AppError> {
    for (ontology, w) in ranges {
        if !w.is_valid() {
            return Err(AppError::new(
                2,
                format!("Invalid range for {ontology}: [{}, {}] (min > max).", w.min, w.max),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_thresholds_and_ranges() {
        let cfg = FileConfig::parse("[thresholds]\nr2_min = 0.95\n\n[ranges]\nCer = [30, 50]\n").unwrap();
        assert_eq!(cfg.thresholds.r2_min, 0.95);
        assert_eq!(cfg.thresholds.max_slope_delta, 0.6);
        assert_eq!(cfg.ranges["Cer"], RangeWindow::new(30, 50));
    }

    #[test]
    fn empty_file_means_defaults() {
        let cfg = FileConfig::parse("").unwrap();
        assert_eq!(cfg.thresholds, Thresholds::default());
        assert!(cfg.ranges.is_empty());
    }

    #[test]
    fn rejects_inverted_window() {
        assert!(FileConfig::parse("[ranges]\nCer = [50, 30]\n").is_err());
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        let bad = Thresholds {
            r2_min: 1.5,
            ..Thresholds::default()
        };
        assert_eq!(validate_thresholds(&bad).unwrap_err().exit_code(), 2);
        assert!(validate_thresholds(&Thresholds::default()).is_ok());
    }
}
