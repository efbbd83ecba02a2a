//! Configuration validation.
//!
//! Checks every recognized option before a run starts. Missing numeric keys
//! take their defaults and pass.

use crate::domain::error::ScreenerError;
use crate::domain::universe::parse_codes;
use crate::ports::config_port::ConfigPort;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    validate_data_config(config)?;
    validate_universe_config(config)?;
    validate_selection_config(config)?;
    validate_report_config(config)?;
    Ok(())
}

pub fn validate_selection_config(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    validate_window(config, "breakout_window", 55)?;
    validate_window(config, "volume_ma_window", 20)?;
    validate_window(config, "rs_lookback", 20)?;
    validate_rs_threshold(config)?;
    validate_min_score(config)?;
    validate_percentile_cutoff(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    require_non_empty(config, "data", "path")?;
    require_non_empty(config, "data", "benchmark")?;
    Ok(())
}

pub fn validate_universe_config(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    if config.get_int("universe", "top_n", 0) < 0 {
        return Err(ScreenerError::invalid(
            "universe",
            "top_n",
            "top_n must be non-negative",
        ));
    }
    if let Some(codes) = config
        .get_string("universe", "codes")
        .filter(|s| !s.trim().is_empty())
    {
        parse_codes(&codes).map_err(|e| ScreenerError::invalid("universe", "codes", e.to_string()))?;
    }
    Ok(())
}

pub fn validate_report_config(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    if config.get_int("report", "max_rows", 20) < 1 {
        return Err(ScreenerError::invalid(
            "report",
            "max_rows",
            "max_rows must be at least 1",
        ));
    }
    Ok(())
}

fn validate_window(config: &dyn ConfigPort, key: &str, default: i64) -> Result<(), ScreenerError> {
    if config.get_int("selection", key, default) < 1 {
        return Err(ScreenerError::invalid(
            "selection",
            key,
            format!("{} must be at least 1", key),
        ));
    }
    Ok(())
}

fn validate_rs_threshold(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    let value = config.get_double("selection", "rs_threshold", 0.7);
    if !value.is_finite() {
        return Err(ScreenerError::invalid(
            "selection",
            "rs_threshold",
            "rs_threshold must be a finite number",
        ));
    }
    Ok(())
}

fn validate_min_score(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    let value = config.get_double("selection", "min_score", 80.0);
    if !(0.0..=100.0).contains(&value) {
        return Err(ScreenerError::invalid(
            "selection",
            "min_score",
            "min_score must be between 0 and 100",
        ));
    }
    Ok(())
}

fn validate_percentile_cutoff(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    let value = config.get_double("selection", "sector_percentile_cutoff", 0.8);
    if !(0.0..1.0).contains(&value) {
        return Err(ScreenerError::invalid(
            "selection",
            "sector_percentile_cutoff",
            "sector_percentile_cutoff must be in [0, 1)",
        ));
    }
    Ok(())
}

fn require_non_empty(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), ScreenerError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(ScreenerError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapConfig {
        values: HashMap<(String, String), String>,
    }

    impl MapConfig {
        fn new(entries: &[(&str, &str, &str)]) -> Self {
            let values = entries
                .iter()
                .map(|(s, k, v)| ((s.to_string(), k.to_string()), v.to_string()))
                .collect();
            Self { values }
        }

        fn valid() -> Self {
            Self::new(&[("data", "path", "./data"), ("data", "benchmark", "000300.SH")])
        }

        fn with(mut self, section: &str, key: &str, value: &str) -> Self {
            self.values
                .insert((section.to_string(), key.to_string()), value.to_string());
            self
        }
    }

    impl ConfigPort for MapConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.values
                .get(&(section.to_string(), key.to_string()))
                .cloned()
        }

        fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }
    }

    fn invalid_key(result: Result<(), ScreenerError>) -> String {
        match result {
            Err(ScreenerError::ConfigInvalid { key, .. }) => key,
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn minimal_config_is_valid() {
        assert!(validate_config(&MapConfig::valid()).is_ok());
    }

    #[test]
    fn missing_data_path() {
        let config = MapConfig::new(&[("data", "benchmark", "000300.SH")]);
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ScreenerError::ConfigMissing { key, .. } if key == "path"));
    }

    #[test]
    fn blank_benchmark() {
        let config = MapConfig::new(&[("data", "path", "./data"), ("data", "benchmark", "  ")]);
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ScreenerError::ConfigMissing { key, .. } if key == "benchmark"));
    }

    #[test]
    fn zero_window_rejected() {
        let config = MapConfig::valid().with("selection", "breakout_window", "0");
        assert_eq!(invalid_key(validate_config(&config)), "breakout_window");
        let config = MapConfig::valid().with("selection", "rs_lookback", "-3");
        assert_eq!(invalid_key(validate_config(&config)), "rs_lookback");
    }

    #[test]
    fn min_score_range() {
        let config = MapConfig::valid().with("selection", "min_score", "100.5");
        assert_eq!(invalid_key(validate_config(&config)), "min_score");
        let config = MapConfig::valid().with("selection", "min_score", "100");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn cutoff_must_be_below_one() {
        let config = MapConfig::valid().with("selection", "sector_percentile_cutoff", "1.0");
        assert_eq!(invalid_key(validate_config(&config)), "sector_percentile_cutoff");
        let config = MapConfig::valid().with("selection", "sector_percentile_cutoff", "0.6");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn infinite_rs_threshold_rejected() {
        let config = MapConfig::valid().with("selection", "rs_threshold", "inf");
        assert_eq!(invalid_key(validate_config(&config)), "rs_threshold");
    }

    #[test]
    fn negative_top_n_rejected() {
        let config = MapConfig::valid().with("universe", "top_n", "-1");
        assert_eq!(invalid_key(validate_config(&config)), "top_n");
    }

    #[test]
    fn duplicate_universe_codes_rejected() {
        let config = MapConfig::valid().with("universe", "codes", "600519.SH,600519.SH");
        assert_eq!(invalid_key(validate_config(&config)), "codes");
    }

    #[test]
    fn max_rows_at_least_one() {
        let config = MapConfig::valid().with("report", "max_rows", "0");
        assert_eq!(invalid_key(validate_config(&config)), "max_rows");
    }
}
