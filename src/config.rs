use std::path::{Path, PathBuf};
use std::time::Duration;
use std::fs;

use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_LANG, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TRANSLATIONS_DIR, LANG_CODES,
    MIN_TIME_BETWEEN_UPDATES_SECS,
};
use crate::units::UnitSystem;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Numeric precision requested from the observations endpoint. "none" omits
/// the query parameter entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NumericPrecision {
    #[default]
    None,
    Decimal,
}

impl NumericPrecision {
    pub fn as_str(self) -> &'static str {
        match self {
            NumericPrecision::None => "none",
            NumericPrecision::Decimal => "decimal",
        }
    }
}

/// Top-level app configuration as read from YAML. All fields are Options so
/// CLI overrides can be layered on top.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,
    /// TWC/Weather Underground API key.
    pub api_key: Option<String>,
    /// Personal weather station identifier, e.g. "KAZBISBE8".
    pub pws_id: Option<String>,
    pub numeric_precision: Option<String>,
    pub lang: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub unit_system: Option<UnitSystem>,
    pub calendarday_temp: Option<bool>,
    pub forecast_enable: Option<bool>,
    pub update_interval_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub translations_dir: Option<PathBuf>,
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone)]
#[command(name = "wupws", about = "Weather Underground PWS poller", disable_help_flag = false)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    #[arg(long)]
    pub api_key: Option<String>,
    #[arg(long)]
    pub pws_id: Option<String>,
    /// "none" or "decimal"
    #[arg(long)]
    pub numeric_precision: Option<String>,
    /// Language tag, e.g. "en-US" or "de-DE"
    #[arg(long)]
    pub lang: Option<String>,
    #[arg(long)]
    pub latitude: Option<f64>,
    #[arg(long)]
    pub longitude: Option<f64>,
    /// "metric" or "imperial"
    #[arg(long)]
    pub unit_system: Option<String>,
    #[arg(long, action = ArgAction::Set)]
    pub calendarday_temp: Option<bool>,
    #[arg(long, action = ArgAction::Set)]
    pub forecast_enable: Option<bool>,
    #[arg(long)]
    pub update_interval_secs: Option<u64>,
    #[arg(long)]
    pub translations_dir: Option<PathBuf>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Resolved, immutable runtime configuration for one station. Created once
/// at setup; the coordinator back-fills missing coordinates from the first
/// observation response without touching this struct.
#[derive(Debug, Clone)]
pub struct StationConfig {
    pub log_level: Option<String>,
    pub api_key: String,
    pub pws_id: String,
    pub numeric_precision: NumericPrecision,
    pub lang: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub unit_system: UnitSystem,
    pub calendarday_temp: bool,
    pub forecast_enable: bool,
    pub update_interval: Duration,
    pub request_timeout: Duration,
    pub translations_dir: PathBuf,
}

/// Public entry point: parse CLI, read YAML, merge, validate, resolve.
pub fn load() -> Result<StationConfig, ConfigError> {
    let cli = Cli::parse();

    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, &cli);

    // 4) Validate
    validate(&cfg)?;

    if cli.dump_config {
        // Pretty YAML of effective config (nice for debugging)
        let s = serde_yaml::to_string(&cfg)?;
        println!("{s}");
        std::process::exit(0);
    }

    resolve(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/wupws/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/wupws/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/wupws.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["wupws.yaml", "config.yaml", "config/wupws.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some()            { dst.log_level = src.log_level; }
    if src.api_key.is_some()              { dst.api_key = src.api_key; }
    if src.pws_id.is_some()               { dst.pws_id = src.pws_id; }
    if src.numeric_precision.is_some()    { dst.numeric_precision = src.numeric_precision; }
    if src.lang.is_some()                 { dst.lang = src.lang; }
    if src.latitude.is_some()             { dst.latitude = src.latitude; }
    if src.longitude.is_some()            { dst.longitude = src.longitude; }
    if src.unit_system.is_some()          { dst.unit_system = src.unit_system; }
    if src.calendarday_temp.is_some()     { dst.calendarday_temp = src.calendarday_temp; }
    if src.forecast_enable.is_some()      { dst.forecast_enable = src.forecast_enable; }
    if src.update_interval_secs.is_some() { dst.update_interval_secs = src.update_interval_secs; }
    if src.request_timeout_secs.is_some() { dst.request_timeout_secs = src.request_timeout_secs; }
    if src.translations_dir.is_some()     { dst.translations_dir = src.translations_dir; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()            { cfg.log_level = cli.log_level.clone(); }
    if cli.api_key.is_some()              { cfg.api_key = cli.api_key.clone(); }
    if cli.pws_id.is_some()               { cfg.pws_id = cli.pws_id.clone(); }
    if cli.numeric_precision.is_some()    { cfg.numeric_precision = cli.numeric_precision.clone(); }
    if cli.lang.is_some()                 { cfg.lang = cli.lang.clone(); }
    if cli.latitude.is_some()             { cfg.latitude = cli.latitude; }
    if cli.longitude.is_some()            { cfg.longitude = cli.longitude; }
    if let Some(us) = cli.unit_system.as_deref() {
        cfg.unit_system = match us.to_lowercase().as_str() {
            "m" | "c" | "celsius" | "metric" => Some(UnitSystem::Metric),
            "e" | "f" | "fahrenheit" | "imperial" => Some(UnitSystem::Imperial),
            _ => cfg.unit_system, // caught by validate below
        };
    }
    if cli.calendarday_temp.is_some()     { cfg.calendarday_temp = cli.calendarday_temp; }
    if cli.forecast_enable.is_some()      { cfg.forecast_enable = cli.forecast_enable; }
    if cli.update_interval_secs.is_some() { cfg.update_interval_secs = cli.update_interval_secs; }
    if cli.translations_dir.is_some()     { cfg.translations_dir = cli.translations_dir.clone(); }
}

/// Put any invariants here (required fields, ranges, etc.)
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.api_key.as_deref().unwrap_or("").is_empty() {
        return Err(ConfigError::Validation("api_key is required".into()));
    }
    if cfg.pws_id.as_deref().unwrap_or("").is_empty() {
        return Err(ConfigError::Validation("pws_id is required".into()));
    }
    if let Some(precision) = cfg.numeric_precision.as_deref() {
        match precision {
            "none" | "decimal" => {}
            _ => {
                return Err(ConfigError::Validation(
                    "numeric_precision must be \"none\" or \"decimal\"".into(),
                ));
            }
        }
    }
    if let Some(lang) = cfg.lang.as_deref() {
        if !LANG_CODES.contains(&lang) {
            return Err(ConfigError::Validation(format!(
                "unsupported language tag \"{lang}\""
            )));
        }
    }
    // Latitude and longitude must exist together; the first observation
    // response back-fills both when neither is given.
    match (cfg.latitude, cfg.longitude) {
        (Some(lat), Some(lon)) => {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(ConfigError::Validation("latitude must be -90..=90".into()));
            }
            if !(-180.0..=180.0).contains(&lon) {
                return Err(ConfigError::Validation("longitude must be -180..=180".into()));
            }
        }
        (None, None) => {}
        _ => {
            return Err(ConfigError::Validation(
                "latitude and longitude must be given together".into(),
            ));
        }
    }
    if cfg.update_interval_secs == Some(0) {
        return Err(ConfigError::Validation("update_interval_secs must be > 0".into()));
    }
    Ok(())
}

/// Collapse the merged Options into the immutable runtime config.
pub fn resolve(cfg: Config) -> Result<StationConfig, ConfigError> {
    let numeric_precision = match cfg.numeric_precision.as_deref() {
        Some("decimal") => NumericPrecision::Decimal,
        _ => NumericPrecision::None,
    };
    Ok(StationConfig {
        log_level: cfg.log_level,
        api_key: cfg.api_key.unwrap_or_default(),
        pws_id: cfg.pws_id.unwrap_or_default(),
        numeric_precision,
        lang: cfg.lang.unwrap_or_else(|| DEFAULT_LANG.to_string()),
        latitude: cfg.latitude,
        longitude: cfg.longitude,
        unit_system: cfg.unit_system.unwrap_or_default(),
        calendarday_temp: cfg.calendarday_temp.unwrap_or(false),
        forecast_enable: cfg.forecast_enable.unwrap_or(true),
        update_interval: Duration::from_secs(
            cfg.update_interval_secs.unwrap_or(MIN_TIME_BETWEEN_UPDATES_SECS),
        ),
        request_timeout: Duration::from_secs(
            cfg.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        ),
        translations_dir: cfg
            .translations_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TRANSLATIONS_DIR)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> Config {
        Config {
            api_key: Some("abc123".into()),
            pws_id: Some("KAZBISBE8".into()),
            ..Config::default()
        }
    }

    #[test]
    fn test_minimal_config_resolves_defaults() {
        let cfg = minimal();
        validate(&cfg).unwrap();
        let station = resolve(cfg).unwrap();
        assert_eq!(station.lang, "en-US");
        assert_eq!(station.numeric_precision, NumericPrecision::None);
        assert_eq!(station.unit_system, UnitSystem::Imperial);
        assert!(station.forecast_enable);
        assert!(!station.calendarday_temp);
        assert_eq!(station.update_interval, Duration::from_secs(300));
        assert_eq!(station.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let mut cfg = minimal();
        cfg.api_key = None;
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_bad_precision_rejected() {
        let mut cfg = minimal();
        cfg.numeric_precision = Some("high".into());
        assert!(validate(&cfg).is_err());
        cfg.numeric_precision = Some("decimal".into());
        validate(&cfg).unwrap();
        assert_eq!(resolve(cfg).unwrap().numeric_precision, NumericPrecision::Decimal);
    }

    #[test]
    fn test_unknown_lang_rejected() {
        let mut cfg = minimal();
        cfg.lang = Some("xx-YY".into());
        assert!(validate(&cfg).is_err());
        cfg.lang = Some("de-DE".into());
        validate(&cfg).unwrap();
    }

    #[test]
    fn test_coordinates_must_pair() {
        let mut cfg = minimal();
        cfg.latitude = Some(31.386);
        assert!(validate(&cfg).is_err());
        cfg.longitude = Some(-110.039);
        validate(&cfg).unwrap();
    }

    #[test]
    fn test_coordinate_ranges() {
        let mut cfg = minimal();
        cfg.latitude = Some(100.0);
        cfg.longitude = Some(0.0);
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_merge_layers_options() {
        let mut base = minimal();
        merge(
            &mut base,
            Config {
                lang: Some("fr-FR".into()),
                update_interval_secs: Some(600),
                ..Config::default()
            },
        );
        assert_eq!(base.lang.as_deref(), Some("fr-FR"));
        assert_eq!(base.update_interval_secs, Some(600));
        // untouched fields survive the merge
        assert_eq!(base.api_key.as_deref(), Some("abc123"));
    }
}
