use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::warn;
use serde::Deserialize;
use thiserror::Error;

/// Error type for translation-table loading. Only raised when the English
/// fallback itself cannot be loaded; a missing requested language degrades
/// to English with a warning.
#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("I/O error reading {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error in {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Localized display labels for the known observation and forecast field
/// keys. Daypart fields carry their own nested table plus the "expired"
/// label shown when the provider has nulled today's daypart name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslationTable {
    #[serde(default)]
    pub daypart: HashMap<String, String>,
    #[serde(flatten)]
    pub labels: HashMap<String, String>,
}

impl TranslationTable {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn daypart_label(&self, key: &str) -> Option<&str> {
        self.daypart.get(key).map(String::as_str)
    }

    /// Label substituted for a daypart name the provider has expired.
    pub fn expired_label(&self) -> &str {
        self.daypart.get("expired").map(String::as_str).unwrap_or("Expired")
    }
}

fn read_table(path: &Path) -> Result<TranslationTable, TranslationError> {
    let file = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| TranslationError::Io {
        file: file.clone(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| TranslationError::Parse { file, source })
}

/// Load the label table for a language tag. The two-letter base code is
/// derived from the tag ("de" from "de-DE") and `{base}.json` is looked up
/// under `dir`; any failure falls back to `en.json`. The fallback is
/// unconditional - if English itself cannot be loaded, setup fails.
pub fn load_translations(dir: &Path, lang: &str) -> Result<TranslationTable, TranslationError> {
    let base = lang.split('-').next().unwrap_or(lang);
    match read_table(&dir.join(format!("{base}.json"))) {
        Ok(table) => Ok(table),
        Err(_) => {
            warn!("Sensor translation file {base}.json does not exist. Defaulting to en-US.");
            read_table(&dir.join("en.json"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn fixture_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("wupws-tran-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("en.json"),
            r#"{"temp": "Temperature", "humidity": "Relative Humidity",
                "daypart": {"temperature": "Forecast Temperature", "expired": "Expired"}}"#,
        )
        .unwrap();
        fs::write(
            dir.join("de.json"),
            r#"{"temp": "Temperatur", "humidity": "Relative Luftfeuchtigkeit",
                "daypart": {"temperature": "Vorhersage Temperatur", "expired": "Abgelaufen"}}"#,
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_load_requested_language() {
        let dir = fixture_dir("de");
        let table = load_translations(&dir, "de-DE").unwrap();
        assert_eq!(table.label("temp"), Some("Temperatur"));
        assert_eq!(table.daypart_label("temperature"), Some("Vorhersage Temperatur"));
        assert_eq!(table.expired_label(), "Abgelaufen");
    }

    #[test]
    fn test_unknown_language_falls_back_to_english() {
        let dir = fixture_dir("fallback");
        let table = load_translations(&dir, "xx-YY").unwrap();
        assert_eq!(table.label("temp"), Some("Temperature"));
        assert_eq!(table.label("humidity"), Some("Relative Humidity"));
    }

    #[test]
    fn test_malformed_language_file_falls_back() {
        let dir = fixture_dir("malformed");
        fs::write(dir.join("fr.json"), "{not json").unwrap();
        let table = load_translations(&dir, "fr-FR").unwrap();
        assert_eq!(table.label("temp"), Some("Temperature"));
    }

    #[test]
    fn test_missing_english_is_fatal() {
        let dir = std::env::temp_dir().join(format!("wupws-tran-empty-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        assert!(load_translations(&dir, "xx-YY").is_err());
    }

    #[test]
    fn test_base_code_derivation() {
        let dir = fixture_dir("base");
        // bare base code without a region also resolves
        let table = load_translations(&dir, "de").unwrap();
        assert_eq!(table.label("temp"), Some("Temperatur"));
    }
}
