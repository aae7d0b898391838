// ============================================================
// TOOL SETTINGS
// ============================================================
// Configuration values shared by every command, resolved once at startup

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::error::{AppError, Result};

/// Column names consumed by the commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    /// Row identifier, used for filtering and the matched-id list (default: `id`)
    pub id: String,

    /// User identifier, used for the distinct-user statistics (default: `user_id_id`)
    pub user_id: String,

    /// Free-text column scanned for markers (default: `output_text`)
    pub text: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            id: "id".to_string(),
            user_id: "user_id_id".to_string(),
            text: "output_text".to_string(),
        }
    }
}

/// Marker vocabulary and matching mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Words opening a marker region (default: `begin`, `beginning`)
    pub begin_words: Vec<String>,

    /// Words closing a marker region (default: `end`, `ending`)
    pub end_words: Vec<String>,

    /// Noun following the begin/end word (default: `text`)
    pub keyword: String,

    /// Require exact case instead of case-insensitive matching
    pub case_sensitive: bool,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            begin_words: vec!["begin".to_string(), "beginning".to_string()],
            end_words: vec!["end".to_string(), "ending".to_string()],
            keyword: "text".to_string(),
            case_sensitive: false,
        }
    }
}

/// File handling options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// Delimiter override, e.g. `,` `;` or `\t`. `None` means detect.
    pub delimiter: Option<String>,

    /// Directory relative paths are resolved against (default: working directory)
    pub base_dir: Option<PathBuf>,
}

/// Latency comparison options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyConfig {
    /// Only rows with this action (case-insensitive) are compared
    pub action: String,

    /// Number of quantile bins over the combined word counts
    pub bins: usize,

    pub before: PathBuf,
    pub after: PathBuf,
    pub exact_output: PathBuf,
    pub binned_output: PathBuf,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            action: "humanize".to_string(),
            bins: 4,
            before: PathBuf::from("latency.xlsx"),
            after: PathBuf::from("latency_after_changes.xlsx"),
            exact_output: PathBuf::from("exact_word_count_diff.csv"),
            binned_output: PathBuf::from("binned_latency_diff.csv"),
        }
    }
}

/// All settings, layered from defaults, a TOML file, env vars and CLI flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub fields: FieldNames,
    pub markers: MarkerConfig,
    pub io: IoConfig,
    pub latency: LatencyConfig,
}

impl Settings {
    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let fields = [&self.fields.id, &self.fields.user_id, &self.fields.text];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(AppError::ConfigError(
                "field names must not be empty".to_string(),
            ));
        }
        if self.markers.begin_words.iter().all(|w| w.trim().is_empty()) {
            return Err(AppError::ConfigError(
                "markers.begin_words needs at least one word".to_string(),
            ));
        }
        if self.markers.end_words.iter().all(|w| w.trim().is_empty()) {
            return Err(AppError::ConfigError(
                "markers.end_words needs at least one word".to_string(),
            ));
        }
        if self.markers.keyword.trim().is_empty() {
            return Err(AppError::ConfigError(
                "markers.keyword must not be empty".to_string(),
            ));
        }
        if self.latency.bins == 0 {
            return Err(AppError::ConfigError("latency.bins must be > 0".to_string()));
        }
        if let Some(delimiter) = &self.io.delimiter {
            parse_delimiter(delimiter)?;
        }
        Ok(())
    }

    /// Delimiter override as a byte, if configured
    pub fn delimiter(&self) -> Result<Option<u8>> {
        self.io.delimiter.as_deref().map(parse_delimiter).transpose()
    }
}

/// Parse a delimiter argument: a single ASCII character, `\t` or `tab`
pub fn parse_delimiter(raw: &str) -> Result<u8> {
    match raw {
        "\\t" | "tab" | "\t" => return Ok(b'\t'),
        _ => {}
    }

    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c as u8),
        _ => Err(AppError::ConfigError(format!(
            "delimiter must be a single ASCII character, got {:?}",
            raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.fields.user_id, "user_id_id");
        assert_eq!(settings.latency.bins, 4);
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(",").unwrap(), b',');
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert_eq!(parse_delimiter("\\t").unwrap(), b'\t');
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert!(parse_delimiter(",,").is_err());
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("—").is_err());
    }

    #[test]
    fn test_validate_rejects_empty_marker_words() {
        let mut settings = Settings::default();
        settings.markers.end_words = vec![" ".to_string()];
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_bins() {
        let mut settings = Settings::default();
        settings.latency.bins = 0;
        assert!(matches!(settings.validate(), Err(AppError::ConfigError(_))));
    }
}
