//! "begin text" / "end text" marker detection and stripping.
//!
//! A marker is a begin/end word, one or more whitespace or underscore
//! characters, the keyword (`text` by default), then optional whitespace and
//! em-dashes. Matching is a substring search.
//!
//! Detection and stripping are independent: the marker scan only detects.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::ops::Range;

use crate::domain::error::{AppError, Result};
use crate::domain::settings::MarkerConfig;

static DEFAULT_DETECTOR: Lazy<MarkerDetector> =
    Lazy::new(|| MarkerDetector::new(&MarkerConfig::default()).unwrap());

/// Build the pattern for one marker kind
fn marker_pattern(words: &[String], keyword: &str) -> String {
    let mut words: Vec<&str> = words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .collect();
    // Longest first so "beginning" is preferred over "begin".
    words.sort_by(|a, b| b.len().cmp(&a.len()));

    let alternatives = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");

    format!(
        r"(?:{})[\s_]+{}\s*(?:\x{{2014}}+)?",
        alternatives,
        regex::escape(keyword.trim())
    )
}

/// Finds marker spans in text
pub trait MarkerLocator {
    /// Span of the last begin-marker
    fn last_begin(&self, text: &str) -> Result<Option<Range<usize>>>;

    /// Span of the first end-marker
    fn first_end(&self, text: &str) -> Result<Option<Range<usize>>>;
}

/// Regex-backed marker detector
#[derive(Debug, Clone)]
pub struct MarkerDetector {
    begin: Regex,
    end: Regex,
}

impl MarkerDetector {
    /// Compile begin/end patterns from the marker configuration
    pub fn new(config: &MarkerConfig) -> Result<Self> {
        if config.keyword.trim().is_empty() {
            return Err(AppError::ConfigError(
                "marker keyword must not be empty".to_string(),
            ));
        }

        let build = |words: &[String], kind: &str| -> Result<Regex> {
            if words.iter().all(|w| w.trim().is_empty()) {
                return Err(AppError::ConfigError(format!(
                    "no {} marker words configured",
                    kind
                )));
            }
            RegexBuilder::new(&marker_pattern(words, &config.keyword))
                .case_insensitive(!config.case_sensitive)
                .build()
                .map_err(|e| AppError::ConfigError(format!("invalid {} marker: {}", kind, e)))
        };

        Ok(Self {
            begin: build(&config.begin_words, "begin")?,
            end: build(&config.end_words, "end")?,
        })
    }

    pub fn has_begin_marker(&self, text: &str) -> bool {
        self.begin.is_match(text)
    }

    pub fn has_end_marker(&self, text: &str) -> bool {
        self.end.is_match(text)
    }

    /// Either marker present. Absent text counts as empty.
    pub fn detect(&self, text: Option<&str>) -> bool {
        let text = text.unwrap_or("");
        self.has_begin_marker(text) || self.has_end_marker(text)
    }
}

impl Default for MarkerDetector {
    fn default() -> Self {
        DEFAULT_DETECTOR.clone()
    }
}

impl MarkerLocator for MarkerDetector {
    fn last_begin(&self, text: &str) -> Result<Option<Range<usize>>> {
        Ok(self.begin.find_iter(text).last().map(|m| m.range()))
    }

    fn first_end(&self, text: &str) -> Result<Option<Range<usize>>> {
        Ok(self.end.find(text).map(|m| m.range()))
    }
}

/// Result of stripping one value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StripOutcome {
    /// Text between the markers, trimmed
    Stripped(String),

    /// Matching failed; the original text is kept
    Fallback { original: String, reason: String },
}

impl StripOutcome {
    pub fn into_text(self) -> String {
        match self {
            StripOutcome::Stripped(text) => text,
            StripOutcome::Fallback { original, .. } => original,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, StripOutcome::Fallback { .. })
    }
}

/// Removes everything outside the begin/end marker region
#[derive(Debug, Clone, Default)]
pub struct MarkerStripper<L = MarkerDetector> {
    locator: L,
}

impl<L: MarkerLocator> MarkerStripper<L> {
    pub fn new(locator: L) -> Self {
        Self { locator }
    }

    /// Drop everything up to the last begin-marker, then everything from the
    /// first end-marker of what remains, then trim.
    pub fn strip(&self, text: &str) -> StripOutcome {
        if text.trim().is_empty() {
            return StripOutcome::Stripped(String::new());
        }

        match self.strip_region(text) {
            Ok(region) => StripOutcome::Stripped(region.trim().to_string()),
            Err(e) => {
                tracing::warn!("Marker stripping failed, keeping original text: {}", e);
                StripOutcome::Fallback {
                    original: text.to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Absent values pass through untouched
    pub fn strip_field(&self, value: Option<&str>) -> Option<StripOutcome> {
        value.map(|text| self.strip(text))
    }

    fn strip_region<'a>(&self, text: &'a str) -> Result<&'a str> {
        let mut region = text;

        if let Some(span) = self.locator.last_begin(region)? {
            region = region.get(span.end..).ok_or_else(|| invalid_span("begin", &span))?;
        }

        if let Some(span) = self.locator.first_end(region)? {
            region = region.get(..span.start).ok_or_else(|| invalid_span("end", &span))?;
        }

        Ok(region)
    }
}

fn invalid_span(kind: &str, span: &Range<usize>) -> AppError {
    AppError::Internal(format!(
        "{} marker span {}..{} is not a valid text range",
        kind, span.start, span.end
    ))
}

/// Begin-marker check with the default, case-insensitive vocabulary
pub fn has_begin_marker(text: &str) -> bool {
    DEFAULT_DETECTOR.has_begin_marker(text)
}

/// End-marker check with the default, case-insensitive vocabulary
pub fn has_end_marker(text: &str) -> bool {
    DEFAULT_DETECTOR.has_end_marker(text)
}

/// Strip with the default vocabulary
pub fn strip_markers(text: &str) -> StripOutcome {
    MarkerStripper::new(&*DEFAULT_DETECTOR).strip(text)
}

impl<T: MarkerLocator + ?Sized> MarkerLocator for &T {
    fn last_begin(&self, text: &str) -> Result<Option<Range<usize>>> {
        (**self).last_begin(text)
    }

    fn first_end(&self, text: &str) -> Result<Option<Range<usize>>> {
        (**self).first_end(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stripped(text: &str) -> String {
        strip_markers(text).into_text()
    }

    #[test]
    fn test_begin_marker_variants() {
        assert!(has_begin_marker("BEGIN_TEXT hello"));
        assert!(has_begin_marker("intro beginning text — body"));
        assert!(has_begin_marker("Begin  __ Text"));
        assert!(!has_begin_marker("begin the text"));
        assert!(!has_begin_marker("end text"));
    }

    #[test]
    fn test_end_marker_variants() {
        assert!(has_end_marker("hi END TEXT bye"));
        assert!(has_end_marker("ending_text"));
        assert!(has_end_marker("ENDING\ttext——"));
        assert!(!has_end_marker("endtext"));
        assert!(!has_end_marker("begin text"));
    }

    #[test]
    fn test_case_sensitive_mode() {
        let upper = MarkerConfig {
            begin_words: vec!["BEGIN".to_string()],
            end_words: vec!["END".to_string()],
            keyword: "TEXT".to_string(),
            case_sensitive: true,
        };
        let strict = MarkerDetector::new(&upper).unwrap();
        assert!(!strict.has_begin_marker("begin text X"));
        assert!(strict.has_begin_marker("BEGIN TEXT X"));

        let relaxed = MarkerDetector::new(&MarkerConfig::default()).unwrap();
        assert!(relaxed.has_begin_marker("begin text X"));
        assert!(relaxed.has_begin_marker("BEGIN TEXT X"));
    }

    #[test]
    fn test_detect_absent_text() {
        let detector = MarkerDetector::default();
        assert!(!detector.detect(None));
        assert!(!detector.detect(Some("")));
        assert!(detector.detect(Some("x end text")));
    }

    #[test]
    fn test_strip_begin_only() {
        assert_eq!(stripped("Sure! BEGIN TEXT — Hello world  "), "Hello world");
        assert_eq!(stripped("begin_text\nline one\nline two"), "line one\nline two");
    }

    #[test]
    fn test_strip_end_only() {
        assert_eq!(stripped("  Hello world END TEXT—— trailing"), "Hello world");
        assert_eq!(stripped("body ending text"), "body");
    }

    #[test]
    fn test_strip_both_markers() {
        assert_eq!(
            stripped("preamble BEGIN TEXT ——— the body END TEXT ——— outro"),
            "the body"
        );
    }

    #[test]
    fn test_strip_end_before_begin() {
        assert_eq!(stripped("a END TEXT b BEGIN TEXT c"), "c");
    }

    #[test]
    fn test_strip_without_markers() {
        assert_eq!(stripped("  plain text, nothing else \n"), "plain text, nothing else");
        assert_eq!(stripped("   "), "");
        assert_eq!(stripped(""), "");
    }

    #[test]
    fn test_strip_is_idempotent() {
        let samples = [
            "begin text a begin text b end text c end text d",
            "BEGIN TEXT —— x",
            "x END TEXT",
            "beginning text beginning text",
            "end text begin text",
            "no markers here",
            "begin_text end_text",
            "  ",
            "weekend text and legend text",
        ];
        for sample in samples {
            let once = stripped(sample);
            assert_eq!(stripped(&once), once, "not idempotent for {:?}", sample);
            assert!(!has_begin_marker(&once));
            assert!(!has_end_marker(&once));
        }
    }

    #[test]
    fn test_strip_field_absent_passthrough() {
        let stripper = MarkerStripper::<MarkerDetector>::default();
        assert_eq!(stripper.strip_field(None), None);
        assert_eq!(
            stripper.strip_field(Some("begin text a")),
            Some(StripOutcome::Stripped("a".to_string()))
        );
    }

    struct FailingLocator;

    impl MarkerLocator for FailingLocator {
        fn last_begin(&self, _text: &str) -> Result<Option<Range<usize>>> {
            Err(AppError::Internal("matcher exploded".to_string()))
        }

        fn first_end(&self, _text: &str) -> Result<Option<Range<usize>>> {
            Ok(None)
        }
    }

    struct OutOfRangeLocator;

    impl MarkerLocator for OutOfRangeLocator {
        fn last_begin(&self, _text: &str) -> Result<Option<Range<usize>>> {
            Ok(None)
        }

        fn first_end(&self, text: &str) -> Result<Option<Range<usize>>> {
            Ok(Some(text.len() + 5..text.len() + 9))
        }
    }

    #[test]
    fn test_locator_failure_falls_back_to_original() {
        let outcome = MarkerStripper::new(FailingLocator).strip("  begin text keep me ");
        assert!(outcome.is_fallback());
        assert_eq!(outcome.clone().into_text(), "  begin text keep me ");
        match outcome {
            StripOutcome::Fallback { reason, .. } => assert!(reason.contains("matcher exploded")),
            StripOutcome::Stripped(_) => panic!("expected fallback"),
        }
    }

    #[test]
    fn test_invalid_span_falls_back_to_original() {
        let outcome = MarkerStripper::new(OutOfRangeLocator).strip("héllo");
        assert_eq!(
            outcome,
            StripOutcome::Fallback {
                original: "héllo".to_string(),
                reason: "Internal error: end marker span 11..15 is not a valid text range"
                    .to_string(),
            }
        );
    }

    #[test]
    fn test_empty_vocabulary_rejected() {
        let config = MarkerConfig {
            begin_words: vec![],
            ..MarkerConfig::default()
        };
        assert!(MarkerDetector::new(&config).is_err());
    }
}
