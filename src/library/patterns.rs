use std::path::Path;

use chrono::NaiveDate;
use regex::{Captures, Regex};
use tracing::{debug, warn};

use super::models::RawMatch;
use crate::error::{Error, Result};

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// How a rule's captures map onto episode information.
///
/// The indices point at the named groups `S`/`E` or `Y`/`M`/`D` in the rule's regex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    SeasonEpisode { season: usize, episode: usize },
    DateBased { year: usize, month: usize, day: usize },
}

#[derive(Debug, Clone)]
pub struct PatternRule {
    regex: Regex,
    kind: PatternKind,
}

impl PatternRule {
    /// Compile a rule, inferring its kind from the named groups it declares
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| Error::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        let group = |name: &str| {
            regex
                .capture_names()
                .position(|n| n == Some(name))
        };

        let kind = match (group("S"), group("E"), group("Y"), group("M"), group("D")) {
            (Some(season), Some(episode), _, _, _) => PatternKind::SeasonEpisode { season, episode },
            (_, _, Some(year), Some(month), Some(day)) => PatternKind::DateBased { year, month, day },
            _ => {
                return Err(Error::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: "needs named groups S and E, or Y, M and D".to_string(),
                });
            }
        };

        Ok(Self { regex, kind })
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Match against a filename. Captures that don't convert (overflow, impossible date) count as no match.
    pub fn extract(&self, filename: &str, source_file: &Path) -> Option<RawMatch> {
        let caps = self.regex.captures(filename)?;
        let start = caps.get(0)?.start();

        let mut raw = RawMatch {
            show_name_fragment: filename[..start].to_string(),
            season: None,
            episode: None,
            air_date: None,
            source_file: source_file.to_path_buf(),
        };

        match self.kind {
            PatternKind::SeasonEpisode { season, episode } => {
                raw.season = Some(number(&caps, season)?);
                raw.episode = Some(number(&caps, episode)?);
            }
            PatternKind::DateBased { year, month, day } => {
                let y = number(&caps, year)? as i32;
                let m = month_number(caps.get(month)?.as_str())?;
                let d = number(&caps, day)?;
                raw.air_date = Some(NaiveDate::from_ymd_opt(y, m, d)?);
            }
        }

        Some(raw)
    }
}

fn number(caps: &Captures<'_>, index: usize) -> Option<u32> {
    caps.get(index)?.as_str().parse().ok()
}

/// Accepts `03` as well as `Mar`, `mar`, `MARCH`
fn month_number(text: &str) -> Option<u32> {
    if let Ok(n) = text.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    let prefix: String = text.chars().take(3).collect::<String>().to_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == prefix)
        .map(|i| i as u32 + 1)
}

/// Ordered rule list; the first rule that matches decides the classification
#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    rules: Vec<PatternRule>,
}

impl PatternRegistry {
    pub fn new(rules: Vec<PatternRule>) -> Self {
        Self { rules }
    }

    /// Build from config lines, skipping (and logging) lines that don't compile
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let rules = lines
            .iter()
            .map(|l| l.as_ref().trim())
            .filter(|l| !l.is_empty())
            .filter_map(|line| match PatternRule::new(line) {
                Ok(rule) => Some(rule),
                Err(e) => {
                    warn!(pattern = %line, error = %e, "Skipping pattern");
                    None
                }
            })
            .collect();
        Self { rules }
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// Mutable access so callers can reorder precedence
    pub fn rules_mut(&mut self) -> &mut Vec<PatternRule> {
        &mut self.rules
    }

    pub fn classify(&self, source_file: &Path) -> Option<RawMatch> {
        let filename = source_file.file_name()?.to_string_lossy();
        self.classify_name(&filename, source_file)
    }

    pub fn classify_name(&self, filename: &str, source_file: &Path) -> Option<RawMatch> {
        for rule in &self.rules {
            if let Some(raw) = rule.extract(filename, source_file) {
                debug!(file = %filename, pattern = %rule.as_str(), "Matched pattern");
                return Some(raw);
            }
        }
        debug!(file = %filename, "No pattern matched");
        None
    }
}
