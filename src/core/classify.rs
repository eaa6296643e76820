// EximCrunch - core/classify.rs
//
// Classification policy: decides whether a parsed pair is aggregated and
// which side of it owns the record.
// Core layer: pure logic, no I/O.

use crate::core::model::CorrespondencePair;
use crate::util::constants;
use crate::util::error::PatternError;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// How the owner of a pair is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifyMode {
    /// The sender must match the inclusion pattern and always owns the pair.
    #[default]
    SenderAnchored,

    /// Whichever side matches the inclusion pattern owns the pair.
    Symmetric,
}

impl ClassifyMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::SenderAnchored => "sender-anchored",
            Self::Symmetric => "symmetric",
        }
    }
}

impl fmt::Display for ClassifyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ClassifyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sender-anchored" | "sender" => Ok(Self::SenderAnchored),
            "symmetric" => Ok(Self::Symmetric),
            other => Err(format!(
                "unknown classification mode '{other}' (expected 'sender-anchored' or 'symmetric')"
            )),
        }
    }
}

/// Why a pair was not aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// No side of the pair matches the inclusion pattern (or, sender-anchored,
    /// the sender does not).
    NotOfInterest,

    /// Both sides match the inclusion pattern.
    Internal,

    /// The correspondent matches the exclusion pattern.
    Excluded,
}

/// Classification result for one pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Aggregate `correspondent` under `owner`. Both are case-folded.
    Keep { owner: String, correspondent: String },

    Discard(DiscardReason),
}

/// Compiled inclusion/exclusion patterns plus the selected policy.
#[derive(Debug, Clone)]
pub struct Classifier {
    inclusion: Regex,
    exclusion: Regex,
    mode: ClassifyMode,
}

impl Classifier {
    /// Compile both patterns. Either failing is a fatal startup error.
    pub fn new(inclusion: &str, exclusion: &str, mode: ClassifyMode) -> Result<Self, PatternError> {
        Ok(Self {
            inclusion: compile("inclusion", inclusion)?,
            exclusion: compile("exclusion", exclusion)?,
            mode,
        })
    }

    pub fn mode(&self) -> ClassifyMode {
        self.mode
    }

    /// Decide what happens to one pair.
    ///
    /// Patterns see the tokens exactly as they appear in the log; only kept
    /// addresses are lowercased.
    pub fn classify(&self, pair: &CorrespondencePair<'_>) -> Disposition {
        let from_ours = self.inclusion.is_match(pair.from);
        let to_ours = self.inclusion.is_match(pair.to);

        let (owner, correspondent) = match (self.mode, from_ours, to_ours) {
            (_, true, true) => return Disposition::Discard(DiscardReason::Internal),
            (_, true, false) => (pair.from, pair.to),
            (ClassifyMode::Symmetric, false, true) => (pair.to, pair.from),
            _ => return Disposition::Discard(DiscardReason::NotOfInterest),
        };

        if self.exclusion.is_match(correspondent) {
            return Disposition::Discard(DiscardReason::Excluded);
        }

        Disposition::Keep {
            owner: owner.to_ascii_lowercase(),
            correspondent: correspondent.to_ascii_lowercase(),
        }
    }
}

fn compile(field: &'static str, pattern: &str) -> Result<Regex, PatternError> {
    if pattern.len() > constants::MAX_REGEX_PATTERN_LENGTH {
        return Err(PatternError::RegexTooLong {
            field,
            length: pattern.len(),
            max_length: constants::MAX_REGEX_PATTERN_LENGTH,
        });
    }
    Regex::new(pattern).map_err(|e| PatternError::InvalidRegex {
        field,
        pattern: pattern.to_string(),
        source: e,
    })
}
