//! Set labels: the persisted names of the partitions an item can land in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Sentinel label carried by items no set has claimed yet.
pub const RAW_LABEL: &str = "raw";

/// Label of the single diagnostic set.
pub const DIAGNOSTIC_LABEL: &str = "diagnostic";

/// Prefix of practice-instance labels (`practice_1`, `practice_2`, ...).
pub const PRACTICE_PREFIX: &str = "practice_";

/// Prefix of drill-bucket labels (`drill-logical-deduction`, ...).
pub const DRILL_PREFIX: &str = "drill-";

/// Replaces whitespace in sub-skill names when deriving drill labels.
pub const DRILL_SEPARATOR: char = '-';

/// Destination partition for an item.
///
/// # Examples
///
/// ```
/// use banksort_core::SetLabel;
///
/// assert_eq!(SetLabel::Diagnostic.to_string(), "diagnostic");
/// assert_eq!(SetLabel::Practice(3).to_string(), "practice_3");
/// assert_eq!(
///     SetLabel::drill_for("Logical Deduction").to_string(),
///     "drill-logical-deduction"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SetLabel {
    /// One-per-cell coverage sample.
    Diagnostic,
    /// Practice instance, numbered from 1.
    Practice(u32),
    /// Leftover bucket; holds the slug derived from a sub-skill name.
    Drill(String),
}

impl SetLabel {
    /// Derive the drill label for a sub-skill: whitespace becomes `-`, then
    /// the whole name is lower-cased.
    pub fn drill_for(sub_skill: &str) -> Self {
        let slug: String = sub_skill
            .chars()
            .map(|c| if c.is_whitespace() { DRILL_SEPARATOR } else { c })
            .collect();
        Self::Drill(slug.to_lowercase())
    }

    /// Whether this label names a drill bucket.
    pub fn is_drill(&self) -> bool {
        matches!(self, Self::Drill(_))
    }
}

impl fmt::Display for SetLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Diagnostic => f.write_str(DIAGNOSTIC_LABEL),
            Self::Practice(n) => write!(f, "{PRACTICE_PREFIX}{n}"),
            Self::Drill(slug) => write!(f, "{DRILL_PREFIX}{slug}"),
        }
    }
}

impl FromStr for SetLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == DIAGNOSTIC_LABEL {
            return Ok(Self::Diagnostic);
        }
        if let Some(n) = s.strip_prefix(PRACTICE_PREFIX)
            && let Ok(n) = n.parse::<u32>()
            && n > 0
        {
            return Ok(Self::Practice(n));
        }
        if let Some(slug) = s.strip_prefix(DRILL_PREFIX)
            && !slug.is_empty()
        {
            return Ok(Self::Drill(slug.to_string()));
        }
        Err(Error::InvalidLabel(s.to_string()))
    }
}

impl TryFrom<String> for SetLabel {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SetLabel> for String {
    fn from(label: SetLabel) -> Self {
        label.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drill_label_replaces_every_whitespace_character() {
        assert_eq!(
            SetLabel::drill_for("Pattern  Recognition").to_string(),
            "drill-pattern--recognition"
        );
        assert_eq!(
            SetLabel::drill_for("Spatial\tReasoning").to_string(),
            "drill-spatial-reasoning"
        );
    }

    #[test]
    fn labels_parse_from_their_display_form() {
        for label in [
            SetLabel::Diagnostic,
            SetLabel::Practice(5),
            SetLabel::drill_for("Logical Deduction"),
        ] {
            assert_eq!(label.to_string().parse::<SetLabel>().unwrap(), label);
        }
    }

    #[test]
    fn raw_and_malformed_labels_do_not_parse() {
        for bad in [RAW_LABEL, "practice_0", "practice_x", "drill-", "mock"] {
            assert!(bad.parse::<SetLabel>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn labels_serialize_as_strings() {
        let json = serde_json::to_string(&SetLabel::Practice(2)).unwrap();
        assert_eq!(json, "\"practice_2\"");
        let back: SetLabel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SetLabel::Practice(2));
    }
}
