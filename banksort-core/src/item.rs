//! Item types: the untrusted rows handed over by a question source and the
//! validated items the allocator works with.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Opaque item identifier, stable for the duration of a run.
///
/// Stores hand identifiers out either as JSON strings or integers; both are
/// accepted and kept as text.
///
/// # Examples
///
/// ```
/// use banksort_core::ItemId;
///
/// let from_number: ItemId = serde_json::from_str("42").unwrap();
/// let from_text: ItemId = serde_json::from_str("\"42\"").unwrap();
/// assert_eq!(from_number, from_text);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create an identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Integer(i64),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Text(text) => Self(text),
            Repr::Integer(n) => Self(n.to_string()),
        })
    }
}

/// Difficulty level in the fixed domain `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Difficulty(u8);

impl Difficulty {
    /// Lowest difficulty level.
    pub const MIN: u8 = 1;
    /// Highest difficulty level.
    pub const MAX: u8 = 5;

    /// Create a difficulty, returning `None` outside `1..=5`.
    pub fn new(level: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&level).then_some(Self(level))
    }

    /// Every level of the domain, lowest first.
    pub fn all() -> impl Iterator<Item = Self> {
        (Self::MIN..=Self::MAX).map(Self)
    }

    /// The numeric level.
    pub fn level(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Difficulty {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| format!("difficulty {value} outside 1..=5"))
    }
}

impl From<Difficulty> for i64 {
    fn from(d: Difficulty) -> Self {
        i64::from(d.0)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A candidate row as returned by a question source.
///
/// Everything but the identifier is optional because upstream generation
/// sometimes leaves metadata blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItem {
    pub id: ItemId,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub sub_skill: Option<String>,
    #[serde(default)]
    pub difficulty: Option<i64>,
    #[serde(default)]
    pub set_label: Option<String>,
}

impl RawItem {
    /// Create a fully tagged raw item.
    pub fn new(
        id: impl Into<ItemId>,
        section: impl Into<String>,
        sub_skill: impl Into<String>,
        difficulty: i64,
    ) -> Self {
        Self {
            id: id.into(),
            section: Some(section.into()),
            sub_skill: Some(sub_skill.into()),
            difficulty: Some(difficulty),
            set_label: Some(crate::label::RAW_LABEL.to_string()),
        }
    }

    /// Validate the metadata, producing an [`Item`] or the reason it was refused.
    pub fn validate(self) -> Result<Item, Rejection> {
        let reject = |id: ItemId, reason| Err(Rejection { id, reason });

        let section = match self.section.filter(|s| !s.trim().is_empty()) {
            Some(section) => section,
            None => return reject(self.id, RejectReason::MissingSection),
        };
        let sub_skill = match self.sub_skill.filter(|s| !s.trim().is_empty()) {
            Some(sub_skill) => sub_skill,
            None => return reject(self.id, RejectReason::MissingSubSkill),
        };
        let difficulty = match self.difficulty {
            None | Some(0) => return reject(self.id, RejectReason::MissingDifficulty),
            Some(raw) => match Difficulty::try_from(raw) {
                Ok(difficulty) => difficulty,
                Err(_) => return reject(self.id, RejectReason::DifficultyOutOfRange(raw)),
            },
        };

        Ok(Item {
            id: self.id,
            section,
            sub_skill,
            difficulty,
        })
    }
}

/// A validated item, belonging to exactly one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub section: String,
    pub sub_skill: String,
    pub difficulty: Difficulty,
}

impl Item {
    /// The (section, sub-skill, difficulty) grouping key of this item.
    pub fn cell(&self) -> Cell<'_> {
        Cell {
            section: &self.section,
            sub_skill: &self.sub_skill,
            difficulty: self.difficulty,
        }
    }
}

/// Grouping key used for diagnostic coverage. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell<'a> {
    pub section: &'a str,
    pub sub_skill: &'a str,
    pub difficulty: Difficulty,
}

impl fmt::Display for Cell<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.section, self.sub_skill, self.difficulty)
    }
}

/// Why a raw item was excluded from allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    MissingSection,
    MissingSubSkill,
    MissingDifficulty,
    DifficultyOutOfRange(i64),
    DuplicateId,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSection => write!(f, "missing section"),
            Self::MissingSubSkill => write!(f, "missing sub-skill"),
            Self::MissingDifficulty => write!(f, "missing difficulty"),
            Self::DifficultyOutOfRange(raw) => write!(f, "difficulty {raw} outside 1..=5"),
            Self::DuplicateId => write!(f, "identifier already seen in this pool"),
        }
    }
}

/// A raw item refused by the pool indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub id: ItemId,
    pub reason: RejectReason,
}
