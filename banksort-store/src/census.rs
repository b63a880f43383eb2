//! Label census: how many items of a test type carry each label.

use std::collections::HashMap;

use banksort_core::RAW_LABEL;
use serde::Serialize;

use crate::error::Result;
use crate::traits::{CensusRow, QuestionSource};

const UNLABELED: &str = "(none)";
const UNKNOWN_SECTION: &str = "(unknown)";

/// Per-label counts, plus a per-section breakdown of raw items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelCensus {
    pub test_type: String,
    /// Sorted by descending count, then label.
    pub labels: Vec<(String, usize)>,
    /// Raw items per section, sorted like `labels`. Empty when nothing is raw.
    pub raw_sections: Vec<(String, usize)>,
    pub total: usize,
}

impl LabelCensus {
    /// Tally `rows`.
    pub fn from_rows(test_type: impl Into<String>, rows: &[CensusRow]) -> Self {
        let mut labels: HashMap<&str, usize> = HashMap::new();
        let mut raw_sections: HashMap<&str, usize> = HashMap::new();

        for row in rows {
            let label = row.set_label.as_deref().unwrap_or(UNLABELED);
            *labels.entry(label).or_default() += 1;
            if label == RAW_LABEL {
                let section = row.section.as_deref().unwrap_or(UNKNOWN_SECTION);
                *raw_sections.entry(section).or_default() += 1;
            }
        }

        Self {
            test_type: test_type.into(),
            labels: ranked(labels),
            raw_sections: ranked(raw_sections),
            total: rows.len(),
        }
    }

    /// Items still carrying the raw label.
    pub fn raw(&self) -> usize {
        self.raw_sections.iter().map(|(_, n)| n).sum()
    }
}

fn ranked(counts: HashMap<&str, usize>) -> Vec<(String, usize)> {
    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(key, n)| (key.to_string(), n))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Fetch and tally the labels of every item of `test_type`.
pub async fn census<S: QuestionSource + ?Sized>(source: &S, test_type: &str) -> Result<LabelCensus> {
    let rows = source.fetch_census(test_type).await?;
    Ok(LabelCensus::from_rows(test_type, &rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(label: Option<&str>, section: &str) -> CensusRow {
        CensusRow {
            set_label: label.map(str::to_string),
            section: Some(section.to_string()),
        }
    }

    #[test]
    fn counts_sort_by_count_then_label() {
        let rows = vec![
            row(Some("practice_2"), "Mathematics"),
            row(Some("diagnostic"), "Mathematics"),
            row(Some("practice_1"), "Mathematics"),
            row(Some("practice_1"), "Verbal Reasoning"),
            row(None, "Mathematics"),
        ];
        let census = LabelCensus::from_rows("EduTest", &rows);

        assert_eq!(
            census.labels,
            vec![
                ("practice_1".to_string(), 2),
                ("(none)".to_string(), 1),
                ("diagnostic".to_string(), 1),
                ("practice_2".to_string(), 1),
            ]
        );
        assert_eq!(census.total, 5);
        assert_eq!(census.raw(), 0);
        assert!(census.raw_sections.is_empty());
    }

    #[test]
    fn raw_items_are_broken_down_by_section() {
        let rows = vec![
            row(Some("raw"), "Mathematics"),
            row(Some("raw"), "Verbal Reasoning"),
            row(Some("raw"), "Verbal Reasoning"),
            row(Some("diagnostic"), "Mathematics"),
        ];
        let census = LabelCensus::from_rows("EduTest", &rows);

        assert_eq!(census.raw(), 3);
        assert_eq!(census.raw_sections[0], ("Verbal Reasoning".to_string(), 2));
        assert_eq!(census.raw_sections[1], ("Mathematics".to_string(), 1));
        assert_eq!(census.labels[0], ("raw".to_string(), 3));
    }
}
