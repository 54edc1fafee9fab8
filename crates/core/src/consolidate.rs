//! De-duplication and consolidation of raw records before cooking.
//!
//! Some deliveries describe one logical item across several files (a book
//! record plus one record per chapter). Records sharing a consolidation key
//! are merged, with an explicit [`AuthorityOrder`] deciding which record wins
//! a conflicting raw key.

use crate::content::ContentSource;
use crate::metadata::RawMetadata;
use serde::Serialize;
use tracing::debug;

/// Which record wins a conflicting raw key during consolidation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthorityOrder {
    /// Input order: records from earlier metadata roles win
    #[default]
    Declaration,
    /// Rank by the value of a raw key; values earlier in `ranking` win and
    /// records with an unranked or missing value come last
    RawValue { key: String, ranking: Vec<String> },
}

impl AuthorityOrder {
    pub fn by_raw_value<I, S>(key: &str, ranking: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::RawValue { key: key.to_lowercase(), ranking: ranking.into_iter().map(Into::into).collect() }
    }

    fn rank(&self, record: &RawMetadata) -> usize {
        match self {
            AuthorityOrder::Declaration => 0,
            AuthorityOrder::RawValue { key, ranking } => record
                .get(key)
                .and_then(|value| ranking.iter().position(|r| r.eq_ignore_ascii_case(value)))
                .unwrap_or(ranking.len()),
        }
    }
}

/// Collapse records sharing the same value for `key` into the first one.
///
/// Later duplicates only contribute raw keys the first record lacks. Records
/// without the key pass through untouched.
pub fn dedupe(records: Vec<RawMetadata>, key: &str) -> Vec<RawMetadata> {
    let mut kept: Vec<RawMetadata> = Vec::with_capacity(records.len());

    for record in records {
        let existing = record
            .get(key)
            .and_then(|value| kept.iter().position(|k| k.get(key) == Some(value)));

        match existing {
            Some(index) => {
                debug!(key, value = record.get(key), "duplicate record merged");
                fill_missing(&mut kept[index], &record);
            }
            None => kept.push(record),
        }
    }

    kept
}

/// Merge records sharing the same value for `key`.
///
/// Groups keep first-appearance order. Within a group the most authoritative
/// record (stable sort by `authority`) provides the base; every other record
/// contributes only keys the base lacks. Records without the key stay on
/// their own.
pub fn consolidate(records: Vec<RawMetadata>, key: &str, authority: &AuthorityOrder) -> Vec<RawMetadata> {
    let mut groups: Vec<(Option<String>, Vec<RawMetadata>)> = Vec::new();

    for record in records {
        let value = record.get(key).map(str::to_string);
        let group = value
            .as_ref()
            .and_then(|v| groups.iter_mut().find(|(gv, _)| gv.as_ref() == Some(v)));

        match group {
            Some((_, members)) => members.push(record),
            None => groups.push((value, vec![record])),
        }
    }

    groups
        .into_iter()
        .map(|(value, mut members)| {
            members.sort_by_key(|m| authority.rank(m));
            let mut iter = members.into_iter();
            let mut merged = iter.next().unwrap_or_default();
            for other in iter {
                fill_missing(&mut merged, &other);
            }
            if let Some(value) = value {
                debug!(key, %value, "records consolidated");
            }
            merged
        })
        .collect()
}

fn fill_missing(target: &mut RawMetadata, other: &RawMetadata) {
    for (key, values) in other.iter() {
        if !target.contains_key(key) {
            target.replace(key, values.to_vec());
        }
    }
    if target.source_url().is_none()
        && let Some(url) = other.source_url()
    {
        target.set_source_url(url);
    }
}

/// Require a file named after a raw value next to the metadata file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameCheck {
    pub raw_key: String,
    pub prefix: String,
    /// Tried in order; the first with content wins
    pub suffixes: Vec<String>,
}

impl FilenameCheck {
    pub fn new<I, S>(raw_key: &str, prefix: impl Into<String>, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            raw_key: raw_key.to_lowercase(),
            prefix: prefix.into(),
            suffixes: suffixes.into_iter().map(Into::into).collect(),
        }
    }
}

/// Outcome of the pre-emit check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PreEmit {
    /// Emit; `primary_url` replaces the full-text URL when a file was found
    Pass { primary_url: Option<String> },
    /// The record describes content that is not in the AU
    Suppress { reason: String },
}

/// Check that the file a record describes exists before emitting it
pub fn pre_emit_check(record: &RawMetadata, check: Option<&FilenameCheck>, source: &dyn ContentSource) -> PreEmit {
    let Some(check) = check else {
        return PreEmit::Pass { primary_url: None };
    };

    let Some(value) = record.get(&check.raw_key) else {
        return PreEmit::Suppress { reason: format!("no value for '{}'", check.raw_key) };
    };

    let dir = record
        .source_url()
        .and_then(|url| url.rfind('/').map(|i| &url[..=i]))
        .unwrap_or_default();

    let found = check
        .suffixes
        .iter()
        .map(|suffix| format!("{}{}{}{}", dir, check.prefix, value, suffix))
        .find(|candidate| source.has_content(candidate));

    match found {
        Some(url) => PreEmit::Pass { primary_url: Some(url) },
        None => PreEmit::Suppress {
            reason: format!("no content for {}{}{}{{{}}}", dir, check.prefix, value, check.suffixes.join(",")),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MemoryContentSource;

    fn record(url: &str, pairs: &[(&str, &str)]) -> RawMetadata {
        let mut raw = RawMetadata::from_source(url);
        for (k, v) in pairs {
            raw.put(k, *v);
        }
        raw
    }

    #[test]
    fn test_dedupe_keeps_first_and_fills_gaps() {
        let records = vec![
            record("a", &[("isbn", "111"), ("title", "First")]),
            record("b", &[("isbn", "222"), ("title", "Other")]),
            record("c", &[("isbn", "111"), ("title", "Dup"), ("lang", "en")]),
            record("d", &[("title", "No key")]),
        ];

        let deduped = dedupe(records, "isbn");
        assert_eq!(deduped.len(), 3);
        assert_eq!(deduped[0].get("title"), Some("First"));
        assert_eq!(deduped[0].get("lang"), Some("en"));
        assert_eq!(deduped[2].get("title"), Some("No key"));
    }

    #[test]
    fn test_consolidate_by_declaration_order() {
        let records = vec![
            record("x/ch1.xml", &[("book-id", "B1"), ("title", "Chapter")]),
            record("x/book.xml", &[("book-id", "B1"), ("title", "Book"), ("isbn", "9780000000002")]),
        ];

        let merged = consolidate(records, "book-id", &AuthorityOrder::Declaration);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].get("title"), Some("Chapter"));
        assert_eq!(merged[0].get("isbn"), Some("9780000000002"));
        assert_eq!(merged[0].source_url(), Some("x/ch1.xml"));
    }

    #[test]
    fn test_consolidate_by_raw_value_ranking() {
        let records = vec![
            record("x/ch1.xml", &[("book-id", "B1"), ("kind", "book-part"), ("title", "Chapter 1")]),
            record("x/ch2.xml", &[("book-id", "B1"), ("kind", "book-part"), ("pages", "20")]),
            record("x/book.xml", &[("book-id", "B1"), ("kind", "book"), ("title", "The Book")]),
            record("y/other.xml", &[("book-id", "B2"), ("kind", "book")]),
        ];

        let authority = AuthorityOrder::by_raw_value("kind", ["book", "book-part"]);
        let merged = consolidate(records, "book-id", &authority);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].get("title"), Some("The Book"));
        assert_eq!(merged[0].get("pages"), Some("20"));
        assert_eq!(merged[0].source_url(), Some("x/book.xml"));
        assert_eq!(merged[1].get("book-id"), Some("B2"));
    }

    #[test]
    fn test_records_without_key_stay_separate() {
        let records = vec![record("a", &[("t", "1")]), record("b", &[("t", "2")])];
        assert_eq!(consolidate(records, "book-id", &AuthorityOrder::Declaration).len(), 2);
    }

    #[test]
    fn test_pre_emit_check() {
        let source = MemoryContentSource::new()
            .with("http://x.org/au/9780000000002.epub", "epub")
            .with("http://x.org/au/9781111111113.pdf", "");
        let check = FilenameCheck::new("isbn", "", [".pdf", ".epub"]);

        let found = record("http://x.org/au/onix.xml", &[("isbn", "9780000000002")]);
        assert_eq!(
            pre_emit_check(&found, Some(&check), &source),
            PreEmit::Pass { primary_url: Some("http://x.org/au/9780000000002.epub".to_string()) }
        );

        let empty = record("http://x.org/au/onix.xml", &[("isbn", "9781111111113")]);
        assert!(matches!(pre_emit_check(&empty, Some(&check), &source), PreEmit::Suppress { .. }));

        let missing = record("http://x.org/au/onix.xml", &[]);
        assert!(matches!(pre_emit_check(&missing, Some(&check), &source), PreEmit::Suppress { .. }));

        assert_eq!(pre_emit_check(&missing, None, &source), PreEmit::Pass { primary_url: None });
    }
}
