use crate::error::{QuireError, Result};
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use url::Url;

static DOI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^10\.\d{4,9}/\S+$").expect("DOI pattern"));
static ISSN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{3}[\dX]$").expect("ISSN pattern"));

const DOI_PREFIXES: [&str; 6] = [
    "doi:",
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi.org/",
];

/// Number of values a field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Single,
    Multi,
}

/// Canonical, publisher-independent metadata field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetadataField {
    Doi,
    Issn,
    Eissn,
    Isbn,
    Eisbn,
    Publisher,
    Provider,
    PublicationType,
    ArticleType,
    PublicationTitle,
    SeriesTitle,
    ArticleTitle,
    Author,
    Volume,
    Issue,
    StartPage,
    EndPage,
    Date,
    Keywords,
    Language,
    Format,
    ProprietaryIdentifier,
    AccessUrl,
}

impl MetadataField {
    pub const ALL: [MetadataField; 23] = [
        MetadataField::Doi,
        MetadataField::Issn,
        MetadataField::Eissn,
        MetadataField::Isbn,
        MetadataField::Eisbn,
        MetadataField::Publisher,
        MetadataField::Provider,
        MetadataField::PublicationType,
        MetadataField::ArticleType,
        MetadataField::PublicationTitle,
        MetadataField::SeriesTitle,
        MetadataField::ArticleTitle,
        MetadataField::Author,
        MetadataField::Volume,
        MetadataField::Issue,
        MetadataField::StartPage,
        MetadataField::EndPage,
        MetadataField::Date,
        MetadataField::Keywords,
        MetadataField::Language,
        MetadataField::Format,
        MetadataField::ProprietaryIdentifier,
        MetadataField::AccessUrl,
    ];

    /// Key used in emitted records
    pub fn key(self) -> &'static str {
        match self {
            MetadataField::Doi => "doi",
            MetadataField::Issn => "issn",
            MetadataField::Eissn => "eissn",
            MetadataField::Isbn => "isbn",
            MetadataField::Eisbn => "eisbn",
            MetadataField::Publisher => "publisher",
            MetadataField::Provider => "provider",
            MetadataField::PublicationType => "publication.type",
            MetadataField::ArticleType => "article.type",
            MetadataField::PublicationTitle => "publication.title",
            MetadataField::SeriesTitle => "series.title",
            MetadataField::ArticleTitle => "article.title",
            MetadataField::Author => "author",
            MetadataField::Volume => "volume",
            MetadataField::Issue => "issue",
            MetadataField::StartPage => "startpage",
            MetadataField::EndPage => "endpage",
            MetadataField::Date => "date",
            MetadataField::Keywords => "keywords",
            MetadataField::Language => "language",
            MetadataField::Format => "format",
            MetadataField::ProprietaryIdentifier => "propid",
            MetadataField::AccessUrl => "access.url",
        }
    }

    pub fn cardinality(self) -> Cardinality {
        match self {
            MetadataField::Author | MetadataField::Keywords => Cardinality::Multi,
            _ => Cardinality::Single,
        }
    }

    pub fn is_multi(self) -> bool {
        self.cardinality() == Cardinality::Multi
    }

    /// Normalise a raw value, or explain why it is not acceptable.
    ///
    /// Identifier checks are form checks only; check digits are not verified.
    pub fn validate(self, value: &str) -> std::result::Result<String, String> {
        let value = value.trim();
        if value.is_empty() {
            return Err("empty value".to_string());
        }

        match self {
            MetadataField::Doi => normalize_doi(value),
            MetadataField::Issn | MetadataField::Eissn => normalize_issn(value),
            MetadataField::Isbn | MetadataField::Eisbn => normalize_isbn(value),
            MetadataField::Author => {
                if value.chars().any(char::is_alphabetic) {
                    Ok(value.to_string())
                } else {
                    Err("author name has no letters".to_string())
                }
            }
            MetadataField::AccessUrl => Url::parse(value)
                .map(|_| value.to_string())
                .map_err(|e| format!("not a URL: {}", e)),
            _ => Ok(value.to_string()),
        }
    }
}

fn normalize_doi(value: &str) -> std::result::Result<String, String> {
    let lower = value.to_ascii_lowercase();
    let stripped = DOI_PREFIXES
        .iter()
        .find(|prefix| lower.starts_with(*prefix))
        .map(|prefix| value[prefix.len()..].trim())
        .unwrap_or(value);

    if DOI_RE.is_match(stripped) {
        Ok(stripped.to_string())
    } else {
        Err("does not look like a DOI".to_string())
    }
}

fn normalize_issn(value: &str) -> std::result::Result<String, String> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_ascii_uppercase();
    let candidate = if compact.is_ascii() && compact.len() == 8 && !compact.contains('-') {
        format!("{}-{}", &compact[..4], &compact[4..])
    } else {
        compact
    };

    if ISSN_RE.is_match(&candidate) {
        Ok(candidate)
    } else {
        Err("does not look like an ISSN".to_string())
    }
}

fn normalize_isbn(value: &str) -> std::result::Result<String, String> {
    let compact: String = value
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();

    let valid = match compact.len() {
        10 => {
            let (body, check) = compact.split_at(9);
            body.chars().all(|c| c.is_ascii_digit()) && check.chars().all(|c| c.is_ascii_digit() || c == 'X')
        }
        13 => compact.chars().all(|c| c.is_ascii_digit()),
        _ => false,
    };

    if valid { Ok(compact) } else { Err("does not look like an ISBN".to_string()) }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for MetadataField {
    type Err = QuireError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|field| field.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| QuireError::UnknownField(s.to_string()))
    }
}

impl Serialize for MetadataField {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}
