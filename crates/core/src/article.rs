//! Article data model: roles, keys, and the assembled file set.

use crate::error::{QuireError, Result};
use regex::Captures;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The part an archived file plays in a logical article
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    FullTextPdf,
    FullTextHtml,
    FullTextEpub,
    Abstract,
    Citation,
    CitationBibtex,
    CitationEndnote,
    CitationRefworks,
    CitationRis,
    ArticleMetadata,
    IssueMetadata,
    References,
    SupplementaryMaterials,
    /// Source-specific role, written `custom(name)` in plugin files
    Custom(String),
}

impl Role {
    /// Built-in roles with their plugin-file names
    const NAMED: [(&'static str, Role); 13] = [
        ("full_text_pdf", Role::FullTextPdf),
        ("full_text_html", Role::FullTextHtml),
        ("full_text_epub", Role::FullTextEpub),
        ("abstract", Role::Abstract),
        ("citation", Role::Citation),
        ("citation_bibtex", Role::CitationBibtex),
        ("citation_endnote", Role::CitationEndnote),
        ("citation_refworks", Role::CitationRefworks),
        ("citation_ris", Role::CitationRis),
        ("article_metadata", Role::ArticleMetadata),
        ("issue_metadata", Role::IssueMetadata),
        ("references", Role::References),
        ("supplementary_materials", Role::SupplementaryMaterials),
    ];

    pub fn custom(name: impl Into<String>) -> Self {
        Role::Custom(name.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::FullTextPdf => "full_text_pdf",
            Role::FullTextHtml => "full_text_html",
            Role::FullTextEpub => "full_text_epub",
            Role::Abstract => "abstract",
            Role::Citation => "citation",
            Role::CitationBibtex => "citation_bibtex",
            Role::CitationEndnote => "citation_endnote",
            Role::CitationRefworks => "citation_refworks",
            Role::CitationRis => "citation_ris",
            Role::ArticleMetadata => "article_metadata",
            Role::IssueMetadata => "issue_metadata",
            Role::References => "references",
            Role::SupplementaryMaterials => "supplementary_materials",
            Role::Custom(name) => name,
        }
    }

    /// Parse a comma-separated role list
    pub fn parse_list(list: &str) -> Result<Vec<Role>> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Role::from_str)
            .collect()
    }
}

impl FromStr for Role {
    type Err = QuireError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();

        if let Some((_, role)) = Self::NAMED.iter().find(|(name, _)| name.eq_ignore_ascii_case(s)) {
            return Ok(role.clone());
        }

        if let Some(name) = s.strip_prefix("custom(").and_then(|r| r.strip_suffix(')')) {
            let name = name.trim();
            let shadows_builtin = Self::NAMED.iter().any(|(builtin, _)| builtin.eq_ignore_ascii_case(name));
            if !name.is_empty() && !shadows_builtin {
                return Ok(Role::Custom(name.to_string()));
            }
        }

        Err(QuireError::UnknownRole(s.to_string()))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// How far resolution goes for each candidate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataTarget {
    /// Count articles only; secondary aspects are not derived
    Article,
    /// Derive every aspect and cook metadata
    #[default]
    Metadata,
}

impl MetadataTarget {
    pub fn is_article_only(self) -> bool {
        self == MetadataTarget::Article
    }
}

impl FromStr for MetadataTarget {
    type Err = QuireError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "article" => Ok(Self::Article),
            "metadata" => Ok(Self::Metadata),
            _ => Err(QuireError::ConfigError(format!(
                "Invalid target: {}. Valid options: article, metadata",
                s
            ))),
        }
    }
}

/// Canonical grouping identifier of a logical article.
///
/// Built from the URL that first matched an aspect pattern: the text before
/// the match, the capture groups, and the text after it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ArticleKey {
    prefix: String,
    captures: Vec<String>,
    suffix: String,
}

impl ArticleKey {
    pub fn new(prefix: impl Into<String>, captures: Vec<String>, suffix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), captures, suffix: suffix.into() }
    }

    /// Key for `url` from a successful match against it
    pub fn from_match(url: &str, caps: &Captures<'_>) -> Self {
        let Some(whole) = caps.get(0) else {
            return Self::new(url, Vec::new(), "");
        };

        let captures = caps
            .iter()
            .skip(1)
            .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect();

        Self::new(&url[..whole.start()], captures, &url[whole.end()..])
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn captures(&self) -> &[String] {
        &self.captures
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl fmt::Display for ArticleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]{}", self.prefix, self.captures.join("|"), self.suffix)
    }
}

/// The files of one completed article
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleFiles {
    key: ArticleKey,
    full_text_url: String,
    roles: BTreeMap<Role, String>,
}

impl ArticleFiles {
    pub fn new(key: ArticleKey, full_text_url: impl Into<String>, roles: BTreeMap<Role, String>) -> Self {
        Self { key, full_text_url: full_text_url.into(), roles }
    }

    pub fn key(&self) -> &ArticleKey {
        &self.key
    }

    /// The URL chosen by the full-text preference list
    pub fn full_text_url(&self) -> &str {
        &self.full_text_url
    }

    pub fn role_url(&self, role: &Role) -> Option<&str> {
        self.roles.get(role).map(String::as_str)
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains_key(role)
    }

    pub fn roles(&self) -> impl Iterator<Item = (&Role, &str)> {
        self.roles.iter().map(|(r, u)| (r, u.as_str()))
    }
}
