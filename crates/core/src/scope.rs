//! Root and candidate predicates for one archival unit.
//!
//! A [`ScopeSpec`] holds the uncompiled templates from a plugin definition;
//! [`ScopeSpec::compile`] binds them to an [`AuConfig`] and fails before any
//! URL is looked at if a template is malformed.

use crate::au::AuConfig;
use crate::error::Result;
use crate::template::{PatternTemplate, TemplateContext, UrlTemplate};
use regex::Regex;

/// Uncompiled scope templates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSpec {
    /// URL prefixes under which candidates are searched; empty = whole AU
    pub roots: Vec<UrlTemplate>,
    /// Candidate pattern; `None` accepts every URL under a root
    pub pattern: Option<PatternTemplate>,
    /// Only subtrees whose URL this pattern matches from the start are searched
    pub include: Option<PatternTemplate>,
    /// URLs matching this pattern are never candidates
    pub exclude: Option<PatternTemplate>,
    /// Required MIME type of candidates
    pub mime_type: Option<String>,
}

impl ScopeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile all templates against the AU
    pub fn compile(&self, au: &AuConfig) -> Result<UrlScope> {
        let roots = self
            .roots
            .iter()
            .map(|root| root.expand(au, TemplateContext::Url))
            .collect::<Result<Vec<_>>>()?;

        let candidate = self.pattern.as_ref().map(|p| p.compile(au)).transpose()?;
        let include = self.include.as_ref().map(|p| p.compile(au)).transpose()?;
        let exclude = self.exclude.as_ref().map(|p| p.compile(au)).transpose()?;
        let mime_type = self.mime_type.as_deref().map(base_mime_type);

        Ok(UrlScope { roots, candidate, include, exclude, mime_type })
    }
}

/// Compiled scope predicates
#[derive(Debug, Clone)]
pub struct UrlScope {
    roots: Vec<String>,
    candidate: Option<Regex>,
    include: Option<Regex>,
    exclude: Option<Regex>,
    mime_type: Option<String>,
}

impl UrlScope {
    /// A scope that accepts every URL
    pub fn unrestricted() -> Self {
        Self { roots: Vec::new(), candidate: None, include: None, exclude: None, mime_type: None }
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// ROOT test: the URL lies under one of the expanded roots
    pub fn in_root(&self, url: &str) -> bool {
        self.roots.is_empty() || self.roots.iter().any(|root| url.starts_with(root.as_str()))
    }

    /// Include-subtree test; the pattern must match at the start of the URL
    pub fn is_included(&self, url: &str) -> bool {
        self.include
            .as_ref()
            .is_none_or(|re| re.find(url).is_some_and(|m| m.start() == 0))
    }

    pub fn is_excluded(&self, url: &str) -> bool {
        self.exclude.as_ref().is_some_and(|re| re.is_match(url))
    }

    /// CANDIDATE test
    pub fn matches_candidate(&self, url: &str) -> bool {
        self.candidate.as_ref().is_none_or(|re| re.is_match(url))
    }

    /// MIME filter; parameters such as `charset` are ignored
    pub fn accepts_content_type(&self, content_type: Option<&str>) -> bool {
        match (&self.mime_type, content_type) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(wanted), Some(actual)) => base_mime_type(actual) == *wanted,
        }
    }
}

fn base_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn au() -> AuConfig {
        AuConfig::new().with("base_url", "http://www.clim-past.net/").with("volume", "8")
    }

    fn spec() -> ScopeSpec {
        ScopeSpec {
            roots: vec![UrlTemplate::parse("\"%s%s/\", base_url, volume").unwrap()],
            pattern: Some(PatternTemplate::parse(r#""^%s%s/[0-9]+/[0-9]{4}/[^/]+\.html$", base_url, volume"#).unwrap()),
            include: None,
            exclude: Some(PatternTemplate::parse(r#""^%s%s/suppl/", base_url, volume"#).unwrap()),
            mime_type: Some("text/html".to_string()),
        }
    }

    #[test]
    fn test_root_and_candidate() {
        let scope = spec().compile(&au()).unwrap();

        assert_eq!(scope.roots(), &["http://www.clim-past.net/8/".to_string()]);
        assert!(scope.in_root("http://www.clim-past.net/8/1/2012/cp-8-1-2012.html"));
        assert!(!scope.in_root("http://www.clim-past.net/9/1/2012/cp-9-1-2012.html"));
        assert!(scope.matches_candidate("http://www.clim-past.net/8/1/2012/cp-8-1-2012.html"));
        assert!(!scope.matches_candidate("http://www.clim-past.net/8/1/2012/cp-8-1-2012.pdf"));
    }

    #[test]
    fn test_exclude() {
        let scope = spec().compile(&au()).unwrap();
        assert!(scope.is_excluded("http://www.clim-past.net/8/suppl/1/2012/x.html"));
        assert!(!scope.is_excluded("http://www.clim-past.net/8/1/2012/x.html"));
    }

    #[test]
    fn test_include_subtree() {
        let include_spec = ScopeSpec {
            include: Some(PatternTemplate::parse(r#""%s%s/[0-9]+/2012/", base_url, volume"#).unwrap()),
            ..spec()
        };
        let scope = include_spec.compile(&au()).unwrap();

        assert!(scope.is_included("http://www.clim-past.net/8/1/2012/cp-8-1-2012.html"));
        assert!(!scope.is_included("http://www.clim-past.net/8/1/2011/cp-8-1-2011.html"));
        assert!(!scope.is_included("http://mirror.org/http://www.clim-past.net/8/1/2012/x.html"));
        assert!(spec().compile(&au()).unwrap().is_included("http://mirror.org/x.html"));
    }

    #[test]
    fn test_mime_filter_ignores_parameters() {
        let scope = spec().compile(&au()).unwrap();
        assert!(scope.accepts_content_type(Some("text/html; charset=UTF-8")));
        assert!(scope.accepts_content_type(Some("TEXT/HTML")));
        assert!(!scope.accepts_content_type(Some("application/pdf")));
        assert!(!scope.accepts_content_type(None));
    }

    #[test]
    fn test_compile_fails_before_matching() {
        let au = AuConfig::new().with("base_url", "http://www.clim-past.net/");
        assert!(spec().compile(&au).is_err());
    }

    #[test]
    fn test_unrestricted() {
        let scope = UrlScope::unrestricted();
        assert!(scope.in_root("anything"));
        assert!(scope.matches_candidate("anything"));
        assert!(scope.is_included("anything"));
        assert!(!scope.is_excluded("anything"));
        assert!(scope.accepts_content_type(None));
    }
}
