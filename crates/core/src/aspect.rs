//! Aspect map: which URL patterns fill which roles, and how one aspect's URL
//! is derived from another's.
//!
//! Derivation is speculative. A replacement only fills a role when the
//! derived URL exists with content in the [`ContentSource`].
//!
//! ```rust
//! use quire_core::{AspectMap, Role};
//!
//! let map = AspectMap::builder()
//!     .add_pattern_aspect(r"/([^/]+)\.pdf$", "/$1.pdf", [Role::FullTextPdf])
//!     .add_pattern_aspect(r"/([^/]+)\.html$", "/$1.html", [Role::FullTextHtml])
//!     .set_full_text_from_roles([Role::FullTextPdf, Role::FullTextHtml])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(map.aspects().len(), 2);
//! ```

use crate::article::Role;
use crate::content::ContentSource;
use crate::error::{QuireError, Result};
use crate::template::compile_regex;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static BACKREF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$(\d+)").expect("backreference pattern"));

/// One aspect pattern as written in a plugin definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AspectPattern {
    pub pattern: String,
    pub case_insensitive: bool,
}

/// Uncompiled aspect: patterns, replacement templates, and roles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AspectSpec {
    pub patterns: Vec<AspectPattern>,
    pub replacements: Vec<String>,
    pub roles: Vec<Role>,
}

impl AspectSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(AspectPattern { pattern: pattern.into(), case_insensitive: false });
        self
    }

    pub fn pattern_case_insensitive(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(AspectPattern { pattern: pattern.into(), case_insensitive: true });
        self
    }

    pub fn replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacements.push(replacement.into());
        self
    }

    pub fn roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.roles.extend(roles);
        self
    }

    fn compile(&self, index: usize) -> Result<Aspect> {
        if self.roles.is_empty() {
            return Err(QuireError::ConfigError(format!("Aspect {} has no roles", index + 1)));
        }
        if self.patterns.is_empty() && self.replacements.is_empty() {
            return Err(QuireError::ConfigError(format!(
                "Aspect {} ({}) has neither a pattern nor a replacement",
                index + 1,
                self.roles[0]
            )));
        }

        let patterns = self
            .patterns
            .iter()
            .map(|p| compile_regex(&p.pattern, p.case_insensitive))
            .collect::<Result<Vec<_>>>()?;

        let replacements = self
            .replacements
            .iter()
            .map(|r| BACKREF.replace_all(r, "$${${1}}").into_owned())
            .collect();

        Ok(Aspect { patterns, replacements, roles: self.roles.clone() })
    }
}

/// A compiled aspect
#[derive(Debug, Clone)]
pub struct Aspect {
    patterns: Vec<Regex>,
    replacements: Vec<String>,
    roles: Vec<Role>,
}

impl Aspect {
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Aspect that is never matched directly, only derived
    pub fn is_derivation_only(&self) -> bool {
        self.patterns.is_empty()
    }

    /// First pattern of this aspect that matches the URL
    pub fn find_match<'u>(&self, url: &'u str) -> Option<(&Regex, Captures<'u>)> {
        self.patterns.iter().find_map(|re| re.captures(url).map(|caps| (re, caps)))
    }

    /// Apply each replacement to the first match of `matcher` in `url` and
    /// return the first derived URL that is present with content.
    pub fn derive(&self, matcher: &Regex, url: &str, source: &dyn ContentSource) -> Option<String> {
        if !matcher.is_match(url) {
            return None;
        }

        self.replacements.iter().find_map(|replacement| {
            let candidate = matcher.replacen(url, 1, replacement.as_str()).into_owned();
            if source.exists(&candidate) && source.has_content(&candidate) {
                Some(candidate)
            } else {
                tracing::trace!(url = %candidate, "derived URL not present");
                None
            }
        })
    }
}

/// Builder for [`AspectMap`]
#[derive(Debug, Clone, Default)]
pub struct AspectMapBuilder {
    aspects: Vec<AspectSpec>,
    full_text_roles: Vec<Role>,
    role_from_other_roles: Vec<(Role, Vec<Role>)>,
}

impl AspectMapBuilder {
    /// Register an aspect
    pub fn add_aspect(mut self, aspect: AspectSpec) -> Self {
        self.aspects.push(aspect);
        self
    }

    /// Register an aspect with one pattern and one replacement
    pub fn add_pattern_aspect(
        self, pattern: impl Into<String>, replacement: impl Into<String>, roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        self.add_aspect(AspectSpec::new().pattern(pattern).replacement(replacement).roles(roles))
    }

    /// Register an aspect that is only ever derived from other aspects
    pub fn add_derived_aspect(self, replacement: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        self.add_aspect(AspectSpec::new().replacement(replacement).roles(roles))
    }

    /// Ordered full-text preference
    pub fn set_full_text_from_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.full_text_roles = roles.into_iter().collect();
        self
    }

    /// Fill `target` from the first populated source role when it is empty
    pub fn set_role_from_other_roles(mut self, target: Role, sources: impl IntoIterator<Item = Role>) -> Self {
        self.role_from_other_roles.push((target, sources.into_iter().collect()));
        self
    }

    pub fn build(self) -> Result<AspectMap> {
        if self.aspects.is_empty() {
            return Err(QuireError::ConfigError("No aspects defined".to_string()));
        }
        if self.aspects.iter().all(|a| a.patterns.is_empty()) {
            return Err(QuireError::ConfigError("No aspect has a pattern to match".to_string()));
        }

        let aspects = self
            .aspects
            .iter()
            .enumerate()
            .map(|(i, spec)| spec.compile(i))
            .collect::<Result<Vec<_>>>()?;

        for role in &self.full_text_roles {
            let produced = aspects.iter().any(|a| a.roles.contains(role))
                || self.role_from_other_roles.iter().any(|(target, _)| target == role);
            if !produced {
                return Err(QuireError::ConfigError(format!(
                    "Full-text role {} is not produced by any aspect",
                    role
                )));
            }
        }

        Ok(AspectMap {
            aspects,
            full_text_roles: self.full_text_roles,
            role_from_other_roles: self.role_from_other_roles,
        })
    }
}

/// Immutable, compiled aspect map
#[derive(Debug, Clone)]
pub struct AspectMap {
    aspects: Vec<Aspect>,
    full_text_roles: Vec<Role>,
    role_from_other_roles: Vec<(Role, Vec<Role>)>,
}

impl AspectMap {
    pub fn builder() -> AspectMapBuilder {
        AspectMapBuilder::default()
    }

    pub fn aspects(&self) -> &[Aspect] {
        &self.aspects
    }

    pub fn full_text_roles(&self) -> &[Role] {
        &self.full_text_roles
    }

    pub fn role_from_other_roles(&self) -> &[(Role, Vec<Role>)] {
        &self.role_from_other_roles
    }

    /// First aspect, in declaration order, with a pattern matching the URL
    pub fn first_match<'u>(&self, url: &'u str) -> Option<(usize, &Regex, Captures<'u>)> {
        self.aspects
            .iter()
            .enumerate()
            .find_map(|(i, aspect)| aspect.find_match(url).map(|(re, caps)| (i, re, caps)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MemoryContentSource;

    const BASE: &str = "http://www.clim-past.net/8/1/2012/cp-8-1-2012";

    fn map() -> AspectMap {
        AspectMap::builder()
            .add_pattern_aspect(r"/([^/]+)\.pdf$", "/$1.pdf", [Role::FullTextPdf])
            .add_pattern_aspect(r"/([^/]+)\.html$", "/$1.html", [Role::FullTextHtml, Role::Abstract])
            .add_derived_aspect("/$1.ris", [Role::CitationRis])
            .set_full_text_from_roles([Role::FullTextPdf, Role::FullTextHtml])
            .build()
            .unwrap()
    }

    #[test]
    fn test_first_match_in_declaration_order() {
        let map = map();
        let url = format!("{}.html", BASE);
        let (index, _, caps) = map.first_match(&url).unwrap();

        assert_eq!(index, 1);
        assert_eq!(&caps[1], "cp-8-1-2012");
        assert!(map.first_match("http://www.clim-past.net/8/index.txt").is_none());
    }

    #[test]
    fn test_derive_requires_content() {
        let map = map();
        let html = format!("{}.html", BASE);
        let (_, matcher, _) = map.first_match(&html).unwrap();
        let matcher = matcher.clone();

        let mut source = MemoryContentSource::new();
        source.insert(format!("{}.pdf", BASE), "%PDF").insert(format!("{}.ris", BASE), "");

        assert_eq!(
            map.aspects()[0].derive(&matcher, &html, &source),
            Some(format!("{}.pdf", BASE))
        );
        assert_eq!(map.aspects()[2].derive(&matcher, &html, &source), None);
    }

    #[test]
    fn test_derive_tries_replacements_in_order() {
        let aspect = AspectSpec::new()
            .replacement("/$1_full.pdf")
            .replacement("/$1.pdf")
            .roles([Role::FullTextPdf])
            .compile(0)
            .unwrap();
        let matcher = Regex::new(r"/([^/]+)\.html$").unwrap();
        let html = format!("{}.html", BASE);

        let source = MemoryContentSource::new().with(format!("{}.pdf", BASE), "%PDF");
        assert_eq!(aspect.derive(&matcher, &html, &source), Some(format!("{}.pdf", BASE)));

        let source = source.with(format!("{}_full.pdf", BASE), "%PDF");
        assert_eq!(aspect.derive(&matcher, &html, &source), Some(format!("{}_full.pdf", BASE)));
    }

    #[test]
    fn test_backreference_followed_by_text() {
        let aspect = AspectSpec::new().replacement("/$1_abs.html").roles([Role::Abstract]).compile(0).unwrap();
        let matcher = Regex::new(r"/([^/]+)\.pdf$").unwrap();
        let source = MemoryContentSource::new().with(format!("{}_abs.html", BASE), "<html/>");

        assert_eq!(
            aspect.derive(&matcher, &format!("{}.pdf", BASE), &source),
            Some(format!("{}_abs.html", BASE))
        );
    }

    #[test]
    fn test_case_insensitive_aspect_pattern() {
        let map = AspectMap::builder()
            .add_aspect(
                AspectSpec::new()
                    .pattern_case_insensitive(r"/chapter/([^/]+)\.pdf$")
                    .roles([Role::FullTextPdf]),
            )
            .build()
            .unwrap();

        assert!(map.first_match("http://x.org/Chapter/1.pdf").is_some());
    }

    #[test]
    fn test_build_validation() {
        assert!(AspectMap::builder().build().is_err());
        assert!(AspectMap::builder().add_derived_aspect("/$1.pdf", [Role::FullTextPdf]).build().is_err());
        assert!(
            AspectMap::builder()
                .add_aspect(AspectSpec::new().pattern(r"\.pdf$"))
                .build()
                .is_err()
        );
        assert!(
            AspectMap::builder()
                .add_pattern_aspect(r"(unclosed", "/$1", [Role::FullTextPdf])
                .build()
                .is_err()
        );
        assert!(
            AspectMap::builder()
                .add_pattern_aspect(r"\.pdf$", "/$1", [Role::FullTextPdf])
                .set_full_text_from_roles([Role::FullTextEpub])
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_full_text_role_from_other_roles_is_valid() {
        let map = AspectMap::builder()
            .add_pattern_aspect(r"/([^/]+)\.html$", "/$1.html", [Role::Abstract])
            .set_role_from_other_roles(Role::FullTextHtml, [Role::Abstract])
            .set_full_text_from_roles([Role::FullTextHtml])
            .build();
        assert!(map.is_ok());
    }
}
