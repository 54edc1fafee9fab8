//! Article assembler: groups the crawled URL set of one AU into articles.
//!
//! Each candidate moves through [`CandidateState`]:
//! `Unseen -> RootMatched -> RoleAssigning -> Complete | Discarded`.
//! URLs are visited in sorted order, so a pass is a deterministic function of
//! the URL set.

use crate::article::{ArticleFiles, ArticleKey, MetadataTarget, Role};
use crate::aspect::AspectMap;
use crate::content::ContentSource;
use crate::error::Result;
use crate::scope::UrlScope;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace, warn};

/// Lifecycle of a candidate article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateState {
    Unseen,
    RootMatched,
    RoleAssigning,
    Complete,
    Discarded,
}

/// Two different URLs claimed the same role under one key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleConflict {
    pub key: ArticleKey,
    pub role: Role,
    /// First-seen URL, which keeps the role
    pub kept: String,
    pub rejected: String,
}

/// A record that never got a full-text role
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscardedArticle {
    pub key: ArticleKey,
    pub roles: BTreeMap<Role, String>,
}

/// Result of one assembler pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyOutcome {
    /// Completed articles in first-seen order
    pub articles: Vec<ArticleFiles>,
    pub discarded: Vec<DiscardedArticle>,
    pub conflicts: Vec<RoleConflict>,
}

#[derive(Debug)]
struct ArticleRecord {
    key: ArticleKey,
    state: CandidateState,
    roles: BTreeMap<Role, String>,
    /// URL of the earliest-declared aspect present, with that aspect's index
    primary: Option<(usize, String)>,
}

impl ArticleRecord {
    fn new(key: ArticleKey) -> Self {
        Self { key, state: CandidateState::RootMatched, roles: BTreeMap::new(), primary: None }
    }

    fn offer_primary(&mut self, index: usize, url: &str) {
        if self.primary.as_ref().is_none_or(|(best, _)| index < *best) {
            self.primary = Some((index, url.to_string()));
        }
    }

    fn assign(&mut self, roles: &[Role], url: &str, conflicts: &mut Vec<RoleConflict>) {
        for role in roles {
            match self.roles.get(role) {
                None => {
                    trace!(key = %self.key, %role, url, "role assigned");
                    self.roles.insert(role.clone(), url.to_string());
                }
                Some(existing) if existing == url => {}
                Some(existing) => {
                    warn!(key = %self.key, %role, kept = %existing, rejected = url, "role conflict");
                    conflicts.push(RoleConflict {
                        key: self.key.clone(),
                        role: role.clone(),
                        kept: existing.clone(),
                        rejected: url.to_string(),
                    });
                }
            }
        }
    }
}

/// One grouping pass over an AU
#[derive(Debug, Clone, Copy)]
pub struct ArticleAssembler<'a> {
    scope: &'a UrlScope,
    aspects: &'a AspectMap,
    target: MetadataTarget,
}

impl<'a> ArticleAssembler<'a> {
    pub fn new(scope: &'a UrlScope, aspects: &'a AspectMap, target: MetadataTarget) -> Self {
        Self { scope, aspects, target }
    }

    /// Walk the AU's URL set and build one record per article
    pub fn assemble(&self, source: &dyn ContentSource) -> Result<AssemblyOutcome> {
        let mut urls = source.urls()?;
        urls.sort();
        urls.dedup();

        let mut records: Vec<ArticleRecord> = Vec::new();
        let mut by_key: HashMap<ArticleKey, usize> = HashMap::new();
        let mut claimed: HashMap<String, usize> = HashMap::new();
        let mut conflicts = Vec::new();

        for url in &urls {
            if !self.scope.in_root(url) || !self.scope.is_included(url) || self.scope.is_excluded(url) {
                continue;
            }

            if !self.is_candidate(url, source) {
                continue;
            }

            let Some((index, matcher, caps)) = self.aspects.first_match(url) else {
                debug!(url, "candidate matches no aspect");
                continue;
            };
            let key = ArticleKey::from_match(url, &caps);

            let slot = match claimed.get(url.as_str()).or_else(|| by_key.get(&key)) {
                Some(&slot) => slot,
                None => {
                    records.push(ArticleRecord::new(key.clone()));
                    by_key.insert(key, records.len() - 1);
                    records.len() - 1
                }
            };

            let record = &mut records[slot];
            record.state = CandidateState::RoleAssigning;
            record.offer_primary(index, url);
            record.assign(self.aspects.aspects()[index].roles(), url, &mut conflicts);
            claimed.insert(url.clone(), slot);

            if self.target.is_article_only() {
                continue;
            }

            for (other_index, other) in self.aspects.aspects().iter().enumerate() {
                if other_index == index {
                    continue;
                }
                if let Some(derived) = other.derive(matcher, url, source) {
                    record.offer_primary(other_index, &derived);
                    record.assign(other.roles(), &derived, &mut conflicts);
                    claimed.insert(derived, slot);
                }
            }
        }

        let mut outcome = AssemblyOutcome { conflicts, ..Default::default() };

        for mut record in records {
            if !self.target.is_article_only() {
                self.apply_role_from_other_roles(&mut record);
            }

            match self.full_text(&record) {
                Some(full_text) => {
                    record.state = CandidateState::Complete;
                    debug!(key = %record.key, state = ?record.state, full_text, "article resolved");
                    outcome
                        .articles
                        .push(ArticleFiles::new(record.key, full_text, record.roles));
                }
                None => {
                    record.state = CandidateState::Discarded;
                    debug!(key = %record.key, state = ?record.state, "no full-text role");
                    outcome
                        .discarded
                        .push(DiscardedArticle { key: record.key, roles: record.roles });
                }
            }
        }

        Ok(outcome)
    }

    fn is_candidate(&self, url: &str, source: &dyn ContentSource) -> bool {
        source.has_content(url)
            && self.scope.matches_candidate(url)
            && self.scope.accepts_content_type(source.content_type(url).as_deref())
    }

    fn apply_role_from_other_roles(&self, record: &mut ArticleRecord) {
        for (target, sources) in self.aspects.role_from_other_roles() {
            if record.roles.contains_key(target) {
                continue;
            }
            if let Some(url) = sources.iter().find_map(|r| record.roles.get(r)).cloned() {
                trace!(key = %record.key, role = %target, url, "role filled from other role");
                record.roles.insert(target.clone(), url);
            }
        }
    }

    /// Without a preference list the earliest-declared aspect present wins
    fn full_text(&self, record: &ArticleRecord) -> Option<String> {
        let preference = self.aspects.full_text_roles();
        if preference.is_empty() {
            return record.primary.as_ref().map(|(_, url)| url.clone());
        }

        preference.iter().find_map(|r| record.roles.get(r)).cloned()
    }
}
