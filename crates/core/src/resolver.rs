//! One resolution pass over an archival unit.
//!
//! The resolver assembles articles, reads each article's metadata files
//! through the [`ContentSource`], consolidates and cooks the raw records,
//! and hands finished records to an [`Emitter`].

use crate::article::{ArticleFiles, ArticleKey, MetadataTarget, Role};
use crate::aspect::AspectMap;
use crate::assembler::{ArticleAssembler, AssemblyOutcome, DiscardedArticle, RoleConflict};
use crate::consolidate::{PreEmit, consolidate, dedupe, pre_emit_check};
use crate::content::{self, ContentSource};
use crate::emit::Emitter;
use crate::error::Result;
use crate::extract::extract_raw;
use crate::metadata::{CookedMetadata, HookContext, MetadataField, PostCookHook, RawMetadata};
use crate::schema::MetadataSchema;
use crate::scope::UrlScope;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What happened to one article
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ArticleOutcome {
    /// At least one record was emitted
    Emitted,
    /// Every record failed the pre-emit check
    Suppressed,
    /// A metadata file could not be read
    Discarded { reason: String },
    /// Article-only target: resolved but nothing emitted
    Counted,
}

/// What happened to one consolidated record of an article
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
    Emitted {
        url: String,
        /// Cooking problems that did not stop the record
        errors: Vec<String>,
    },
    Suppressed {
        reason: String,
    },
}

/// A metadata file that could be read but not parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionFailure {
    pub url: String,
    pub reason: String,
}

/// Per-article entry of a [`ResolutionReport`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleReport {
    pub key: ArticleKey,
    pub full_text_url: String,
    pub roles: BTreeMap<Role, String>,
    #[serde(flatten)]
    pub outcome: ArticleOutcome,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<RecordOutcome>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extraction_failures: Vec<ExtractionFailure>,
}

/// Everything one pass did, including what it dropped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionReport {
    pub plugin: String,
    pub articles: Vec<ArticleReport>,
    /// Candidates the assembler dropped for lack of a full-text role
    pub discarded: Vec<DiscardedArticle>,
    pub conflicts: Vec<RoleConflict>,
}

impl ResolutionReport {
    pub fn emitted_records(&self) -> usize {
        self.articles
            .iter()
            .flat_map(|a| &a.records)
            .filter(|r| matches!(r, RecordOutcome::Emitted { .. }))
            .count()
    }

    pub fn suppressed_records(&self) -> usize {
        self.articles
            .iter()
            .flat_map(|a| &a.records)
            .filter(|r| matches!(r, RecordOutcome::Suppressed { .. }))
            .count()
    }

    pub fn count(&self, outcome: fn(&ArticleOutcome) -> bool) -> usize {
        self.articles.iter().filter(|a| outcome(&a.outcome)).count()
    }
}

/// A compiled plugin bound to one AU
#[derive(Debug, Clone)]
pub struct Resolver {
    name: String,
    scope: UrlScope,
    aspects: AspectMap,
    target: MetadataTarget,
    schema: Arc<MetadataSchema>,
    metadata_roles: Vec<Role>,
    hooks: Vec<PostCookHook>,
}

impl Resolver {
    pub fn new(scope: UrlScope, aspects: AspectMap, schema: Arc<MetadataSchema>) -> Self {
        Self {
            name: schema.id.clone(),
            metadata_roles: schema.metadata_roles.clone(),
            scope,
            aspects,
            target: MetadataTarget::default(),
            schema,
            hooks: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_target(mut self, target: MetadataTarget) -> Self {
        self.target = target;
        self
    }

    /// Read these roles instead of the schema's, in this order
    pub fn with_metadata_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.metadata_roles = roles.into_iter().collect();
        self
    }

    pub fn with_hook(mut self, hook: PostCookHook) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> MetadataTarget {
        self.target
    }

    pub fn schema(&self) -> &MetadataSchema {
        &self.schema
    }

    pub fn scope(&self) -> &UrlScope {
        &self.scope
    }

    pub fn aspects(&self) -> &AspectMap {
        &self.aspects
    }

    pub fn metadata_roles(&self) -> &[Role] {
        &self.metadata_roles
    }

    /// Group the AU's URLs into articles without reading any metadata
    pub fn assemble(&self, source: &dyn ContentSource) -> Result<AssemblyOutcome> {
        ArticleAssembler::new(&self.scope, &self.aspects, self.target).assemble(source)
    }

    /// Run one pass over the AU, emitting every record that survives.
    ///
    /// Only a failure to list the AU's URLs is an error; per-article problems
    /// end up in the report.
    pub fn resolve(&self, source: &dyn ContentSource, emitter: &mut dyn Emitter) -> Result<ResolutionReport> {
        info!(plugin = %self.name, schema = %self.schema.id, target = ?self.target, "resolution started");

        let AssemblyOutcome { articles, discarded, conflicts } = self.assemble(source)?;
        let mut report = ResolutionReport {
            plugin: self.name.clone(),
            articles: Vec::with_capacity(articles.len()),
            discarded,
            conflicts,
        };

        for article in &articles {
            let entry = if self.target.is_article_only() {
                Self::report_for(article, ArticleOutcome::Counted)
            } else {
                self.resolve_article(article, source, emitter)
            };
            report.articles.push(entry);
        }

        info!(
            plugin = %self.name,
            articles = report.articles.len(),
            emitted = report.emitted_records(),
            suppressed = report.suppressed_records(),
            discarded = report.discarded.len(),
            conflicts = report.conflicts.len(),
            "resolution finished"
        );

        Ok(report)
    }

    fn report_for(article: &ArticleFiles, outcome: ArticleOutcome) -> ArticleReport {
        ArticleReport {
            key: article.key().clone(),
            full_text_url: article.full_text_url().to_string(),
            roles: article.roles().map(|(r, u)| (r.clone(), u.to_string())).collect(),
            outcome,
            records: Vec::new(),
            extraction_failures: Vec::new(),
        }
    }

    fn resolve_article(
        &self, article: &ArticleFiles, source: &dyn ContentSource, emitter: &mut dyn Emitter,
    ) -> ArticleReport {
        let mut entry = Self::report_for(article, ArticleOutcome::Suppressed);

        let records = match self.extract_article(article, source, &mut entry.extraction_failures) {
            Ok(records) => records,
            Err(reason) => {
                debug!(key = %article.key(), %reason, "article discarded");
                entry.outcome = ArticleOutcome::Discarded { reason };
                return entry;
            }
        };

        for record in self.consolidate(records) {
            let outcome = match pre_emit_check(&record, self.schema.filename_check.as_ref(), source) {
                PreEmit::Suppress { reason } => {
                    debug!(key = %article.key(), %reason, "record suppressed");
                    RecordOutcome::Suppressed { reason }
                }
                PreEmit::Pass { primary_url } => {
                    let url = primary_url.unwrap_or_else(|| article.full_text_url().to_string());
                    let (metadata, errors) = self.cook(&record, article, &url);
                    emitter.emit(&url, metadata);
                    entry.outcome = ArticleOutcome::Emitted;
                    RecordOutcome::Emitted { url, errors }
                }
            };
            entry.records.push(outcome);
        }

        entry
    }

    /// Read every metadata file of the article once, in role order.
    ///
    /// A read failure ends the article; a parse failure is recorded and the
    /// remaining files are still read.
    fn extract_article(
        &self, article: &ArticleFiles, source: &dyn ContentSource, failures: &mut Vec<ExtractionFailure>,
    ) -> std::result::Result<Vec<RawMetadata>, String> {
        let mut records = Vec::new();
        let mut seen = HashSet::new();

        for role in &self.metadata_roles {
            let Some(url) = article.role_url(role) else {
                continue;
            };
            if !seen.insert(url) {
                continue;
            }

            let text = content::read_to_string(source, url).map_err(|e| e.to_string())?;

            match extract_raw(&self.schema.format, url, &text) {
                Ok(extracted) => {
                    debug!(url, %role, records = extracted.len(), "metadata extracted");
                    records.extend(extracted);
                }
                Err(e) => {
                    warn!(url, %role, error = %e, "metadata extraction failed");
                    failures.push(ExtractionFailure { url: url.to_string(), reason: e.to_string() });
                }
            }
        }

        if records.is_empty() {
            records.push(RawMetadata::new());
        }

        Ok(records)
    }

    fn consolidate(&self, records: Vec<RawMetadata>) -> Vec<RawMetadata> {
        let records = match &self.schema.dedup_key {
            Some(key) => dedupe(records, key),
            None => records,
        };

        match &self.schema.consolidation_key {
            Some(key) => consolidate(records, key, &self.schema.authority),
            None => records,
        }
    }

    fn cook(&self, record: &RawMetadata, article: &ArticleFiles, url: &str) -> (CookedMetadata, Vec<String>) {
        let cooked = self.schema.cook_map.cook(record);
        let mut metadata = cooked.metadata;

        let context = HookContext { raw: record, source_url: record.source_url(), full_text_url: article.full_text_url() };
        for hook in &self.hooks {
            hook.apply(&context, &mut metadata);
        }
        metadata.put_if_better(MetadataField::AccessUrl, url);

        (metadata, cooked.errors.iter().map(ToString::to_string).collect())
    }
}
