//! Article aspect resolution and metadata consolidation for archival units.
//!
//! Given the crawled URL set of one archival unit (AU), `quire-core` groups
//! URLs into logical articles, assigns each URL a [`Role`], extracts raw
//! metadata from the role files, consolidates multi-file deliveries and
//! cooks the result into canonical [`CookedMetadata`] records handed to an
//! [`Emitter`].
//!
//! ```rust
//! use quire_core::{AspectMap, AuConfig, Role, TemplateContext, UrlTemplate};
//!
//! let au = AuConfig::new().with("base_url", "http://www.clim-past.net/").with("volume", "8");
//! let root = UrlTemplate::parse(r#""%s%s/", base_url, volume"#).unwrap();
//! assert_eq!(root.expand(&au, TemplateContext::Url).unwrap(), "http://www.clim-past.net/8/");
//!
//! let aspects = AspectMap::builder()
//!     .add_pattern_aspect(r"/([^/]+)\.html$", "/$1.html", [Role::FullTextHtml])
//!     .add_derived_aspect("/$1.pdf", [Role::FullTextPdf])
//!     .set_full_text_from_roles([Role::FullTextPdf, Role::FullTextHtml])
//!     .build()
//!     .unwrap();
//! assert_eq!(aspects.aspects().len(), 2);
//! ```

pub mod article;
pub mod aspect;
pub mod assembler;
pub mod au;
pub mod consolidate;
pub mod content;
pub mod emit;
pub mod error;
pub mod extract;
pub mod formatters;
pub mod metadata;
pub mod plugin;
pub mod resolver;
pub mod schema;
pub mod scope;
pub mod template;

pub use article::{ArticleFiles, ArticleKey, MetadataTarget, Role};
pub use aspect::{AspectMap, AspectMapBuilder, AspectSpec};
pub use assembler::{ArticleAssembler, AssemblyOutcome, CandidateState, DiscardedArticle, RoleConflict};
pub use au::AuConfig;
pub use consolidate::{AuthorityOrder, FilenameCheck, PreEmit, consolidate, dedupe, pre_emit_check};
pub use content::{ContentSource, DirectoryContentSource, InjectedFailure, MemoryContentSource};
pub use emit::{EmittedRecord, Emitter};
pub use error::{ContentError, MetadataError, QuireError, Result};
pub use extract::{SourceFormat, extract_raw};
pub use formatters::{JsonConfig, JsonFormatter, TextConfig, TextFormatter};
pub use formatters::{records_to_json, records_to_text, report_to_json, report_to_text};
pub use metadata::{CookMap, Cooked, CookedMetadata, MetadataField, PostCookHook, RawMetadata};
pub use plugin::{ConfigParser, Directive, PluginConfig, PluginLoader, PluginLoaderBuilder};
pub use resolver::{ArticleOutcome, ArticleReport, RecordOutcome, ResolutionReport, Resolver};
pub use schema::{MetadataSchema, registry};
pub use scope::{ScopeSpec, UrlScope};
pub use template::{PatternTemplate, TemplateContext, UrlTemplate};
