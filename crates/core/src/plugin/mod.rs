//! Plugin definitions: line-oriented directive files describing one
//! publisher's URL layout, aspects and metadata schema.

pub mod directives;
pub mod loader;
pub mod parser;

pub use directives::{Directive, PluginConfig, parse_directive};
pub use loader::{PluginLoader, PluginLoaderBuilder};
pub use parser::ConfigParser;

use crate::au::AuConfig;
use crate::aspect::AspectMap;
use crate::error::{QuireError, Result};
use crate::metadata::PostCookHook;
use crate::resolver::Resolver;
use crate::schema;
use crate::scope::ScopeSpec;
use crate::template::compile_regex;

impl PluginConfig {
    /// Bind the definition to an AU and compile everything.
    ///
    /// Every template, pattern, aspect and schema reference is checked
    /// here, before any URL is read.
    pub fn build(&self, au: &AuConfig) -> Result<Resolver> {
        let scope = ScopeSpec {
            roots: self.roots.clone(),
            pattern: self.pattern.clone(),
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            mime_type: self.mime_type.clone(),
        }
        .compile(au)?;

        let mut aspects = AspectMap::builder().set_full_text_from_roles(self.full_text_from.iter().cloned());
        for aspect in &self.aspects {
            aspects = aspects.add_aspect(aspect.clone());
        }
        for (target, sources) in &self.role_from {
            aspects = aspects.set_role_from_other_roles(target.clone(), sources.iter().cloned());
        }
        let aspects = aspects.build()?;

        let schema_id = self
            .schema
            .as_deref()
            .ok_or_else(|| QuireError::PluginConfigError("Missing 'schema' directive".to_string()))?;
        let schema = schema::registry().lookup(schema_id)?;
        schema.validate()?;

        let mut resolver = Resolver::new(scope, aspects, schema).with_target(self.target.unwrap_or_default());

        if let Some(name) = &self.name {
            resolver = resolver.with_name(name.clone());
        }
        if !self.metadata_roles.is_empty() {
            resolver = resolver.with_metadata_roles(self.metadata_roles.iter().cloned());
        }
        if let Some(publisher) = &self.publisher {
            resolver = resolver.with_hook(PostCookHook::fixed_publisher(publisher.clone()));
        }
        if let Some(pattern) = &self.date_from_url {
            let regex = compile_regex(pattern, false)?;
            if regex.captures_len() < 2 {
                return Err(QuireError::ConfigError(format!(
                    "date_from_url pattern has no capture group: {}",
                    pattern
                )));
            }
            resolver = resolver.with_hook(PostCookHook::date_from_url(regex));
        }

        Ok(resolver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::{MetadataTarget, Role};

    const PLUGIN: &str = r#"
name: Climate of the Past
root: "%s%s/", base_url, volume
pattern: "^%s%s/[0-9]+/[0-9]{4}/[^/]+\.html$", base_url, volume
aspect: /([^/]+)\.html$ => /$1.html => full_text_html, abstract
aspect: => /$1.pdf => full_text_pdf
aspect: => /$1.ris => citation_ris
full_text_from: full_text_pdf, full_text_html
schema: ris
publisher: Copernicus
date_from_url: /([0-9]{4})/[^/]+$
"#;

    fn au() -> AuConfig {
        AuConfig::new().with("base_url", "http://www.clim-past.net/").with("volume", "8")
    }

    #[test]
    fn test_build_resolver() {
        let resolver = ConfigParser::parse_string(PLUGIN).unwrap().build(&au()).unwrap();

        assert_eq!(resolver.name(), "Climate of the Past");
        assert_eq!(resolver.schema().id, "ris");
        assert_eq!(resolver.target(), MetadataTarget::Metadata);
        assert_eq!(resolver.metadata_roles(), &[Role::CitationRis, Role::ArticleMetadata]);
        assert_eq!(resolver.scope().roots(), &["http://www.clim-past.net/8/".to_string()]);
        assert_eq!(resolver.aspects().aspects().len(), 3);
    }

    #[test]
    fn test_build_fails_before_reading() {
        let config = ConfigParser::parse_string(PLUGIN).unwrap();
        assert!(config.build(&AuConfig::new().with("base_url", "http://x.org/")).is_err());

        let mut unknown = config.clone();
        unknown.schema = Some("mods".to_string());
        assert!(matches!(unknown.build(&au()), Err(QuireError::UnknownSchema(_))));

        let mut missing = config.clone();
        missing.schema = None;
        assert!(missing.build(&au()).is_err());

        let mut no_group = config;
        no_group.date_from_url = Some("/[0-9]{4}/".to_string());
        assert!(no_group.build(&au()).is_err());
    }

    #[test]
    fn test_metadata_role_override() {
        let content = format!("{}metadata_role: abstract\n", PLUGIN);
        let resolver = ConfigParser::parse_string(&content).unwrap().build(&au()).unwrap();
        assert_eq!(resolver.metadata_roles(), &[Role::Abstract]);
    }
}
