use crate::article::{MetadataTarget, Role};
use crate::aspect::{AspectPattern, AspectSpec};
use crate::error::{QuireError, Result};
use crate::template::{PatternTemplate, UrlTemplate};

/// Represents a single plugin directive
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Human-readable plugin name
    Name(String),

    /// Scope templates
    Root(UrlTemplate),
    Pattern(PatternTemplate),
    Include(PatternTemplate),
    Exclude(PatternTemplate),
    MimeType(String),

    /// Resolution depth
    Target(MetadataTarget),

    /// Aspects; `alt_*` lines extend the most recent aspect
    Aspect(AspectSpec),
    AltPattern(AspectPattern),
    AltReplacement(String),

    /// Role selection
    FullTextFrom(Vec<Role>),
    RoleFrom(Role, Vec<Role>),

    /// Metadata
    Schema(String),
    MetadataRole(Vec<Role>),
    Publisher(String),
    DateFromUrl(String),
}

/// Plugin definition assembled from directives
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginConfig {
    pub name: Option<String>,

    pub roots: Vec<UrlTemplate>,
    pub pattern: Option<PatternTemplate>,
    pub include: Option<PatternTemplate>,
    pub exclude: Option<PatternTemplate>,
    pub mime_type: Option<String>,

    pub target: Option<MetadataTarget>,

    /// Aspects in declaration order; earlier aspects take precedence
    pub aspects: Vec<AspectSpec>,
    pub full_text_from: Vec<Role>,
    pub role_from: Vec<(Role, Vec<Role>)>,

    pub schema: Option<String>,
    /// Overrides the schema's metadata roles when non-empty
    pub metadata_roles: Vec<Role>,
    pub publisher: Option<String>,
    pub date_from_url: Option<String>,
}

impl PluginConfig {
    /// Create a new empty plugin config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directive to this config
    ///
    /// `alt_pattern`/`alt_replacement` without a preceding `aspect` are
    /// rejected.
    pub fn add_directive(&mut self, directive: Directive) -> Result<()> {
        match directive {
            Directive::Name(name) => self.name = Some(name),

            Directive::Root(root) => self.roots.push(root),
            Directive::Pattern(pattern) => self.pattern = Some(pattern),
            Directive::Include(pattern) => self.include = Some(pattern),
            Directive::Exclude(pattern) => self.exclude = Some(pattern),
            Directive::MimeType(mime) => self.mime_type = Some(mime),

            Directive::Target(target) => self.target = Some(target),

            Directive::Aspect(aspect) => self.aspects.push(aspect),
            Directive::AltPattern(pattern) => self.last_aspect("alt_pattern")?.patterns.push(pattern),
            Directive::AltReplacement(replacement) => {
                self.last_aspect("alt_replacement")?.replacements.push(replacement)
            }

            Directive::FullTextFrom(roles) => self.full_text_from.extend(roles),
            Directive::RoleFrom(target, sources) => self.role_from.push((target, sources)),

            Directive::Schema(id) => self.schema = Some(id),
            Directive::MetadataRole(roles) => self.metadata_roles.extend(roles),
            Directive::Publisher(name) => self.publisher = Some(name),
            Directive::DateFromUrl(pattern) => self.date_from_url = Some(pattern),
        }
        Ok(())
    }

    fn last_aspect(&mut self, directive: &str) -> Result<&mut AspectSpec> {
        self.aspects
            .last_mut()
            .ok_or_else(|| QuireError::PluginConfigError(format!("{} without a preceding aspect", directive)))
    }

    /// Merge another config into this one.
    ///
    /// Single-valued directives set in `other` win; a list directive set in
    /// `other` replaces ours as a whole.
    pub fn merge(&mut self, other: &PluginConfig) {
        fn replace_if_set<T: Clone>(ours: &mut Option<T>, theirs: &Option<T>) {
            if theirs.is_some() {
                ours.clone_from(theirs);
            }
        }
        fn replace_if_nonempty<T: Clone>(ours: &mut Vec<T>, theirs: &[T]) {
            if !theirs.is_empty() {
                *ours = theirs.to_vec();
            }
        }

        replace_if_set(&mut self.name, &other.name);
        replace_if_nonempty(&mut self.roots, &other.roots);
        replace_if_set(&mut self.pattern, &other.pattern);
        replace_if_set(&mut self.include, &other.include);
        replace_if_set(&mut self.exclude, &other.exclude);
        replace_if_set(&mut self.mime_type, &other.mime_type);
        replace_if_set(&mut self.target, &other.target);
        replace_if_nonempty(&mut self.aspects, &other.aspects);
        replace_if_nonempty(&mut self.full_text_from, &other.full_text_from);
        replace_if_nonempty(&mut self.role_from, &other.role_from);
        replace_if_set(&mut self.schema, &other.schema);
        replace_if_nonempty(&mut self.metadata_roles, &other.metadata_roles);
        replace_if_set(&mut self.publisher, &other.publisher);
        replace_if_set(&mut self.date_from_url, &other.date_from_url);
    }

    /// Check if this config is effectively empty
    pub fn is_empty(&self) -> bool {
        self.aspects.is_empty() && self.roots.is_empty() && self.pattern.is_none() && self.schema.is_none()
    }
}

/// Parse a directive line from a plugin definition
pub fn parse_directive(line: &str) -> Result<Directive> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Err(QuireError::PluginConfigError("Empty or comment line".to_string()));
    }

    let Some((key, value)) = line.split_once(':') else {
        return Err(QuireError::PluginConfigError(format!("Invalid directive format: {}", line)));
    };
    let key = key.trim();
    let value = value.trim();

    if value.is_empty() {
        return Err(QuireError::PluginConfigError(format!("Missing value for {}", key)));
    }

    match key {
        "name" => Ok(Directive::Name(value.to_string())),

        "root" => Ok(Directive::Root(UrlTemplate::parse(value)?)),
        "pattern" => Ok(Directive::Pattern(PatternTemplate::parse(value)?)),
        "pattern(i)" => Ok(Directive::Pattern(PatternTemplate::parse_case_insensitive(value)?)),
        "include" => Ok(Directive::Include(PatternTemplate::parse(value)?)),
        "include(i)" => Ok(Directive::Include(PatternTemplate::parse_case_insensitive(value)?)),
        "exclude" => Ok(Directive::Exclude(PatternTemplate::parse(value)?)),
        "exclude(i)" => Ok(Directive::Exclude(PatternTemplate::parse_case_insensitive(value)?)),
        "mime_type" => Ok(Directive::MimeType(value.to_ascii_lowercase())),

        "target" => Ok(Directive::Target(value.parse()?)),

        "aspect" => parse_aspect(value, false).map(Directive::Aspect),
        "aspect(i)" => parse_aspect(value, true).map(Directive::Aspect),
        "alt_pattern" => Ok(Directive::AltPattern(AspectPattern {
            pattern: value.to_string(),
            case_insensitive: false,
        })),
        "alt_pattern(i)" => Ok(Directive::AltPattern(AspectPattern {
            pattern: value.to_string(),
            case_insensitive: true,
        })),
        "alt_replacement" => Ok(Directive::AltReplacement(value.to_string())),

        "full_text_from" => Ok(Directive::FullTextFrom(parse_roles(value)?)),
        "role_from" => {
            let (target, sources) = value
                .split_once("<-")
                .ok_or_else(|| QuireError::PluginConfigError(format!("Invalid role_from format: {}", value)))?;
            Ok(Directive::RoleFrom(target.parse()?, parse_roles(sources)?))
        }

        "schema" => Ok(Directive::Schema(value.to_ascii_lowercase())),
        "metadata_role" => Ok(Directive::MetadataRole(parse_roles(value)?)),
        "publisher" => Ok(Directive::Publisher(value.to_string())),
        "date_from_url" => Ok(Directive::DateFromUrl(value.to_string())),

        _ => Err(QuireError::PluginConfigError(format!("Unknown directive: {}", key))),
    }
}

/// `PATTERN => REPLACEMENT => roles`; either of the first two may be empty
fn parse_aspect(value: &str, case_insensitive: bool) -> Result<AspectSpec> {
    let parts: Vec<&str> = value.split("=>").map(str::trim).collect();
    let [pattern, replacement, roles] = parts[..] else {
        return Err(QuireError::PluginConfigError(format!(
            "Invalid aspect format (expected PATTERN => REPLACEMENT => ROLES): {}",
            value
        )));
    };

    let mut aspect = AspectSpec::new().roles(parse_roles(roles)?);
    if !pattern.is_empty() {
        aspect = if case_insensitive {
            aspect.pattern_case_insensitive(pattern)
        } else {
            aspect.pattern(pattern)
        };
    }
    if !replacement.is_empty() {
        aspect = aspect.replacement(replacement);
    }

    Ok(aspect)
}

fn parse_roles(value: &str) -> Result<Vec<Role>> {
    let roles = Role::parse_list(value)?;
    if roles.is_empty() {
        return Err(QuireError::PluginConfigError(format!("Empty role list: {}", value)));
    }
    Ok(roles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_directive_name() {
        let directive = parse_directive("name: Example Journals").unwrap();
        assert_eq!(directive, Directive::Name("Example Journals".to_string()));
    }

    #[test]
    fn test_parse_directive_templates() {
        let directive = parse_directive(r#"root: "%s%s/", base_url, volume"#).unwrap();
        assert!(matches!(directive, Directive::Root(t) if t.variables().count() == 2));

        let directive = parse_directive(r#"pattern(i): "^%s.*\.html$", base_url"#).unwrap();
        assert!(matches!(directive, Directive::Pattern(p) if p.case_insensitive));

        let directive = parse_directive(r#"include: "^%s%s/[0-9]+/", base_url, volume"#).unwrap();
        assert!(matches!(directive, Directive::Include(p) if !p.case_insensitive));

        assert!(parse_directive(r#"root: "%s%s/", base_url"#).is_err());
    }

    #[test]
    fn test_parse_directive_aspect() {
        let directive = parse_directive(r"aspect: /([^/]+)\.pdf$ => /$1.pdf => full_text_pdf").unwrap();
        let Directive::Aspect(aspect) = directive else { panic!("expected aspect") };
        assert_eq!(aspect.patterns.len(), 1);
        assert_eq!(aspect.patterns[0].pattern, r"/([^/]+)\.pdf$");
        assert_eq!(aspect.replacements, vec!["/$1.pdf".to_string()]);
        assert_eq!(aspect.roles, vec![Role::FullTextPdf]);
    }

    #[test]
    fn test_parse_directive_derivation_only_aspect() {
        let directive = parse_directive("aspect: => /$1.ris => citation_ris, article_metadata").unwrap();
        let Directive::Aspect(aspect) = directive else { panic!("expected aspect") };
        assert!(aspect.patterns.is_empty());
        assert_eq!(aspect.roles, vec![Role::CitationRis, Role::ArticleMetadata]);
    }

    #[test]
    fn test_parse_directive_role_from() {
        let directive = parse_directive("role_from: article_metadata <- citation_ris, abstract").unwrap();
        assert_eq!(
            directive,
            Directive::RoleFrom(Role::ArticleMetadata, vec![Role::CitationRis, Role::Abstract])
        );
    }

    #[test]
    fn test_parse_directive_invalid() {
        assert!(parse_directive("invalid_directive").is_err());
        assert!(parse_directive("colour: blue").is_err());
        assert!(parse_directive("aspect: /x => full_text_pdf").is_err());
        assert!(parse_directive("aspect: /x => /y => not_a_role").is_err());
        assert!(parse_directive("target: everything").is_err());
        assert!(parse_directive("full_text_from:").is_err());
    }

    #[test]
    fn test_alt_directives_extend_last_aspect() {
        let mut config = PluginConfig::new();
        assert!(config.add_directive(Directive::AltReplacement("/x".to_string())).is_err());

        config
            .add_directive(parse_directive(r"aspect: \.pdf$ => .pdf => full_text_pdf").unwrap())
            .unwrap();
        config.add_directive(parse_directive(r"alt_pattern(i): \.PDF$").unwrap()).unwrap();
        config.add_directive(parse_directive("alt_replacement: .PDF").unwrap()).unwrap();

        assert_eq!(config.aspects.len(), 1);
        assert_eq!(config.aspects[0].patterns.len(), 2);
        assert!(config.aspects[0].patterns[1].case_insensitive);
        assert_eq!(config.aspects[0].replacements.len(), 2);
    }

    #[test]
    fn test_plugin_config_merge() {
        let mut standard = PluginConfig::new();
        standard.add_directive(Directive::Name("Standard".to_string())).unwrap();
        standard.add_directive(Directive::Schema("ris".to_string())).unwrap();
        standard.add_directive(Directive::FullTextFrom(vec![Role::FullTextPdf])).unwrap();

        let mut custom = PluginConfig::new();
        custom.add_directive(Directive::Schema("highwire".to_string())).unwrap();

        standard.merge(&custom);

        assert_eq!(standard.name.as_deref(), Some("Standard"));
        assert_eq!(standard.schema.as_deref(), Some("highwire"));
        assert_eq!(standard.full_text_from, vec![Role::FullTextPdf]);
    }

    #[test]
    fn test_plugin_config_is_empty() {
        let mut config = PluginConfig::new();
        assert!(config.is_empty());

        config.add_directive(Directive::Publisher("X".to_string())).unwrap();
        assert!(config.is_empty());

        config.add_directive(Directive::Schema("ris".to_string())).unwrap();
        assert!(!config.is_empty());
    }
}
