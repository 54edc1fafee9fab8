//! printf-style URL templates bound to AU variables.
//!
//! Templates are written the way plugin definitions write them: a quoted
//! format string followed by the AU variables that fill its placeholders,
//! in order.
//!
//! ```rust
//! use quire_core::{AuConfig, TemplateContext, UrlTemplate};
//!
//! let template = UrlTemplate::parse("\"%s%s/\", base_url, volume").unwrap();
//! let au = AuConfig::new().with("base_url", "http://www.example.com/").with("volume", "8");
//!
//! let root = template.expand(&au, TemplateContext::Url).unwrap();
//! assert_eq!(root, "http://www.example.com/8/");
//! ```

use crate::au::AuConfig;
use crate::error::{QuireError, Result};
use regex::{Regex, RegexBuilder};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Where an expanded template is used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateContext {
    /// Plain URL prefix; values are substituted verbatim
    Url,
    /// Regular expression source; values are escaped
    Regex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    Str,
    Int,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(Conversion),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum VarExpr {
    Name(String),
    UrlHost(String),
    UrlPath(String),
}

impl VarExpr {
    fn parse(expr: &str) -> std::result::Result<Self, String> {
        let expr = expr.trim();

        let (ctor, name): (fn(String) -> VarExpr, &str) =
            if let Some(inner) = expr.strip_prefix("url_host(").and_then(|r| r.strip_suffix(')')) {
                (VarExpr::UrlHost, inner.trim())
            } else if let Some(inner) = expr.strip_prefix("url_path(").and_then(|r| r.strip_suffix(')')) {
                (VarExpr::UrlPath, inner.trim())
            } else {
                (VarExpr::Name, expr)
            };

        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!("invalid variable expression '{}'", expr));
        }

        Ok(ctor(name.to_string()))
    }

    fn name(&self) -> &str {
        match self {
            VarExpr::Name(n) | VarExpr::UrlHost(n) | VarExpr::UrlPath(n) => n,
        }
    }

    fn resolve(&self, au: &AuConfig) -> Result<String> {
        let raw = au
            .get(self.name())
            .ok_or_else(|| QuireError::ConfigError(format!("AU variable '{}' is not set", self.name())))?;

        match self {
            VarExpr::Name(_) => Ok(raw.to_string()),
            VarExpr::UrlHost(name) | VarExpr::UrlPath(name) => {
                let url = Url::parse(raw)
                    .map_err(|e| QuireError::ConfigError(format!("AU variable '{}' is not a URL: {}", name, e)))?;
                if matches!(self, VarExpr::UrlHost(_)) {
                    url.host_str()
                        .map(str::to_string)
                        .ok_or_else(|| QuireError::ConfigError(format!("AU variable '{}' has no host", name)))
                } else {
                    Ok(url.path().to_string())
                }
            }
        }
    }
}

/// A parsed printf-style template with its variable list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    source: String,
    segments: Vec<Segment>,
    vars: Vec<VarExpr>,
}

impl UrlTemplate {
    /// Parse `"format", var1, var2` or a bare format without placeholders.
    ///
    /// Supported conversions are `%s`, `%d` and `%%`. The number of
    /// placeholders must equal the number of variables.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let err = |reason: String| QuireError::TemplateError { template: trimmed.to_string(), reason };

        let (format, var_list) = match trimmed.strip_prefix('"') {
            Some(rest) => {
                let close = rest
                    .rfind('"')
                    .ok_or_else(|| err("unterminated format string".to_string()))?;
                let tail = rest[close + 1..].trim();
                let vars = if tail.is_empty() {
                    ""
                } else {
                    tail.strip_prefix(',')
                        .ok_or_else(|| err("expected ',' after format string".to_string()))?
                };
                (&rest[..close], vars)
            }
            None => (trimmed, ""),
        };

        if format.is_empty() {
            return Err(err("empty format string".to_string()));
        }

        let segments = parse_format(format).map_err(&err)?;

        let mut vars = Vec::new();
        if !var_list.trim().is_empty() {
            for expr in var_list.split(',') {
                vars.push(VarExpr::parse(expr).map_err(&err)?);
            }
        }

        let placeholders = segments.iter().filter(|s| matches!(s, Segment::Placeholder(_))).count();
        if placeholders != vars.len() {
            return Err(err(format!(
                "{} placeholder(s) but {} variable(s)",
                placeholders,
                vars.len()
            )));
        }

        Ok(Self { source: trimmed.to_string(), segments, vars })
    }

    /// Substitute AU variables into the template
    pub fn expand(&self, au: &AuConfig, context: TemplateContext) -> Result<String> {
        let mut out = String::new();
        let mut vars = self.vars.iter();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(conversion) => {
                    let Some(var) = vars.next() else {
                        return Err(QuireError::TemplateError {
                            template: self.source.clone(),
                            reason: "more placeholders than variables".to_string(),
                        });
                    };
                    let value = var.resolve(au)?;
                    let value = match conversion {
                        Conversion::Str => value,
                        Conversion::Int => value
                            .trim()
                            .parse::<i64>()
                            .map_err(|_| QuireError::TemplateError {
                                template: self.source.clone(),
                                reason: format!("%d expects an integer, '{}' = '{}'", var.name(), value),
                            })?
                            .to_string(),
                    };

                    match context {
                        TemplateContext::Url => out.push_str(&value),
                        TemplateContext::Regex => out.push_str(&regex::escape(&value)),
                    }
                }
            }
        }

        Ok(out)
    }

    /// Names of the AU variables this template reads
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.vars.iter().map(VarExpr::name)
    }

    /// The template as written
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for UrlTemplate {
    type Err = QuireError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_format(format: &str) -> std::result::Result<Vec<Segment>, String> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = format.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            literal.push(c);
            continue;
        }

        let conversion = match chars.next() {
            Some('%') => {
                literal.push('%');
                continue;
            }
            Some('s') => Conversion::Str,
            Some('d') => Conversion::Int,
            Some(other) => return Err(format!("unsupported conversion '%{}'", other)),
            None => return Err("dangling '%' at end of format".to_string()),
        };

        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(Segment::Placeholder(conversion));
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    Ok(segments)
}

/// A regex template with its own case-sensitivity flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternTemplate {
    pub template: UrlTemplate,
    pub case_insensitive: bool,
}

impl PatternTemplate {
    pub fn new(template: UrlTemplate, case_insensitive: bool) -> Self {
        Self { template, case_insensitive }
    }

    /// Case-sensitive pattern from template text
    pub fn parse(input: &str) -> Result<Self> {
        Ok(Self::new(UrlTemplate::parse(input)?, false))
    }

    /// Case-insensitive pattern from template text
    pub fn parse_case_insensitive(input: &str) -> Result<Self> {
        Ok(Self::new(UrlTemplate::parse(input)?, true))
    }

    /// Expand against the AU and compile
    pub fn compile(&self, au: &AuConfig) -> Result<Regex> {
        let source = self.template.expand(au, TemplateContext::Regex)?;
        compile_regex(&source, self.case_insensitive)
    }
}

/// Compile a regex, mapping failures to [`QuireError::PatternError`]
pub fn compile_regex(pattern: &str, case_insensitive: bool) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|source| QuireError::PatternError { pattern: pattern.to_string(), source })
}
