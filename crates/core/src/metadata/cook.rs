use super::cooked::CookedMetadata;
use super::field::MetadataField;
use super::raw::RawMetadata;
use crate::error::MetadataError;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Immutable mapping of raw keys to canonical fields.
///
/// Entries are applied in declaration order, so earlier raw keys have
/// priority over later ones for the same field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookMap {
    entries: Vec<(String, MetadataField)>,
}

/// Builder for [`CookMap`]
#[derive(Debug, Clone, Default)]
pub struct CookMapBuilder {
    entries: Vec<(String, MetadataField)>,
}

impl CookMapBuilder {
    pub fn map(mut self, raw_key: &str, field: MetadataField) -> Self {
        self.entries.push((raw_key.to_lowercase(), field));
        self
    }

    pub fn build(self) -> CookMap {
        CookMap { entries: self.entries }
    }
}

/// Result of cooking one raw record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cooked {
    pub metadata: CookedMetadata,
    pub errors: Vec<MetadataError>,
}

impl CookMap {
    pub fn builder() -> CookMapBuilder {
        CookMapBuilder::default()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, MetadataField)> {
        self.entries.iter().map(|(k, f)| (k.as_str(), *f))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cook a raw record into canonical fields.
    ///
    /// For each entry, a field that already holds a valid value is left
    /// alone. Otherwise single-valued fields take the first raw value that
    /// validates and multi-valued fields take every valid value in order.
    /// The result depends only on `raw` and the map.
    pub fn cook(&self, raw: &RawMetadata) -> Cooked {
        let mut cooked = Cooked::default();

        for (raw_key, field) in &self.entries {
            let values = raw.get_all(raw_key);
            if values.is_empty() || cooked.metadata.has_valid_value(*field) {
                continue;
            }

            for value in values {
                match cooked.metadata.put(*field, value) {
                    Ok(()) if !field.is_multi() => break,
                    Ok(()) => {}
                    Err(err) => cooked.errors.push(err),
                }
            }
        }

        cooked
    }
}

/// What a post-cook hook may look at
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    pub raw: &'a RawMetadata,
    /// URL of the file the raw record came from, if any
    pub source_url: Option<&'a str>,
    pub full_text_url: &'a str,
}

/// Write access for post-cook hooks that can only fill empty fields
pub struct GapFiller<'a> {
    metadata: &'a mut CookedMetadata,
}

impl<'a> GapFiller<'a> {
    pub fn new(metadata: &'a mut CookedMetadata) -> Self {
        Self { metadata }
    }

    pub fn get(&self, field: MetadataField) -> Option<&str> {
        self.metadata.get(field)
    }

    /// [`CookedMetadata::put_if_better`]
    pub fn fill(&mut self, field: MetadataField, value: &str) -> bool {
        self.metadata.put_if_better(field, value)
    }
}

type HookFn = dyn Fn(&HookContext<'_>, &mut GapFiller<'_>) + Send + Sync;

/// Source-specific step run after generic cooking
#[derive(Clone)]
pub struct PostCookHook {
    name: String,
    run: Arc<HookFn>,
}

impl PostCookHook {
    pub fn new<F>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn(&HookContext<'_>, &mut GapFiller<'_>) + Send + Sync + 'static,
    {
        Self { name: name.into(), run: Arc::new(run) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, context: &HookContext<'_>, metadata: &mut CookedMetadata) {
        (self.run)(context, &mut GapFiller::new(metadata));
    }

    /// Fill a field with a constant
    pub fn fixed_field(field: MetadataField, value: impl Into<String>) -> Self {
        let value = value.into();
        Self::new(format!("fixed {}", field), move |_, gaps| {
            gaps.fill(field, &value);
        })
    }

    /// Fill the publisher with a known name
    pub fn fixed_publisher(name: impl Into<String>) -> Self {
        Self::fixed_field(MetadataField::Publisher, name)
    }

    /// Fill the date from the first capture group of `pattern`, tried
    /// against the metadata source URL and then the full-text URL.
    pub fn date_from_url(pattern: Regex) -> Self {
        Self::new(format!("date from {}", pattern.as_str()), move |ctx, gaps| {
            if gaps.get(MetadataField::Date).is_some() {
                return;
            }

            let found = ctx
                .source_url
                .into_iter()
                .chain(std::iter::once(ctx.full_text_url))
                .find_map(|url| pattern.captures(url).and_then(|c| c.get(1)).map(|m| m.as_str().to_string()));

            if let Some(date) = found {
                gaps.fill(MetadataField::Date, &date);
            }
        })
    }
}

impl fmt::Debug for PostCookHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostCookHook").field("name", &self.name).finish()
    }
}
