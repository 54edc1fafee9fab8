//! Raw metadata extraction from article content.
//!
//! Each [`SourceFormat`] turns the bytes behind one metadata-role URL into
//! zero or more [`RawMetadata`] records keyed by format-specific names.

pub mod html;
pub mod ris;
#[cfg(feature = "xml")]
pub mod walkers;
#[cfg(feature = "xml")]
pub mod xml;

use crate::error::Result;
use crate::metadata::RawMetadata;

#[cfg(feature = "xml")]
pub use xml::{NodeWalker, ValueExtractor, XmlNode, XmlSchema};

/// Content format of a metadata file
#[derive(Debug, Clone)]
pub enum SourceFormat {
    /// XPath-driven XML (JATS, ONIX, BITS, ...)
    #[cfg(feature = "xml")]
    Xml(XmlSchema),
    /// `<meta>` tags of an HTML landing page
    HtmlMeta,
    /// RIS citation export
    Ris,
}

impl SourceFormat {
    pub fn name(&self) -> &'static str {
        match self {
            #[cfg(feature = "xml")]
            SourceFormat::Xml(_) => "xml",
            SourceFormat::HtmlMeta => "html",
            SourceFormat::Ris => "ris",
        }
    }
}

/// Parse `content` fetched from `url` into raw records
pub fn extract_raw(format: &SourceFormat, url: &str, content: &str) -> Result<Vec<RawMetadata>> {
    match format {
        #[cfg(feature = "xml")]
        SourceFormat::Xml(schema) => schema.extract(content, url),
        SourceFormat::HtmlMeta => html::extract_meta_tags(content, url),
        SourceFormat::Ris => ris::extract_ris(content, url),
    }
}

/// Collapse runs of whitespace to single spaces; `None` when nothing is left
pub(crate) fn collapse_whitespace(text: &str) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}
