use super::collapse_whitespace;
use crate::error::{QuireError, Result};
use crate::metadata::RawMetadata;
use scraper::{Html, Selector};

/// Collect `<meta name|property=... content=...>` pairs into one raw record.
///
/// Keys are the `name` (or `property`) attribute; repeated tags such as
/// `citation_author` keep every value in document order.
pub fn extract_meta_tags(html: &str, source_url: &str) -> Result<Vec<RawMetadata>> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("meta[content]").map_err(|e| QuireError::ExtractionError {
        url: source_url.to_string(),
        reason: format!("Invalid selector: {:?}", e),
    })?;

    let mut raw = RawMetadata::from_source(source_url);
    for element in document.select(&selector) {
        let attrs = element.value();
        let Some(name) = attrs.attr("name").or_else(|| attrs.attr("property")) else {
            continue;
        };

        if let Some(content) = attrs.attr("content").and_then(collapse_whitespace) {
            raw.put(name.trim(), content);
        }
    }

    Ok(vec![raw])
}
