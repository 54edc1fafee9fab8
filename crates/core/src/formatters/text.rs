use crate::emit::EmittedRecord;
use crate::resolver::{ArticleOutcome, RecordOutcome, ResolutionReport};

/// Configuration for plain text output
#[derive(Debug, Clone, Default)]
pub struct TextConfig {
    /// Wrap values at specified width (0 = no wrapping)
    pub line_width: usize,

    /// Append a one-line summary of the pass
    pub include_summary: bool,
}

/// Plain text formatter for emitted records and reports
pub struct TextFormatter {
    config: TextConfig,
}

impl TextFormatter {
    pub fn new(config: TextConfig) -> Self {
        Self { config }
    }

    pub fn convert(&self, records: &[EmittedRecord], report: &ResolutionReport) -> String {
        records_to_text(records, report, &self.config)
    }

    pub fn report_only(&self, report: &ResolutionReport) -> String {
        report_to_text(report)
    }
}

/// One block per record: the primary URL, then `field: value` lines
pub fn records_to_text(records: &[EmittedRecord], report: &ResolutionReport, config: &TextConfig) -> String {
    let mut blocks = Vec::with_capacity(records.len());

    for record in records {
        let mut block = record.url.clone();
        for (field, values) in record.metadata.fields() {
            let label = format!("  {}: ", field);
            let value = values.join("; ");
            block.push('\n');
            block.push_str(&label);
            block.push_str(&wrap_value(&value, config.line_width, label.len()));
        }
        blocks.push(block);
    }

    if config.include_summary {
        blocks.push(summary(report));
    }

    blocks.join("\n\n")
}

/// One line per article with its outcome, followed by dropped candidates
pub fn report_to_text(report: &ResolutionReport) -> String {
    let mut lines = Vec::new();

    for article in &report.articles {
        let outcome = match &article.outcome {
            ArticleOutcome::Emitted => "emitted".to_string(),
            ArticleOutcome::Suppressed => "suppressed".to_string(),
            ArticleOutcome::Discarded { reason } => format!("discarded ({})", reason),
            ArticleOutcome::Counted => "article".to_string(),
        };
        lines.push(format!("{}  {}", article.full_text_url, outcome));

        for (role, url) in &article.roles {
            lines.push(format!("  {}: {}", role, url));
        }
        for record in &article.records {
            if let RecordOutcome::Suppressed { reason } = record {
                lines.push(format!("  suppressed: {}", reason));
            }
        }
        for failure in &article.extraction_failures {
            lines.push(format!("  unparseable: {} ({})", failure.url, failure.reason));
        }
    }

    for discarded in &report.discarded {
        lines.push(format!("{}  incomplete", discarded.key));
    }
    for conflict in &report.conflicts {
        lines.push(format!(
            "{}  conflict on {}: kept {}, rejected {}",
            conflict.key, conflict.role, conflict.kept, conflict.rejected
        ));
    }

    lines.push(summary(report));
    lines.join("\n")
}

fn summary(report: &ResolutionReport) -> String {
    format!(
        "{}: {} article(s), {} record(s) emitted, {} suppressed, {} incomplete",
        report.plugin,
        report.articles.len(),
        report.emitted_records(),
        report.suppressed_records(),
        report.discarded.len()
    )
}

/// Wrap a value at `width`, indenting continuation lines by `indent`
fn wrap_value(value: &str, width: usize, indent: usize) -> String {
    if width == 0 || width <= indent {
        return value.to_string();
    }

    let words: Vec<&str> = value.split_whitespace().collect();
    wrap_words(&words, width - indent).replace('\n', &format!("\n{}", " ".repeat(indent)))
}

/// Wrap a slice of words to specified width
fn wrap_words(words: &[&str], width: usize) -> String {
    let mut lines = Vec::new();
    let mut current_line = Vec::new();
    let mut current_length = 0;

    for &word in words {
        let word_len = word.len();

        if current_length == 0 {
            current_line.push(word);
            current_length = word_len;
        } else if current_length + 1 + word_len <= width {
            current_length += 1 + word_len;
            current_line.push(word);
        } else {
            lines.push(current_line.join(" "));
            current_line = vec![word];
            current_length = word_len;
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line.join(" "));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{CookedMetadata, MetadataField};

    fn records() -> Vec<EmittedRecord> {
        let mut metadata = CookedMetadata::new();
        metadata.put(MetadataField::ArticleTitle, "Ice cores and the climate of the last glacial").unwrap();
        metadata.put(MetadataField::Author, "Smith, J.").unwrap();
        metadata.put(MetadataField::Author, "Doe, A.").unwrap();
        vec![EmittedRecord { url: "http://x.org/a.pdf".to_string(), metadata }]
    }

    fn report() -> ResolutionReport {
        ResolutionReport { plugin: "example".to_string(), ..Default::default() }
    }

    #[test]
    fn test_records_to_text() {
        let text = records_to_text(&records(), &report(), &TextConfig::default());

        assert!(text.starts_with("http://x.org/a.pdf\n"));
        assert!(text.contains("  author: Smith, J.; Doe, A."));
        assert!(text.contains("  article.title: Ice cores"));
        assert!(!text.contains("article(s)"));
    }

    #[test]
    fn test_records_to_text_with_summary() {
        let config = TextConfig { include_summary: true, ..Default::default() };
        let text = records_to_text(&records(), &report(), &config);
        assert!(text.ends_with("example: 0 article(s), 0 record(s) emitted, 0 suppressed, 0 incomplete"));
    }

    #[test]
    fn test_wrap_value_indents_continuations() {
        let wrapped = wrap_value("one two three four five six", 16, 6);
        assert!(wrapped.contains("\n      "));
        assert_eq!(wrap_value("one two", 0, 6), "one two");
    }

    #[test]
    fn test_wrap_words() {
        let words = vec!["hello", "world", "this", "is", "a", "test"];
        let wrapped = wrap_words(&words, 10);
        assert!(wrapped.contains('\n'));
    }

    #[test]
    fn test_text_formatter_report_only() {
        let formatter = TextFormatter::new(TextConfig::default());
        assert!(formatter.report_only(&report()).contains("0 article(s)"));
        assert_eq!(
            formatter.convert(&records(), &report()),
            records_to_text(&records(), &report(), &TextConfig::default())
        );
    }
}
