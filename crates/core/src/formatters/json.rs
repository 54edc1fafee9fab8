use crate::Result;
use crate::emit::EmittedRecord;
use crate::resolver::ResolutionReport;
use serde::Serialize;

/// Complete JSON output structure
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    /// Emitted records in emission order
    pub records: &'a [EmittedRecord],
    /// Optional per-article report
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<&'a ResolutionReport>,
}

/// Configuration for JSON output
#[derive(Debug, Clone, Default)]
pub struct JsonConfig {
    /// Include the resolution report next to the records
    pub include_report: bool,
    /// Pretty print JSON output
    pub pretty: bool,
}

fn to_string<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    if pretty { Ok(serde_json::to_string_pretty(value)?) } else { Ok(serde_json::to_string(value)?) }
}

/// Convert emitted records (and optionally the report) to JSON
pub fn records_to_json(records: &[EmittedRecord], report: &ResolutionReport, config: &JsonConfig) -> Result<String> {
    let output = JsonOutput { records, report: config.include_report.then_some(report) };
    to_string(&output, config.pretty)
}

/// Convert the resolution report alone to JSON (for --articles)
pub fn report_to_json(report: &ResolutionReport, pretty: bool) -> Result<String> {
    to_string(report, pretty)
}

/// JSON formatter with configurable options
pub struct JsonFormatter {
    config: JsonConfig,
}

impl JsonFormatter {
    pub fn new(config: JsonConfig) -> Self {
        Self { config }
    }

    pub fn convert(&self, records: &[EmittedRecord], report: &ResolutionReport) -> Result<String> {
        records_to_json(records, report, &self.config)
    }

    pub fn report_only(&self, report: &ResolutionReport) -> Result<String> {
        report_to_json(report, self.config.pretty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{CookedMetadata, MetadataField};

    fn records() -> Vec<EmittedRecord> {
        let mut metadata = CookedMetadata::new();
        metadata.put(MetadataField::Doi, "10.5194/cp-8-1-2012").unwrap();
        metadata.put(MetadataField::Author, "Smith, J.").unwrap();
        metadata.put(MetadataField::Author, "Doe, A.").unwrap();
        vec![EmittedRecord { url: "http://x.org/a.pdf".to_string(), metadata }]
    }

    fn report() -> ResolutionReport {
        ResolutionReport { plugin: "example".to_string(), ..Default::default() }
    }

    #[test]
    fn test_records_to_json_compact() {
        let json = records_to_json(&records(), &report(), &JsonConfig::default()).unwrap();

        assert!(json.contains(r#""url":"http://x.org/a.pdf""#));
        assert!(json.contains(r#""doi":"10.5194/cp-8-1-2012""#));
        assert!(json.contains(r#""author":["Smith, J.","Doe, A."]"#));
        assert!(!json.contains("report"));
    }

    #[test]
    fn test_records_to_json_with_report() {
        let config = JsonConfig { include_report: true, pretty: true };
        let json = records_to_json(&records(), &report(), &config).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["report"]["plugin"], "example");
        assert_eq!(value["records"].as_array().map(Vec::len), Some(1));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_json_formatter() {
        let config = JsonConfig { pretty: false, ..Default::default() };
        let formatter = JsonFormatter::new(config.clone());

        assert_eq!(
            formatter.convert(&records(), &report()).unwrap(),
            records_to_json(&records(), &report(), &config).unwrap()
        );
        assert!(formatter.report_only(&report()).unwrap().starts_with('{'));
    }
}
