pub mod json;
pub mod text;

pub use json::{JsonConfig, JsonFormatter, JsonOutput, records_to_json, report_to_json};
pub use text::{TextConfig, TextFormatter, records_to_text, report_to_text};
