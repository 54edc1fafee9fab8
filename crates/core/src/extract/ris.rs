use crate::error::{QuireError, Result};
use crate::metadata::RawMetadata;

/// Parse RIS citation records (`TAG  - value`, terminated by `ER  -`).
///
/// Each `TY` ... `ER` block becomes one raw record keyed by tag. Lines
/// without a tag continue the previous value. A final record missing its
/// `ER` line is still returned.
pub fn extract_ris(content: &str, source_url: &str) -> Result<Vec<RawMetadata>> {
    let mut records = Vec::new();
    let mut current: Option<RawMetadata> = None;
    let mut last_tag: Option<String> = None;

    let err = |line_no: usize, reason: &str| QuireError::ExtractionError {
        url: source_url.to_string(),
        reason: format!("RIS line {}: {}", line_no + 1, reason),
    };

    for (line_no, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim_end().trim_start_matches('\u{feff}');
        if line.trim().is_empty() {
            continue;
        }

        let Some((tag, value)) = split_tag(line) else {
            match (current.as_mut(), last_tag.as_deref()) {
                (Some(record), Some(tag)) => {
                    let mut values = record.get_all(tag).to_vec();
                    if let Some(last) = values.last_mut() {
                        last.push(' ');
                        last.push_str(line.trim());
                    }
                    record.replace(tag, values);
                    continue;
                }
                _ => return Err(err(line_no, "expected 'TAG  - value'")),
            }
        };

        match tag {
            "TY" => {
                if current.is_some() {
                    return Err(err(line_no, "TY inside an open record"));
                }
                let mut record = RawMetadata::from_source(source_url);
                record.put("TY", value);
                current = Some(record);
                last_tag = Some("TY".to_string());
            }
            "ER" => {
                let Some(record) = current.take() else {
                    return Err(err(line_no, "ER without TY"));
                };
                records.push(record);
                last_tag = None;
            }
            _ => {
                let Some(record) = current.as_mut() else {
                    return Err(err(line_no, "tag outside of a record"));
                };
                record.put(tag, value);
                last_tag = Some(tag.to_string());
            }
        }
    }

    if let Some(record) = current {
        records.push(record);
    }

    Ok(records)
}

fn split_tag(line: &str) -> Option<(&str, &str)> {
    let (tag, value) = line.split_once("  - ").or_else(|| line.split_once("  -"))?;
    let tag = tag.trim();
    let valid = tag.len() == 2
        && tag.starts_with(|c: char| c.is_ascii_uppercase())
        && tag.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());

    valid.then(|| (tag, value.trim()))
}
