use super::field::MetadataField;
use crate::error::MetadataError;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Value slot of one cooked field
#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Valid(Vec<String>),
    /// Validation failed and nothing valid has been seen yet
    Invalid { raw: String, reason: String },
}

/// Canonical metadata of one consolidated record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookedMetadata {
    fields: BTreeMap<MetadataField, Slot>,
}

impl CookedMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store a value.
    ///
    /// Single-valued fields accept a value when empty or holding an invalid
    /// marker; re-putting the same value is a no-op and a different value is
    /// a [`MetadataError::CardinalityError`]. Multi-valued fields append.
    pub fn put(&mut self, field: MetadataField, value: &str) -> Result<(), MetadataError> {
        let normalized = match field.validate(value) {
            Ok(v) => v,
            Err(reason) => {
                if !self.fields.contains_key(&field) {
                    self.fields
                        .insert(field, Slot::Invalid { raw: value.trim().to_string(), reason: reason.clone() });
                }
                return Err(MetadataError::InvalidValue { field, value: value.to_string(), reason });
            }
        };

        match self.fields.get_mut(&field) {
            Some(Slot::Valid(values)) if field.is_multi() => {
                values.push(normalized);
                Ok(())
            }
            Some(Slot::Valid(values)) => {
                let existing = values.first().cloned().unwrap_or_default();
                if existing == normalized {
                    Ok(())
                } else {
                    Err(MetadataError::CardinalityError { field, existing, value: normalized })
                }
            }
            Some(slot @ Slot::Invalid { .. }) => {
                *slot = Slot::Valid(vec![normalized]);
                Ok(())
            }
            None => {
                self.fields.insert(field, Slot::Valid(vec![normalized]));
                Ok(())
            }
        }
    }

    /// Store a value only when the field has no valid value yet.
    ///
    /// Returns whether the value was written.
    pub fn put_if_better(&mut self, field: MetadataField, value: &str) -> bool {
        if value.trim().is_empty() || self.has_valid_value(field) {
            return false;
        }
        self.put(field, value).is_ok()
    }

    /// First valid value
    pub fn get(&self, field: MetadataField) -> Option<&str> {
        self.get_list(field).first().map(String::as_str)
    }

    /// All valid values
    pub fn get_list(&self, field: MetadataField) -> &[String] {
        match self.fields.get(&field) {
            Some(Slot::Valid(values)) => values,
            _ => &[],
        }
    }

    pub fn has_valid_value(&self, field: MetadataField) -> bool {
        !self.get_list(field).is_empty()
    }

    /// Raw text and reason of an invalid marker
    pub fn invalid_value(&self, field: MetadataField) -> Option<(&str, &str)> {
        match self.fields.get(&field) {
            Some(Slot::Invalid { raw, reason }) => Some((raw.as_str(), reason.as_str())),
            _ => None,
        }
    }

    /// Fields with valid values, in canonical order
    pub fn fields(&self) -> impl Iterator<Item = (MetadataField, &[String])> {
        self.fields.iter().filter_map(|(field, slot)| match slot {
            Slot::Valid(values) => Some((*field, values.as_slice())),
            Slot::Invalid { .. } => None,
        })
    }

    /// Number of fields holding valid values
    pub fn len(&self) -> usize {
        self.fields().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Serialized as `{ "doi": "...", "author": ["...", "..."] }`; invalid
/// markers are omitted.
impl Serialize for CookedMetadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (field, values) in self.fields() {
            if field.is_multi() {
                map.serialize_entry(field.key(), values)?;
            } else {
                map.serialize_entry(field.key(), &values[0])?;
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_single() {
        let mut md = CookedMetadata::new();
        md.put(MetadataField::ArticleTitle, "A Title").unwrap();
        md.put(MetadataField::ArticleTitle, "A Title").unwrap();

        let err = md.put(MetadataField::ArticleTitle, "Another").unwrap_err();
        assert!(matches!(err, MetadataError::CardinalityError { .. }));
        assert_eq!(md.get(MetadataField::ArticleTitle), Some("A Title"));
    }

    #[test]
    fn test_put_multi_keeps_order() {
        let mut md = CookedMetadata::new();
        md.put(MetadataField::Author, "Smith, J.").unwrap();
        md.put(MetadataField::Author, "Doe, A.").unwrap();

        assert_eq!(md.get_list(MetadataField::Author), &["Smith, J.".to_string(), "Doe, A.".to_string()]);
    }

    #[test]
    fn test_invalid_marker_is_replaced_by_valid_value() {
        let mut md = CookedMetadata::new();
        assert!(md.put(MetadataField::Doi, "garbage").is_err());
        assert!(!md.has_valid_value(MetadataField::Doi));
        assert_eq!(md.invalid_value(MetadataField::Doi).map(|(raw, _)| raw), Some("garbage"));

        assert!(md.put_if_better(MetadataField::Doi, "10.5194/cp-8-1-2012"));
        assert_eq!(md.get(MetadataField::Doi), Some("10.5194/cp-8-1-2012"));
        assert!(md.invalid_value(MetadataField::Doi).is_none());
    }

    #[test]
    fn test_put_if_better_never_overwrites() {
        let mut md = CookedMetadata::new();
        md.put(MetadataField::Publisher, "Copernicus").unwrap();

        assert!(!md.put_if_better(MetadataField::Publisher, "Someone Else"));
        assert!(!md.put_if_better(MetadataField::Volume, "  "));
        assert_eq!(md.get(MetadataField::Publisher), Some("Copernicus"));
    }

    #[test]
    fn test_serialize_skips_invalid() {
        let mut md = CookedMetadata::new();
        md.put(MetadataField::Doi, "10.5194/cp-8-1-2012").unwrap();
        md.put(MetadataField::Author, "Smith, J.").unwrap();
        let _ = md.put(MetadataField::Isbn, "123");

        let json = serde_json::to_value(&md).unwrap();
        assert_eq!(json["doi"], "10.5194/cp-8-1-2012");
        assert_eq!(json["author"][0], "Smith, J.");
        assert!(json.get("isbn").is_none());
        assert_eq!(md.len(), 2);
    }
}
