use crate::metadata::CookedMetadata;
use serde::Serialize;

/// Receiver of finished metadata records.
///
/// Records are moved into the emitter, so each one is emitted at most once.
pub trait Emitter {
    fn emit(&mut self, primary_url: &str, metadata: CookedMetadata);
}

/// One emitted record, as collected by `Vec<EmittedRecord>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmittedRecord {
    pub url: String,
    pub metadata: CookedMetadata,
}

impl Emitter for Vec<EmittedRecord> {
    fn emit(&mut self, primary_url: &str, metadata: CookedMetadata) {
        self.push(EmittedRecord { url: primary_url.to_string(), metadata });
    }
}

impl<F> Emitter for F
where
    F: FnMut(&str, CookedMetadata),
{
    fn emit(&mut self, primary_url: &str, metadata: CookedMetadata) {
        self(primary_url, metadata)
    }
}
