//! Raw and cooked article metadata.
//!
//! Extractors produce [`RawMetadata`] keyed by source-specific names. A
//! [`CookMap`] turns it into [`CookedMetadata`] keyed by [`MetadataField`];
//! [`PostCookHook`]s then fill remaining gaps.

pub mod cook;
pub mod cooked;
pub mod field;
pub mod raw;

pub use cook::{CookMap, CookMapBuilder, Cooked, GapFiller, HookContext, PostCookHook};
pub use cooked::CookedMetadata;
pub use field::{Cardinality, MetadataField};
pub use raw::RawMetadata;
