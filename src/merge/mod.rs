//! Cross-site merge of channels and programmes
//!
//! Channels are unified per id, keeping the richest definition. Programmes
//! are deduplicated per channel with a fuzzy temporal match and fused
//! field-by-field, with the quality score plus the preferred-site order
//! deciding who wins on conflicts.

pub mod engine;
pub mod fuzzy;
pub mod score;

pub use engine::{MergeEngine, MergedGuide};
