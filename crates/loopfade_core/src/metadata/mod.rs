//! Collection metadata and tag merging.
//!
//! A collection's metadata file maps lower-cased track stems to tag
//! objects. Keys beginning with `__` are internal control fields and are
//! never written to the output file:
//!
//! ```json
//! {
//!     "__common__": { "album": "Cave Story", "artist": "Pixel" },
//!     "access":     { "title": "Access", "track": 1 },
//!     "fanfale1":   { "title": "Victory!", "__loops": "*0" }
//! }
//! ```

mod file;
mod merger;

pub use file::{CollectionMetadata, TrackConfig};
pub use merger::{merge_tags, TagDirective};

/// Prefix that marks a key as internal.
pub const INTERNAL_KEY_PREFIX: &str = "__";

/// Per-track key holding the loop-override expression.
pub const LOOP_OVERRIDE_KEY: &str = "__loops";

/// Stem holding collection-wide tags.
pub const COMMON_KEY: &str = "__common__";

/// Whether a metadata key is an internal control field.
pub fn is_internal_key(key: &str) -> bool {
    key.starts_with(INTERNAL_KEY_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_keys_are_recognised() {
        assert!(is_internal_key(LOOP_OVERRIDE_KEY));
        assert!(is_internal_key(COMMON_KEY));
        assert!(!is_internal_key("title"));
        assert!(!is_internal_key("_title"));
    }
}
