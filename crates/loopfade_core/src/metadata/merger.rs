//! Merging of collection-wide and per-track tags.

use indexmap::IndexMap;

use super::is_internal_key;

/// One `key=value` tag handed to the encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDirective {
    pub key: String,
    pub value: String,
}

impl TagDirective {
    /// Encoder argument value (`key=value`).
    pub fn to_arg(&self) -> String {
        format!("{}={}", self.key, self.value)
    }
}

/// Merge common and per-track tags into encoder directives.
///
/// Per-track values win on collision but the key keeps the position it
/// had in the common map. Internal keys are dropped. The order is the
/// insertion order of the merged map, so the output is stable for a
/// given input.
pub fn merge_tags(
    common: &IndexMap<String, String>,
    track: &IndexMap<String, String>,
) -> Vec<TagDirective> {
    let mut merged: IndexMap<&str, &str> = IndexMap::new();
    for (key, value) in common.iter().chain(track.iter()) {
        merged.insert(key.as_str(), value.as_str());
    }

    merged
        .into_iter()
        .filter(|(key, _)| !is_internal_key(key))
        .map(|(key, value)| TagDirective {
            key: key.to_string(),
            value: value.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn pairs(directives: &[TagDirective]) -> Vec<(&str, &str)> {
        directives
            .iter()
            .map(|d| (d.key.as_str(), d.value.as_str()))
            .collect()
    }

    #[test]
    fn track_values_override_common() {
        let merged = merge_tags(
            &map(&[("a", "1"), ("b", "2")]),
            &map(&[("b", "3"), ("c", "4")]),
        );
        assert_eq!(pairs(&merged), vec![("a", "1"), ("b", "3"), ("c", "4")]);
    }

    #[test]
    fn internal_keys_are_stripped() {
        let merged = merge_tags(
            &map(&[("__common_note", "x"), ("album", "OST")]),
            &map(&[("__loops", "+2"), ("title", "Theme")]),
        );
        assert_eq!(pairs(&merged), vec![("album", "OST"), ("title", "Theme")]);
    }

    #[test]
    fn empty_inputs_yield_nothing() {
        assert!(merge_tags(&IndexMap::new(), &IndexMap::new()).is_empty());
    }

    #[test]
    fn directive_formats_as_key_value() {
        let directive = TagDirective {
            key: "title".to_string(),
            value: "Moonsong = Night".to_string(),
        };
        assert_eq!(directive.to_arg(), "title=Moonsong = Night");
    }
}
