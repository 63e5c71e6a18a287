//! Fragment text codec.
//!
//! State travels in the URL fragment as `key=value` pairs joined by `&`.
//! Nothing is escaped: a value may contain `=` (only the first `=` of a
//! segment separates key from value), but a `&` inside a key or value splits
//! the pair on the way back in.

use std::collections::BTreeMap;

/// Key-value state as carried in the fragment.
pub type StateMap = BTreeMap<String, String>;

/// Separator between pairs.
pub const PAIR_SEPARATOR: char = '&';

/// Separator between a key and its value.
pub const KEY_VALUE_SEPARATOR: char = '=';

/// Parse fragment text into state.
///
/// Segments without `=` are dropped. A leading `#` is ignored. When a key
/// repeats, the last occurrence wins.
pub fn parse(fragment: &str) -> StateMap {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);

    fragment
        .split(PAIR_SEPARATOR)
        .filter_map(|segment| {
            segment
                .split_once(KEY_VALUE_SEPARATOR)
                .map(|(key, value)| (key.to_string(), value.to_string()))
        })
        .collect()
}

/// Look up a single key without building the whole map.
pub fn lookup(fragment: &str, key: &str) -> Option<String> {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);

    fragment
        .split(PAIR_SEPARATOR)
        .filter_map(|segment| segment.split_once(KEY_VALUE_SEPARATOR))
        .filter(|(k, _)| *k == key)
        .last()
        .map(|(_, value)| value.to_string())
}

/// Serialize state into fragment text. Empty state gives the empty string.
pub fn serialize(state: &StateMap) -> String {
    let mut out = String::new();
    for (key, value) in state {
        if !out.is_empty() {
            out.push(PAIR_SEPARATOR);
        }
        out.push_str(key);
        out.push(KEY_VALUE_SEPARATOR);
        out.push_str(value);
    }
    out
}

/// Keys whose value differs between two states (added, removed or changed).
pub fn changed_keys(before: &StateMap, after: &StateMap) -> Vec<String> {
    let mut changed: Vec<String> = before
        .iter()
        .filter(|(k, v)| after.get(*k) != Some(*v))
        .map(|(k, _)| k.clone())
        .collect();

    changed.extend(
        after
            .keys()
            .filter(|k| !before.contains_key(*k))
            .cloned(),
    );
    changed.sort();
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn map(pairs: &[(&str, &str)]) -> StateMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_pairs() {
        let state = parse("a=1&b=2");
        assert_eq!(state, map(&[("a", "1"), ("b", "2")]));
    }

    #[test]
    fn test_parse_drops_malformed_segments() {
        let state = parse("a=1&malformed&b=2");
        assert_eq!(state, map(&[("a", "1"), ("b", "2")]));
    }

    #[test]
    fn test_parse_splits_on_first_equals() {
        let state = parse("query=x=y&n=");
        assert_eq!(state, map(&[("query", "x=y"), ("n", "")]));
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse("").is_empty());
        assert!(parse("#").is_empty());
        assert!(parse("&&").is_empty());
    }

    #[test]
    fn test_parse_strips_hash_marker() {
        assert_eq!(parse("#file=main.rs"), map(&[("file", "main.rs")]));
    }

    #[test]
    fn test_parse_last_duplicate_wins() {
        assert_eq!(parse("a=1&a=2"), map(&[("a", "2")]));
        assert_eq!(lookup("a=1&a=2", "a"), Some("2".to_string()));
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("a=1&b=2", "b"), Some("2".to_string()));
        assert_eq!(lookup("a=1&b", "b"), None);
        assert_eq!(lookup("", "a"), None);
    }

    #[test]
    fn test_serialize() {
        assert_eq!(serialize(&StateMap::new()), "");
        assert_eq!(serialize(&map(&[("b", "2"), ("a", "1")])), "a=1&b=2");
    }

    #[test]
    fn test_ampersand_in_value_is_not_escaped() {
        // Known limitation: the value is cut at the `&`.
        let text = serialize(&map(&[("q", "x&y")]));
        assert_eq!(text, "q=x&y");
        assert_eq!(parse(&text), map(&[("q", "x")]));
    }

    #[test]
    fn test_changed_keys() {
        let before = map(&[("a", "1"), ("b", "2"), ("c", "3")]);
        let after = map(&[("a", "1"), ("b", "9"), ("d", "4")]);
        assert_eq!(changed_keys(&before, &after), vec!["b", "c", "d"]);
        assert!(changed_keys(&before, &before).is_empty());
    }

    proptest! {
        #[test]
        fn prop_parse_inverts_serialize(
            state in prop::collection::btree_map("[a-z0-9_.-]{1,8}", "[a-zA-Z0-9=/_.-]{0,12}", 0..8)
        ) {
            prop_assert_eq!(parse(&serialize(&state)), state);
        }
    }
}
