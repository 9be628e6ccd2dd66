//! Property-based tests for scribe using proptest

use proptest::prelude::*;
use scribe::core::field::{encode_hex, flatten};
use scribe::prelude::*;

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Trace),
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
        Just(LogLevel::Metric),
    ]
}

/// Plain fields plus nested aggregates up to three levels deep
fn any_field() -> impl Strategy<Value = Field> {
    let leaf = prop_oneof![
        ("[a-z]{1,8}", ".*").prop_map(|(k, v)| Field::string(k, v)),
        ("[a-z]{1,8}", any::<i64>()).prop_map(|(k, v)| Field::int64(k, v)),
        ("[a-z]{1,8}", any::<u64>()).prop_map(|(k, v)| Field::uint64(k, v)),
        ("[a-z]{1,8}", prop::collection::vec(any::<u8>(), 0..16))
            .prop_map(|(k, v)| Field::bytes(k, v)),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        ("[a-z]{1,8}", prop::collection::vec(inner, 0..4))
            .prop_map(|(k, nested)| Field::aggregate(k, nested))
    })
}

fn count_leaves(fields: &[Field]) -> usize {
    fields
        .iter()
        .map(|f| match &f.value {
            FieldValue::Aggregate(nested) => count_leaves(nested),
            _ => 1,
        })
        .sum()
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    /// Test that LogLevel string conversions roundtrip correctly
    #[test]
    fn test_log_level_str_roundtrip(level in any_level()) {
        let parsed: LogLevel = level.to_str().parse().unwrap();
        prop_assert_eq!(level, parsed);
    }

    /// Test that parsing accepts upper-case input
    #[test]
    fn test_log_level_case_insensitive(level in any_level()) {
        let parsed: LogLevel = level.to_str().to_uppercase().parse().unwrap();
        prop_assert_eq!(level, parsed);
    }

    #[test]
    fn test_log_level_invalid_parse(invalid in "[^a-zA-Z]*") {
        prop_assert!(invalid.parse::<LogLevel>().is_err());
    }
}

// ============================================================================
// Field Tests
// ============================================================================

proptest! {
    /// Flattening never leaves an aggregate behind and keeps every leaf
    #[test]
    fn test_flatten_removes_all_aggregates(fields in prop::collection::vec(any_field(), 0..8)) {
        let leaves = count_leaves(&fields);
        let flat = flatten(fields);

        prop_assert!(flat.iter().all(|f| !f.is_nested()));
        prop_assert_eq!(flat.len(), leaves);
    }

    #[test]
    fn test_hex_is_lowercase_and_double_length(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let hex = encode_hex(&bytes);
        prop_assert_eq!(hex.len(), bytes.len() * 2);
        prop_assert!(hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }
}

// ============================================================================
// Formatter Tests
// ============================================================================

proptest! {
    /// Any message and field set renders to exactly one parseable JSON line
    #[test]
    fn test_json_formatter_single_line(
        level in any_level(),
        message in ".*",
        fields in prop::collection::vec(any_field(), 0..6),
    ) {
        let record = Record::new(level, message.clone(), flatten(fields));
        let line = JsonFormatter::new().format_record(&record).unwrap();

        prop_assert!(!line.contains('\n'));
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        prop_assert_eq!(parsed["level"].as_str(), Some(level.to_str()));
    }

    /// Underscore-prefixed keys always come after function and source
    #[test]
    fn test_human_readable_underscore_keys_last(
        key in "_[a-z]{1,6}",
        message in "[a-z ]{0,20}",
    ) {
        let fields = vec![
            Field::string(key.clone(), "x"),
            Field::function("f"),
            Field::source("s.rs:1"),
            Field::int("n", 1),
        ];
        let record = Record::new(LogLevel::Info, message, fields);
        let line = HumanReadableFormatter::new()
            .with_colors(false)
            .format_record(&record)
            .unwrap();

        let underscore_at = line.find(&format!(" {}=x", key)).unwrap();
        let source_at = line.find(" source=s.rs:1").unwrap();
        let n_at = line.find(" n=1").unwrap();
        prop_assert!(n_at < source_at);
        prop_assert!(source_at < underscore_at);
    }
}

// ============================================================================
// Filter Tests
// ============================================================================

proptest! {
    /// A chain allows a record exactly when every filter does
    #[test]
    fn test_filter_chain_is_conjunction(
        level in any_level(),
        message in "[a-z]{0,12}",
        verdicts in prop::collection::vec(any::<bool>(), 0..6),
    ) {
        let filters: Vec<std::sync::Arc<dyn Filter>> = verdicts
            .iter()
            .map(|&verdict| {
                let filter = move |_: LogLevel, _: &str, _: &[Field]| verdict;
                std::sync::Arc::new(filter) as std::sync::Arc<dyn Filter>
            })
            .collect();
        let chain = FilterChain::new(filters);

        prop_assert_eq!(chain.allows(level, &message, &[]), verdicts.iter().all(|v| *v));
    }

    #[test]
    fn test_only_errors(level in any_level(), message in ".*") {
        prop_assert_eq!(OnlyErrors.allows(level, &message, &[]), level == LogLevel::Error);
    }
}
