use gumshoe::{repair::repair, timestamp};
use proptest::prelude::*;
use serde_json::{Map, Value};
use time::{macros::format_description, Duration, PrimitiveDateTime};

/// JSON values whose strings cannot contain any of the repaired byte patterns.
fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(Value::from),
        "[a-zA-Z0-9 ._-]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
            prop::collection::btree_map("[a-zA-Z0-9_]{0,6}", inner, 0..5)
                .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Renders `value` the way the broken plist renderer does: empty-string values dropped and
/// a dangling separator before every list terminator.
fn render_with_defects(value: &Value, commas: usize) -> String {
    let dangling = format!("{}]", ",".repeat(commas));
    value
        .to_string()
        .replace(r#":"""#, ":")
        .replace(']', &dangling)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Well-formed JSON never contains `:}`, `:,` or `,]`, so repair must leave it alone.
    #[test]
    fn prop_repair_is_identity_on_well_formed_json(value in arb_json()) {
        let text = value.to_string();
        prop_assert_eq!(repair(&text), text);
    }

    /// One pass restores every document of the defect family.
    #[test]
    fn prop_single_pass_restores_defective_rendering(value in arb_json(), commas in 1usize..4) {
        let broken = render_with_defects(&value, commas);
        let repaired = repair(&broken);
        let reparsed: Value = serde_json::from_str(&repaired)
            .map_err(|err| TestCaseError::fail(format!("{err}: {repaired}")))?;
        prop_assert_eq!(reparsed, value);
    }

    /// A second pass never finds anything left to rewrite.
    #[test]
    fn prop_repair_is_idempotent(text in r#"[:,\]\}"a0 ]{0,48}"#) {
        let once = repair(&text);
        prop_assert_eq!(repair(&once), once);
    }

    #[test]
    fn prop_convert_parses_back_to_epoch_plus_offset(
        seconds in 0i64..4_000_000_000,
        millis in 0u32..1000,
    ) {
        let offset = seconds as f64 + f64::from(millis) / 1000.0;
        let rendered = timestamp::convert(Some(offset));
        prop_assert!(rendered.ends_with("(Estimate)"), "{}", rendered);

        let stamp = rendered.trim_end_matches(timestamp::ESTIMATE_SUFFIX);
        let parsed = PrimitiveDateTime::parse(
            stamp,
            format_description!("[month repr:short] [day] [year] [hour]:[minute]:[second]"),
        )
        .map_err(|err| TestCaseError::fail(format!("{err}: {stamp}")))?;

        let expected = timestamp::DEVICE_EPOCH + Duration::seconds(seconds);
        prop_assert_eq!(parsed.assume_utc(), expected);
    }
}

#[test]
fn convert_none_is_always_the_sentinel() {
    assert_eq!(timestamp::convert(None), "Not Available");
}
