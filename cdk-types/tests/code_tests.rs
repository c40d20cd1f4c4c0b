use cdk_types::{normalize, Code};
use pretty_assertions::{assert_eq, assert_ne};
use proptest::prelude::*;

#[test]
fn comparisons_use_normalized_form() {
    let a = Code::parse("abc-123");
    let b = Code::parse("  ABC-123  ");
    assert_eq!(a.normalized(), b.normalized());
    assert_ne!(a.raw(), b.raw());
}

#[test]
fn display_is_normalized() {
    assert_eq!(Code::parse(" xy z ").to_string(), "XY Z");
}

proptest! {
    // normalize(normalize(x)) == normalize(x)
    #[test]
    fn normalization_is_idempotent(raw in ".{0,64}") {
        let once = normalize(&raw);
        prop_assert_eq!(normalize(&once), once.clone());
    }

    #[test]
    fn normalized_has_no_surrounding_whitespace(raw in ".{0,64}") {
        let n = normalize(&raw);
        prop_assert_eq!(n.trim(), n.as_str());
    }
}
