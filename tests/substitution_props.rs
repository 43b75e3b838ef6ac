//! Property-based tests for placeholder substitution
//!
//! Coverage targets:
//! - Every token occurrence is replaced, everything else is kept
//! - Re-running over substituted output changes nothing
//! - Text inserted by one binding is never scanned by a later one

use proptest::prelude::*;
use webgen::template::{apply, Binding, SENTINEL};

prop_compose! {
    /// Filler text that cannot contain a placeholder
    fn arb_filler()(text in "[a-z0-9 =;:/.'\"<>-]{0,24}") -> String {
        text
    }
}

prop_compose! {
    /// Bindings for distinct, non-overlapping tokens
    fn arb_bindings()(
        values in prop::collection::vec(prop::option::of("[a-z0-9.:/-]{0,16}"), 1..5)
    ) -> Vec<Binding> {
        values
            .into_iter()
            .enumerate()
            .map(|(i, value)| Binding::new(format!("REPLACE_ME_T{}X", i), value))
            .collect()
    }
}

prop_compose! {
    /// A template interleaving filler with token references, plus the
    /// expected output built piece by piece
    fn arb_case()(
        bindings in arb_bindings(),
        pieces in prop::collection::vec((arb_filler(), any::<prop::sample::Index>()), 0..8),
        tail in arb_filler(),
    ) -> (Vec<Binding>, String, String) {
        let mut template = String::new();
        let mut expected = String::new();
        for (filler, index) in &pieces {
            let binding = &bindings[index.index(bindings.len())];
            template.push_str(filler);
            template.push_str(&binding.token);
            expected.push_str(filler);
            expected.push_str(binding.value.as_deref().unwrap_or(SENTINEL));
        }
        template.push_str(&tail);
        expected.push_str(&tail);
        (bindings, template, expected)
    }
}

proptest! {
    #[test]
    fn replaces_tokens_and_keeps_other_text((bindings, template, expected) in arb_case()) {
        let out = apply(&bindings, &template);
        prop_assert_eq!(out.text, expected);
    }

    #[test]
    fn second_pass_is_noop((bindings, template, _expected) in arb_case()) {
        let first = apply(&bindings, &template);
        let second = apply(&bindings, &first.text);
        prop_assert_eq!(&second.text, &first.text);
        prop_assert!(second.counts.iter().all(|c| c.count == 0));
    }

    #[test]
    fn inserted_text_is_not_rescanned(
        prefix in arb_filler(),
        middle in arb_filler(),
        b_value in "[a-z]{1,8}",
    ) {
        let bindings = [
            Binding::found("REPLACE_ME_A", "[REPLACE_ME_B]"),
            Binding::found("REPLACE_ME_B", b_value.clone()),
        ];
        let template = format!("{prefix}REPLACE_ME_A{middle}REPLACE_ME_B");

        let out = apply(&bindings, &template);

        prop_assert_eq!(out.text, format!("{prefix}[REPLACE_ME_B]{middle}{b_value}"));
        prop_assert_eq!(out.counts[1].count, 1);
    }
}
