// Property tests for template parsing and the built-in generators.
//
// Properties tested:
// 1. Text without "{{" renders to itself
// 2. Malformed markers never fail rendering and come back verbatim
// 3. random_string(n) yields n alphanumeric characters
// 4. random_number(min, max) stays within [min, max]

use std::collections::HashSet;

use proptest::prelude::*;
use txbench_core::template::{builtins, render_str};
use txbench_core::{FunctionRegistry, Template, Value};

proptest! {
    #[test]
    fn prop_plain_text_is_identity(text in "[^{]{0,64}") {
        let rendered = Template::parse(text.clone())
            .render(&FunctionRegistry::with_builtins())
            .unwrap();
        prop_assert_eq!(rendered, text);
    }

    #[test]
    fn prop_unclosed_marker_is_raw(prefix in "[a-zA-Z ]{0,16}", body in "[a-z_ ]{0,16}") {
        let source = format!("{prefix}{{{{ {body}");
        prop_assert_eq!(render_str(&source).unwrap(), source);
    }

    #[test]
    fn prop_random_string_length_and_alphabet(length in 0i64..256) {
        let value = builtins::random_string(&[Value::Integer(length)]).unwrap();
        let text = value.as_text().unwrap();
        prop_assert_eq!(text.len() as i64, length);
        prop_assert!(text.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn prop_random_number_within_bounds(min in -1_000_000i64..1_000_000, span in 0i64..1_000) {
        let max = min + span;
        let source = format!("{{{{ random_number({min}, {max}) }}}}");
        let n: i64 = render_str(&source).unwrap().parse().unwrap();
        prop_assert!((min..=max).contains(&n));
    }
}

#[test]
fn test_random_number_hits_both_bounds() {
    let seen: HashSet<i64> = (0..2_000)
        .map(|_| {
            builtins::random_number(&[Value::Integer(1), Value::Integer(3)])
                .unwrap()
                .as_integer()
                .unwrap()
        })
        .collect();
    assert_eq!(seen, HashSet::from([1, 2, 3]));
}

#[test]
fn test_fresh_values_per_render() {
    let template = Template::parse("{{ random_string(24) }}");
    let registry = FunctionRegistry::with_builtins();
    let a = template.render(&registry).unwrap();
    let b = template.render(&registry).unwrap();
    assert_eq!(a.len(), 24);
    assert_ne!(a, b);
}
