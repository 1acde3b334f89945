//! Property-based tests: address grammar and all-or-nothing parameter writes.

use proptest::prelude::*;
use tether_core::{
    NumericRange, Parameter, ParameterError, ValidationError, address_to_path, is_valid_address,
    path_to_address,
};

fn arb_segment() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_.~-]{1,12}"
}

fn arb_address() -> impl Strategy<Value = String> {
    proptest::collection::vec(arb_segment(), 1..6)
        .prop_map(|segments| format!("/{}", segments.join("/")))
}

proptest! {
    #[test]
    fn address_round_trips(address in arb_address()) {
        prop_assert!(is_valid_address(&address));
        prop_assert_eq!(path_to_address(&address_to_path(&address)), address);
    }

    #[test]
    fn path_round_trips(path in proptest::collection::vec(arb_segment(), 1..6)) {
        prop_assert_eq!(address_to_path(&path_to_address(&path)), path);
    }

    #[test]
    fn checked_write_commits_or_leaves_prior(prior in -100_i64..100, next in -200_i64..200) {
        let p = Parameter::builder("level", 0_i64)
            .range(NumericRange::new(-100, 100))
            .check_range(true)
            .build()
            .unwrap();
        p.set(prior).unwrap();

        match p.set(next) {
            Ok(()) => {
                prop_assert!((-100..=100).contains(&next));
                prop_assert_eq!(p.get(), next);
            }
            Err(ParameterError::Validation(ValidationError::OutOfRange { .. })) => {
                prop_assert!(!(-100..=100).contains(&next));
                prop_assert_eq!(p.get(), prior);
            }
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }
}
