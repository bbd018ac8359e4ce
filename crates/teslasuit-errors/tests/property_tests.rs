//! Property tests for status code decoding.

use proptest::prelude::*;
use teslasuit_errors::StatusCode;

proptest! {
    #[test]
    fn prop_raw_round_trips(raw in any::<i32>()) {
        prop_assert_eq!(StatusCode::from_raw(raw).to_raw(), raw);
    }

    #[test]
    fn prop_good_iff_high_bit_clear(raw in any::<i32>()) {
        prop_assert_eq!(StatusCode::from_raw(raw).is_good(), raw >= 0);
    }

    #[test]
    fn prop_failures_always_error(raw in i32::MIN..0) {
        prop_assert!(StatusCode::from_raw(raw).into_result("ts_device_open").is_err());
    }
}
