//! Behavioural tests for the error crate's public surface.

use teslasuit_errors::prelude::*;

mod status_tests {
    use super::*;

    #[test]
    fn test_good_codes_round_trip() {
        for raw in 0..=4 {
            let code = StatusCode::from_raw(raw);
            assert!(code.is_good(), "{code} should be good");
            assert_eq!(code.to_raw(), raw);
        }
    }

    #[test]
    fn test_last_bad_code_is_unexpected() {
        let raw = (0x8000_0000_u32 | 22).cast_signed();
        assert_eq!(StatusCode::from_raw(raw), StatusCode::Unexpected);
        let past_end = (0x8000_0000_u32 | 23).cast_signed();
        assert_eq!(StatusCode::from_raw(past_end), StatusCode::Unknown(past_end));
    }

    #[test]
    fn test_status_propagates_through_umbrella() -> Result<()> {
        fn call(raw: i32) -> Result<()> {
            StatusCode::from_raw(raw).into_result("ts_haptic_stop_player")?;
            Ok(())
        }

        call(0)?;
        let err = call((0x8000_0000_u32 | 21).cast_signed());
        assert!(matches!(
            err,
            Err(TeslasuitError::Api(ApiError::Status {
                code: StatusCode::NoDevice,
                ..
            }))
        ));
        Ok(())
    }
}

mod classification_tests {
    use super::*;

    #[test]
    fn test_every_category_displays() {
        let errors: Vec<TeslasuitError> = vec![
            ApiError::NotLoaded.into(),
            DeviceError::unknown("00").into(),
            HapticError::NoDevice.into(),
            ValidationError::required("path").into(),
            std::io::Error::other("disk").into(),
            TeslasuitError::config("bad yaml"),
        ];
        let categories: Vec<String> = errors.iter().map(|e| e.category().to_string()).collect();
        assert_eq!(
            categories,
            ["Api", "Device", "Haptic", "Validation", "IO", "Config"]
        );
    }

    #[test]
    fn test_warning_level_errors_are_recoverable() {
        let err: TeslasuitError = DeviceError::AlreadyConnected {
            slot: 2,
            device: "ABCD".into(),
        }
        .into();
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_status_severity_flows_through_api_error() {
        let err = ApiError::Status {
            operation: "ts_asset_load_from_binary_data",
            code: StatusCode::OutOfMemory,
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }
}
