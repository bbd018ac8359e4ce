//! Vendor status codes.
//!
//! The vendor library reports the outcome of most calls as a signed 32-bit
//! `TsStatusCode`. Values with the high bit clear are successes; the failure
//! range starts at `0x8000_0000` and counts up in declaration order.

use core::fmt;

use crate::api::ApiError;
use crate::common::ErrorSeverity;

const BAD_BASE: u32 = 0x8000_0000;

/// Decoded vendor status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// Operation succeeded.
    Good,
    /// Succeeded, but the library was not initialized.
    GoodNotInitialized,
    /// Succeeded, the library was already initialized.
    GoodAlreadyInitialized,
    /// Succeeded, the object already existed.
    GoodAlreadyExists,
    /// Succeeded without doing anything.
    GoodNothingTodo,
    /// Generic failure.
    Bad,
    /// An argument was rejected.
    InvalidArgument,
    /// A pointer argument was null or dangling.
    BadPointer,
    /// The object already exists.
    BadAlreadyExists,
    /// Allocation failed inside the library.
    OutOfMemory,
    /// The library was not initialized.
    NotInitialized,
    /// The command was rejected by the device.
    BadCommand,
    /// Not implemented by this library build.
    NotImplemented,
    /// The requested object does not exist.
    NotFound,
    /// The object is not valid.
    NotValid,
    /// Not supported by this device.
    NotSupported,
    /// The device or library is in the wrong state.
    BadState,
    /// A size argument was wrong.
    BadSize,
    /// IPC with the vendor service failed.
    IpcFail,
    /// Too many sessions are open.
    SessionLimitExceeded,
    /// Parsing input data failed.
    ParseFail,
    /// A file could not be opened.
    FileOpenFailed,
    /// A file could not be flushed.
    FileFlushFailed,
    /// A file could not be written.
    FileWriteFailed,
    /// Access was denied.
    AccessDenied,
    /// The vendor service could not be started.
    ServiceStartFailed,
    /// No device is attached.
    NoDevice,
    /// Unexpected internal failure.
    Unexpected,
    /// A value outside the documented table.
    Unknown(i32),
}

const GOOD_CODES: [StatusCode; 5] = [
    StatusCode::Good,
    StatusCode::GoodNotInitialized,
    StatusCode::GoodAlreadyInitialized,
    StatusCode::GoodAlreadyExists,
    StatusCode::GoodNothingTodo,
];

const BAD_CODES: [StatusCode; 23] = [
    StatusCode::Bad,
    StatusCode::InvalidArgument,
    StatusCode::BadPointer,
    StatusCode::BadAlreadyExists,
    StatusCode::OutOfMemory,
    StatusCode::NotInitialized,
    StatusCode::BadCommand,
    StatusCode::NotImplemented,
    StatusCode::NotFound,
    StatusCode::NotValid,
    StatusCode::NotSupported,
    StatusCode::BadState,
    StatusCode::BadSize,
    StatusCode::IpcFail,
    StatusCode::SessionLimitExceeded,
    StatusCode::ParseFail,
    StatusCode::FileOpenFailed,
    StatusCode::FileFlushFailed,
    StatusCode::FileWriteFailed,
    StatusCode::AccessDenied,
    StatusCode::ServiceStartFailed,
    StatusCode::NoDevice,
    StatusCode::Unexpected,
];

impl StatusCode {
    /// Decode a raw `TsStatusCode`.
    pub fn from_raw(raw: i32) -> Self {
        let bits = raw.cast_unsigned();
        let table: &[StatusCode] = if bits & BAD_BASE == 0 {
            &GOOD_CODES
        } else {
            &BAD_CODES
        };
        let offset = (bits & !BAD_BASE) as usize;
        table.get(offset).copied().unwrap_or(StatusCode::Unknown(raw))
    }

    /// Encode back to the raw `TsStatusCode`.
    pub fn to_raw(self) -> i32 {
        if let StatusCode::Unknown(raw) = self {
            return raw;
        }
        let position = |table: &[StatusCode]| table.iter().position(|code| *code == self);
        let bits = match position(&GOOD_CODES) {
            Some(offset) => offset as u32,
            None => BAD_BASE | position(&BAD_CODES).unwrap_or(0) as u32,
        };
        bits.cast_signed()
    }

    /// Whether the code reports success.
    pub fn is_good(self) -> bool {
        self.to_raw().cast_unsigned() & BAD_BASE == 0
    }

    /// Severity used when the code is logged.
    pub fn severity(self) -> ErrorSeverity {
        match self {
            code if code.is_good() => ErrorSeverity::Info,
            StatusCode::NoDevice | StatusCode::NotFound => ErrorSeverity::Warning,
            StatusCode::OutOfMemory | StatusCode::Unexpected => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Convert into a `Result`, attributing a failure to `operation`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] when the code is not good.
    pub fn into_result(self, operation: &'static str) -> Result<(), ApiError> {
        if self.is_good() {
            Ok(())
        } else {
            Err(ApiError::Status {
                operation,
                code: self,
            })
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCode::Unknown(raw) => write!(f, "Unknown({:#010x})", raw.cast_unsigned()),
            other => write!(f, "{other:?}({:#010x})", other.to_raw().cast_unsigned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_good() {
        assert_eq!(StatusCode::from_raw(0), StatusCode::Good);
        assert!(StatusCode::Good.is_good());
    }

    #[test]
    fn test_bad_range_decodes_in_order() {
        assert_eq!(StatusCode::from_raw(BAD_BASE.cast_signed()), StatusCode::Bad);
        assert_eq!(
            StatusCode::from_raw((BAD_BASE | 1).cast_signed()),
            StatusCode::InvalidArgument
        );
        assert_eq!(
            StatusCode::from_raw((BAD_BASE | 21).cast_signed()),
            StatusCode::NoDevice
        );
    }

    #[test]
    fn test_unknown_values_are_preserved() {
        let code = StatusCode::from_raw(4242);
        assert_eq!(code, StatusCode::Unknown(4242));
        assert_eq!(code.to_raw(), 4242);
        assert!(code.is_good());

        let bad = StatusCode::from_raw((BAD_BASE | 0x00ff_0000).cast_signed());
        assert!(!bad.is_good());
    }

    #[test]
    fn test_into_result_names_operation() {
        let result = StatusCode::NoDevice.into_result("ts_mocap_start_streaming");
        assert!(matches!(
            result,
            Err(ApiError::Status {
                operation: "ts_mocap_start_streaming",
                code: StatusCode::NoDevice,
            })
        ));
        assert!(StatusCode::GoodNothingTodo.into_result("ts_initialize").is_ok());
    }
}
