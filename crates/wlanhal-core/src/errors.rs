//! Error types for the WLAN HAL
//!
//! This module contains the error taxonomy shared by the codec, the driver
//! client and the service layer, together with the stable status codes each
//! error maps to on the wire. IPC callers only ever see the status code;
//! everything here is recoverable by retrying or choosing different
//! arguments.

// ----------------------------------------------------------------------------
// Wire Codec Errors
// ----------------------------------------------------------------------------

/// Errors raised while encoding or decoding a wire message
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("buffer truncated while reading {wanted}")]
    Truncated { wanted: &'static str },
    #[error("field type mismatch: expected {expected}, found tag {found:#04x}")]
    TypeMismatch { expected: &'static str, found: u8 },
    #[error("unknown field tag {0:#04x}")]
    UnknownTag(u8),
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,
    #[error("field of {len} bytes exceeds the {max}-byte limit")]
    FieldTooLarge { len: usize, max: usize },
    #[error("{0} bytes of trailing data after the last field")]
    TrailingBytes(usize),
}

// ----------------------------------------------------------------------------
// HAL Errors
// ----------------------------------------------------------------------------

/// Error taxonomy for the WLAN HAL service surface
#[derive(Debug, thiserror::Error)]
pub enum HalError {
    /// Malformed, null-equivalent or wrong-size argument, caught before any
    /// state is touched.
    #[error("invalid parameter: {reason}")]
    InvalidParam { reason: String },

    /// No unbound interface supports the requested role.
    #[error("no free interface supports the requested role")]
    NotAvailable,

    /// Lookup by interface name failed.
    #[error("no bound feature on interface {if_name}")]
    NotFound { if_name: String },

    /// The underlying driver genuinely does not support the request.
    #[error("not supported by the underlying driver")]
    NotSupported,

    #[error("service is already started")]
    AlreadyStarted,

    #[error("service is not started")]
    NotStarted,

    #[error("client {0} is already registered for events")]
    AlreadyRegistered(u32),

    /// Privileged-operation identity check failed.
    #[error("identity {0} may not perform privileged operations")]
    Unauthorized(u32),

    /// Resource exhaustion while building registry state. State is left
    /// consistent, never partially built.
    #[error("allocation failure while building {what}")]
    AllocationFailure { what: &'static str },

    /// Opaque transport failure; the driver's code passes through unchanged.
    #[error("driver command failed with code {code}")]
    Driver { code: i32 },

    #[error("wire format error: {0}")]
    Wire(#[from] WireError),
}

// ----------------------------------------------------------------------------
// Status Codes
// ----------------------------------------------------------------------------

/// Wire status for a successful request.
pub const STATUS_SUCCESS: i32 = 0;
/// Generic failure, used when the driver reports no more specific code.
pub const STATUS_FAILURE: i32 = -1;
pub const STATUS_NOT_SUPPORTED: i32 = -2;
pub const STATUS_INVALID_PARAM: i32 = -3;
pub const STATUS_NOT_AVAILABLE: i32 = 1;
pub const STATUS_NOT_FOUND: i32 = 2;
pub const STATUS_ALREADY_STARTED: i32 = 3;
pub const STATUS_NOT_STARTED: i32 = 4;
pub const STATUS_ALREADY_REGISTERED: i32 = 5;
pub const STATUS_UNAUTHORIZED: i32 = 6;
pub const STATUS_ALLOCATION_FAILURE: i32 = 7;

impl HalError {
    /// The stable status code reported to IPC callers.
    ///
    /// Driver failures keep the driver's own code; wire errors surface as
    /// invalid parameters because a malformed buffer is indistinguishable
    /// from a malformed argument at the protocol boundary.
    pub fn status(&self) -> i32 {
        match self {
            HalError::InvalidParam { .. } => STATUS_INVALID_PARAM,
            HalError::NotAvailable => STATUS_NOT_AVAILABLE,
            HalError::NotFound { .. } => STATUS_NOT_FOUND,
            HalError::NotSupported => STATUS_NOT_SUPPORTED,
            HalError::AlreadyStarted => STATUS_ALREADY_STARTED,
            HalError::NotStarted => STATUS_NOT_STARTED,
            HalError::AlreadyRegistered(_) => STATUS_ALREADY_REGISTERED,
            HalError::Unauthorized(_) => STATUS_UNAUTHORIZED,
            HalError::AllocationFailure { .. } => STATUS_ALLOCATION_FAILURE,
            HalError::Driver { code } => *code,
            HalError::Wire(_) => STATUS_INVALID_PARAM,
        }
    }
}

// ----------------------------------------------------------------------------
// Convenience Error Constructors
// ----------------------------------------------------------------------------

impl HalError {
    /// Create an invalid-parameter error with a reason
    pub fn invalid_param<T: Into<String>>(reason: T) -> Self {
        HalError::InvalidParam {
            reason: reason.into(),
        }
    }

    /// Create a lookup-failed error for an interface name
    pub fn not_found<T: Into<String>>(if_name: T) -> Self {
        HalError::NotFound {
            if_name: if_name.into(),
        }
    }

    /// Create a driver error carrying the transport's own code
    pub fn driver(code: i32) -> Self {
        HalError::Driver { code }
    }

    /// Create a driver error with the generic failure code, used when the
    /// driver's reply violates its own protocol.
    pub fn driver_failure() -> Self {
        HalError::Driver {
            code: STATUS_FAILURE,
        }
    }
}

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type Result<T> = std::result::Result<T, HalError>;
pub type HalResult<T> = Result<T>;

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_are_stable() {
        assert_eq!(HalError::invalid_param("x").status(), STATUS_INVALID_PARAM);
        assert_eq!(HalError::NotAvailable.status(), STATUS_NOT_AVAILABLE);
        assert_eq!(HalError::not_found("wlan0").status(), STATUS_NOT_FOUND);
        assert_eq!(HalError::NotSupported.status(), STATUS_NOT_SUPPORTED);
        assert_eq!(HalError::AlreadyStarted.status(), STATUS_ALREADY_STARTED);
        assert_eq!(HalError::NotStarted.status(), STATUS_NOT_STARTED);
        assert_eq!(
            HalError::AlreadyRegistered(7).status(),
            STATUS_ALREADY_REGISTERED
        );
        assert_eq!(HalError::Unauthorized(12345).status(), STATUS_UNAUTHORIZED);
    }

    #[test]
    fn test_driver_code_passes_through_unchanged() {
        assert_eq!(HalError::driver(-77).status(), -77);
        assert_eq!(HalError::driver_failure().status(), STATUS_FAILURE);
    }

    #[test]
    fn test_wire_errors_surface_as_invalid_param() {
        let err = HalError::from(WireError::Truncated { wanted: "u32" });
        assert_eq!(err.status(), STATUS_INVALID_PARAM);
    }
}
