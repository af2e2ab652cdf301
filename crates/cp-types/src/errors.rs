use thiserror::Error;

/// Main error type for the Coverplace system
#[derive(Error, Debug)]
pub enum CpError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Coverplace operations
pub type CpResult<T> = Result<T, CpError>;

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::CpError::InvalidConfiguration(format!($($arg)*))
    };
}

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::CpError::Internal(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = config_error!("radius must be positive, got {}", -1.0);
        assert!(error.to_string().contains("Invalid configuration"));
        assert!(error.to_string().contains("-1"));
    }

    #[test]
    fn test_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let cp_error: CpError = json_err.into();

        match cp_error {
            CpError::Serialization(_) => (),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_internal_macro() {
        let err = internal_error!("grid shape mismatch: {}x{}", 3, 4);
        assert_eq!(err.to_string(), "Internal error: grid shape mismatch: 3x4");
    }
}
