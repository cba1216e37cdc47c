// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the vigil binary.

use thiserror::Error;

/// Result type alias for vigil-bin operations.
pub type BinResult<T> = Result<T, BinError>;

/// Errors that can occur in the vigil binary.
#[derive(Debug, Error)]
pub enum BinError {
    /// Config loading error.
    #[error("Config error: {0}")]
    Config(#[from] vigil_config::ConfigError),

    /// Mechanism or rule construction error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] vigil_core::PipelineError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Runtime error.
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl BinError {
    /// Creates a runtime error.
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// Returns the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Pipeline(_) => 1,
            Self::Io(_) => 2,
            Self::Runtime(_) => 3,
        }
    }
}

// =============================================================================
// Error Reporting
// =============================================================================

/// Reports an error with its cause chain.
pub fn report_error(error: &BinError) {
    eprintln!("Error: {}", error);

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("  Caused by: {}", cause);
        source = cause.source();
    }
}

/// Reports an error and exits with the appropriate code.
pub fn report_error_and_exit(error: BinError) -> ! {
    report_error(&error);
    std::process::exit(error.exit_code())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            BinError::from(vigil_core::PipelineError::configuration("x")).exit_code(),
            1
        );
        assert_eq!(BinError::runtime("x").exit_code(), 3);
    }
}
