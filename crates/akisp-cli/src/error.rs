// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use akisp::ErrorKind;
use std::fmt;
use std::process::ExitCode;

/// CLI-specific error type with exit code mapping
#[derive(Debug)]
pub enum CliError {
    /// Invalid command-line arguments or board description
    InvalidArgs(String),
    /// Board file missing or unreadable
    BoardNotFound(String),
    /// Vendor ISP library or entry point not available
    HardwareUnavailable(String),
    /// Bring-up stopped on a pin, clock or sensor failure
    BringupFailed(String),
    /// General error from the akisp library
    General(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::InvalidArgs(msg) => write!(f, "Invalid arguments: {}", msg),
            CliError::BoardNotFound(msg) => write!(f, "Board file not found: {}", msg),
            CliError::HardwareUnavailable(msg) => write!(f, "ISP unavailable: {}", msg),
            CliError::BringupFailed(msg) => write!(f, "Bring-up failed: {}", msg),
            CliError::General(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }

    fn code(&self) -> u8 {
        match self {
            CliError::General(_) => 1,
            CliError::InvalidArgs(_) => 2,
            CliError::BoardNotFound(_) => 3,
            CliError::HardwareUnavailable(_) => 4,
            CliError::BringupFailed(_) => 5,
        }
    }
}

/// Map akisp::Error to CliError by error class
impl From<akisp::Error> for CliError {
    fn from(err: akisp::Error) -> Self {
        let msg = format!("{} ({})", err, err.errno());
        match err.kind() {
            ErrorKind::NotImplemented => CliError::HardwareUnavailable(msg),
            ErrorKind::Configuration => CliError::InvalidArgs(msg),
            ErrorKind::ResourceUnavailable | ErrorKind::Allocation => {
                CliError::BringupFailed(msg)
            }
            ErrorKind::InvalidArgument => CliError::InvalidArgs(msg),
            ErrorKind::Io => CliError::General(msg),
        }
    }
}

/// Helper function to convert result to exit code
pub fn result_to_exit_code<T>(result: Result<T, CliError>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code()
        }
    }
}
