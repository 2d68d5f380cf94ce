//! Exit codes for the burnrate CLI.
//!
//! Exit codes communicate the outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0-1: Operational outcomes (query answered, or answered with no data)
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal errors (bugs, or the disk failing under us)

/// Exit codes for burnrate operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // ========================================================================
    // Operational Outcomes (0-1)
    // ========================================================================
    /// Success: query answered
    Clean = 0,

    /// Query answered but there was not enough data for an estimate
    NoData = 1,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments (bad window, unknown entity or group)
    ArgsError = 10,

    /// Configuration file missing, unparseable, or invalid
    ConfigError = 11,

    /// Snapshot log or registry unreadable
    DataError = 15,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Stable name for JSON output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::NoData => "OK_NO_DATA",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::DataError => "ERR_DATA",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<&br_common::Error> for ExitCode {
    fn from(err: &br_common::Error) -> Self {
        use br_common::Error;
        match err {
            Error::Config(_) => ExitCode::ConfigError,
            Error::InvalidWindow(_)
            | Error::EntityNotFound { .. }
            | Error::GroupNotFound { .. }
            | Error::InvalidRecord(_) => ExitCode::ArgsError,
            Error::EmptyLog => ExitCode::NoData,
            Error::CorruptLog(_) | Error::Json(_) => ExitCode::DataError,
            Error::Collection(_) => ExitCode::InternalError,
            Error::Io(_) => ExitCode::IoError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
