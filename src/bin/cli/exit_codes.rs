//! Exit codes for the CLI tool.

use apkbump::Error;

/// Exit code constants
pub const SUCCESS: i32 = 0;
/// Fatal error occurred
pub const FATAL_ERROR: i32 = 2;
/// Container format error
pub const BAD_ARCHIVE: i32 = 3;
/// Manifest document error
pub const BAD_DOCUMENT: i32 = 4;
/// I/O error
pub const IO_ERROR: i32 = 5;
/// External converter failed
pub const EXTERNAL_TOOL: i32 = 6;

/// Exit code enum for structured handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    FatalError,
    BadArchive,
    BadDocument,
    IoError,
    ExternalTool,
}

impl ExitCode {
    /// Returns the numeric exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::FatalError => FATAL_ERROR,
            Self::BadArchive => BAD_ARCHIVE,
            Self::BadDocument => BAD_DOCUMENT,
            Self::IoError => IO_ERROR,
            Self::ExternalTool => EXTERNAL_TOOL,
        }
    }
}

/// Converts a patching error to an exit code
pub fn error_to_exit_code(error: &Error) -> ExitCode {
    match error {
        Error::Io(_) => ExitCode::IoError,
        Error::EntryNotFound { .. } => ExitCode::BadArchive,
        Error::MalformedArchive { .. } => ExitCode::BadArchive,
        Error::UnsupportedMethod { .. } => ExitCode::BadArchive,
        Error::UnsupportedFeature { .. } => ExitCode::BadArchive,
        Error::MalformedDocument { .. } => ExitCode::BadDocument,
        Error::ExternalTool { .. } => ExitCode::ExternalTool,
        // Future error variants - required by #[non_exhaustive]
        _ => ExitCode::FatalError,
    }
}
