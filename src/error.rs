//! Error types for manifest patching operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when patching a package, along with a convenient
//! [`Result<T>`] type alias.
//!
//! All fallible operations in this crate return `Result<T, Error>`. Errors
//! are fatal to the current invocation: the patching pipeline aborts at the
//! first failing stage and propagates the error up to the caller.
//!
//! ```rust,no_run
//! use apkbump::{PatchRequest, Result, patch_path};
//!
//! fn bump(path: &str) -> Result<()> {
//!     let request = PatchRequest::new().version_code(42);
//!     patch_path(path.as_ref(), &request)?;
//!     Ok(())
//! }
//! ```

use std::io;
use std::process::ExitStatus;

/// The main error type for manifest patching operations.
///
/// Each variant includes enough context to diagnose the failure without
/// re-running the tool. Variants map onto the pipeline stages: container
/// parsing and entry lookup, document decoding, subprocess conversion, and
/// plain I/O.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An entry was not found in the container.
    ///
    /// Returned when the manifest path expected for the container kind (or a
    /// caller-supplied path) does not match any entry exactly. Matching is
    /// case-sensitive and performs no normalization.
    #[error("Entry not found: {path}")]
    EntryNotFound {
        /// The path that was not found.
        path: String,
    },

    /// The container's zip structure is invalid or corrupt.
    ///
    /// The offset points at the byte where parsing failed, relative to the
    /// start of the container.
    #[error("Malformed archive at offset {offset:#x}: {reason}")]
    MalformedArchive {
        /// The byte offset where corruption was detected.
        offset: u64,
        /// A description of the corruption.
        reason: String,
    },

    /// The binary manifest document could not be decoded.
    ///
    /// Covers truncated buffers, unexpected field tags, wire-type
    /// mismatches, invalid UTF-8 in string fields, and typed values whose
    /// variant tag is not part of the closed [`CompiledValue`] set.
    ///
    /// [`CompiledValue`]: crate::manifest::CompiledValue
    #[error("Malformed document at offset {offset:#x}: {reason}")]
    MalformedDocument {
        /// The byte offset where decoding failed.
        offset: u64,
        /// A description of the failure.
        reason: String,
    },

    /// The container uses a compression method this tool does not handle.
    ///
    /// Only stored (0) and deflate (8) entries can be extracted or
    /// replaced. Other entries pass through untouched, so this error only
    /// surfaces for the manifest entry itself.
    #[error("Unsupported compression method: {method}")]
    UnsupportedMethod {
        /// The zip method id that is not supported.
        method: u16,
    },

    /// A container feature outside this tool's scope was encountered.
    #[error("Unsupported feature: {feature}")]
    UnsupportedFeature {
        /// The name of the unsupported feature.
        feature: &'static str,
    },

    /// The external format converter failed.
    ///
    /// Any non-zero exit from the converter subprocess is fatal; the
    /// combined stdout/stderr of the tool is carried for diagnosis. There
    /// is no retry.
    #[error("{tool} failed ({status}): {output}")]
    ExternalTool {
        /// The converter binary that was invoked.
        tool: String,
        /// The subprocess exit status.
        status: ExitStatus,
        /// Combined stdout/stderr of the subprocess.
        output: String,
    },
}

impl Error {
    /// Creates a `MalformedArchive` error.
    pub fn malformed_archive(offset: u64, reason: impl Into<String>) -> Self {
        Error::MalformedArchive {
            offset,
            reason: reason.into(),
        }
    }

    /// Creates a `MalformedDocument` error.
    pub fn malformed_document(offset: u64, reason: impl Into<String>) -> Self {
        Error::MalformedDocument {
            offset,
            reason: reason.into(),
        }
    }

    /// Returns `true` if this is a structural corruption error.
    ///
    /// Corruption errors indicate the input artifact is damaged or not of
    /// the expected format, as opposed to environment failures (I/O, the
    /// converter binary missing).
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::MalformedArchive { .. } | Error::MalformedDocument { .. }
        )
    }

    /// Returns the byte offset associated with this error, if any.
    pub fn offset(&self) -> Option<u64> {
        match self {
            Error::MalformedArchive { offset, .. } => Some(*offset),
            Error::MalformedDocument { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

/// A specialized Result type for patching operations.
///
/// This is defined as `std::result::Result<T, Error>` for convenience.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_entry_not_found() {
        let err = Error::EntryNotFound {
            path: "base/manifest/AndroidManifest.xml".into(),
        };
        assert_eq!(
            err.to_string(),
            "Entry not found: base/manifest/AndroidManifest.xml"
        );
        assert!(!err.is_corruption());
    }

    #[test]
    fn test_malformed_archive() {
        let err = Error::malformed_archive(0x1234, "bad central directory signature");
        assert!(err.to_string().contains("0x1234"));
        assert!(err.to_string().contains("bad central directory signature"));
        assert!(err.is_corruption());
        assert_eq!(err.offset(), Some(0x1234));
    }

    #[test]
    fn test_malformed_document() {
        let err = Error::malformed_document(7, "unexpected field tag 9");
        assert!(err.to_string().contains("0x7"));
        assert!(err.to_string().contains("unexpected field tag 9"));
        assert!(err.is_corruption());
        assert_eq!(err.offset(), Some(7));
    }

    #[test]
    fn test_unsupported_method() {
        let err = Error::UnsupportedMethod { method: 12 };
        assert!(err.to_string().contains("12"));
        assert!(!err.is_corruption());
        assert_eq!(err.offset(), None);
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
