//! External format converter boundary.
//!
//! Fully-binary packages cannot be patched directly: their manifest uses
//! the packed resource-table encoding rather than the proto one. The
//! `aapt2 convert` tool translates the whole package between the two
//! container kinds, and this module is the subprocess seam around it. The
//! converter is a black box: any non-zero exit is fatal and carries the
//! tool's combined output for diagnosis, with no retry.

use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use crate::{Error, Result};

/// Environment variable overriding the converter binary.
pub const AAPT2_ENV: &str = "AAPT2";

const DEFAULT_TOOL: &str = "aapt2";

/// Conversion direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Binary package to proto intermediate.
    Proto,
    /// Proto intermediate back to binary package.
    Binary,
}

impl Direction {
    fn output_format(self) -> &'static str {
        match self {
            Direction::Proto => "proto",
            Direction::Binary => "binary",
        }
    }
}

/// Handle to the converter subprocess.
#[derive(Debug, Clone)]
pub struct Converter {
    tool: OsString,
}

impl Converter {
    /// Creates a converter using `aapt2` from `PATH`, or the binary named
    /// by the `AAPT2` environment variable when set.
    pub fn from_env() -> Self {
        Self {
            tool: std::env::var_os(AAPT2_ENV).unwrap_or_else(|| DEFAULT_TOOL.into()),
        }
    }

    /// Creates a converter invoking the given binary.
    pub fn new(tool: impl Into<OsString>) -> Self {
        Self { tool: tool.into() }
    }

    /// Converts `input` into `output` in the given direction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the subprocess cannot be spawned and
    /// [`Error::ExternalTool`] if it exits non-zero.
    pub fn convert(&self, input: &Path, output: &Path, direction: Direction) -> Result<()> {
        log::debug!(
            "running {} convert --output-format {} on {}",
            self.tool.to_string_lossy(),
            direction.output_format(),
            input.display()
        );

        let result = Command::new(&self.tool)
            .arg("convert")
            .arg("-o")
            .arg(output)
            .arg("--output-format")
            .arg(direction.output_format())
            .arg(input)
            .output()?;

        if !result.status.success() {
            let mut combined = String::from_utf8_lossy(&result.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&result.stderr));
            return Err(Error::ExternalTool {
                tool: self.tool.to_string_lossy().into_owned(),
                status: result.status,
                output: combined.trim().to_string(),
            });
        }
        Ok(())
    }
}
