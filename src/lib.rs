//! # apkbump
//!
//! A pure-Rust tool for patching version and package metadata inside the
//! compiled `AndroidManifest.xml` of an app package, leaving every other
//! byte of the archive alone.
//!
//! Three inputs are accepted: an `.apk` (patched through an `aapt2
//! convert` round trip), an `.aab` bundle (patched directly), and a bare
//! binary manifest document. Three overrides can be applied: the package
//! name, the version code, and the version name.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use apkbump::{PatchRequest, Result, patch_path};
//!
//! fn main() -> Result<()> {
//!     let request = PatchRequest::new()
//!         .version_code(42)
//!         .version_name("2.0.1");
//!
//!     let outcome = patch_path("app.aab".as_ref(), &request)?;
//!     for change in &outcome.changes {
//!         println!("{change}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Guarantees
//!
//! - The re-encoded manifest uses the canonical wire field order the
//!   downstream toolchain requires; a decoded document re-encodes to the
//!   exact input bytes for compiler-produced manifests.
//! - Container entries other than the manifest are copied verbatim at the
//!   byte level: storage method, flags, extra fields and data all survive.
//! - Output is staged in a temporary file and atomically renamed over the
//!   original, so a failed run never corrupts the input artifact.
//!
//! ## Errors
//!
//! All operations return [`Result<T>`]. Every error is fatal to the
//! invocation; there are no retries. See [`Error`] for the taxonomy.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod apply;
pub mod container;
pub mod convert;
pub mod error;
pub mod manifest;
pub mod patch;

pub use error::{Error, Result};

// Re-export the pipeline API at the crate root for convenience.
pub use apply::{
    APK_MANIFEST_PATH, BUNDLE_MANIFEST_PATH, PackageKind, PatchOutcome, patch_manifest_file,
    patch_path,
};

// Re-export the core model types.
pub use container::Archive;
pub use manifest::Document;
pub use patch::{ANDROID_NAMESPACE, AppliedChange, PatchRequest};
