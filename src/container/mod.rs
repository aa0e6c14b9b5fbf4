//! Zip container access: entry listing, extraction, and single-entry
//! replacement.
//!
//! The container model is deliberately narrow. Entries are held as an
//! ordered sequence mirroring the central directory, and each entry keeps
//! the byte span of its raw local record in the source buffer. Replacement
//! rewrites exactly one entry; every other entry's local record is copied
//! verbatim, so storage method, flags, extra fields and data bytes of
//! untouched entries survive byte for byte. Only the central directory is
//! re-emitted, with local header offsets adjusted.
//!
//! # Example
//!
//! ```rust,ignore
//! use apkbump::container::Archive;
//!
//! let archive = Archive::open_path("app.aab".as_ref())?;
//! let manifest = archive.extract("base/manifest/AndroidManifest.xml")?;
//! let rewritten = archive.replace_entry("base/manifest/AndroidManifest.xml", &patched)?;
//! ```

mod reader;
mod writer;

#[cfg(test)]
pub(crate) mod test_util;

pub use reader::{Archive, Entry};

/// Local file header signature.
pub(crate) const LOCAL_HEADER_SIG: u32 = 0x0403_4b50;
/// Central directory file header signature.
pub(crate) const CENTRAL_HEADER_SIG: u32 = 0x0201_4b50;
/// End of central directory signature.
pub(crate) const EOCD_SIG: u32 = 0x0605_4b50;
/// Zip64 end of central directory locator signature.
pub(crate) const ZIP64_LOCATOR_SIG: u32 = 0x0706_4b50;
/// Optional data descriptor signature.
pub(crate) const DATA_DESCRIPTOR_SIG: u32 = 0x0807_4b50;

/// Compression method: stored (no compression).
pub const METHOD_STORED: u16 = 0;
/// Compression method: deflate.
pub const METHOD_DEFLATE: u16 = 8;

/// General purpose flag bit 3: sizes and CRC follow the data in a
/// descriptor record.
pub(crate) const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;

/// Fixed part of the local file header.
pub(crate) const LOCAL_HEADER_LEN: usize = 30;
/// Fixed part of a central directory file header.
pub(crate) const CENTRAL_HEADER_LEN: usize = 46;
/// Fixed part of the end of central directory record.
pub(crate) const EOCD_LEN: usize = 22;
