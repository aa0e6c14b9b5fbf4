//! Single-entry replacement with verbatim passthrough.

use std::io::Write;

use crate::{Error, Result};

use super::reader::{Archive, Entry};
use super::{
    CENTRAL_HEADER_SIG, EOCD_SIG, FLAG_DATA_DESCRIPTOR, LOCAL_HEADER_SIG, METHOD_DEFLATE,
    METHOD_STORED,
};

fn push_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Replacement metadata for the target entry's rebuilt records.
struct ReplacedEntry {
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
}

impl Archive {
    /// Produces a new container with the named entry's content replaced.
    ///
    /// Every other entry's raw local record (header, extra field, data
    /// bytes and trailing descriptor) is copied verbatim in original
    /// order; recompressing a passthrough entry could move or resize
    /// records that downstream consumers expect untouched. The central
    /// directory is re-emitted with local offsets adjusted and every other
    /// field preserved. The replaced entry keeps the storage method the
    /// original entry used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] if `path` does not name an entry,
    /// and [`Error::UnsupportedMethod`] if the target entry uses a method
    /// other than stored or deflate.
    pub fn replace_entry(&self, path: &str, new_bytes: &[u8]) -> Result<Vec<u8>> {
        let target = self
            .entries()
            .iter()
            .position(|e| e.name_bytes() == path.as_bytes())
            .ok_or_else(|| Error::EntryNotFound {
                path: path.to_string(),
            })?;

        let mut out = Vec::with_capacity(self.data().len());
        let mut offsets = Vec::with_capacity(self.len());
        let mut replaced = None;

        for (index, entry) in self.entries().iter().enumerate() {
            let offset = u32::try_from(out.len()).map_err(|_| Error::UnsupportedFeature {
                feature: "archive larger than 4 GiB",
            })?;
            offsets.push(offset);

            if index == target {
                replaced = Some(write_replacement_record(&mut out, entry, new_bytes)?);
            } else {
                out.extend_from_slice(&self.data()[entry.local_span()]);
            }
        }

        let replaced = replaced.expect("target entry was visited");

        let cd_offset = u32::try_from(out.len()).map_err(|_| Error::UnsupportedFeature {
            feature: "archive larger than 4 GiB",
        })?;
        for (index, entry) in self.entries().iter().enumerate() {
            let patch = (index == target).then_some(&replaced);
            write_central_record(&mut out, entry, offsets[index], patch);
        }
        let cd_size = out.len() as u32 - cd_offset;

        push_u32(&mut out, EOCD_SIG);
        push_u16(&mut out, 0); // this disk
        push_u16(&mut out, 0); // central directory disk
        push_u16(&mut out, self.len() as u16);
        push_u16(&mut out, self.len() as u16);
        push_u32(&mut out, cd_size);
        push_u32(&mut out, cd_offset);
        push_u16(&mut out, self.comment().len() as u16);
        out.extend_from_slice(self.comment());

        log::debug!(
            "replaced entry '{path}': {} -> {} bytes, {} other entries passed through raw",
            self.entries()[target].uncompressed_size(),
            new_bytes.len(),
            self.len() - 1
        );

        Ok(out)
    }
}

/// Writes a fresh local record for the replaced entry.
///
/// The record reuses the original entry's storage method, timestamps and
/// local extra field, carries up-to-date sizes inline, and drops the data
/// descriptor flag since the sizes are known up front.
fn write_replacement_record(
    out: &mut Vec<u8>,
    entry: &Entry,
    new_bytes: &[u8],
) -> Result<ReplacedEntry> {
    let payload = match entry.method() {
        METHOD_STORED => new_bytes.to_vec(),
        METHOD_DEFLATE => {
            let mut encoder =
                flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(new_bytes)?;
            encoder.finish()?
        }
        method => return Err(Error::UnsupportedMethod { method }),
    };

    let replaced = ReplacedEntry {
        crc32: crc32fast::hash(new_bytes),
        compressed_size: payload.len() as u32,
        uncompressed_size: new_bytes.len() as u32,
    };

    push_u32(out, LOCAL_HEADER_SIG);
    push_u16(out, entry.version_needed());
    push_u16(out, entry.flags() & !FLAG_DATA_DESCRIPTOR);
    push_u16(out, entry.method());
    push_u16(out, entry.mod_time());
    push_u16(out, entry.mod_date());
    push_u32(out, replaced.crc32);
    push_u32(out, replaced.compressed_size);
    push_u32(out, replaced.uncompressed_size);
    push_u16(out, entry.name_bytes().len() as u16);
    push_u16(out, entry.local_extra().len() as u16);
    out.extend_from_slice(entry.name_bytes());
    out.extend_from_slice(entry.local_extra());
    out.extend_from_slice(&payload);

    Ok(replaced)
}

/// Re-emits one central directory record.
///
/// Fields come verbatim from the source entry except the local header
/// offset and, for the replaced entry, the CRC, sizes and descriptor
/// flag, which must agree with the freshly written local record.
fn write_central_record(
    out: &mut Vec<u8>,
    entry: &Entry,
    offset: u32,
    replaced: Option<&ReplacedEntry>,
) {
    let flags = match replaced {
        Some(_) => entry.flags() & !FLAG_DATA_DESCRIPTOR,
        None => entry.flags(),
    };
    let (crc32, compressed_size, uncompressed_size) = match replaced {
        Some(r) => (r.crc32, r.compressed_size, r.uncompressed_size),
        None => (entry.crc32(), entry.compressed_size(), entry.uncompressed_size()),
    };

    push_u32(out, CENTRAL_HEADER_SIG);
    push_u16(out, entry.version_made_by());
    push_u16(out, entry.version_needed());
    push_u16(out, flags);
    push_u16(out, entry.method());
    push_u16(out, entry.mod_time());
    push_u16(out, entry.mod_date());
    push_u32(out, crc32);
    push_u32(out, compressed_size);
    push_u32(out, uncompressed_size);
    push_u16(out, entry.name_bytes().len() as u16);
    push_u16(out, entry.extra().len() as u16);
    push_u16(out, entry.comment().len() as u16);
    push_u16(out, 0); // disk start
    push_u16(out, entry.internal_attrs());
    push_u32(out, entry.external_attrs());
    push_u32(out, offset);
    out.extend_from_slice(entry.name_bytes());
    out.extend_from_slice(entry.extra());
    out.extend_from_slice(entry.comment());
}
