//! Container parsing and entry extraction.

use std::collections::HashSet;
use std::io::Read;
use std::ops::Range;
use std::path::Path;

use crate::{Error, Result};

use super::{
    CENTRAL_HEADER_LEN, CENTRAL_HEADER_SIG, DATA_DESCRIPTOR_SIG, EOCD_LEN, EOCD_SIG,
    FLAG_DATA_DESCRIPTOR, LOCAL_HEADER_LEN, LOCAL_HEADER_SIG, METHOD_DEFLATE, METHOD_STORED,
    ZIP64_LOCATOR_SIG,
};

/// Maximum length of the end-of-central-directory comment, which bounds
/// the backwards signature search.
const MAX_COMMENT_LEN: usize = u16::MAX as usize;

/// One entry of a parsed container.
///
/// Central directory metadata is captured in full so the rewriter can
/// re-emit it unchanged, alongside the spans of the entry's raw local
/// record and compressed payload in the source buffer.
#[derive(Debug, Clone)]
pub struct Entry {
    name: Vec<u8>,
    version_made_by: u16,
    version_needed: u16,
    flags: u16,
    method: u16,
    mod_time: u16,
    mod_date: u16,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    internal_attrs: u16,
    external_attrs: u32,
    extra: Vec<u8>,
    comment: Vec<u8>,
    local_extra: Vec<u8>,
    /// Full raw local record: header, name, extra, data, descriptor.
    local_span: Range<usize>,
    /// Compressed payload within the local record.
    data_span: Range<usize>,
}

impl Entry {
    /// The entry path, lossily decoded for display.
    pub fn path(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }

    /// The raw path bytes. Matching is exact and byte-wise.
    pub fn name_bytes(&self) -> &[u8] {
        &self.name
    }

    /// The zip compression method id.
    pub fn method(&self) -> u16 {
        self.method
    }

    /// The declared uncompressed size.
    pub fn uncompressed_size(&self) -> u32 {
        self.uncompressed_size
    }

    /// The declared compressed size.
    pub fn compressed_size(&self) -> u32 {
        self.compressed_size
    }

    /// The declared CRC-32 of the uncompressed content.
    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    pub(super) fn version_made_by(&self) -> u16 {
        self.version_made_by
    }

    pub(super) fn version_needed(&self) -> u16 {
        self.version_needed
    }

    pub(super) fn flags(&self) -> u16 {
        self.flags
    }

    pub(super) fn mod_time(&self) -> u16 {
        self.mod_time
    }

    pub(super) fn mod_date(&self) -> u16 {
        self.mod_date
    }

    pub(super) fn internal_attrs(&self) -> u16 {
        self.internal_attrs
    }

    pub(super) fn external_attrs(&self) -> u32 {
        self.external_attrs
    }

    pub(super) fn extra(&self) -> &[u8] {
        &self.extra
    }

    pub(super) fn comment(&self) -> &[u8] {
        &self.comment
    }

    pub(super) fn local_extra(&self) -> &[u8] {
        &self.local_extra
    }

    pub(super) fn local_span(&self) -> Range<usize> {
        self.local_span.clone()
    }

    fn data_span(&self) -> Range<usize> {
        self.data_span.clone()
    }
}

/// A parsed zip container.
///
/// Owns the full source buffer; entry extraction and replacement both
/// operate against it without touching the file system.
#[derive(Debug)]
pub struct Archive {
    data: Vec<u8>,
    entries: Vec<Entry>,
    comment: Vec<u8>,
}

impl Archive {
    /// Reads and parses a container from a file.
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::parse(std::fs::read(path)?)
    }

    /// Parses a container from an in-memory buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedArchive`] on structural corruption,
    /// [`Error::UnsupportedFeature`] for zip64 and multi-disk containers.
    pub fn parse(data: Vec<u8>) -> Result<Self> {
        let eocd_pos = find_eocd(&data)?;

        if eocd_pos >= 20 && u32_at(&data, eocd_pos - 20)? == ZIP64_LOCATOR_SIG {
            return Err(Error::UnsupportedFeature {
                feature: "zip64 archive",
            });
        }

        let disk = u16_at(&data, eocd_pos + 4)?;
        let cd_disk = u16_at(&data, eocd_pos + 6)?;
        let entries_on_disk = u16_at(&data, eocd_pos + 8)?;
        let total_entries = u16_at(&data, eocd_pos + 10)?;
        let cd_size = u32_at(&data, eocd_pos + 12)?;
        let cd_offset = u32_at(&data, eocd_pos + 16)?;
        let comment_len = u16_at(&data, eocd_pos + 20)? as usize;
        let comment = data[eocd_pos + EOCD_LEN..eocd_pos + EOCD_LEN + comment_len].to_vec();

        if disk != 0 || cd_disk != 0 || entries_on_disk != total_entries {
            return Err(Error::UnsupportedFeature {
                feature: "multi-disk archive",
            });
        }
        if total_entries == u16::MAX || cd_size == u32::MAX || cd_offset == u32::MAX {
            return Err(Error::UnsupportedFeature {
                feature: "zip64 archive",
            });
        }

        let mut entries = Vec::with_capacity(total_entries as usize);
        let mut seen = HashSet::new();
        let mut pos = cd_offset as usize;
        for _ in 0..total_entries {
            let entry = parse_central_entry(&data, &mut pos)?;
            if !seen.insert(entry.name.clone()) {
                return Err(Error::malformed_archive(
                    pos as u64,
                    format!("duplicate entry path '{}'", entry.path()),
                ));
            }
            entries.push(entry);
        }

        Ok(Self {
            data,
            entries,
            comment,
        })
    }

    /// The entries, in central directory order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the container has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up an entry by exact path.
    pub fn entry(&self, path: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == path.as_bytes())
    }

    /// Extracts the decompressed content of the named entry.
    ///
    /// Matching is case-sensitive with no normalization. Content integrity
    /// is verified against the entry's CRC-32.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] if no entry path equals `path`
    /// exactly, [`Error::UnsupportedMethod`] for entries that are neither
    /// stored nor deflated, and [`Error::MalformedArchive`] when the data
    /// fails to inflate or the CRC does not match.
    pub fn extract(&self, path: &str) -> Result<Vec<u8>> {
        let entry = self.entry(path).ok_or_else(|| Error::EntryNotFound {
            path: path.to_string(),
        })?;

        let raw = &self.data[entry.data_span()];
        let content = match entry.method() {
            METHOD_STORED => raw.to_vec(),
            METHOD_DEFLATE => {
                let mut out = Vec::with_capacity(entry.uncompressed_size() as usize);
                flate2::read::DeflateDecoder::new(raw)
                    .read_to_end(&mut out)
                    .map_err(|e| {
                        Error::malformed_archive(
                            entry.data_span.start as u64,
                            format!("deflate stream corrupt: {e}"),
                        )
                    })?;
                out
            }
            method => return Err(Error::UnsupportedMethod { method }),
        };

        let actual = crc32fast::hash(&content);
        if actual != entry.crc32() {
            return Err(Error::malformed_archive(
                entry.data_span.start as u64,
                format!(
                    "CRC mismatch for entry '{}': expected {:#x}, got {actual:#x}",
                    entry.path(),
                    entry.crc32()
                ),
            ));
        }

        Ok(content)
    }

    pub(super) fn data(&self) -> &[u8] {
        &self.data
    }

    pub(super) fn comment(&self) -> &[u8] {
        &self.comment
    }
}

/// Locates the end-of-central-directory record.
///
/// The record sits at the end of the file, preceded only by its own
/// optional comment, so the search runs backwards over the final 64 KiB
/// and accepts the first candidate whose comment length reaches exactly
/// to the end of the buffer.
fn find_eocd(data: &[u8]) -> Result<usize> {
    if data.len() < EOCD_LEN {
        return Err(Error::malformed_archive(
            0,
            "buffer too small for an end of central directory record",
        ));
    }
    let floor = data.len().saturating_sub(EOCD_LEN + MAX_COMMENT_LEN);
    for pos in (floor..=data.len() - EOCD_LEN).rev() {
        if u32_at(data, pos)? == EOCD_SIG {
            let comment_len = u16_at(data, pos + 20)? as usize;
            if pos + EOCD_LEN + comment_len == data.len() {
                return Ok(pos);
            }
        }
    }
    Err(Error::malformed_archive(
        data.len() as u64,
        "end of central directory record not found",
    ))
}

fn parse_central_entry(data: &[u8], pos: &mut usize) -> Result<Entry> {
    let at = *pos;
    if u32_at(data, at)? != CENTRAL_HEADER_SIG {
        return Err(Error::malformed_archive(
            at as u64,
            "bad central directory signature",
        ));
    }

    let version_made_by = u16_at(data, at + 4)?;
    let version_needed = u16_at(data, at + 6)?;
    let flags = u16_at(data, at + 8)?;
    let method = u16_at(data, at + 10)?;
    let mod_time = u16_at(data, at + 12)?;
    let mod_date = u16_at(data, at + 14)?;
    let crc32 = u32_at(data, at + 16)?;
    let compressed_size = u32_at(data, at + 20)?;
    let uncompressed_size = u32_at(data, at + 24)?;
    let name_len = u16_at(data, at + 28)? as usize;
    let extra_len = u16_at(data, at + 30)? as usize;
    let comment_len = u16_at(data, at + 32)? as usize;
    let disk_start = u16_at(data, at + 34)?;
    let internal_attrs = u16_at(data, at + 36)?;
    let external_attrs = u32_at(data, at + 38)?;
    let local_offset = u32_at(data, at + 42)?;

    if disk_start != 0 {
        return Err(Error::UnsupportedFeature {
            feature: "multi-disk archive",
        });
    }
    if compressed_size == u32::MAX || uncompressed_size == u32::MAX || local_offset == u32::MAX {
        return Err(Error::UnsupportedFeature {
            feature: "zip64 archive",
        });
    }

    let name_start = at + CENTRAL_HEADER_LEN;
    let end = name_start + name_len + extra_len + comment_len;
    if end > data.len() {
        return Err(Error::malformed_archive(
            at as u64,
            "central directory record overruns buffer",
        ));
    }
    let name = data[name_start..name_start + name_len].to_vec();
    let extra = data[name_start + name_len..name_start + name_len + extra_len].to_vec();
    let comment = data[name_start + name_len + extra_len..end].to_vec();
    *pos = end;

    // Resolve the raw local record the central entry points at.
    let lh = local_offset as usize;
    if u32_at(data, lh)? != LOCAL_HEADER_SIG {
        return Err(Error::malformed_archive(
            lh as u64,
            format!("bad local header signature for entry '{}'", String::from_utf8_lossy(&name)),
        ));
    }
    let local_name_len = u16_at(data, lh + 26)? as usize;
    let local_extra_len = u16_at(data, lh + 28)? as usize;
    let local_extra_start = lh + LOCAL_HEADER_LEN + local_name_len;
    let data_start = local_extra_start + local_extra_len;
    let data_end = data_start + compressed_size as usize;
    if data_end > data.len() {
        return Err(Error::malformed_archive(
            lh as u64,
            "entry data overruns buffer",
        ));
    }
    let local_extra = data[local_extra_start..data_start].to_vec();

    // A descriptor trails the data when flag bit 3 is set; its leading
    // signature word is optional.
    let mut local_end = data_end;
    if flags & FLAG_DATA_DESCRIPTOR != 0 {
        let descriptor_len = if u32_at(data, data_end).is_ok_and(|sig| sig == DATA_DESCRIPTOR_SIG)
        {
            16
        } else {
            12
        };
        local_end = data_end + descriptor_len;
        if local_end > data.len() {
            return Err(Error::malformed_archive(
                data_end as u64,
                "data descriptor overruns buffer",
            ));
        }
    }

    Ok(Entry {
        name,
        version_made_by,
        version_needed,
        flags,
        method,
        mod_time,
        mod_date,
        crc32,
        compressed_size,
        uncompressed_size,
        internal_attrs,
        external_attrs,
        extra,
        comment,
        local_extra,
        local_span: lh..local_end,
        data_span: data_start..data_end,
    })
}

fn u16_at(data: &[u8], pos: usize) -> Result<u16> {
    data.get(pos..pos + 2)
        .map(|b| u16::from_le_bytes(b.try_into().unwrap()))
        .ok_or_else(|| Error::malformed_archive(pos as u64, "truncated record"))
}

fn u32_at(data: &[u8], pos: usize) -> Result<u32> {
    data.get(pos..pos + 4)
        .map(|b| u32::from_le_bytes(b.try_into().unwrap()))
        .ok_or_else(|| Error::malformed_archive(pos as u64, "truncated record"))
}
