//! Hand-rolled zip fixtures for container unit tests.
//!
//! The production code never creates archives from scratch, so the tests
//! build their own: fixed local records, a central directory, and an end
//! record, with just enough variety (stored, deflated, data-descriptor
//! entries) to exercise the parser and rewriter.

use std::io::Write;

use super::{
    CENTRAL_HEADER_SIG, DATA_DESCRIPTOR_SIG, EOCD_SIG, FLAG_DATA_DESCRIPTOR, LOCAL_HEADER_SIG,
    METHOD_DEFLATE, METHOD_STORED,
};

// Arbitrary but fixed DOS timestamp shared by all fixture entries.
const FIXTURE_TIME: u16 = 0x7d1c;
const FIXTURE_DATE: u16 = 0x5a21;

/// Blueprint for one fixture entry.
pub struct ZipSpec<'a> {
    pub name: &'a str,
    pub content: &'a [u8],
    pub method: u16,
    pub with_descriptor: bool,
}

impl<'a> ZipSpec<'a> {
    pub fn stored(name: &'a str, content: &'a [u8]) -> Self {
        Self {
            name,
            content,
            method: METHOD_STORED,
            with_descriptor: false,
        }
    }

    pub fn deflated(name: &'a str, content: &'a [u8]) -> Self {
        Self {
            name,
            content,
            method: METHOD_DEFLATE,
            with_descriptor: false,
        }
    }

    pub fn deflated_with_descriptor(name: &'a str, content: &'a [u8]) -> Self {
        Self {
            name,
            content,
            method: METHOD_DEFLATE,
            with_descriptor: true,
        }
    }
}

/// Raw-deflates a buffer at the default level.
pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder =
        flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn push_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Builds a complete zip from the given entry blueprints.
pub fn build_zip(specs: &[ZipSpec<'_>]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut central = Vec::new();

    for spec in specs {
        let payload = match spec.method {
            METHOD_STORED => spec.content.to_vec(),
            METHOD_DEFLATE => deflate(spec.content),
            m => panic!("fixture does not support method {m}"),
        };
        let crc = crc32fast::hash(spec.content);
        let flags = if spec.with_descriptor {
            FLAG_DATA_DESCRIPTOR
        } else {
            0
        };
        let offset = out.len() as u32;

        // Local record.
        push_u32(&mut out, LOCAL_HEADER_SIG);
        push_u16(&mut out, 20);
        push_u16(&mut out, flags);
        push_u16(&mut out, spec.method);
        push_u16(&mut out, FIXTURE_TIME);
        push_u16(&mut out, FIXTURE_DATE);
        if spec.with_descriptor {
            push_u32(&mut out, 0);
            push_u32(&mut out, 0);
            push_u32(&mut out, 0);
        } else {
            push_u32(&mut out, crc);
            push_u32(&mut out, payload.len() as u32);
            push_u32(&mut out, spec.content.len() as u32);
        }
        push_u16(&mut out, spec.name.len() as u16);
        push_u16(&mut out, 0); // no extra field
        out.extend_from_slice(spec.name.as_bytes());
        out.extend_from_slice(&payload);
        if spec.with_descriptor {
            push_u32(&mut out, DATA_DESCRIPTOR_SIG);
            push_u32(&mut out, crc);
            push_u32(&mut out, payload.len() as u32);
            push_u32(&mut out, spec.content.len() as u32);
        }

        // Matching central directory record.
        push_u32(&mut central, CENTRAL_HEADER_SIG);
        push_u16(&mut central, 0x031e); // made by: unix
        push_u16(&mut central, 20);
        push_u16(&mut central, flags);
        push_u16(&mut central, spec.method);
        push_u16(&mut central, FIXTURE_TIME);
        push_u16(&mut central, FIXTURE_DATE);
        push_u32(&mut central, crc);
        push_u32(&mut central, payload.len() as u32);
        push_u32(&mut central, spec.content.len() as u32);
        push_u16(&mut central, spec.name.len() as u16);
        push_u16(&mut central, 0); // extra
        push_u16(&mut central, 0); // comment
        push_u16(&mut central, 0); // disk start
        push_u16(&mut central, 0); // internal attrs
        push_u32(&mut central, 0o100644 << 16); // external attrs
        push_u32(&mut central, offset);
        central.extend_from_slice(spec.name.as_bytes());
    }

    let cd_offset = out.len() as u32;
    out.extend_from_slice(&central);

    push_u32(&mut out, EOCD_SIG);
    push_u16(&mut out, 0);
    push_u16(&mut out, 0);
    push_u16(&mut out, specs.len() as u16);
    push_u16(&mut out, specs.len() as u16);
    push_u32(&mut out, central.len() as u32);
    push_u32(&mut out, cd_offset);
    push_u16(&mut out, 0); // no comment
    out
}
