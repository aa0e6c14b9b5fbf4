//! Shared test utilities for integration tests.
//!
//! This module provides the manifest and zip fixtures used across the
//! test files. Archive creation lives here because the library itself
//! only ever rewrites existing containers.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test
//! file compiles as a separate crate and may only use a subset of these
//! helpers.

#![allow(dead_code)]

use std::io::Write;

use apkbump::ANDROID_NAMESPACE;
use apkbump::manifest::{Attribute, CompiledValue, Document, Element, NamespaceDecl, RawChild, SourcePos};

/// Builds a realistic manifest document: namespace declaration, the three
/// patchable attributes, a bystander attribute, and two child elements.
pub fn sample_document() -> Document {
    let application = Document {
        root: Element {
            namespace_decls: vec![],
            namespace_uri: String::new(),
            name: "application".into(),
            attributes: vec![attribute(
                ANDROID_NAMESPACE,
                "debuggable",
                "true",
                Some(CompiledValue::Boolean(true)),
            )],
            children: vec![],
        },
        source: Some(SourcePos { line: 8, column: 4 }),
    };
    let uses_sdk = Document {
        root: Element {
            namespace_decls: vec![],
            namespace_uri: String::new(),
            name: "uses-sdk".into(),
            attributes: vec![attribute(
                ANDROID_NAMESPACE,
                "minSdkVersion",
                "24",
                Some(CompiledValue::IntDecimal(24)),
            )],
            children: vec![],
        },
        source: Some(SourcePos { line: 5, column: 4 }),
    };

    Document {
        root: Element {
            namespace_decls: vec![NamespaceDecl {
                prefix: "android".into(),
                uri: ANDROID_NAMESPACE.into(),
                source: Some(SourcePos { line: 2, column: 0 }),
            }],
            namespace_uri: String::new(),
            name: "manifest".into(),
            attributes: vec![
                attribute("", "package", "com.example.old", None),
                attribute(
                    ANDROID_NAMESPACE,
                    "versionCode",
                    "5",
                    Some(CompiledValue::IntDecimal(5)),
                ),
                attribute(ANDROID_NAMESPACE, "versionName", "1.0", None),
                attribute(
                    ANDROID_NAMESPACE,
                    "compileSdkVersion",
                    "34",
                    Some(CompiledValue::IntDecimal(34)),
                ),
            ],
            children: vec![
                RawChild(uses_sdk.encode()),
                RawChild(application.encode()),
            ],
        },
        source: Some(SourcePos { line: 1, column: 0 }),
    }
}

/// The sample document in its encoded binary form.
pub fn sample_manifest_bytes() -> Vec<u8> {
    sample_document().encode()
}

pub fn attribute(
    namespace_uri: &str,
    name: &str,
    value: &str,
    compiled: Option<CompiledValue>,
) -> Attribute {
    Attribute {
        namespace_uri: namespace_uri.into(),
        name: name.into(),
        value: value.into(),
        source: None,
        resource_id: 0,
        compiled,
    }
}

/// Zip compression method: stored.
pub const STORED: u16 = 0;
/// Zip compression method: deflate.
pub const DEFLATE: u16 = 8;

/// Blueprint for one fixture zip entry.
pub struct TestEntry<'a> {
    pub name: &'a str,
    pub content: &'a [u8],
    pub method: u16,
}

impl<'a> TestEntry<'a> {
    pub fn stored(name: &'a str, content: &'a [u8]) -> Self {
        Self {
            name,
            content,
            method: STORED,
        }
    }

    pub fn deflated(name: &'a str, content: &'a [u8]) -> Self {
        Self {
            name,
            content,
            method: DEFLATE,
        }
    }

    /// An entry declaring an arbitrary method, with the content carried
    /// as-is. Useful for exercising passthrough of entries the tool
    /// cannot decompress.
    pub fn with_method(name: &'a str, content: &'a [u8], method: u16) -> Self {
        Self {
            name,
            content,
            method,
        }
    }
}

fn push_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Builds a complete zip container from the given blueprints.
pub fn build_zip(entries: &[TestEntry<'_>]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut central = Vec::new();

    for entry in entries {
        let payload = match entry.method {
            DEFLATE => {
                let mut encoder =
                    flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(entry.content).unwrap();
                encoder.finish().unwrap()
            }
            _ => entry.content.to_vec(),
        };
        let crc = crc32fast::hash(entry.content);
        let offset = out.len() as u32;

        push_u32(&mut out, 0x0403_4b50);
        push_u16(&mut out, 20);
        push_u16(&mut out, 0); // flags
        push_u16(&mut out, entry.method);
        push_u16(&mut out, 0x7d1c); // mod time
        push_u16(&mut out, 0x5a21); // mod date
        push_u32(&mut out, crc);
        push_u32(&mut out, payload.len() as u32);
        push_u32(&mut out, entry.content.len() as u32);
        push_u16(&mut out, entry.name.len() as u16);
        push_u16(&mut out, 0);
        out.extend_from_slice(entry.name.as_bytes());
        out.extend_from_slice(&payload);

        push_u32(&mut central, 0x0201_4b50);
        push_u16(&mut central, 0x031e);
        push_u16(&mut central, 20);
        push_u16(&mut central, 0);
        push_u16(&mut central, entry.method);
        push_u16(&mut central, 0x7d1c);
        push_u16(&mut central, 0x5a21);
        push_u32(&mut central, crc);
        push_u32(&mut central, payload.len() as u32);
        push_u32(&mut central, entry.content.len() as u32);
        push_u16(&mut central, entry.name.len() as u16);
        push_u16(&mut central, 0);
        push_u16(&mut central, 0);
        push_u16(&mut central, 0);
        push_u16(&mut central, 0);
        push_u32(&mut central, 0o100644 << 16);
        push_u32(&mut central, offset);
        central.extend_from_slice(entry.name.as_bytes());
    }

    let cd_offset = out.len() as u32;
    out.extend_from_slice(&central);

    push_u32(&mut out, 0x0605_4b50);
    push_u16(&mut out, 0);
    push_u16(&mut out, 0);
    push_u16(&mut out, entries.len() as u16);
    push_u16(&mut out, entries.len() as u16);
    push_u32(&mut out, central.len() as u32);
    push_u32(&mut out, cd_offset);
    push_u16(&mut out, 0);
    out
}
