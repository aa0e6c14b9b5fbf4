//! Strict decoder for the binary manifest encoding.
//!
//! The schema is closed: any field tag the decoder does not recognize is a
//! [`MalformedDocument`] error rather than something to skip, so a schema
//! drift between producer and this tool surfaces immediately instead of
//! silently dropping data on re-encode.
//!
//! [`MalformedDocument`]: crate::Error::MalformedDocument

use crate::{Error, Result};

use super::field;
use super::wire::{WIRE_FIXED32, WIRE_LEN, WIRE_VARINT, WireReader};
use super::{Attribute, CompiledValue, Document, Element, NamespaceDecl, RawChild, SourcePos};

impl Document {
    /// Decodes a binary manifest document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedDocument`] if the buffer is truncated,
    /// contains an unexpected field tag or wire type, holds invalid UTF-8
    /// in a string field, carries a typed value outside the closed
    /// [`CompiledValue`] set, or is not rooted at an element.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = WireReader::new(bytes);
        let mut root = None;
        let mut source = None;

        while !r.is_empty() {
            let (f, wt) = r.read_key()?;
            match f {
                field::NODE_ELEMENT => {
                    r.expect_wire_type(f, wt, WIRE_LEN)?;
                    let (payload, offset) = r.read_len_prefixed()?;
                    root = Some(decode_element(payload, offset)?);
                }
                field::NODE_TEXT => {
                    return Err(Error::malformed_document(
                        r.offset(),
                        "document root is a text node, expected an element",
                    ));
                }
                field::NODE_SOURCE => {
                    r.expect_wire_type(f, wt, WIRE_LEN)?;
                    let (payload, offset) = r.read_len_prefixed()?;
                    source = Some(decode_source(payload, offset)?);
                }
                _ => {
                    return Err(unexpected_field("node", f, r.offset()));
                }
            }
        }

        let root = root.ok_or_else(|| {
            Error::malformed_document(0, "document has no root element")
        })?;

        log::debug!(
            "decoded manifest: <{}> with {} attribute(s), {} child node(s)",
            root.name,
            root.attributes.len(),
            root.children.len()
        );

        Ok(Document { root, source })
    }
}

fn unexpected_field(record: &str, f: u32, offset: u64) -> Error {
    Error::malformed_document(offset, format!("unexpected field tag {f} in {record}"))
}

fn decode_source(buf: &[u8], base: u64) -> Result<SourcePos> {
    let mut r = WireReader::with_base(buf, base);
    let mut pos = SourcePos::default();
    while !r.is_empty() {
        let (f, wt) = r.read_key()?;
        match f {
            field::SOURCE_LINE => {
                r.expect_wire_type(f, wt, WIRE_VARINT)?;
                pos.line = r.read_varint_u32()?;
            }
            field::SOURCE_COLUMN => {
                r.expect_wire_type(f, wt, WIRE_VARINT)?;
                pos.column = r.read_varint_u32()?;
            }
            _ => return Err(unexpected_field("source position", f, r.offset())),
        }
    }
    Ok(pos)
}

fn decode_namespace(buf: &[u8], base: u64) -> Result<NamespaceDecl> {
    let mut r = WireReader::with_base(buf, base);
    let mut decl = NamespaceDecl {
        prefix: String::new(),
        uri: String::new(),
        source: None,
    };
    while !r.is_empty() {
        let (f, wt) = r.read_key()?;
        r.expect_wire_type(f, wt, WIRE_LEN)?;
        match f {
            field::NS_PREFIX => decl.prefix = r.read_string()?,
            field::NS_URI => decl.uri = r.read_string()?,
            field::NS_SOURCE => {
                let (payload, offset) = r.read_len_prefixed()?;
                decl.source = Some(decode_source(payload, offset)?);
            }
            _ => return Err(unexpected_field("namespace declaration", f, r.offset())),
        }
    }
    Ok(decl)
}

fn decode_element(buf: &[u8], base: u64) -> Result<Element> {
    let mut r = WireReader::with_base(buf, base);
    let mut element = Element {
        namespace_decls: Vec::new(),
        namespace_uri: String::new(),
        name: String::new(),
        attributes: Vec::new(),
        children: Vec::new(),
    };
    while !r.is_empty() {
        let (f, wt) = r.read_key()?;
        r.expect_wire_type(f, wt, WIRE_LEN)?;
        match f {
            field::ELEMENT_NAMESPACE_DECL => {
                let (payload, offset) = r.read_len_prefixed()?;
                element.namespace_decls.push(decode_namespace(payload, offset)?);
            }
            field::ELEMENT_NAMESPACE_URI => element.namespace_uri = r.read_string()?,
            field::ELEMENT_NAME => element.name = r.read_string()?,
            field::ELEMENT_ATTRIBUTE => {
                let (payload, offset) = r.read_len_prefixed()?;
                element.attributes.push(decode_attribute(payload, offset)?);
            }
            field::ELEMENT_CHILD => {
                // Children are opaque to the patcher: keep the raw encoded
                // node bytes and re-emit them verbatim.
                let (payload, _) = r.read_len_prefixed()?;
                element.children.push(RawChild(payload.to_vec()));
            }
            _ => return Err(unexpected_field("element", f, r.offset())),
        }
    }
    Ok(element)
}

fn decode_attribute(buf: &[u8], base: u64) -> Result<Attribute> {
    let mut r = WireReader::with_base(buf, base);
    let mut attr = Attribute {
        namespace_uri: String::new(),
        name: String::new(),
        value: String::new(),
        source: None,
        resource_id: 0,
        compiled: None,
    };
    while !r.is_empty() {
        let (f, wt) = r.read_key()?;
        match f {
            field::ATTR_NAMESPACE_URI => {
                r.expect_wire_type(f, wt, WIRE_LEN)?;
                attr.namespace_uri = r.read_string()?;
            }
            field::ATTR_NAME => {
                r.expect_wire_type(f, wt, WIRE_LEN)?;
                attr.name = r.read_string()?;
            }
            field::ATTR_VALUE => {
                r.expect_wire_type(f, wt, WIRE_LEN)?;
                attr.value = r.read_string()?;
            }
            field::ATTR_SOURCE => {
                r.expect_wire_type(f, wt, WIRE_LEN)?;
                let (payload, offset) = r.read_len_prefixed()?;
                attr.source = Some(decode_source(payload, offset)?);
            }
            field::ATTR_RESOURCE_ID => {
                r.expect_wire_type(f, wt, WIRE_VARINT)?;
                attr.resource_id = r.read_varint_u32()?;
            }
            field::ATTR_COMPILED_ITEM => {
                r.expect_wire_type(f, wt, WIRE_LEN)?;
                let (payload, offset) = r.read_len_prefixed()?;
                attr.compiled = Some(decode_item(payload, offset)?);
            }
            _ => return Err(unexpected_field("attribute", f, r.offset())),
        }
    }
    Ok(attr)
}

/// Decodes the string wrapper message carried by string-kind items.
fn decode_string_wrapper(buf: &[u8], base: u64) -> Result<String> {
    let mut r = WireReader::with_base(buf, base);
    let mut value = String::new();
    while !r.is_empty() {
        let (f, wt) = r.read_key()?;
        match f {
            field::STR_VALUE => {
                r.expect_wire_type(f, wt, WIRE_LEN)?;
                value = r.read_string()?;
            }
            _ => return Err(unexpected_field("string value", f, r.offset())),
        }
    }
    Ok(value)
}

/// Requires the payload of a marker message (null/empty) to carry nothing.
fn require_empty_payload(buf: &[u8], offset: u64) -> Result<()> {
    if buf.is_empty() {
        Ok(())
    } else {
        Err(Error::malformed_document(
            offset,
            "marker value carries unexpected payload",
        ))
    }
}

fn decode_item(buf: &[u8], base: u64) -> Result<CompiledValue> {
    let mut r = WireReader::with_base(buf, base);
    let mut value = None;
    while !r.is_empty() {
        let (f, wt) = r.read_key()?;
        match f {
            field::ITEM_STR => {
                r.expect_wire_type(f, wt, WIRE_LEN)?;
                let (payload, offset) = r.read_len_prefixed()?;
                value = Some(CompiledValue::Str(decode_string_wrapper(payload, offset)?));
            }
            field::ITEM_RAW_STR => {
                r.expect_wire_type(f, wt, WIRE_LEN)?;
                let (payload, offset) = r.read_len_prefixed()?;
                value = Some(CompiledValue::RawStr(decode_string_wrapper(payload, offset)?));
            }
            field::ITEM_PRIM => {
                r.expect_wire_type(f, wt, WIRE_LEN)?;
                let (payload, offset) = r.read_len_prefixed()?;
                value = Some(decode_primitive(payload, offset)?);
            }
            field::ITEM_REF
            | field::ITEM_STYLED_STR
            | field::ITEM_FILE
            | field::ITEM_ID => {
                return Err(Error::malformed_document(
                    r.offset(),
                    format!("unsupported compiled value variant {f}"),
                ));
            }
            _ => return Err(unexpected_field("compiled item", f, r.offset())),
        }
    }
    value.ok_or_else(|| Error::malformed_document(base, "compiled item carries no value"))
}

fn decode_primitive(buf: &[u8], base: u64) -> Result<CompiledValue> {
    let mut r = WireReader::with_base(buf, base);
    let mut value = None;
    while !r.is_empty() {
        let (f, wt) = r.read_key()?;
        match f {
            field::PRIM_NULL => {
                r.expect_wire_type(f, wt, WIRE_LEN)?;
                let (payload, offset) = r.read_len_prefixed()?;
                require_empty_payload(payload, offset)?;
                value = Some(CompiledValue::Null);
            }
            field::PRIM_EMPTY => {
                r.expect_wire_type(f, wt, WIRE_LEN)?;
                let (payload, offset) = r.read_len_prefixed()?;
                require_empty_payload(payload, offset)?;
                value = Some(CompiledValue::Empty);
            }
            field::PRIM_FLOAT => {
                r.expect_wire_type(f, wt, WIRE_FIXED32)?;
                value = Some(CompiledValue::Float(f32::from_bits(r.read_fixed32()?)));
            }
            field::PRIM_INT_DECIMAL => {
                r.expect_wire_type(f, wt, WIRE_VARINT)?;
                value = Some(CompiledValue::IntDecimal(r.read_varint_i32()?));
            }
            field::PRIM_INT_HEX => {
                r.expect_wire_type(f, wt, WIRE_VARINT)?;
                value = Some(CompiledValue::IntHex(r.read_varint_u32()?));
            }
            field::PRIM_BOOLEAN => {
                r.expect_wire_type(f, wt, WIRE_VARINT)?;
                value = Some(CompiledValue::Boolean(r.read_varint()? != 0));
            }
            field::PRIM_COLOR_ARGB8 => {
                r.expect_wire_type(f, wt, WIRE_VARINT)?;
                value = Some(CompiledValue::ColorArgb8(r.read_varint_u32()?));
            }
            field::PRIM_COLOR_RGB8 => {
                r.expect_wire_type(f, wt, WIRE_VARINT)?;
                value = Some(CompiledValue::ColorRgb8(r.read_varint_u32()?));
            }
            field::PRIM_COLOR_ARGB4 => {
                r.expect_wire_type(f, wt, WIRE_VARINT)?;
                value = Some(CompiledValue::ColorArgb4(r.read_varint_u32()?));
            }
            field::PRIM_COLOR_RGB4 => {
                r.expect_wire_type(f, wt, WIRE_VARINT)?;
                value = Some(CompiledValue::ColorRgb4(r.read_varint_u32()?));
            }
            field::PRIM_DIMENSION => {
                r.expect_wire_type(f, wt, WIRE_VARINT)?;
                value = Some(CompiledValue::Dimension(r.read_varint_u32()?));
            }
            field::PRIM_FRACTION => {
                r.expect_wire_type(f, wt, WIRE_VARINT)?;
                value = Some(CompiledValue::Fraction(r.read_varint_u32()?));
            }
            field::PRIM_DIMENSION_DEPRECATED | field::PRIM_FRACTION_DEPRECATED => {
                return Err(Error::malformed_document(
                    r.offset(),
                    format!("unsupported compiled value variant {f} (deprecated)"),
                ));
            }
            _ => return Err(unexpected_field("primitive value", f, r.offset())),
        }
    }
    value.ok_or_else(|| Error::malformed_document(base, "primitive carries no value"))
}
