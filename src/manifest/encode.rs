//! Canonical encoder for the binary manifest encoding.
//!
//! Every record kind has an explicit encoder that writes its fields in
//! ascending schema field-number order. Downstream consumers of the
//! manifest perform order-sensitive parsing, so the wire order is a fixed
//! external contract: it must never depend on the in-memory struct layout
//! or on a generic serializer's iteration order. Default values follow the
//! canonical elision rules: empty strings and zero scalars are omitted,
//! except inside a value union, where presence itself is the information.

use super::field;
use super::wire::{
    write_fixed32_field, write_len_field, write_string_field, write_varint_field,
    write_varint_field_always, write_varint_i32_field,
};
use super::{Attribute, CompiledValue, Document, Element, NamespaceDecl, SourcePos};

impl Document {
    /// Encodes the document back to its binary form.
    ///
    /// Re-encoding a freshly decoded document reproduces the input byte
    /// for byte when the input was canonically encoded, which is the case
    /// for every compiler-produced manifest.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        write_len_field(&mut out, field::NODE_ELEMENT, &encode_element(&self.root));
        if let Some(source) = &self.source {
            write_len_field(&mut out, field::NODE_SOURCE, &encode_source(source));
        }
        out
    }
}

fn encode_source(source: &SourcePos) -> Vec<u8> {
    let mut out = Vec::new();
    write_varint_field(&mut out, field::SOURCE_LINE, u64::from(source.line));
    write_varint_field(&mut out, field::SOURCE_COLUMN, u64::from(source.column));
    out
}

fn encode_namespace(decl: &NamespaceDecl) -> Vec<u8> {
    let mut out = Vec::new();
    write_string_field(&mut out, field::NS_PREFIX, &decl.prefix);
    write_string_field(&mut out, field::NS_URI, &decl.uri);
    if let Some(source) = &decl.source {
        write_len_field(&mut out, field::NS_SOURCE, &encode_source(source));
    }
    out
}

fn encode_element(element: &Element) -> Vec<u8> {
    let mut out = Vec::new();
    for decl in &element.namespace_decls {
        write_len_field(&mut out, field::ELEMENT_NAMESPACE_DECL, &encode_namespace(decl));
    }
    write_string_field(&mut out, field::ELEMENT_NAMESPACE_URI, &element.namespace_uri);
    write_string_field(&mut out, field::ELEMENT_NAME, &element.name);
    for attr in &element.attributes {
        write_len_field(&mut out, field::ELEMENT_ATTRIBUTE, &encode_attribute(attr));
    }
    for child in &element.children {
        write_len_field(&mut out, field::ELEMENT_CHILD, child.as_bytes());
    }
    out
}

fn encode_attribute(attr: &Attribute) -> Vec<u8> {
    let mut out = Vec::new();
    write_string_field(&mut out, field::ATTR_NAMESPACE_URI, &attr.namespace_uri);
    write_string_field(&mut out, field::ATTR_NAME, &attr.name);
    write_string_field(&mut out, field::ATTR_VALUE, &attr.value);
    if let Some(source) = &attr.source {
        write_len_field(&mut out, field::ATTR_SOURCE, &encode_source(source));
    }
    write_varint_field(&mut out, field::ATTR_RESOURCE_ID, u64::from(attr.resource_id));
    if let Some(compiled) = &attr.compiled {
        write_len_field(&mut out, field::ATTR_COMPILED_ITEM, &encode_item(compiled));
    }
    out
}

fn encode_string_wrapper(value: &str) -> Vec<u8> {
    let mut out = Vec::new();
    write_string_field(&mut out, field::STR_VALUE, value);
    out
}

fn encode_item(value: &CompiledValue) -> Vec<u8> {
    let mut out = Vec::new();
    match value {
        CompiledValue::Str(s) => {
            write_len_field(&mut out, field::ITEM_STR, &encode_string_wrapper(s));
        }
        CompiledValue::RawStr(s) => {
            write_len_field(&mut out, field::ITEM_RAW_STR, &encode_string_wrapper(s));
        }
        // Everything else nests inside a primitive record.
        CompiledValue::Null
        | CompiledValue::Empty
        | CompiledValue::Float(_)
        | CompiledValue::IntDecimal(_)
        | CompiledValue::IntHex(_)
        | CompiledValue::Boolean(_)
        | CompiledValue::ColorArgb8(_)
        | CompiledValue::ColorRgb8(_)
        | CompiledValue::ColorArgb4(_)
        | CompiledValue::ColorRgb4(_)
        | CompiledValue::Dimension(_)
        | CompiledValue::Fraction(_) => {
            write_len_field(&mut out, field::ITEM_PRIM, &encode_primitive(value));
        }
    }
    out
}

/// Encodes the primitive record for scalar value kinds.
///
/// Union members are written unconditionally: a zero `versionCode` or a
/// `false` boolean still occupies its field, since presence distinguishes
/// "set to default" from "absent".
fn encode_primitive(value: &CompiledValue) -> Vec<u8> {
    let mut out = Vec::new();
    match value {
        CompiledValue::Null => write_len_field(&mut out, field::PRIM_NULL, &[]),
        CompiledValue::Empty => write_len_field(&mut out, field::PRIM_EMPTY, &[]),
        CompiledValue::Float(v) => write_fixed32_field(&mut out, field::PRIM_FLOAT, v.to_bits()),
        CompiledValue::IntDecimal(v) => {
            write_varint_i32_field(&mut out, field::PRIM_INT_DECIMAL, *v);
        }
        CompiledValue::IntHex(v) => {
            write_varint_field_always(&mut out, field::PRIM_INT_HEX, u64::from(*v));
        }
        CompiledValue::Boolean(v) => {
            write_varint_field_always(&mut out, field::PRIM_BOOLEAN, u64::from(*v));
        }
        CompiledValue::ColorArgb8(v) => {
            write_varint_field_always(&mut out, field::PRIM_COLOR_ARGB8, u64::from(*v));
        }
        CompiledValue::ColorRgb8(v) => {
            write_varint_field_always(&mut out, field::PRIM_COLOR_RGB8, u64::from(*v));
        }
        CompiledValue::ColorArgb4(v) => {
            write_varint_field_always(&mut out, field::PRIM_COLOR_ARGB4, u64::from(*v));
        }
        CompiledValue::ColorRgb4(v) => {
            write_varint_field_always(&mut out, field::PRIM_COLOR_RGB4, u64::from(*v));
        }
        CompiledValue::Dimension(v) => {
            write_varint_field_always(&mut out, field::PRIM_DIMENSION, u64::from(*v));
        }
        CompiledValue::Fraction(v) => {
            write_varint_field_always(&mut out, field::PRIM_FRACTION, u64::from(*v));
        }
        CompiledValue::Str(_) | CompiledValue::RawStr(_) => {
            unreachable!("string kinds are encoded at the item level")
        }
    }
    out
}
