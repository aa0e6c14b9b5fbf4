//! Binary manifest document model.
//!
//! A compiled `AndroidManifest.xml` is a protobuf-framed tree of nodes:
//! one root element carrying namespace declarations, attributes with typed
//! values, and child nodes. This module decodes that encoding into an
//! owned tree, lets the patcher edit the root element's attributes, and
//! re-encodes the tree in the canonical field order the downstream
//! toolchain requires.
//!
//! The model is not lossy: every attribute, namespace declaration, source
//! position, resource id and typed value survives a decode/encode cycle.
//! Child nodes are opaque to the patcher and are held as their raw encoded
//! bytes, which re-emit verbatim.
//!
//! # Example
//!
//! ```rust,ignore
//! use apkbump::manifest::Document;
//!
//! let mut document = Document::decode(&bytes)?;
//! for attr in &document.root.attributes {
//!     println!("{}={}", attr.name, attr.value);
//! }
//! let out = document.encode();
//! ```

mod decode;
mod encode;
pub mod wire;

/// Schema field numbers for the binary manifest encoding.
///
/// The wire order of every record is ascending field number; the encoder
/// treats these as a fixed external contract.
pub(crate) mod field {
    // Node: oneof { element, text }, then source.
    pub const NODE_ELEMENT: u32 = 1;
    pub const NODE_TEXT: u32 = 2;
    pub const NODE_SOURCE: u32 = 3;

    // Source position.
    pub const SOURCE_LINE: u32 = 1;
    pub const SOURCE_COLUMN: u32 = 2;

    // Namespace declaration.
    pub const NS_PREFIX: u32 = 1;
    pub const NS_URI: u32 = 2;
    pub const NS_SOURCE: u32 = 3;

    // Element.
    pub const ELEMENT_NAMESPACE_DECL: u32 = 1;
    pub const ELEMENT_NAMESPACE_URI: u32 = 2;
    pub const ELEMENT_NAME: u32 = 3;
    pub const ELEMENT_ATTRIBUTE: u32 = 4;
    pub const ELEMENT_CHILD: u32 = 5;

    // Attribute.
    pub const ATTR_NAMESPACE_URI: u32 = 1;
    pub const ATTR_NAME: u32 = 2;
    pub const ATTR_VALUE: u32 = 3;
    pub const ATTR_SOURCE: u32 = 4;
    pub const ATTR_RESOURCE_ID: u32 = 5;
    pub const ATTR_COMPILED_ITEM: u32 = 6;

    // Compiled item: oneof over value kinds.
    pub const ITEM_REF: u32 = 1;
    pub const ITEM_STR: u32 = 2;
    pub const ITEM_RAW_STR: u32 = 3;
    pub const ITEM_STYLED_STR: u32 = 4;
    pub const ITEM_FILE: u32 = 5;
    pub const ITEM_ID: u32 = 6;
    pub const ITEM_PRIM: u32 = 7;

    // String wrapper message inside a compiled item.
    pub const STR_VALUE: u32 = 1;

    // Primitive: oneof over scalar kinds.
    pub const PRIM_NULL: u32 = 1;
    pub const PRIM_EMPTY: u32 = 2;
    pub const PRIM_FLOAT: u32 = 3;
    pub const PRIM_DIMENSION_DEPRECATED: u32 = 4;
    pub const PRIM_FRACTION_DEPRECATED: u32 = 5;
    pub const PRIM_INT_DECIMAL: u32 = 6;
    pub const PRIM_INT_HEX: u32 = 7;
    pub const PRIM_BOOLEAN: u32 = 8;
    pub const PRIM_COLOR_ARGB8: u32 = 9;
    pub const PRIM_COLOR_RGB8: u32 = 10;
    pub const PRIM_COLOR_ARGB4: u32 = 11;
    pub const PRIM_COLOR_RGB4: u32 = 12;
    pub const PRIM_DIMENSION: u32 = 13;
    pub const PRIM_FRACTION: u32 = 14;
}

/// A decoded binary manifest document.
///
/// The tree is rooted at exactly one [`Element`]; a document whose root
/// node is a text node is rejected during decode.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// The root element.
    pub root: Element,
    /// Source position of the root node, if the compiler recorded one.
    pub source: Option<SourcePos>,
}

/// An element of the document tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Namespace declarations carried on this element (e.g. `xmlns:android`).
    pub namespace_decls: Vec<NamespaceDecl>,
    /// Namespace URI of the tag itself; empty for unqualified tags.
    pub namespace_uri: String,
    /// Local tag name.
    pub name: String,
    /// Attributes, in document order.
    pub attributes: Vec<Attribute>,
    /// Child nodes, preserved as raw encoded bytes.
    pub children: Vec<RawChild>,
}

/// A namespace declaration on an element.
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDecl {
    /// Declared prefix (e.g. `android`).
    pub prefix: String,
    /// Namespace URI the prefix maps to.
    pub uri: String,
    /// Source position, if recorded.
    pub source: Option<SourcePos>,
}

/// One attribute of an element.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Namespace URI; empty for bare attributes such as `package`.
    pub namespace_uri: String,
    /// Local attribute name.
    pub name: String,
    /// Human-readable string value. May be empty when only the typed value
    /// is carried (the binary-to-proto conversion drops it).
    pub value: String,
    /// Source position, if recorded.
    pub source: Option<SourcePos>,
    /// Framework resource id; 0 when the attribute has none.
    pub resource_id: u32,
    /// Typed value, parallel to `value`.
    pub compiled: Option<CompiledValue>,
}

/// Line/column position in the source the document was compiled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourcePos {
    /// 1-based line number; 0 when unknown.
    pub line: u32,
    /// 0-based column number.
    pub column: u32,
}

/// A child node kept as its raw encoded bytes.
///
/// The patcher never descends into children, so they are carried opaquely
/// and re-emitted byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChild(
    /// The raw encoded node bytes.
    pub Vec<u8>,
);

impl RawChild {
    /// The raw encoded node bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// The typed value of an attribute.
///
/// This is a closed set: decoding a value whose variant tag falls outside
/// it (references, styled strings, file references, ids) fails with
/// [`Error::MalformedDocument`]. Those kinds never occur on the root
/// `<manifest>` element, which is the only element this tool edits.
///
/// [`Error::MalformedDocument`]: crate::Error::MalformedDocument
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledValue {
    /// A UTF-8 string.
    Str(String),
    /// An unprocessed string, kept exactly as written in the source.
    RawStr(String),
    /// An explicit null.
    Null,
    /// An explicitly empty value.
    Empty,
    /// A 32-bit float.
    Float(f32),
    /// A decimal integer. `versionCode` carries this kind.
    IntDecimal(i32),
    /// A hexadecimal integer.
    IntHex(u32),
    /// A boolean.
    Boolean(bool),
    /// Color in #AARRGGBB form.
    ColorArgb8(u32),
    /// Color in #RRGGBB form.
    ColorRgb8(u32),
    /// Color in #ARGB form.
    ColorArgb4(u32),
    /// Color in #RGB form.
    ColorRgb4(u32),
    /// A dimension value in packed unit form.
    Dimension(u32),
    /// A fraction value in packed unit form.
    Fraction(u32),
}

impl Attribute {
    /// Returns `true` if this attribute matches the given namespace URI and
    /// local name exactly.
    pub fn is(&self, namespace_uri: &str, name: &str) -> bool {
        self.namespace_uri == namespace_uri && self.name == name
    }
}
