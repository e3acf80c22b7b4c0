//! Core types for the DIDL header format.
//!
//! A `TypeRef` is a signed 32-bit integer. Negative values name built-in
//! types: `-1 ..= -17` are primitives, `-18 ..= -23` are type constructors.
//! Non-negative values index the per-message type table.

use std::fmt;

/// The four bytes every message starts with.
pub const MAGIC: [u8; 4] = *b"DIDL";

/// The magic bytes as read by `Buffer::read_word`.
pub const MAGIC_WORD: u32 = u32::from_le_bytes(MAGIC);

/// Lowest primitive tag. Anything below is a constructor or unknown.
pub const PRIM_LOWEST: i32 = -17;

/// Lowest constructor tag this decoder understands.
pub const CON_LOWEST: i32 = -23;

/// Decoding traps. Each one aborts the decode of the current message.
///
/// `reason()` gives the short, stable string that callers forward verbatim
/// when rejecting a malformed payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A read ran past the end of the buffer.
    #[error("out of bounds: needed {needed} bytes, {remaining} remaining")]
    OutOfBounds { needed: usize, remaining: usize },
    /// A varint carried a redundant trailing group.
    #[error("not shortest encoding")]
    NonCanonicalEncoding,
    /// A varint does not fit in 32 bits.
    #[error("int overflow")]
    IntegerOverflow,
    /// The first word was not `DIDL`.
    #[error("missing magic bytes: found {0:#010x}")]
    BadMagic(u32),
    /// The declared type count cannot fit in the remaining input.
    #[error("too many types: {0}")]
    TooManyTypes(u32),
    /// A type declaration did not start with a known constructor tag.
    ///
    /// Primitive tags and table indices are "type index too high"; tags below
    /// the constructor range are "future type".
    #[error("{reason}: {0}", reason = unknown_type_reason(.0))]
    UnknownType(i32),
    /// A type reference is neither a primitive nor a valid table index.
    #[error("type index out of range: {0}")]
    IndexOutOfRange(i32),
}

impl Error {
    pub fn reason(&self) -> &'static str {
        match self {
            Error::OutOfBounds { .. } => "out of bounds",
            Error::NonCanonicalEncoding => "not shortest encoding",
            Error::IntegerOverflow => "int overflow",
            Error::BadMagic(_) => "missing magic bytes",
            Error::TooManyTypes(_) => "too many types",
            Error::UnknownType(tag) => unknown_type_reason(tag),
            Error::IndexOutOfRange(_) => "type index out of range",
        }
    }
}

fn unknown_type_reason(tag: &i32) -> &'static str {
    if *tag >= PRIM_LOWEST { "type index too high" } else { "future type" }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Built-in types that need no table entry.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prim {
    Null = -1,
    Bool = -2,
    Nat = -3,
    Int = -4,
    Nat8 = -5,
    Nat16 = -6,
    Nat32 = -7,
    Nat64 = -8,
    Int8 = -9,
    Int16 = -10,
    Int32 = -11,
    Int64 = -12,
    Float32 = -13,
    Float64 = -14,
    Text = -15,
    Reserved = -16,
    Empty = -17,
}

impl Prim {
    pub const fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            -1 => Some(Prim::Null),
            -2 => Some(Prim::Bool),
            -3 => Some(Prim::Nat),
            -4 => Some(Prim::Int),
            -5 => Some(Prim::Nat8),
            -6 => Some(Prim::Nat16),
            -7 => Some(Prim::Nat32),
            -8 => Some(Prim::Nat64),
            -9 => Some(Prim::Int8),
            -10 => Some(Prim::Int16),
            -11 => Some(Prim::Int32),
            -12 => Some(Prim::Int64),
            -13 => Some(Prim::Float32),
            -14 => Some(Prim::Float64),
            -15 => Some(Prim::Text),
            -16 => Some(Prim::Reserved),
            -17 => Some(Prim::Empty),
            _ => None,
        }
    }

    pub const fn tag(self) -> i32 {
        self as i32
    }

    pub const fn name(self) -> &'static str {
        match self {
            Prim::Null => "null",
            Prim::Bool => "bool",
            Prim::Nat => "nat",
            Prim::Int => "int",
            Prim::Nat8 => "nat8",
            Prim::Nat16 => "nat16",
            Prim::Nat32 => "nat32",
            Prim::Nat64 => "nat64",
            Prim::Int8 => "int8",
            Prim::Int16 => "int16",
            Prim::Int32 => "int32",
            Prim::Int64 => "int64",
            Prim::Float32 => "float32",
            Prim::Float64 => "float64",
            Prim::Text => "text",
            Prim::Reserved => "reserved",
            Prim::Empty => "empty",
        }
    }
}

/// Compound type constructors. Each one starts a type table declaration.
///
/// Field shapes following the tag:
/// - `Opt`, `Vec`: one `TypeRef`
/// - `Record`, `Variant`: count, then `(field id: u32, TypeRef)` pairs
/// - `Func`: arg refs, ret refs, annotation bytes (each count-prefixed)
/// - `Service`: count, then `(name: length-prefixed bytes, TypeRef)` pairs
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Con {
    Opt = -18,
    Vec = -19,
    Record = -20,
    Variant = -21,
    Func = -22,
    Service = -23,
}

impl Con {
    pub const fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            -18 => Some(Con::Opt),
            -19 => Some(Con::Vec),
            -20 => Some(Con::Record),
            -21 => Some(Con::Variant),
            -22 => Some(Con::Func),
            -23 => Some(Con::Service),
            _ => None,
        }
    }

    pub const fn tag(self) -> i32 {
        self as i32
    }

    pub const fn name(self) -> &'static str {
        match self {
            Con::Opt => "opt",
            Con::Vec => "vec",
            Con::Record => "record",
            Con::Variant => "variant",
            Con::Func => "func",
            Con::Service => "service",
        }
    }
}

/// A reference to a type: a primitive tag or an index into the type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeRef(pub i32);

/// What a validated `TypeRef` points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Prim(Prim),
    Index(u32),
}

impl TypeRef {
    pub const fn raw(self) -> i32 {
        self.0
    }

    pub const fn is_primitive(self) -> bool {
        self.0 < 0 && self.0 >= PRIM_LOWEST
    }

    /// Table index, if this refers to a declared type.
    pub const fn index(self) -> Option<u32> {
        if self.0 >= 0 { Some(self.0 as u32) } else { None }
    }

    /// Checks the reference against a table of `n_types` entries.
    pub fn check(self, n_types: u32) -> Result<Self> {
        match self.index() {
            Some(index) if index < n_types => Ok(self),
            Some(_) => Err(Error::IndexOutOfRange(self.0)),
            None if self.is_primitive() => Ok(self),
            None => Err(Error::IndexOutOfRange(self.0)),
        }
    }

    /// Classifies the reference. `None` for constructor or unknown tags,
    /// which never survive `check`.
    pub fn resolve(self) -> Option<Resolved> {
        match self.index() {
            Some(index) => Some(Resolved::Index(index)),
            None => Prim::from_tag(self.0).map(Resolved::Prim),
        }
    }
}

impl From<Prim> for TypeRef {
    fn from(prim: Prim) -> Self {
        TypeRef(prim.tag())
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resolve() {
            Some(Resolved::Prim(p)) => write!(f, "{}", p.name()),
            Some(Resolved::Index(i)) => write!(f, "#{}", i),
            None => write!(f, "<invalid {}>", self.0),
        }
    }
}
