//! # Header
//!
//! Entry point for every incoming message. Parsing is strictly linear:
//!
//! `Magic -> TypeCount -> [TypeSlot]* -> MainTypeCount -> [MainTypeRef]* -> Done`
//!
//! Any step may trap, and a trap ends the decode of the whole message.

use tracing::debug;
use tracing::debug_span;

use crate::buffer::Buffer;
use crate::leb128;
use crate::table::TypeTable;
use crate::table::read_type_ref;
use crate::types::Con;
use crate::types::Error;
use crate::types::MAGIC_WORD;
use crate::types::Result;
use crate::types::TypeRef;

/// A validated message header, handed to the value decoder.
///
/// Every `TypeRef` in `main_types()` and every reference inside the table's
/// declarations is known to be a primitive or an index below `n_types()`.
/// The fields are read-only so that stays true after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header<'a> {
    bytes: &'a [u8],
    table: TypeTable,
    main_types: Vec<TypeRef>,
    main_types_offset: usize,
    values_offset: usize,
}

/// Parses the header at the start of `bytes`.
pub fn parse_header(bytes: &[u8]) -> Result<Header<'_>> {
    Header::parse(&mut Buffer::new(bytes))
}

impl<'a> Header<'a> {
    /// Parses a header starting at the current position of `buf`, leaving
    /// `buf` at `values_offset()` on success.
    pub fn parse(buf: &mut Buffer<'a>) -> Result<Self> {
        let span = debug_span!("parse_header", len = buf.remaining());
        let _enter = span.enter();

        match Self::parse_inner(buf) {
            Ok(header) => {
                debug!(
                    n_types = header.table.len(),
                    main_count = header.main_types.len(),
                    values_offset = header.values_offset,
                    "header parsed"
                );
                Ok(header)
            }
            Err(e) => {
                debug!(reason = e.reason(), pos = buf.pos(), "header trapped: {}", e);
                Err(e)
            }
        }
    }

    fn parse_inner(buf: &mut Buffer<'a>) -> Result<Self> {
        let magic = buf.read_word()?;
        if magic != MAGIC_WORD {
            return Err(Error::BadMagic(magic));
        }

        let n_types = leb128::read_u32(buf)?;
        if i32::try_from(n_types).is_err() {
            return Err(Error::TooManyTypes(n_types));
        }
        let table = TypeTable::build(buf, n_types)?;

        let main_types_offset = buf.pos();
        let main_count = leb128::read_u32(buf)?;
        // each main type takes at least one byte
        let mut main_types = Vec::with_capacity((main_count as usize).min(buf.remaining()));
        for _ in 0..main_count {
            main_types.push(read_type_ref(buf, n_types)?);
        }

        Ok(Self {
            bytes: buf.full_slice(),
            table,
            main_types,
            main_types_offset,
            values_offset: buf.pos(),
        })
    }

    /// Number of declared types.
    pub fn n_types(&self) -> u32 {
        self.table.len() as u32
    }

    pub fn table(&self) -> &TypeTable {
        &self.table
    }

    /// The argument types of the message, in order.
    pub fn main_types(&self) -> &[TypeRef] {
        &self.main_types
    }

    /// Where the main-type count starts.
    pub fn main_types_offset(&self) -> usize {
        self.main_types_offset
    }

    /// First byte after the header; message values start here.
    pub fn values_offset(&self) -> usize {
        self.values_offset
    }

    /// A buffer over the message positioned at the declaration of table
    /// index `index`.
    ///
    /// # Errors
    /// `IndexOutOfRange` if `index` is not in the table.
    pub fn type_buffer(&self, index: u32) -> Result<Buffer<'a>> {
        let offset = self
            .table
            .offset(index)
            .ok_or(Error::IndexOutOfRange(i32::try_from(index).unwrap_or(i32::MAX)))?;
        Buffer::new(self.bytes).at(offset)
    }

    /// The constructor of the declaration at table index `index`.
    pub fn constructor(&self, index: u32) -> Result<Con> {
        let tag = leb128::read_i32(&mut self.type_buffer(index)?)?;
        Con::from_tag(tag).ok_or(Error::UnknownType(tag))
    }

    /// A buffer positioned at the first value byte.
    pub fn values(&self) -> Result<Buffer<'a>> {
        Buffer::new(self.bytes).at(self.values_offset)
    }
}
