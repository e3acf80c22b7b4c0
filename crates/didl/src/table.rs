//! # Type Table
//!
//! One forward pass over the type declarations of a header. Each slot records
//! where its declaration starts; the declaration itself stays in the message
//! bytes and is only read again when a value of that type is decoded.
//!
//! ## Invariants
//! - **Bounded references**: every `TypeRef` read during the pass is either a
//!   primitive tag or an index below `n_types`. Later stages rely on this
//!   without re-checking.
//! - **Shallow**: referenced types are not followed. A chain of individually
//!   valid declarations is accepted no matter how deep it nests.
//! - **Bounded memory**: the table holds exactly `n_types` offsets.

use tracing::trace;

use crate::buffer::Buffer;
use crate::leb128;
use crate::types::Con;
use crate::types::Error;
use crate::types::Result;
use crate::types::TypeRef;

/// Byte offsets of the type declarations in a message, by table index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeTable {
    offsets: Vec<usize>,
}

impl TypeTable {
    /// Reads `n_types` declarations from `buf`.
    ///
    /// Every declaration takes at least one byte and the main-type count
    /// follows the table, so `n_types` must be smaller than the bytes left in
    /// `buf`. This is checked before anything is allocated.
    ///
    /// # Errors
    /// - `TooManyTypes` if the count cannot fit.
    /// - `UnknownType` if a declaration does not start with a constructor tag.
    /// - `IndexOutOfRange` for any embedded reference outside the table.
    /// - Any reader or varint error from the declarations themselves.
    pub fn build(buf: &mut Buffer<'_>, n_types: u32) -> Result<Self> {
        if n_types as usize >= buf.remaining() {
            return Err(Error::TooManyTypes(n_types));
        }

        let mut offsets = Vec::with_capacity(n_types as usize);
        for index in 0..n_types {
            let offset = buf.pos();
            let tag = leb128::read_i32(buf)?;
            let con = Con::from_tag(tag).ok_or(Error::UnknownType(tag))?;
            trace!(index, offset, con = con.name(), "type slot");
            read_fields(buf, con, n_types)?;
            offsets.push(offset);
        }
        Ok(Self { offsets })
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Offset of the declaration for table index `index`.
    pub fn offset(&self, index: u32) -> Option<usize> {
        self.offsets.get(index as usize).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.offsets.iter().copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.offsets
    }
}

/// Reads one `TypeRef` and checks it against the table bound.
pub(crate) fn read_type_ref(buf: &mut Buffer<'_>, n_types: u32) -> Result<TypeRef> {
    TypeRef(leb128::read_i32(buf)?).check(n_types)
}

fn read_type_refs(buf: &mut Buffer<'_>, n_types: u32) -> Result<()> {
    for _ in 0..leb128::read_u32(buf)? {
        read_type_ref(buf, n_types)?;
    }
    Ok(())
}

fn read_fields(buf: &mut Buffer<'_>, con: Con, n_types: u32) -> Result<()> {
    match con {
        Con::Opt | Con::Vec => {
            read_type_ref(buf, n_types)?;
        }
        Con::Record | Con::Variant => {
            for _ in 0..leb128::read_u32(buf)? {
                leb128::read_u32(buf)?; // field id
                read_type_ref(buf, n_types)?;
            }
        }
        Con::Func => {
            read_type_refs(buf, n_types)?; // args
            read_type_refs(buf, n_types)?; // rets
            let annotations = leb128::read_u32(buf)?;
            buf.advance(annotations as usize)?;
        }
        Con::Service => {
            for _ in 0..leb128::read_u32(buf)? {
                let name_len = leb128::read_u32(buf)?;
                buf.advance(name_len as usize)?;
                read_type_ref(buf, n_types)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Prim;

    fn build(bytes: &[u8], n_types: u32) -> Result<(TypeTable, usize)> {
        let mut buf = Buffer::new(bytes);
        let table = TypeTable::build(&mut buf, n_types)?;
        Ok((table, buf.pos()))
    }

    const NAT: u8 = 0x7D; // -3
    const TEXT: u8 = 0x71; // -15
    const OPT: u8 = 0x6E; // -18
    const VEC: u8 = 0x6D; // -19
    const RECORD: u8 = 0x6C; // -20
    const VARIANT: u8 = 0x6B; // -21
    const FUNC: u8 = 0x6A; // -22
    const SERVICE: u8 = 0x69; // -23

    #[test]
    fn tag_bytes_match_constructors() -> Result<()> {
        let tags = [
            (NAT, Prim::Nat.tag()),
            (TEXT, Prim::Text.tag()),
            (OPT, Con::Opt.tag()),
            (VEC, Con::Vec.tag()),
            (RECORD, Con::Record.tag()),
            (VARIANT, Con::Variant.tag()),
            (FUNC, Con::Func.tag()),
            (SERVICE, Con::Service.tag()),
        ];
        for (byte, tag) in tags {
            assert_eq!(leb128::read_i32(&mut Buffer::new(&[byte]))?, tag);
        }
        Ok(())
    }

    #[test]
    fn empty_table() -> Result<()> {
        let (table, pos) = build(&[0x00], 0)?;
        assert!(table.is_empty());
        assert_eq!(pos, 0);
        Ok(())
    }

    #[test]
    fn opt_and_vec() -> Result<()> {
        // 0: opt nat, 1: vec #0
        let (table, pos) = build(&[OPT, NAT, VEC, 0x00, 0x00], 2)?;
        assert_eq!(table.as_slice(), &[0, 2]);
        assert_eq!(pos, 4);
        Ok(())
    }

    #[test]
    fn self_reference_is_in_range() -> Result<()> {
        let (table, _) = build(&[VEC, 0x00, 0x00], 1)?;
        assert_eq!(table.offset(0), Some(0));
        assert_eq!(table.offset(1), None);
        Ok(())
    }

    #[test]
    fn record_and_variant_fields() -> Result<()> {
        let bytes = [
            RECORD, 0x02, 0x00, NAT, 0x01, TEXT,
            VARIANT, 0x02, 0x05, 0x00, 0x05, 0x00, // duplicate ids are not our concern
            0x00,
        ];
        let (table, pos) = build(&bytes, 2)?;
        assert_eq!(table.as_slice(), &[0, 6]);
        assert_eq!(pos, 12);
        Ok(())
    }

    #[test]
    fn func_annotations_skipped_unread() -> Result<()> {
        // func (nat, #0) -> (text) with two arbitrary annotation bytes
        let bytes = [FUNC, 0x02, NAT, 0x00, 0x01, TEXT, 0x02, 0xFF, 0xFE, 0x00];
        let (_, pos) = build(&bytes, 1)?;
        assert_eq!(pos, 9);
        Ok(())
    }

    #[test]
    fn service_names_skipped_unread() -> Result<()> {
        // one method whose name is not UTF-8
        let bytes = [SERVICE, 0x01, 0x03, 0xC3, 0x28, 0xFF, 0x01, FUNC, 0x00, 0x00, 0x00, 0x00];
        let (table, pos) = build(&bytes, 2)?;
        assert_eq!(table.as_slice(), &[0, 7]);
        assert_eq!(pos, 11);
        Ok(())
    }

    #[test]
    fn reference_one_past_the_end() {
        assert_eq!(build(&[VEC, 0x01, 0x00], 1), Err(Error::IndexOutOfRange(1)));
        assert_eq!(build(&[OPT, 0x01, 0x00], 1), Err(Error::IndexOutOfRange(1)));
        assert_eq!(
            build(&[RECORD, 0x01, 0x00, 0x02, 0x00, 0x00], 2),
            Err(Error::IndexOutOfRange(2))
        );
        assert_eq!(
            build(&[FUNC, 0x00, 0x01, 0x01, 0x00, 0x00], 1),
            Err(Error::IndexOutOfRange(1))
        );
        assert_eq!(
            build(&[SERVICE, 0x01, 0x00, 0x01, 0x00], 1),
            Err(Error::IndexOutOfRange(1))
        );
    }

    #[test]
    fn constructor_tag_is_not_a_reference() {
        assert_eq!(build(&[VEC, VEC, 0x00], 1), Err(Error::IndexOutOfRange(-19)));
    }

    #[test]
    fn declarations_must_be_constructors() {
        assert_eq!(build(&[NAT, 0x00], 1), Err(Error::UnknownType(-3)));
        assert_eq!(build(&[0x00, 0x00], 1), Err(Error::UnknownType(0)));
        // -24, one below the lowest known constructor
        assert_eq!(build(&[0x68, 0x00, 0x00], 1), Err(Error::UnknownType(-24)));
    }

    #[test]
    fn count_checked_before_allocation() {
        assert_eq!(build(&[VEC, NAT, 0x00], 3), Err(Error::TooManyTypes(3)));
        assert_eq!(build(&[], 0), Err(Error::TooManyTypes(0)));
        assert_eq!(build(&[0x00], u32::MAX), Err(Error::TooManyTypes(u32::MAX)));
    }

    #[test]
    fn oversized_skip_traps() {
        let bytes = [FUNC, 0x00, 0x00, 0x7F, 0x00];
        assert!(matches!(build(&bytes, 1), Err(Error::OutOfBounds { .. })));
        let bytes = [SERVICE, 0x01, 0x7F, 0x00];
        assert!(matches!(build(&bytes, 1), Err(Error::OutOfBounds { .. })));
    }

    #[test]
    fn huge_field_count_traps_on_input_end() {
        // record claiming u32::MAX fields
        let bytes = [RECORD, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F, 0x00, NAT];
        assert!(matches!(build(&bytes, 1), Err(Error::OutOfBounds { .. })));
    }
}
