//! Writer for DIDL headers.
//!
//! Emits type declarations and main types in canonical form. Shapes are not
//! checked here; `parse_header` is the authority on what is valid, so the
//! encoder can also produce deliberately broken headers via `raw`.

use crate::leb128;
use crate::types::Con;
use crate::types::Error;
use crate::types::MAGIC;
use crate::types::Result;
use crate::types::TypeRef;

#[derive(Debug, Clone, Default)]
pub struct HeaderEncoder {
    decls: Vec<u8>,
    n_types: u32,
    main_types: Vec<TypeRef>,
}

fn write_len(out: &mut Vec<u8>, len: usize) -> Result<()> {
    let len = u32::try_from(len).map_err(|_| Error::IntegerOverflow)?;
    leb128::write_u32(out, len);
    Ok(())
}

impl HeaderEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_types(&self) -> u32 {
        self.n_types
    }

    fn begin(&mut self, con: Con) -> Result<TypeRef> {
        let index = i32::try_from(self.n_types).map_err(|_| Error::TooManyTypes(self.n_types))?;
        self.n_types += 1;
        leb128::write_i32(&mut self.decls, con.tag());
        Ok(TypeRef(index))
    }

    fn type_ref(&mut self, ty: TypeRef) {
        leb128::write_i32(&mut self.decls, ty.raw());
    }

    pub fn opt(&mut self, inner: TypeRef) -> Result<TypeRef> {
        let ty = self.begin(Con::Opt)?;
        self.type_ref(inner);
        Ok(ty)
    }

    pub fn vec(&mut self, inner: TypeRef) -> Result<TypeRef> {
        let ty = self.begin(Con::Vec)?;
        self.type_ref(inner);
        Ok(ty)
    }

    pub fn record(&mut self, fields: &[(u32, TypeRef)]) -> Result<TypeRef> {
        self.fields(Con::Record, fields)
    }

    pub fn variant(&mut self, cases: &[(u32, TypeRef)]) -> Result<TypeRef> {
        self.fields(Con::Variant, cases)
    }

    fn fields(&mut self, con: Con, fields: &[(u32, TypeRef)]) -> Result<TypeRef> {
        let ty = self.begin(con)?;
        write_len(&mut self.decls, fields.len())?;
        for &(id, field) in fields {
            leb128::write_u32(&mut self.decls, id);
            self.type_ref(field);
        }
        Ok(ty)
    }

    pub fn func(&mut self, args: &[TypeRef], rets: &[TypeRef], annotations: &[u8]) -> Result<TypeRef> {
        let ty = self.begin(Con::Func)?;
        for list in [args, rets] {
            write_len(&mut self.decls, list.len())?;
            for &t in list {
                self.type_ref(t);
            }
        }
        write_len(&mut self.decls, annotations.len())?;
        self.decls.extend_from_slice(annotations);
        Ok(ty)
    }

    pub fn service(&mut self, methods: &[(&[u8], TypeRef)]) -> Result<TypeRef> {
        let ty = self.begin(Con::Service)?;
        write_len(&mut self.decls, methods.len())?;
        for &(name, method) in methods {
            write_len(&mut self.decls, name.len())?;
            self.decls.extend_from_slice(name);
            self.type_ref(method);
        }
        Ok(ty)
    }

    /// Appends `bytes` as one declaration, verbatim.
    pub fn raw(&mut self, bytes: &[u8]) -> Result<TypeRef> {
        let index = i32::try_from(self.n_types).map_err(|_| Error::TooManyTypes(self.n_types))?;
        self.n_types += 1;
        self.decls.extend_from_slice(bytes);
        Ok(TypeRef(index))
    }

    pub fn main_type(&mut self, ty: impl Into<TypeRef>) -> &mut Self {
        self.main_types.push(ty.into());
        self
    }

    /// The complete header: magic, type table, main types.
    pub fn finish(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(16 + self.decls.len() + self.main_types.len());
        out.extend_from_slice(&MAGIC);
        leb128::write_u32(&mut out, self.n_types);
        out.extend_from_slice(&self.decls);
        write_len(&mut out, self.main_types.len())?;
        for ty in &self.main_types {
            leb128::write_i32(&mut out, ty.raw());
        }
        Ok(out)
    }
}
