//! # didl
//!
//! Decoding of the self-describing type header that precedes every
//! inter-actor message.
//!
//! The input is untrusted. This crate reads the header once, traps on any
//! malformed, truncated, or out-of-range data, and produces a `Header` whose
//! type references are all known to be in bounds. The value decoder then
//! reads message values starting at `Header::values_offset()` and looks types
//! up through the table without re-validating indices.
//!
//! ## Format
//!
//! ```text
//! magic      : "DIDL"
//! type_count : LEB128
//! type_table : type_count x (constructor tag: SLEB128, fields)
//! main_count : LEB128
//! main_types : main_count x TypeRef (SLEB128)
//! ```

pub mod types;
pub mod buffer;
pub mod leb128;
pub mod table;
pub mod header;
pub mod encoder;

pub use types::Result;
pub use types::Error;
pub use types::Prim;
pub use types::Con;
pub use types::TypeRef;
pub use types::Resolved;
pub use types::MAGIC;

pub use buffer::Buffer;

pub use table::TypeTable;

pub use header::Header;
pub use header::parse_header;

pub use encoder::HeaderEncoder;
