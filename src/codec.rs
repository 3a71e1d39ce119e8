//! Binary storage for dense float models.
//!
//! Projection matrices and other dense vector stores are persisted in a small
//! fixed-layout format:
//!
//! ```text
//! +--------+-----------+-------------------------------+
//! | "XiML" | W: u32 LE | record 0 | record 1 | ...      |
//! +--------+-----------+-------------------------------+
//! keyed record:   id: u32 LE, W x f32 LE   (4 + 4W bytes)
//! indexed record: W x f32 LE               (4W bytes, id = position)
//! ```
//!
//! All values are little-endian. Files written on big-endian hosts by older
//! tooling that used native byte order are not readable.

pub mod binary;
pub mod json_lines;

pub use binary::{
    BinaryModelReader, BinaryModelWriter, Record, RecordLayout, SIGNATURE, decode,
    decode_partial, encode, read_model, read_partial_model, write_model,
};
pub use json_lines::{convert_json_lines, partial_convert_json_lines, revert_to_json_lines};
