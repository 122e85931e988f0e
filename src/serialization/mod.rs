//! Bitcoin wire and storage integer codecs
//!
//! This module provides consensus-critical serialization functions that must match
//! Bitcoin Core's byte layouts exactly to ensure consensus compatibility.
//!
//! All codecs work on a byte slice plus an offset: decoders return
//! `(value, bytes_consumed)`, encoders return the new offset and never write
//! partially.

pub mod cursor;
pub mod fixed64;
pub mod varint;
pub mod varint2;

pub use byteorder::{BigEndian, ByteOrder, LittleEndian};
pub use cursor::{write_u32_le, ByteReader, ByteWriter};
pub use varint::{decode_varint, encode_varint, read_varint, varint_size, write_varint};
pub use varint2::{decode_varint2, encode_varint2, read_varint2, varint2_size, write_varint2};
