//! Writers for the primitives that make up coordinator records.
//!
//! Two layouts coexist on `__consumer_offsets`:
//!
//! * the legacy (non-flexible) one, used by every key and by the classic
//!   `GroupMetadataValue` / `OffsetCommitValue`: `i16`-length strings, `i32`-length
//!   byte arrays and `i32`-count arrays;
//! * the flexible one, used by every consumer group (next generation protocol)
//!   value: compact strings, arrays and bytes (unsigned varint `N + 1`, with `0` for
//!   `null`) and a tagged fields section closing each struct.
//!
//! All fixed size integers are big-endian.

use bytes::BufMut;
use uuid::Uuid;

use crate::errors::CoordinatorRecordError;
use crate::errors::CoordinatorRecordError::InvalidLength;

/// Length of a legacy string: it must fit the `i16` prefix.
fn str_len(len: usize) -> Result<i16, CoordinatorRecordError> {
    i16::try_from(len).map_err(|_| InvalidLength(len as i64))
}

/// Length of legacy bytes or arrays: it must fit the `i32` prefix.
fn array_len(len: usize) -> Result<i32, CoordinatorRecordError> {
    i32::try_from(len).map_err(|_| InvalidLength(len as i64))
}

pub(crate) fn put_str<B: BufMut>(buf: &mut B, value: &str) -> Result<(), CoordinatorRecordError> {
    buf.put_i16(str_len(value.len())?);
    buf.put_slice(value.as_bytes());
    Ok(())
}

pub(crate) fn put_nullable_str<B: BufMut>(buf: &mut B, value: Option<&str>) -> Result<(), CoordinatorRecordError> {
    match value {
        None => {
            buf.put_i16(-1);
            Ok(())
        },
        Some(s) => put_str(buf, s),
    }
}

pub(crate) fn put_bytes<B: BufMut>(buf: &mut B, value: &[u8]) -> Result<(), CoordinatorRecordError> {
    buf.put_i32(array_len(value.len())?);
    buf.put_slice(value);
    Ok(())
}

pub(crate) fn put_array_len<B: BufMut>(buf: &mut B, len: usize) -> Result<(), CoordinatorRecordError> {
    buf.put_i32(array_len(len)?);
    Ok(())
}

pub(crate) fn put_unsigned_varint<B: BufMut>(buf: &mut B, mut value: u32) {
    while value >= 0x80 {
        buf.put_u8(((value & 0x7f) as u8) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Unsigned varint `len + 1`: it must fit an `u32`.
fn put_compact_len<B: BufMut>(buf: &mut B, len: usize) -> Result<(), CoordinatorRecordError> {
    let compact_len = len
        .checked_add(1)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or(InvalidLength(len as i64))?;
    put_unsigned_varint(buf, compact_len);
    Ok(())
}

pub(crate) fn put_compact_str<B: BufMut>(buf: &mut B, value: &str) -> Result<(), CoordinatorRecordError> {
    put_compact_len(buf, value.len())?;
    buf.put_slice(value.as_bytes());
    Ok(())
}

pub(crate) fn put_compact_nullable_str<B: BufMut>(
    buf: &mut B,
    value: Option<&str>,
) -> Result<(), CoordinatorRecordError> {
    match value {
        None => {
            put_unsigned_varint(buf, 0);
            Ok(())
        },
        Some(s) => put_compact_str(buf, s),
    }
}

pub(crate) fn put_compact_bytes<B: BufMut>(buf: &mut B, value: &[u8]) -> Result<(), CoordinatorRecordError> {
    put_compact_len(buf, value.len())?;
    buf.put_slice(value);
    Ok(())
}

pub(crate) fn put_compact_array_len<B: BufMut>(buf: &mut B, len: usize) -> Result<(), CoordinatorRecordError> {
    put_compact_len(buf, len)
}

pub(crate) fn put_compact_array<B, T, F>(
    buf: &mut B,
    elements: &[T],
    mut put_element: F,
) -> Result<(), CoordinatorRecordError>
where
    B: BufMut,
    F: FnMut(&mut B, &T) -> Result<(), CoordinatorRecordError>,
{
    put_compact_array_len(buf, elements.len())?;
    for element in elements {
        put_element(buf, element)?;
    }
    Ok(())
}

pub(crate) fn put_uuid<B: BufMut>(buf: &mut B, value: &Uuid) {
    buf.put_slice(value.as_bytes());
}

/// Closes a flexible struct that carries no tagged field.
pub(crate) fn put_empty_tagged_fields<B: BufMut>(buf: &mut B) {
    put_unsigned_varint(buf, 0);
}

/// Writes a tagged fields section: `(tag, payload)` pairs must be in ascending tag order.
pub(crate) fn put_tagged_fields<B: BufMut>(buf: &mut B, fields: &[(u32, &[u8])]) -> Result<(), CoordinatorRecordError> {
    let num_fields = u32::try_from(fields.len()).map_err(|_| InvalidLength(fields.len() as i64))?;
    put_unsigned_varint(buf, num_fields);
    for (tag, payload) in fields {
        let size = u32::try_from(payload.len()).map_err(|_| InvalidLength(payload.len() as i64))?;
        put_unsigned_varint(buf, *tag);
        put_unsigned_varint(buf, size);
        buf.put_slice(payload);
    }
    Ok(())
}
