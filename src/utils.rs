use bytes_parser::BytesParser;
use uuid::Uuid;

use crate::errors::CoordinatorRecordError;
use crate::errors::CoordinatorRecordError::{ByteParsingError, InvalidLength};

/// Upper bound for pre-allocating collections from a length read off the wire.
///
/// A corrupted length must not turn into a huge allocation: past this, the
/// collection grows as elements are actually parsed.
const MAX_PREALLOCATED_ELEMENTS: usize = 1024;

/// Capacity to reserve for a collection of `len` elements parsed from the wire.
pub(crate) fn capacity_for(len: usize) -> usize {
    len.min(MAX_PREALLOCATED_ELEMENTS)
}

/// Adapter for [`BytesParser::parse_i8`].
pub(crate) fn parse_i8(parser: &mut BytesParser) -> Result<i8, CoordinatorRecordError> {
    parser.parse_i8().map_err(ByteParsingError)
}

/// Adapter for [`BytesParser::parse_u8`].
pub(crate) fn parse_u8(parser: &mut BytesParser) -> Result<u8, CoordinatorRecordError> {
    parser.parse_u8().map_err(ByteParsingError)
}

/// Adapter for [`BytesParser::parse_i16`].
///
/// # Arguments
///
/// * `parser` - A [`BytesParser`] with its internal cursor pointing
///     at the beginning of the [`i16`] we want to parse.
pub(crate) fn parse_i16(parser: &mut BytesParser) -> Result<i16, CoordinatorRecordError> {
    parser.parse_i16().map_err(ByteParsingError)
}

/// Adapter for [`BytesParser::parse_i32`].
///
/// # Arguments
///
/// * `parser` - A [`BytesParser`] with its internal cursor pointing
///     at the beginning of the [`i32`] we want to parse.
pub(crate) fn parse_i32(parser: &mut BytesParser) -> Result<i32, CoordinatorRecordError> {
    parser.parse_i32().map_err(ByteParsingError)
}

/// Adapter for [`BytesParser::parse_i64`].
///
/// # Arguments
///
/// * `parser` - A [`BytesParser`] with its internal cursor pointing
///     at the beginning of the [`i64`] we want to parse.
pub(crate) fn parse_i64(parser: &mut BytesParser) -> Result<i64, CoordinatorRecordError> {
    parser.parse_i64().map_err(ByteParsingError)
}

fn parse_utf8(parser: &mut BytesParser, len: usize) -> Result<String, CoordinatorRecordError> {
    parser.parse_str_utf8(len).map(|s| s.into()).map_err(ByteParsingError)
}

/// A [`String`] parser for the legacy (non-flexible) layout: `i16` length, then UTF-8 bytes.
///
/// Returns a [`String::default`] if the parsed `i16` contains a negative value.
pub(crate) fn parse_str(parser: &mut BytesParser) -> Result<String, CoordinatorRecordError> {
    Ok(parse_nullable_str(parser)?.unwrap_or_default())
}

/// Same as [`parse_str`], but a negative length is read as `None`.
pub(crate) fn parse_nullable_str(parser: &mut BytesParser) -> Result<Option<String>, CoordinatorRecordError> {
    let strlen = parse_i16(parser)?;
    if strlen < 0 {
        return Ok(None);
    }

    parse_utf8(parser, strlen as usize).map(Some)
}

/// A [`Vec<u8>`] parser for the legacy layout: `i32` length, then the bytes.
///
/// Returns an empty vector if the length is negative (`null` bytes).
pub(crate) fn parse_vec_bytes(parser: &mut BytesParser) -> Result<Vec<u8>, CoordinatorRecordError> {
    let bytes_array_len = parse_i32(parser)?;
    if bytes_array_len < 0 {
        return Ok(Vec::new());
    }

    let slice = parser.parse_slice(bytes_array_len as usize).map_err(ByteParsingError)?;

    Ok(slice.to_vec())
}

/// Length of a legacy array: `i32` count, where a negative count is an empty array.
pub(crate) fn parse_array_len(parser: &mut BytesParser) -> Result<usize, CoordinatorRecordError> {
    let len = parse_i32(parser)?;
    Ok(if len < 0 { 0 } else { len as usize })
}

/// Unsigned variable-length integer, 7 bits per byte, least significant group first.
pub(crate) fn parse_unsigned_varint(parser: &mut BytesParser) -> Result<u32, CoordinatorRecordError> {
    let mut value = 0_u32;
    for i in 0..5 {
        let byte = parse_u8(parser)?;
        if i == 4 && (byte & 0xf0) != 0 {
            return Err(InvalidLength(i64::from(byte)));
        }
        value |= u32::from(byte & 0x7f) << (7 * i);
        if (byte & 0x80) == 0 {
            return Ok(value);
        }
    }

    Err(InvalidLength(i64::from(value)))
}

/// Length of a compact (flexible) collection: unsigned varint `N + 1`, where `0` is `null`.
fn parse_compact_len(parser: &mut BytesParser) -> Result<Option<usize>, CoordinatorRecordError> {
    match parse_unsigned_varint(parser)? {
        0 => Ok(None),
        n => Ok(Some((n - 1) as usize)),
    }
}

/// A compact nullable string.
pub(crate) fn parse_compact_nullable_str(parser: &mut BytesParser) -> Result<Option<String>, CoordinatorRecordError> {
    match parse_compact_len(parser)? {
        None => Ok(None),
        Some(len) => parse_utf8(parser, len).map(Some),
    }
}

/// A compact string; `null` is read as [`String::default`].
pub(crate) fn parse_compact_str(parser: &mut BytesParser) -> Result<String, CoordinatorRecordError> {
    Ok(parse_compact_nullable_str(parser)?.unwrap_or_default())
}

/// A compact byte array; `null` is read as an empty vector.
pub(crate) fn parse_compact_bytes(parser: &mut BytesParser) -> Result<Vec<u8>, CoordinatorRecordError> {
    match parse_compact_len(parser)? {
        None => Ok(Vec::new()),
        Some(len) => parser.parse_slice(len).map(|s| s.to_vec()).map_err(ByteParsingError),
    }
}

/// Length of a compact array; `null` is read as an empty array.
pub(crate) fn parse_compact_array_len(parser: &mut BytesParser) -> Result<usize, CoordinatorRecordError> {
    Ok(parse_compact_len(parser)?.unwrap_or_default())
}

/// Parses a compact array, calling `parse_element` once per element.
pub(crate) fn parse_compact_array<T, F>(
    parser: &mut BytesParser,
    mut parse_element: F,
) -> Result<Vec<T>, CoordinatorRecordError>
where
    F: FnMut(&mut BytesParser) -> Result<T, CoordinatorRecordError>,
{
    let len = parse_compact_array_len(parser)?;
    let mut elements = Vec::with_capacity(capacity_for(len));
    for _ in 0..len {
        elements.push(parse_element(parser)?);
    }

    Ok(elements)
}

/// A 128-bit topic identifier: 16 bytes, most significant first.
pub(crate) fn parse_uuid(parser: &mut BytesParser) -> Result<Uuid, CoordinatorRecordError> {
    let slice = parser.parse_slice(16).map_err(ByteParsingError)?;
    Uuid::from_slice(slice).map_err(|_| InvalidLength(slice.len() as i64))
}

/// The tagged fields section closing every flexible struct.
///
/// Returns every `(tag, payload)` pair found: the caller picks the tags it knows about.
pub(crate) fn parse_tagged_fields(parser: &mut BytesParser) -> Result<Vec<(u32, Vec<u8>)>, CoordinatorRecordError> {
    let num_fields = parse_unsigned_varint(parser)? as usize;
    let mut fields = Vec::with_capacity(capacity_for(num_fields));
    for _ in 0..num_fields {
        let tag = parse_unsigned_varint(parser)?;
        let size = parse_unsigned_varint(parser)? as usize;
        let payload = parser.parse_slice(size).map_err(ByteParsingError)?;
        fields.push((tag, payload.to_vec()));
    }

    Ok(fields)
}

/// Skips a tagged fields section, for structs that define no tagged fields.
pub(crate) fn skip_tagged_fields(parser: &mut BytesParser, struct_name: &str) -> Result<(), CoordinatorRecordError> {
    for (tag, _) in parse_tagged_fields(parser)? {
        tracing::debug!(tag, struct_name, "Skipping unknown tagged field");
    }

    Ok(())
}

/// Milliseconds since the UNIX epoch as a [`chrono::DateTime`].
///
/// Returns `None` if the timestamp is out of the representable range.
pub(crate) fn chrono_datetime(millis: i64) -> Option<chrono::DateTime<chrono::Utc>> {
    use chrono::TimeZone;

    chrono::Utc.timestamp_millis_opt(millis).single()
}

/// Milliseconds since the UNIX epoch as a [`time::OffsetDateTime`].
#[cfg(feature = "ts_time")]
pub(crate) fn time_offset_datetime(millis: i64) -> Option<time::OffsetDateTime> {
    time::OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
}

/// Used in unit tests to verify type is Thread Safe and Async/Await Safe.
///
/// It enforces that the given type implements the following standard traits:
///
/// * `std::marker::Sized`: type has a constant size known at compile time
/// * `std::marker::Send`: type is safe to send to another thread
/// * `std::marker::Sync`: type is Sync if it is safe to share between threads;
///   type can be Sync if and only if a reference to it is Send
/// * `std::marker::Unpin`: type can be safely moved after pinning
#[cfg(test)]
pub(crate) fn is_thread_safe<T: Sized + Send + Sync + Unpin>() {}
