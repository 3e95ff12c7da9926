//! Per-value tagged encoding.
//!
//! Every value starts with a one-byte ASCII tag naming its kind:
//!
//! | Tag | Kind | Payload |
//! |-----|------|---------|
//! | `S` | string | `u32` length + UTF-8 |
//! | `b` | boolean | one byte |
//! | `l` | long | `i64` |
//! | `d` | double | `f64` bits |
//! | `D` | decimal | `u32` length + literal |
//! | `T` | date | `i64` seconds + `u32` nanos + `i32` offset seconds |
//! | `N` | name | `u32` length + UTF-8 |
//! | `P` | path | `u32` length + UTF-8 |
//! | `U` | uuid | 16 bytes |
//! | `R` / `W` | reference / weak reference | 16-byte target uuid |
//! | `I` | uri | `u32` length + UTF-8 |
//! | `B` | binary | `u64` length + bytes |
//! | `O` | object | `u32` length + JSON |
//! | `L` | large value | kind code + `u8` hash length + hash + `u64` length |
//!
//! The narrow tags `i` (`i32`), `s` (`i16`), `f` (`f32`) and `c` (`u32`
//! scalar value) are still decoded, promoted to long, double and string. They
//! are never written.

use std::io::{Read, Write};

use chrono::{DateTime, FixedOffset};
use graft_types::{ContentHash, Decimal, Name, Path, PropertyType, Value};
use uuid::Uuid;

use crate::error::{CodecError, CodecResult};
use crate::wire::*;

pub(crate) const TAG_STRING: u8 = b'S';
pub(crate) const TAG_BOOLEAN: u8 = b'b';
pub(crate) const TAG_LONG: u8 = b'l';
pub(crate) const TAG_DOUBLE: u8 = b'd';
pub(crate) const TAG_DECIMAL: u8 = b'D';
pub(crate) const TAG_DATE: u8 = b'T';
pub(crate) const TAG_NAME: u8 = b'N';
pub(crate) const TAG_PATH: u8 = b'P';
pub(crate) const TAG_UUID: u8 = b'U';
pub(crate) const TAG_REFERENCE: u8 = b'R';
pub(crate) const TAG_WEAK_REFERENCE: u8 = b'W';
pub(crate) const TAG_URI: u8 = b'I';
pub(crate) const TAG_BINARY: u8 = b'B';
pub(crate) const TAG_OBJECT: u8 = b'O';
pub(crate) const TAG_LARGE: u8 = b'L';

const TAG_INT: u8 = b'i';
const TAG_SHORT: u8 = b's';
const TAG_FLOAT: u8 = b'f';
const TAG_CHAR: u8 = b'c';

/// A value as it appears on the wire: either inline or a large value placeholder.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum WireValue {
    Inline(Value),
    Large {
        kind: PropertyType,
        hash: ContentHash,
        length: u64,
    },
}

/// Write a value inline. Large values are handled by the caller.
pub(crate) fn write_inline<W: Write + ?Sized>(out: &mut W, value: &Value) -> CodecResult<()> {
    match value {
        Value::String(s) => {
            write_u8(out, TAG_STRING)?;
            write_str(out, s)
        }
        Value::Boolean(b) => {
            write_u8(out, TAG_BOOLEAN)?;
            write_u8(out, u8::from(*b))
        }
        Value::Long(n) => {
            write_u8(out, TAG_LONG)?;
            write_i64(out, *n)
        }
        Value::Double(d) => {
            write_u8(out, TAG_DOUBLE)?;
            write_f64(out, *d)
        }
        Value::Decimal(d) => {
            write_u8(out, TAG_DECIMAL)?;
            write_str(out, d.as_str())
        }
        Value::Date(date) => {
            write_u8(out, TAG_DATE)?;
            write_i64(out, date.timestamp())?;
            write_u32(out, date.timestamp_subsec_nanos())?;
            write_i32(out, date.offset().local_minus_utc())
        }
        Value::Name(name) => {
            write_u8(out, TAG_NAME)?;
            write_str(out, name.as_str())
        }
        Value::Path(path) => {
            write_u8(out, TAG_PATH)?;
            write_str(out, &path.to_string())
        }
        Value::Uuid(id) => {
            write_u8(out, TAG_UUID)?;
            out.write_all(id.as_bytes())?;
            Ok(())
        }
        Value::Reference(target) => write_reference(out, TAG_REFERENCE, target),
        Value::WeakReference(target) => write_reference(out, TAG_WEAK_REFERENCE, target),
        Value::Uri(uri) => {
            write_u8(out, TAG_URI)?;
            write_str(out, uri)
        }
        Value::Binary(data) => {
            write_u8(out, TAG_BINARY)?;
            write_blob(out, data)
        }
        Value::Object(json) => {
            let encoded =
                serde_json::to_vec(json).map_err(|e| CodecError::InvalidValue(e.to_string()))?;
            write_u8(out, TAG_OBJECT)?;
            write_bytes(out, &encoded)
        }
    }
}

pub(crate) fn write_reference<W: Write + ?Sized>(
    out: &mut W,
    tag: u8,
    target: &Uuid,
) -> CodecResult<()> {
    write_u8(out, tag)?;
    out.write_all(target.as_bytes())?;
    Ok(())
}

pub(crate) fn write_large<W: Write + ?Sized>(
    out: &mut W,
    kind: PropertyType,
    hash: &ContentHash,
    length: u64,
) -> CodecResult<()> {
    write_u8(out, TAG_LARGE)?;
    write_u8(out, kind.code())?;
    // Digest length precedes the digest.
    write_u8(out, ContentHash::LEN as u8)?;
    out.write_all(hash.as_bytes())?;
    write_u64(out, length)
}

/// Read one tagged value.
pub(crate) fn read_wire_value<R: Read + ?Sized>(input: &mut R) -> CodecResult<WireValue> {
    let tag = read_u8(input)?;
    let value = match tag {
        TAG_STRING => Value::String(read_string(input)?),
        TAG_BOOLEAN => match read_u8(input)? {
            0 => Value::Boolean(false),
            1 => Value::Boolean(true),
            other => {
                return Err(CodecError::InvalidValue(format!(
                    "boolean byte {other:#04x}"
                )))
            }
        },
        TAG_LONG => Value::Long(read_i64(input)?),
        TAG_INT => Value::Long(i64::from(read_i32(input)?)),
        TAG_SHORT => Value::Long(i64::from(read_i16(input)?)),
        TAG_DOUBLE => Value::Double(read_f64(input)?),
        TAG_FLOAT => Value::Double(f64::from(read_f32(input)?)),
        TAG_CHAR => {
            let code = read_u32(input)?;
            let c = char::from_u32(code).ok_or_else(|| {
                CodecError::InvalidValue(format!("character code {code:#x}"))
            })?;
            Value::String(c.to_string())
        }
        TAG_DECIMAL => Value::Decimal(Decimal::new(read_string(input)?)?),
        TAG_DATE => Value::Date(read_date(input)?),
        TAG_NAME => Value::Name(Name::new(read_string(input)?)?),
        TAG_PATH => Value::Path(Path::parse(&read_string(input)?)?),
        TAG_UUID => Value::Uuid(read_uuid(input)?),
        TAG_REFERENCE => Value::Reference(read_uuid(input)?),
        TAG_WEAK_REFERENCE => Value::WeakReference(read_uuid(input)?),
        TAG_URI => Value::Uri(read_string(input)?),
        TAG_BINARY => Value::Binary(read_blob(input)?),
        TAG_OBJECT => {
            let bytes = read_bytes(input)?;
            Value::Object(
                serde_json::from_slice(&bytes)
                    .map_err(|e| CodecError::InvalidValue(e.to_string()))?,
            )
        }
        TAG_LARGE => return read_large(input),
        other => return Err(CodecError::UnknownTag(other)),
    };
    Ok(WireValue::Inline(value))
}

fn read_large<R: Read + ?Sized>(input: &mut R) -> CodecResult<WireValue> {
    let kind = PropertyType::from_code(read_u8(input)?)?;
    if !kind.is_large_value_eligible() {
        return Err(CodecError::InvalidValue(format!(
            "{kind} values are never stored as large values"
        )));
    }
    let hash_len = read_u8(input)?;
    let hash_bytes = read_exact_vec(input, u64::from(hash_len))?;
    let hash = ContentHash::from_slice(&hash_bytes)?;
    let length = read_u64(input)?;
    Ok(WireValue::Large { kind, hash, length })
}

fn read_uuid<R: Read + ?Sized>(input: &mut R) -> CodecResult<Uuid> {
    let mut bytes = [0u8; 16];
    input.read_exact(&mut bytes)?;
    Ok(Uuid::from_bytes(bytes))
}

fn read_date<R: Read + ?Sized>(input: &mut R) -> CodecResult<DateTime<FixedOffset>> {
    let secs = read_i64(input)?;
    let nanos = read_u32(input)?;
    let offset_secs = read_i32(input)?;
    let offset = FixedOffset::east_opt(offset_secs)
        .ok_or_else(|| CodecError::InvalidValue(format!("utc offset {offset_secs}s")))?;
    let utc = DateTime::from_timestamp(secs, nanos)
        .ok_or_else(|| CodecError::InvalidValue(format!("timestamp {secs}.{nanos:09}")))?;
    Ok(utc.with_timezone(&offset))
}
