//! The closed set of property value kinds.
//!
//! [`Value`] is a sum type with one variant per [`PropertyType`]; each variant
//! carries the canonical in-memory representation of that kind. Narrower
//! representations (32-bit and 16-bit integers, 32-bit floats, single
//! characters) are promoted to their canonical wide kind on conversion, so
//! equal logical values always encode and hash identically.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;
use crate::name::Name;
use crate::path::Path;

/// The kind of a property value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PropertyType {
    String,
    Binary,
    Long,
    Double,
    Decimal,
    Boolean,
    Date,
    Name,
    Path,
    Uuid,
    Reference,
    WeakReference,
    Uri,
    Object,
}

impl PropertyType {
    /// Every kind, in code order.
    pub const ALL: [PropertyType; 14] = [
        Self::String,
        Self::Binary,
        Self::Long,
        Self::Double,
        Self::Decimal,
        Self::Boolean,
        Self::Date,
        Self::Name,
        Self::Path,
        Self::Uuid,
        Self::Reference,
        Self::WeakReference,
        Self::Uri,
        Self::Object,
    ];

    /// Stable numeric code, used when a large value record stores its kind.
    pub fn code(self) -> u8 {
        match self {
            Self::String => 1,
            Self::Binary => 2,
            Self::Long => 3,
            Self::Double => 4,
            Self::Decimal => 5,
            Self::Boolean => 6,
            Self::Date => 7,
            Self::Name => 8,
            Self::Path => 9,
            Self::Uuid => 10,
            Self::Reference => 11,
            Self::WeakReference => 12,
            Self::Uri => 13,
            Self::Object => 14,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, TypeError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.code() == code)
            .ok_or(TypeError::UnknownPropertyType(code))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Binary => "Binary",
            Self::Long => "Long",
            Self::Double => "Double",
            Self::Decimal => "Decimal",
            Self::Boolean => "Boolean",
            Self::Date => "Date",
            Self::Name => "Name",
            Self::Path => "Path",
            Self::Uuid => "UUID",
            Self::Reference => "Reference",
            Self::WeakReference => "WeakReference",
            Self::Uri => "URI",
            Self::Object => "Object",
        }
    }

    /// Whether values of this kind may be externalized as large values.
    pub fn is_large_value_eligible(self) -> bool {
        matches!(self, Self::String | Self::Binary | Self::Uri)
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An arbitrary-precision decimal kept in its literal form.
///
/// Equality is textual: `1.0` and `1.00` are different values, matching
/// scale-sensitive decimal semantics.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Decimal(String);

impl Decimal {
    pub fn new(literal: impl Into<String>) -> Result<Self, TypeError> {
        let literal = literal.into();
        if is_decimal_literal(&literal) {
            Ok(Self(literal))
        } else {
            Err(TypeError::InvalidDecimal(literal))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_decimal_literal(s: &str) -> bool {
    let s = s.strip_prefix(['+', '-']).unwrap_or(s);
    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(pos) => (&s[..pos], Some(&s[pos + 1..])),
        None => (s, None),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    let mantissa_ok = !(int_part.is_empty() && frac_part.is_empty())
        && all_digits(int_part)
        && all_digits(frac_part);
    let exponent_ok = exponent.map_or(true, |exp| {
        let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
        !exp.is_empty() && all_digits(exp)
    });
    mantissa_ok && exponent_ok
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Decimal {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Decimal {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Decimal> for String {
    fn from(decimal: Decimal) -> Self {
        decimal.0
    }
}

/// A reference-typed value seen by reference accounting sinks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reference {
    pub target: Uuid,
    pub weak: bool,
}

impl Reference {
    pub fn strong(target: Uuid) -> Self {
        Self {
            target,
            weak: false,
        }
    }

    pub fn weak(target: Uuid) -> Self {
        Self { target, weak: true }
    }
}

impl From<Reference> for Value {
    fn from(reference: Reference) -> Self {
        if reference.weak {
            Value::WeakReference(reference.target)
        } else {
            Value::Reference(reference.target)
        }
    }
}

/// A single typed property value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    String(String),
    Binary(Vec<u8>),
    Long(i64),
    Double(f64),
    Decimal(Decimal),
    Boolean(bool),
    Date(DateTime<FixedOffset>),
    Name(Name),
    Path(Path),
    Uuid(Uuid),
    Reference(Uuid),
    WeakReference(Uuid),
    Uri(String),
    Object(serde_json::Value),
}

impl Value {
    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::String(_) => PropertyType::String,
            Self::Binary(_) => PropertyType::Binary,
            Self::Long(_) => PropertyType::Long,
            Self::Double(_) => PropertyType::Double,
            Self::Decimal(_) => PropertyType::Decimal,
            Self::Boolean(_) => PropertyType::Boolean,
            Self::Date(_) => PropertyType::Date,
            Self::Name(_) => PropertyType::Name,
            Self::Path(_) => PropertyType::Path,
            Self::Uuid(_) => PropertyType::Uuid,
            Self::Reference(_) => PropertyType::Reference,
            Self::WeakReference(_) => PropertyType::WeakReference,
            Self::Uri(_) => PropertyType::Uri,
            Self::Object(_) => PropertyType::Object,
        }
    }

    /// The reference carried by this value, if it is reference-typed.
    pub fn as_reference(&self) -> Option<Reference> {
        match self {
            Self::Reference(target) => Some(Reference::strong(*target)),
            Self::WeakReference(target) => Some(Reference::weak(*target)),
            _ => None,
        }
    }

    /// The bytes a large value store keeps for this value.
    ///
    /// Returns `None` for kinds that are never externalized.
    pub fn large_value_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::String(s) | Self::Uri(s) => Some(s.as_bytes()),
            Self::Binary(data) => Some(data),
            _ => None,
        }
    }

    /// Rebuild a value from the bytes returned by [`Value::large_value_bytes`].
    pub fn from_large_value_bytes(kind: PropertyType, bytes: Vec<u8>) -> Result<Self, TypeError> {
        let utf8 = |bytes: Vec<u8>| {
            String::from_utf8(bytes).map_err(|e| TypeError::InvalidValueBytes(e.to_string()))
        };
        match kind {
            PropertyType::String => Ok(Self::String(utf8(bytes)?)),
            PropertyType::Uri => Ok(Self::Uri(utf8(bytes)?)),
            PropertyType::Binary => Ok(Self::Binary(bytes)),
            other => Err(TypeError::NotLargeValueEligible {
                kind: other.to_string(),
            }),
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Self::String(value.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Binary(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Self::Binary(value.to_vec())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Long(i64::from(value))
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Self::Long(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Long(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Double(f64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::Date(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value.fixed_offset())
    }
}

impl From<Name> for Value {
    fn from(value: Name) -> Self {
        Self::Name(value)
    }
}

impl From<Path> for Value {
    fn from(value: Path) -> Self {
        Self::Path(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Self::Object(value)
    }
}
