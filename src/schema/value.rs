// Instance values for schemaforge
//
// Values are used for field defaults, caller overrides and generated fake
// instances. Byte payloads use `Bytes` so fixed and bytes values are cheap to clone.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Fixed-precision decimal stored as an unscaled integer and a scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    unscaled: i128,
    scale: u32,
}

impl Decimal {
    /// Creates a decimal equal to `unscaled * 10^-scale`
    pub fn new(unscaled: i128, scale: u32) -> Self {
        Self { unscaled, scale }
    }

    /// Returns the unscaled integer
    pub fn unscaled(&self) -> i128 {
        self.unscaled
    }

    /// Returns the number of fractional digits
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Total number of significant digits, counting all fractional digits
    pub fn digits(&self) -> u32 {
        let integer_digits = count_digits(self.unscaled.unsigned_abs());
        integer_digits.max(self.scale)
    }

    /// Parses a plain decimal literal such as "-100.05"
    pub fn parse(text: &str) -> Option<Self> {
        let (negative, body) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let (integer, fraction) = match body.split_once('.') {
            Some((integer, fraction)) => (integer, fraction),
            None => (body, ""),
        };
        if integer.is_empty() && fraction.is_empty() {
            return None;
        }
        if !integer.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
            return None;
        }
        let digits = format!("{}{}", integer, fraction);
        let magnitude: i128 = if digits.is_empty() { 0 } else { digits.parse().ok()? };
        let unscaled = if negative { -magnitude } else { magnitude };
        Some(Self::new(unscaled, fraction.len() as u32))
    }
}

fn count_digits(mut n: u128) -> u32 {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.unscaled.unsigned_abs().to_string();
        let sign = if self.unscaled < 0 { "-" } else { "" };
        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{}{}", sign, magnitude);
        }
        let padded = format!("{:0>width$}", magnitude, width = scale + 1);
        let (integer, fraction) = padded.split_at(padded.len() - scale);
        write!(f, "{}{}.{}", sign, integer, fraction)
    }
}

/// A populated record instance: record name plus field values in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    /// Record name
    pub record: String,
    /// Field values in declaration order
    pub fields: Vec<(String, Value)>,
}

impl Instance {
    /// Creates an empty instance of the named record
    pub fn new(record: impl Into<String>) -> Self {
        Self {
            record: record.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field value
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.push((name.into(), value));
        self
    }

    /// Returns the value of a field
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Number of populated fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no field is populated
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A value conforming to some type descriptor
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bytes(Bytes),
    String(String),
    Date(NaiveDate),
    TimeMillis(NaiveTime),
    TimeMicros(NaiveTime),
    TimestampMillis(DateTime<Utc>),
    TimestampMicros(DateTime<Utc>),
    Uuid(Uuid),
    Decimal(Decimal),
    Fixed(Bytes),
    Enum(String),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Record(Instance),
}

impl Value {
    /// Returns true for `Value::Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the value's shape, used in error messages
    pub fn shape_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Int(_) => "int32",
            Value::Long(_) => "int64",
            Value::Float(_) => "float32",
            Value::Double(_) => "float64",
            Value::Bytes(_) => "bytes",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::TimeMillis(_) => "time-millis",
            Value::TimeMicros(_) => "time-micros",
            Value::TimestampMillis(_) => "timestamp-millis",
            Value::TimestampMicros(_) => "timestamp-micros",
            Value::Uuid(_) => "uuid",
            Value::Decimal(_) => "decimal",
            Value::Fixed(_) => "fixed",
            Value::Enum(_) => "enum",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Record(_) => "record",
        }
    }

    /// Returns the record instance, if this is a record value
    pub fn as_record(&self) -> Option<&Instance> {
        match self {
            Value::Record(instance) => Some(instance),
            _ => None,
        }
    }

    /// Encodes the value the way Avro JSON writes defaults.
    ///
    /// Dates become days since the Unix epoch, times and timestamps integer
    /// milli/microseconds, bytes ISO-8859-1 strings, uuids and decimals strings.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Boolean(v) => JsonValue::Bool(*v),
            Value::Int(v) => JsonValue::from(*v),
            Value::Long(v) => JsonValue::from(*v),
            Value::Float(v) => float_to_json(f64::from(*v)),
            Value::Double(v) => float_to_json(*v),
            Value::Bytes(b) | Value::Fixed(b) => JsonValue::String(b.iter().map(|&byte| byte as char).collect()),
            Value::String(s) | Value::Enum(s) => JsonValue::String(s.clone()),
            Value::Date(d) => {
                let epoch = DateTime::<Utc>::UNIX_EPOCH.date_naive();
                JsonValue::from(d.signed_duration_since(epoch).num_days())
            }
            Value::TimeMillis(t) => {
                let millis = i64::from(t.num_seconds_from_midnight()) * 1_000 + i64::from(t.nanosecond() / 1_000_000);
                JsonValue::from(millis)
            }
            Value::TimeMicros(t) => {
                let micros = i64::from(t.num_seconds_from_midnight()) * 1_000_000 + i64::from(t.nanosecond() / 1_000);
                JsonValue::from(micros)
            }
            Value::TimestampMillis(ts) => JsonValue::from(ts.timestamp_millis()),
            Value::TimestampMicros(ts) => JsonValue::from(ts.timestamp_micros()),
            Value::Uuid(u) => JsonValue::String(u.to_string()),
            Value::Decimal(d) => JsonValue::String(d.to_string()),
            Value::Array(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(entries) => JsonValue::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
            Value::Record(instance) => JsonValue::Object(
                instance
                    .fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

fn float_to_json(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Instance> for Value {
    fn from(v: Instance) -> Self {
        Value::Record(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Bytes(b) | Value::Fixed(b) => write!(f, "0x{}", hex::encode(b)),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Date(d) => write!(f, "{}", d),
            Value::TimeMillis(t) | Value::TimeMicros(t) => write!(f, "{}", t),
            Value::TimestampMillis(ts) | Value::TimestampMicros(ts) => write!(f, "{}", ts.to_rfc3339()),
            Value::Uuid(u) => write!(f, "{}", u),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Enum(symbol) => write!(f, "{}", symbol),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Record(instance) => {
                write!(f, "{}(", instance.record)?;
                for (i, (name, value)) in instance.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", name, value)?;
                }
                write!(f, ")")
            }
        }
    }
}
