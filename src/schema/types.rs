// Type descriptor model for schemaforge
//
// This module defines the closed set of type descriptors a field can carry,
// together with the resolved Field and Record structures owned by the registry.

use std::fmt;

use crate::schema::value::Value;

/// Physical primitive kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// Boolean type
    Boolean,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 32-bit floating point (IEEE 754)
    Float32,
    /// 64-bit floating point (IEEE 754)
    Float64,
    /// Binary data (bytes)
    Bytes,
    /// UTF-8 encoded string
    String,
    /// Null type
    Null,
}

impl PrimitiveKind {
    /// Returns the canonical kind name (e.g., "int32")
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Int32 => "int32",
            PrimitiveKind::Int64 => "int64",
            PrimitiveKind::Float32 => "float32",
            PrimitiveKind::Float64 => "float64",
            PrimitiveKind::Bytes => "bytes",
            PrimitiveKind::String => "string",
            PrimitiveKind::Null => "null",
        }
    }

    /// Returns the Avro type name this kind is written as
    pub fn avro_name(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Int32 => "int",
            PrimitiveKind::Int64 => "long",
            PrimitiveKind::Float32 => "float",
            PrimitiveKind::Float64 => "double",
            PrimitiveKind::Bytes => "bytes",
            PrimitiveKind::String => "string",
            PrimitiveKind::Null => "null",
        }
    }
}

/// Logical types: a physical representation annotated with a meaning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalType {
    /// Calendar date (days since the Unix epoch on the wire)
    Date,
    /// Time of day with millisecond precision
    TimeMillis,
    /// Time of day with microsecond precision
    TimeMicros,
    /// Instant with millisecond precision
    TimestampMillis,
    /// Instant with microsecond precision
    TimestampMicros,
    /// Universally unique identifier
    Uuid,
    /// Fixed-precision decimal; invariant `0 < scale <= precision <= 38`
    Decimal { precision: u32, scale: u32 },
}

impl LogicalType {
    /// Returns the logical kind name (e.g., "timestamp-millis")
    pub fn name(&self) -> &'static str {
        match self {
            LogicalType::Date => "date",
            LogicalType::TimeMillis => "time-millis",
            LogicalType::TimeMicros => "time-micros",
            LogicalType::TimestampMillis => "timestamp-millis",
            LogicalType::TimestampMicros => "timestamp-micros",
            LogicalType::Uuid => "uuid",
            LogicalType::Decimal { .. } => "decimal",
        }
    }

    /// Returns the physical primitive this logical type is carried by
    pub fn physical(&self) -> PrimitiveKind {
        match self {
            LogicalType::Date | LogicalType::TimeMillis => PrimitiveKind::Int32,
            LogicalType::TimeMicros
            | LogicalType::TimestampMillis
            | LogicalType::TimestampMicros => PrimitiveKind::Int64,
            LogicalType::Uuid => PrimitiveKind::String,
            LogicalType::Decimal { .. } => PrimitiveKind::Bytes,
        }
    }
}

/// Named enumeration type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    /// Type name
    pub name: String,
    /// Ordered, distinct, non-empty symbols
    pub symbols: Vec<String>,
    /// Type-level fallback symbol
    pub default: Option<String>,
}

/// Named fixed-length byte type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedType {
    /// Type name
    pub name: String,
    /// Number of bytes, always > 0
    pub size: usize,
}

/// Tagged representation of one field's type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    /// Primitive physical type
    Primitive(PrimitiveKind),
    /// Logical type with its parameters
    Logical(LogicalType),
    /// Fixed-length bytes
    Fixed(FixedType),
    /// Enumeration
    Enum(EnumType),
    /// Homogeneous ordered sequence
    Array(Box<TypeDescriptor>),
    /// String-keyed mapping
    Map(Box<TypeDescriptor>),
    /// Ordered set of alternatives with distinct identities
    Union(Vec<TypeDescriptor>),
    /// Nullable wrapper, rendered as a union with null
    Optional(Box<TypeDescriptor>),
    /// Reference to a record resolved through the registry
    RecordRef(String),
}

impl TypeDescriptor {
    /// Shorthand for a primitive descriptor
    pub fn primitive(kind: PrimitiveKind) -> Self {
        TypeDescriptor::Primitive(kind)
    }

    /// Shorthand for an optional descriptor
    pub fn optional(inner: TypeDescriptor) -> Self {
        TypeDescriptor::Optional(Box::new(inner))
    }

    /// Shorthand for a record reference
    pub fn record(name: impl Into<String>) -> Self {
        TypeDescriptor::RecordRef(name.into())
    }

    /// Returns true for the null primitive
    pub fn is_null(&self) -> bool {
        matches!(self, TypeDescriptor::Primitive(PrimitiveKind::Null))
    }

    /// Returns true if this descriptor is a union or an optional wrapper
    pub fn is_union_like(&self) -> bool {
        matches!(self, TypeDescriptor::Union(_) | TypeDescriptor::Optional(_))
    }

    /// Identity used to reject ambiguous union members.
    ///
    /// Named types are identified by name, everything else by kind.
    pub fn identity(&self) -> String {
        match self {
            TypeDescriptor::Primitive(kind) => kind.name().to_string(),
            TypeDescriptor::Logical(logical) => logical.name().to_string(),
            TypeDescriptor::Fixed(fixed) => fixed.name.clone(),
            TypeDescriptor::Enum(enum_type) => enum_type.name.clone(),
            TypeDescriptor::Array(_) => "array".to_string(),
            TypeDescriptor::Map(_) => "map".to_string(),
            TypeDescriptor::Union(_) => "union".to_string(),
            TypeDescriptor::Optional(_) => "union".to_string(),
            TypeDescriptor::RecordRef(name) => name.clone(),
        }
    }

    /// Flattened union members, with `Optional` expanded to `null` + inner members.
    ///
    /// Non-union descriptors yield themselves.
    pub fn members(&self) -> Vec<&TypeDescriptor> {
        match self {
            TypeDescriptor::Union(members) => members.iter().collect(),
            TypeDescriptor::Optional(inner) => {
                let mut members = vec![&NULL_DESCRIPTOR];
                members.extend(inner.members().into_iter().filter(|m| !m.is_null()));
                members
            }
            other => vec![other],
        }
    }
}

static NULL_DESCRIPTOR: TypeDescriptor = TypeDescriptor::Primitive(PrimitiveKind::Null);

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Primitive(kind) => write!(f, "{}", kind.name()),
            TypeDescriptor::Logical(LogicalType::Decimal { precision, scale }) => {
                write!(f, "decimal({}, {})", precision, scale)
            }
            TypeDescriptor::Logical(logical) => write!(f, "{}", logical.name()),
            TypeDescriptor::Fixed(fixed) => write!(f, "fixed({})", fixed.size),
            TypeDescriptor::Enum(enum_type) => write!(f, "enum {}", enum_type.name),
            TypeDescriptor::Array(items) => write!(f, "array<{}>", items),
            TypeDescriptor::Map(values) => write!(f, "map<{}>", values),
            TypeDescriptor::Union(members) => {
                write!(f, "union[")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", member)?;
                }
                write!(f, "]")
            }
            TypeDescriptor::Optional(inner) => write!(f, "optional<{}>", inner),
            TypeDescriptor::RecordRef(name) => write!(f, "{}", name),
        }
    }
}

/// A resolved field of a record
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field name
    pub name: String,
    /// Resolved field type
    pub field_type: TypeDescriptor,
    /// Default value (if any); `Some(Value::Null)` is an explicit absent default
    pub default: Option<Value>,
    /// Position in declaration order
    pub order_index: usize,
    /// Field documentation
    pub doc: Option<String>,
    /// Alternative names
    pub aliases: Vec<String>,
}

/// A resolved record definition
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Record name (registry key)
    pub name: String,
    /// Record namespace
    pub namespace: Option<String>,
    /// Record documentation
    pub doc: Option<String>,
    /// Alternative names
    pub aliases: Vec<String>,
    /// Fields in declaration order
    pub fields: Vec<Field>,
}

impl Record {
    /// Looks up a field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the namespace-qualified name
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) if !ns.is_empty() => format!("{}.{}", ns, self.name),
            _ => self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_distinguishes_named_types() {
        let bus = TypeDescriptor::record("Bus");
        let car = TypeDescriptor::record("Car");
        assert_ne!(bus.identity(), car.identity());
        assert_eq!(
            TypeDescriptor::primitive(PrimitiveKind::String).identity(),
            TypeDescriptor::primitive(PrimitiveKind::String).identity()
        );
    }

    #[test]
    fn test_optional_members_put_null_first() {
        let optional = TypeDescriptor::optional(TypeDescriptor::Union(vec![
            TypeDescriptor::record("Bus"),
            TypeDescriptor::record("Car"),
        ]));
        let members = optional.members();
        assert_eq!(members.len(), 3);
        assert!(members[0].is_null());
        assert_eq!(members[1], &TypeDescriptor::record("Bus"));
    }

    #[test]
    fn test_logical_physical_types() {
        assert_eq!(LogicalType::Date.physical(), PrimitiveKind::Int32);
        assert_eq!(LogicalType::TimestampMicros.physical(), PrimitiveKind::Int64);
        assert_eq!(
            LogicalType::Decimal { precision: 5, scale: 2 }.physical(),
            PrimitiveKind::Bytes
        );
    }

    #[test]
    fn test_display() {
        let descriptor = TypeDescriptor::Array(Box::new(TypeDescriptor::optional(
            TypeDescriptor::Logical(LogicalType::Decimal { precision: 5, scale: 2 }),
        )));
        assert_eq!(descriptor.to_string(), "array<optional<decimal(5, 2)>>");
    }

    #[test]
    fn test_record_full_name() {
        let record = Record {
            name: "Bus".to_string(),
            namespace: Some("types.bus_type".to_string()),
            doc: None,
            aliases: Vec::new(),
            fields: Vec::new(),
        };
        assert_eq!(record.full_name(), "types.bus_type.Bus");
    }
}
