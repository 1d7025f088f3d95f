// Record declarations for schemaforge
//
// A declaration is the raw, unresolved description of a record as handed over
// by an introspection provider: field names, native type annotations, defaults
// and per-field metadata. The field resolver turns declarations into records.

use std::fmt;

use crate::internal::error::Result;
use crate::schema::value::Value;

/// Native type annotation of a declared field
#[derive(Debug, Clone, PartialEq)]
pub enum NativeType {
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,
    Bytes,
    Str,
    Null,
    Date,
    TimeMillis,
    TimeMicros,
    TimestampMillis,
    TimestampMicros,
    Uuid,
    /// Decimal; precision and scale come from the field metadata
    Decimal,
    /// Fixed-length bytes; size comes from the field metadata
    Fixed,
    /// Enumeration with its symbols and optional type-level default
    Enum {
        name: String,
        symbols: Vec<String>,
        default: Option<String>,
    },
    /// Homogeneous list
    List(Box<NativeType>),
    /// Variable-length homogeneous tuple
    Tuple(Box<NativeType>),
    /// String-keyed dictionary
    Dict(Box<NativeType>),
    /// Union of alternatives
    Union(Vec<NativeType>),
    /// Nullable annotation
    Optional(Box<NativeType>),
    /// Another (possibly not yet declared) record
    Record(String),
    /// The record being declared
    SelfRef,
}

impl NativeType {
    /// Shorthand for a list annotation
    pub fn list(inner: NativeType) -> Self {
        NativeType::List(Box::new(inner))
    }

    /// Shorthand for a dictionary annotation
    pub fn dict(inner: NativeType) -> Self {
        NativeType::Dict(Box::new(inner))
    }

    /// Shorthand for an optional annotation
    pub fn optional(inner: NativeType) -> Self {
        NativeType::Optional(Box::new(inner))
    }

    /// Shorthand for a record annotation
    pub fn record(name: impl Into<String>) -> Self {
        NativeType::Record(name.into())
    }

    /// Shorthand for an enum annotation without a type-level default
    pub fn enumeration(name: impl Into<String>, symbols: &[&str]) -> Self {
        NativeType::Enum {
            name: name.into(),
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            default: None,
        }
    }
}

/// Default of a declared field
#[derive(Clone)]
pub enum FieldDefault {
    /// Explicit absent default (`None`)
    Null,
    /// Concrete default value
    Value(Value),
    /// Factory producing the default, evaluated once when the record is resolved
    Factory(fn() -> Value),
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefault::Null => write!(f, "Null"),
            FieldDefault::Value(value) => f.debug_tuple("Value").field(value).finish(),
            FieldDefault::Factory(_) => write!(f, "Factory(..)"),
        }
    }
}

/// Per-field metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMetadata {
    /// Maximum digits (decimal precision)
    pub precision: Option<u32>,
    /// Decimal places (decimal scale)
    pub scale: Option<u32>,
    /// Fixed size in bytes
    pub size: Option<usize>,
    /// Name given to a fixed type; defaults to the field name
    pub fixed_name: Option<String>,
    /// Field documentation
    pub doc: Option<String>,
    /// Alternative field names
    pub aliases: Vec<String>,
}

/// A declared field
#[derive(Debug, Clone)]
pub struct FieldDeclaration {
    /// Field name
    pub name: String,
    /// Native type annotation
    pub native_type: NativeType,
    /// Declared default (if any)
    pub default: Option<FieldDefault>,
    /// Field metadata
    pub metadata: FieldMetadata,
}

impl FieldDeclaration {
    /// Creates a field without default or metadata
    pub fn new(name: impl Into<String>, native_type: NativeType) -> Self {
        Self {
            name: name.into(),
            native_type,
            default: None,
            metadata: FieldMetadata::default(),
        }
    }

    /// Sets a concrete default
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(FieldDefault::Value(value));
        self
    }

    /// Sets an explicit absent default
    pub fn with_null_default(mut self) -> Self {
        self.default = Some(FieldDefault::Null);
        self
    }

    /// Sets a default factory
    pub fn with_default_factory(mut self, factory: fn() -> Value) -> Self {
        self.default = Some(FieldDefault::Factory(factory));
        self
    }

    /// Sets decimal precision and scale
    pub fn with_decimal(mut self, precision: u32, scale: u32) -> Self {
        self.metadata.precision = Some(precision);
        self.metadata.scale = Some(scale);
        self
    }

    /// Sets the fixed size
    pub fn with_size(mut self, size: usize) -> Self {
        self.metadata.size = Some(size);
        self
    }

    /// Replaces the metadata
    pub fn with_metadata(mut self, metadata: FieldMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A declared record
#[derive(Debug, Clone)]
pub struct RecordDefinition {
    /// Record name
    pub name: String,
    /// Record namespace
    pub namespace: Option<String>,
    /// Record documentation
    pub doc: Option<String>,
    /// Alternative names
    pub aliases: Vec<String>,
    /// Fields in declaration order
    pub fields: Vec<FieldDeclaration>,
}

impl RecordDefinition {
    /// Creates an empty record definition
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            doc: None,
            aliases: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Sets the namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Sets the documentation
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Appends a field declaration
    pub fn field(mut self, field: FieldDeclaration) -> Self {
        self.fields.push(field);
        self
    }
}

/// Introspection collaborator that yields record declarations on demand.
///
/// The registry consults its provider when a record name is requested that has
/// not been registered yet.
pub trait ModelProvider: Send + Sync {
    /// Returns the declaration of the named record, or `None` if unknown.
    fn definition(&self, name: &str) -> Result<Option<RecordDefinition>>;
}
