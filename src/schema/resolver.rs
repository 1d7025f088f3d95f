// Field resolver for schemaforge
//
// This module converts record declarations (native annotations, defaults and
// metadata) into resolved records made of type descriptors. Referenced records
// are not resolved here: they become `RecordRef`s that the registry resolves lazily.

use std::collections::HashSet;

use log::trace;

use crate::internal::error::{Error, Result};
use crate::schema::declaration::{FieldDeclaration, FieldDefault, FieldMetadata, NativeType, RecordDefinition};
use crate::schema::types::{EnumType, FixedType, Field, LogicalType, PrimitiveKind, Record, TypeDescriptor};
use crate::schema::value::Value;

/// Largest decimal precision whose unscaled values fit in an `i128`
pub const MAX_DECIMAL_PRECISION: u32 = 38;

/// Location of the field currently being resolved
struct FieldContext<'a> {
    record: &'a str,
    field: &'a str,
    metadata: &'a FieldMetadata,
}

impl FieldContext<'_> {
    fn error(&self, reason: impl Into<String>) -> Error {
        Error::configuration(self.record, Some(self.field), reason)
    }
}

/// Resolves record declarations into records
#[derive(Debug, Default, Clone, Copy)]
pub struct FieldResolver;

impl FieldResolver {
    /// Creates a new field resolver
    pub fn new() -> Self {
        Self
    }

    /// Resolves every field of a record definition, in declaration order
    pub fn resolve_record(&self, definition: &RecordDefinition) -> Result<Record> {
        if definition.name.is_empty() {
            return Err(Error::configuration("<unnamed>", None, "record name must not be empty"));
        }

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(definition.fields.len());
        for (order_index, declaration) in definition.fields.iter().enumerate() {
            if !seen.insert(declaration.name.as_str()) {
                return Err(Error::configuration(
                    &definition.name,
                    Some(&declaration.name),
                    "duplicate field name",
                ));
            }
            fields.push(self.resolve_field(&definition.name, order_index, declaration)?);
        }

        trace!("Resolved record '{}' with {} field(s)", definition.name, fields.len());

        Ok(Record {
            name: definition.name.clone(),
            namespace: definition.namespace.clone(),
            doc: definition.doc.clone(),
            aliases: definition.aliases.clone(),
            fields,
        })
    }

    /// Resolves a single field declaration
    pub fn resolve_field(
        &self,
        record: &str,
        order_index: usize,
        declaration: &FieldDeclaration,
    ) -> Result<Field> {
        let ctx = FieldContext {
            record,
            field: &declaration.name,
            metadata: &declaration.metadata,
        };

        let mut field_type = self.resolve_type(&ctx, &declaration.native_type)?;

        let mut default = match &declaration.default {
            None => None,
            Some(FieldDefault::Null) => Some(Value::Null),
            Some(FieldDefault::Value(value)) => Some(value.clone()),
            Some(FieldDefault::Factory(factory)) => Some(factory()),
        };

        // An explicit absent default makes the field nullable
        if matches!(default, Some(Value::Null)) && !field_type.is_union_like() && !field_type.is_null() {
            field_type = TypeDescriptor::optional(field_type);
        }

        if let Some(value) = default.take() {
            default = Some(self.check_enum_default(&ctx, &field_type, value)?);
        }

        Ok(Field {
            name: declaration.name.clone(),
            field_type,
            default,
            order_index,
            doc: declaration.metadata.doc.clone(),
            aliases: declaration.metadata.aliases.clone(),
        })
    }

    /// Maps a native annotation to a type descriptor, inner types first
    fn resolve_type(&self, ctx: &FieldContext<'_>, native: &NativeType) -> Result<TypeDescriptor> {
        let descriptor = match native {
            NativeType::Bool => TypeDescriptor::Primitive(PrimitiveKind::Boolean),
            NativeType::Int32 => TypeDescriptor::Primitive(PrimitiveKind::Int32),
            NativeType::Int64 => TypeDescriptor::Primitive(PrimitiveKind::Int64),
            NativeType::Float32 => TypeDescriptor::Primitive(PrimitiveKind::Float32),
            NativeType::Float64 => TypeDescriptor::Primitive(PrimitiveKind::Float64),
            NativeType::Bytes => TypeDescriptor::Primitive(PrimitiveKind::Bytes),
            NativeType::Str => TypeDescriptor::Primitive(PrimitiveKind::String),
            NativeType::Null => TypeDescriptor::Primitive(PrimitiveKind::Null),
            NativeType::Date => TypeDescriptor::Logical(LogicalType::Date),
            NativeType::TimeMillis => TypeDescriptor::Logical(LogicalType::TimeMillis),
            NativeType::TimeMicros => TypeDescriptor::Logical(LogicalType::TimeMicros),
            NativeType::TimestampMillis => TypeDescriptor::Logical(LogicalType::TimestampMillis),
            NativeType::TimestampMicros => TypeDescriptor::Logical(LogicalType::TimestampMicros),
            NativeType::Uuid => TypeDescriptor::Logical(LogicalType::Uuid),
            NativeType::Decimal => self.resolve_decimal(ctx)?,
            NativeType::Fixed => self.resolve_fixed(ctx)?,
            NativeType::Enum { name, symbols, default } => self.resolve_enum(ctx, name, symbols, default)?,
            NativeType::List(inner) | NativeType::Tuple(inner) => {
                TypeDescriptor::Array(Box::new(self.resolve_type(ctx, inner)?))
            }
            NativeType::Dict(inner) => TypeDescriptor::Map(Box::new(self.resolve_type(ctx, inner)?)),
            NativeType::Union(members) => self.resolve_union(ctx, members)?,
            NativeType::Optional(inner) => match self.resolve_type(ctx, inner)? {
                already @ TypeDescriptor::Optional(_) => already,
                null @ TypeDescriptor::Primitive(PrimitiveKind::Null) => null,
                TypeDescriptor::Union(members) => {
                    // Optional[Union[A, B]] wraps the non-null members only
                    let mut concrete: Vec<TypeDescriptor> =
                        members.into_iter().filter(|m| !m.is_null()).collect();
                    match concrete.len() {
                        0 => TypeDescriptor::Primitive(PrimitiveKind::Null),
                        1 => TypeDescriptor::optional(concrete.remove(0)),
                        _ => TypeDescriptor::optional(TypeDescriptor::Union(concrete)),
                    }
                }
                inner => TypeDescriptor::optional(inner),
            },
            NativeType::Record(name) => {
                if name.is_empty() {
                    return Err(ctx.error("record reference must name a record"));
                }
                TypeDescriptor::RecordRef(name.clone())
            }
            NativeType::SelfRef => TypeDescriptor::RecordRef(ctx.record.to_string()),
        };
        Ok(descriptor)
    }

    fn resolve_decimal(&self, ctx: &FieldContext<'_>) -> Result<TypeDescriptor> {
        let precision = ctx
            .metadata
            .precision
            .ok_or_else(|| ctx.error("decimal requires explicit precision (max digits)"))?;
        let scale = ctx
            .metadata
            .scale
            .ok_or_else(|| ctx.error("decimal requires explicit scale (decimal places)"))?;

        if precision == 0 || scale == 0 {
            return Err(ctx.error(format!(
                "decimal precision and scale must be positive, got precision={} scale={}",
                precision, scale
            )));
        }
        if scale > precision {
            return Err(ctx.error(format!(
                "decimal scale {} exceeds precision {}",
                scale, precision
            )));
        }
        if precision > MAX_DECIMAL_PRECISION {
            return Err(ctx.error(format!(
                "decimal precision {} exceeds the supported maximum of {}",
                precision, MAX_DECIMAL_PRECISION
            )));
        }

        Ok(TypeDescriptor::Logical(LogicalType::Decimal { precision, scale }))
    }

    fn resolve_fixed(&self, ctx: &FieldContext<'_>) -> Result<TypeDescriptor> {
        let size = match ctx.metadata.size {
            Some(size) if size > 0 => size,
            Some(_) => return Err(ctx.error("fixed size must be positive")),
            None => return Err(ctx.error("fixed requires an explicit size")),
        };
        let name = ctx
            .metadata
            .fixed_name
            .clone()
            .unwrap_or_else(|| ctx.field.to_string());
        Ok(TypeDescriptor::Fixed(FixedType { name, size }))
    }

    fn resolve_enum(
        &self,
        ctx: &FieldContext<'_>,
        name: &str,
        symbols: &[String],
        default: &Option<String>,
    ) -> Result<TypeDescriptor> {
        if symbols.is_empty() {
            return Err(ctx.error(format!("enum '{}' must declare at least one symbol", name)));
        }
        let mut seen = HashSet::new();
        for symbol in symbols {
            if !seen.insert(symbol.as_str()) {
                return Err(ctx.error(format!("enum '{}' repeats symbol '{}'", name, symbol)));
            }
        }
        if let Some(default) = default {
            if !seen.contains(default.as_str()) {
                return Err(ctx.error(format!(
                    "enum '{}' default '{}' is not one of its symbols",
                    name, default
                )));
            }
        }
        let name = if name.is_empty() { ctx.field.to_string() } else { name.to_string() };
        Ok(TypeDescriptor::Enum(EnumType {
            name,
            symbols: symbols.to_vec(),
            default: default.clone(),
        }))
    }

    fn resolve_union(&self, ctx: &FieldContext<'_>, natives: &[NativeType]) -> Result<TypeDescriptor> {
        if natives.is_empty() {
            return Err(ctx.error("union must have at least one member"));
        }

        let mut members: Vec<TypeDescriptor> = Vec::with_capacity(natives.len());
        for native in natives {
            match self.resolve_type(ctx, native)? {
                // Nested unions and optionals are spliced into the enclosing union
                TypeDescriptor::Union(inner) => members.extend(inner),
                TypeDescriptor::Optional(inner) => {
                    members.push(TypeDescriptor::Primitive(PrimitiveKind::Null));
                    match *inner {
                        TypeDescriptor::Union(inner) => members.extend(inner),
                        other => members.push(other),
                    }
                }
                other => members.push(other),
            }
        }

        let mut identities = HashSet::new();
        for member in &members {
            if !identities.insert(member.identity()) {
                return Err(ctx.error(format!(
                    "union has more than one member of type '{}'",
                    member.identity()
                )));
            }
        }

        Ok(TypeDescriptor::Union(members))
    }

    /// Checks enum defaults against the symbol set, normalizing string defaults to symbols
    fn check_enum_default(&self, ctx: &FieldContext<'_>, field_type: &TypeDescriptor, default: Value) -> Result<Value> {
        let enum_type = match field_type {
            TypeDescriptor::Enum(enum_type) => enum_type,
            TypeDescriptor::Optional(inner) => match inner.as_ref() {
                TypeDescriptor::Enum(enum_type) => enum_type,
                _ => return Ok(default),
            },
            _ => return Ok(default),
        };

        let symbol = match default {
            Value::Enum(symbol) | Value::String(symbol) => symbol,
            other => return Ok(other),
        };
        if !enum_type.symbols.contains(&symbol) {
            return Err(ctx.error(format!(
                "default '{}' is not a symbol of enum '{}'",
                symbol, enum_type.name
            )));
        }
        Ok(Value::Enum(symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::error::ErrorKind;
    use crate::schema::value::Decimal;

    fn resolve(definition: RecordDefinition) -> Result<Record> {
        FieldResolver::new().resolve_record(&definition)
    }

    #[test]
    fn test_fields_keep_declaration_order() {
        let record = resolve(
            RecordDefinition::new("User")
                .field(FieldDeclaration::new("name", NativeType::Str))
                .field(FieldDeclaration::new("age", NativeType::Int32))
                .field(FieldDeclaration::new("pets", NativeType::list(NativeType::Str))),
        )
        .unwrap();

        let names: Vec<&str> = record.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["name", "age", "pets"]);
        assert_eq!(record.fields[2].order_index, 2);
        assert_eq!(
            record.fields[2].field_type,
            TypeDescriptor::Array(Box::new(TypeDescriptor::Primitive(PrimitiveKind::String)))
        );
    }

    #[test]
    fn test_null_default_wraps_in_optional() {
        let record = resolve(
            RecordDefinition::new("User")
                .field(FieldDeclaration::new("address", NativeType::Str).with_null_default())
                .field(FieldDeclaration::new("country", NativeType::Str).with_default(Value::from("Argentina"))),
        )
        .unwrap();

        assert_eq!(
            record.fields[0].field_type,
            TypeDescriptor::optional(TypeDescriptor::Primitive(PrimitiveKind::String))
        );
        assert_eq!(record.fields[0].default, Some(Value::Null));
        // A concrete default does not force optionality
        assert_eq!(record.fields[1].field_type, TypeDescriptor::Primitive(PrimitiveKind::String));
    }

    #[test]
    fn test_decimal_requires_precision_and_scale() {
        let err = resolve(
            RecordDefinition::new("User").field(FieldDeclaration::new("score", NativeType::Decimal)),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.field(), Some("score"));

        let err = resolve(
            RecordDefinition::new("User")
                .field(FieldDeclaration::new("score", NativeType::Decimal).with_decimal(2, 5)),
        )
        .unwrap_err();
        assert!(err.to_string().contains("exceeds precision"));

        let err = resolve(
            RecordDefinition::new("User")
                .field(FieldDeclaration::new("score", NativeType::Decimal).with_decimal(5, 0)),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let record = resolve(
            RecordDefinition::new("User")
                .field(FieldDeclaration::new("score", NativeType::Decimal).with_decimal(11, 5)),
        )
        .unwrap();
        assert_eq!(
            record.fields[0].field_type,
            TypeDescriptor::Logical(LogicalType::Decimal { precision: 11, scale: 5 })
        );
    }

    #[test]
    fn test_fixed_requires_positive_size() {
        let err = resolve(
            RecordDefinition::new("User").field(FieldDeclaration::new("md5", NativeType::Fixed)),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = resolve(
            RecordDefinition::new("User").field(FieldDeclaration::new("md5", NativeType::Fixed).with_size(0)),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let record = resolve(
            RecordDefinition::new("User").field(FieldDeclaration::new("md5", NativeType::Fixed).with_size(16)),
        )
        .unwrap();
        assert_eq!(
            record.fields[0].field_type,
            TypeDescriptor::Fixed(FixedType { name: "md5".to_string(), size: 16 })
        );
    }

    #[test]
    fn test_enum_validation() {
        let empty = resolve(
            RecordDefinition::new("User").field(FieldDeclaration::new("color", NativeType::enumeration("Color", &[]))),
        )
        .unwrap_err();
        assert_eq!(empty.kind(), ErrorKind::Configuration);

        let bad_default = resolve(
            RecordDefinition::new("User").field(
                FieldDeclaration::new("color", NativeType::enumeration("Color", &["BLUE", "RED"]))
                    .with_default(Value::from("GREEN")),
            ),
        )
        .unwrap_err();
        assert_eq!(bad_default.kind(), ErrorKind::Configuration);

        let record = resolve(
            RecordDefinition::new("User").field(
                FieldDeclaration::new("color", NativeType::enumeration("Color", &["BLUE", "RED"]))
                    .with_default(Value::from("RED")),
            ),
        )
        .unwrap();
        assert_eq!(record.fields[0].default, Some(Value::Enum("RED".to_string())));
    }

    #[test]
    fn test_union_rejects_duplicate_members() {
        let err = resolve(
            RecordDefinition::new("User").field(FieldDeclaration::new(
                "value",
                NativeType::Union(vec![NativeType::Str, NativeType::Str]),
            )),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let record = resolve(
            RecordDefinition::new("Trip").field(FieldDeclaration::new(
                "vehicle",
                NativeType::Union(vec![NativeType::record("Bus"), NativeType::record("Car")]),
            )),
        )
        .unwrap();
        assert_eq!(
            record.fields[0].field_type,
            TypeDescriptor::Union(vec![TypeDescriptor::record("Bus"), TypeDescriptor::record("Car")])
        );
    }

    #[test]
    fn test_self_reference_becomes_record_ref() {
        let record = resolve(
            RecordDefinition::new("User")
                .field(FieldDeclaration::new("teammate", NativeType::optional(NativeType::SelfRef)).with_null_default()),
        )
        .unwrap();
        assert_eq!(
            record.fields[0].field_type,
            TypeDescriptor::optional(TypeDescriptor::record("User"))
        );
    }

    #[test]
    fn test_default_factory_is_evaluated() {
        fn hundred() -> Value {
            Value::Decimal(Decimal::new(10000, 2))
        }
        let record = resolve(
            RecordDefinition::new("User").field(
                FieldDeclaration::new("score", NativeType::Decimal)
                    .with_decimal(5, 2)
                    .with_default_factory(hundred),
            ),
        )
        .unwrap();
        assert_eq!(record.fields[0].default, Some(Value::Decimal(Decimal::new(10000, 2))));
    }

    #[test]
    fn test_duplicate_field_names_rejected() {
        let err = resolve(
            RecordDefinition::new("User")
                .field(FieldDeclaration::new("name", NativeType::Str))
                .field(FieldDeclaration::new("name", NativeType::Int32)),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.field(), Some("name"));
    }

    #[test]
    fn test_optional_union_is_flattened() {
        let record = resolve(
            RecordDefinition::new("Trip").field(
                FieldDeclaration::new(
                    "river_trip",
                    NativeType::optional(NativeType::Union(vec![NativeType::record("Bus"), NativeType::record("Car")])),
                )
                .with_null_default(),
            ),
        )
        .unwrap();
        let members = record.fields[0].field_type.members();
        assert_eq!(members.len(), 3);
        assert!(members[0].is_null());
    }
}
