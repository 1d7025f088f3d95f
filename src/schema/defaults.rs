// Default value checks for schemaforge
//
// This module decides whether a value has the shape a type descriptor asks for
// and applies the field default rules enforced while building schemas.

use crate::internal::error::{Error, Result};
use crate::schema::types::{Field, LogicalType, PrimitiveKind, Record, TypeDescriptor};
use crate::schema::value::Value;

/// Returns true if `value` has the shape described by `descriptor`.
///
/// Record references match record instances of the same name; nested record
/// fields are not inspected. Integer values are accepted for 64-bit fields and
/// finite doubles within range for 32-bit float fields.
pub fn conforms(value: &Value, descriptor: &TypeDescriptor) -> bool {
    match (descriptor, value) {
        (TypeDescriptor::Primitive(kind), value) => conforms_primitive(*kind, value),

        (TypeDescriptor::Logical(logical), value) => match (logical, value) {
            (LogicalType::Date, Value::Date(_)) => true,
            (LogicalType::TimeMillis, Value::TimeMillis(_)) => true,
            (LogicalType::TimeMicros, Value::TimeMicros(_)) => true,
            (LogicalType::TimestampMillis, Value::TimestampMillis(_)) => true,
            (LogicalType::TimestampMicros, Value::TimestampMicros(_)) => true,
            (LogicalType::Uuid, Value::Uuid(_)) => true,
            (LogicalType::Decimal { precision, scale }, Value::Decimal(d)) => {
                d.scale() == *scale && d.digits() <= *precision
            }
            _ => false,
        },

        (TypeDescriptor::Fixed(fixed), Value::Fixed(bytes)) => bytes.len() == fixed.size,

        (TypeDescriptor::Enum(enum_type), Value::Enum(symbol)) => enum_type.symbols.contains(symbol),

        (TypeDescriptor::Array(items), Value::Array(values)) => values.iter().all(|v| conforms(v, items)),

        (TypeDescriptor::Map(values_type), Value::Map(entries)) => {
            entries.values().all(|v| conforms(v, values_type))
        }

        (TypeDescriptor::Union(members), value) => members.iter().any(|m| conforms(value, m)),

        (TypeDescriptor::Optional(inner), value) => value.is_null() || conforms(value, inner),

        (TypeDescriptor::RecordRef(name), Value::Record(instance)) => &instance.record == name,

        _ => false,
    }
}

fn conforms_primitive(kind: PrimitiveKind, value: &Value) -> bool {
    match (kind, value) {
        (PrimitiveKind::Null, Value::Null) => true,
        (PrimitiveKind::Boolean, Value::Boolean(_)) => true,
        (PrimitiveKind::Int32, Value::Int(_)) => true,
        (PrimitiveKind::Int64, Value::Long(_) | Value::Int(_)) => true,
        (PrimitiveKind::Float32, Value::Float(v)) => v.is_finite(),
        (PrimitiveKind::Float32, Value::Double(v)) => v.is_finite() && v.abs() <= f64::from(f32::MAX),
        (PrimitiveKind::Float64, Value::Double(v)) => v.is_finite(),
        (PrimitiveKind::Float64, Value::Float(v)) => v.is_finite(),
        (PrimitiveKind::Bytes, Value::Bytes(_)) => true,
        (PrimitiveKind::String, Value::String(_)) => true,
        _ => false,
    }
}

/// Union members in the order they are written for a field.
///
/// `Optional` puts `null` first unless the field carries a concrete default,
/// in which case `null` goes last so the default's type leads the union.
pub fn ordered_members<'a>(field_type: &'a TypeDescriptor, default: Option<&Value>) -> Vec<&'a TypeDescriptor> {
    let mut members = field_type.members();
    let concrete_default = default.map_or(false, |d| !d.is_null());
    if matches!(field_type, TypeDescriptor::Optional(_)) && concrete_default {
        let null = members.remove(0);
        members.push(null);
    }
    members
}

/// Checks a field's default against its type.
///
/// With `enforce_union_order`, a union default must match the first member
/// as written (see [`ordered_members`]); otherwise any member will do.
pub fn check_field_default(record: &Record, field: &Field, enforce_union_order: bool) -> Result<()> {
    let default = match &field.default {
        Some(default) => default,
        None => return Ok(()),
    };

    if field.field_type.is_union_like() {
        let members = ordered_members(&field.field_type, Some(default));
        let matched = if enforce_union_order {
            members.first().map_or(false, |first| conforms(default, first))
        } else {
            members.iter().any(|m| conforms(default, m))
        };
        if !matched {
            let expected = members.first().map(|m| m.to_string()).unwrap_or_default();
            return Err(Error::schema(
                &record.name,
                Some(&field.name),
                format!(
                    "default of type {} does not match the first union member {}",
                    default.shape_name(),
                    expected
                ),
            ));
        }
        return Ok(());
    }

    if !conforms(default, &field.field_type) {
        return Err(Error::schema(
            &record.name,
            Some(&field.name),
            format!(
                "default of type {} does not match declared type {}",
                default.shape_name(),
                field.field_type
            ),
        ));
    }
    Ok(())
}
