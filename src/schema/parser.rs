// JSON model file parser for schemaforge
//
// A model file declares records in JSON so they can be fed to the registry
// without a host reflection layer:
//
//     {"records": [{"name": "User", "fields": [{"name": "age", "type": "int32"}]}]}
//
// Field types are either a type name (primitive, logical, `decimal`, `fixed`,
// `self` or another record's name) or a single-key object for the composite
// forms. Defaults are converted according to the declared field type.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use bytes::Bytes;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use log::debug;
use serde_json::{Map, Value as JsonValue};

use crate::internal::error::{Error, Result};
use crate::schema::declaration::{
    FieldDeclaration, FieldDefault, FieldMetadata, ModelProvider, NativeType, RecordDefinition,
};
use crate::schema::registry::RecordRegistry;
use crate::schema::value::{Decimal, Instance, Value};

/// Key naming the record of a nested record default inside a union
const RECORD_TAG: &str = "$record";

/// Records declared in a JSON model document
#[derive(Debug, Clone, Default)]
pub struct JsonModel {
    definitions: Vec<RecordDefinition>,
}

/// A record whose types are parsed but whose defaults are still raw JSON
struct PendingRecord {
    definition: RecordDefinition,
    defaults: Vec<Option<JsonValue>>,
}

impl JsonModel {
    /// Parses a model document from JSON text
    pub fn parse(text: &str) -> Result<Self> {
        let document: JsonValue = serde_json::from_str(text)
            .map_err(|e| Error::model("document", format!("invalid JSON: {}", e)))?;
        Self::from_value(&document)
    }

    /// Reads and parses a model file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let model = Self::parse(&text)?;
        debug!(
            "Loaded {} record(s) from {}",
            model.definitions.len(),
            path.display()
        );
        Ok(model)
    }

    /// Builds a model from an already parsed JSON document
    pub fn from_value(document: &JsonValue) -> Result<Self> {
        let obj = match document {
            JsonValue::Object(obj) => obj,
            _ => return Err(Error::model("document", "model document must be a JSON object")),
        };
        let records = match obj.get("records") {
            Some(JsonValue::Array(records)) => records,
            Some(_) => return Err(Error::model("document", "'records' must be an array")),
            None => return Err(Error::model("document", "required key 'records' is missing")),
        };

        let mut pending = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let parsed = parse_record(record, &format!("records[{}]", index))?;
            if pending
                .iter()
                .any(|p: &PendingRecord| p.definition.name == parsed.definition.name)
            {
                return Err(Error::model(
                    parsed.definition.name.as_str(),
                    "record is declared more than once",
                ));
            }
            pending.push(parsed);
        }

        // Defaults may reference any record of the document, so convert them last
        let lookup: HashMap<&str, &[FieldDeclaration]> = pending
            .iter()
            .map(|p| (p.definition.name.as_str(), p.definition.fields.as_slice()))
            .collect();
        let mut converted = Vec::with_capacity(pending.len());
        for record in &pending {
            let converter = DefaultConverter {
                lookup: &lookup,
                owner: &record.definition.name,
            };
            let mut defaults = Vec::with_capacity(record.defaults.len());
            for (field, raw) in record.definition.fields.iter().zip(&record.defaults) {
                let default = match raw {
                    None => None,
                    Some(JsonValue::Null) => Some(FieldDefault::Null),
                    Some(raw) => {
                        let location = format!("{}.{}", record.definition.name, field.name);
                        Some(FieldDefault::Value(converter.convert(raw, &field.native_type, &location)?))
                    }
                };
                defaults.push(default);
            }
            converted.push(defaults);
        }

        let definitions = pending
            .into_iter()
            .zip(converted)
            .map(|(mut record, defaults)| {
                for (field, default) in record.definition.fields.iter_mut().zip(defaults) {
                    field.default = default;
                }
                record.definition
            })
            .collect();

        Ok(Self { definitions })
    }

    /// Declared records in document order
    pub fn definitions(&self) -> &[RecordDefinition] {
        &self.definitions
    }

    /// Names of the declared records in document order
    pub fn names(&self) -> Vec<&str> {
        self.definitions.iter().map(|d| d.name.as_str()).collect()
    }

    /// Converts a JSON value into a value for `record.field`, using the same
    /// rules as field defaults
    pub fn field_value(&self, record: &str, field: &str, raw: &JsonValue) -> Result<Value> {
        let location = format!("{}.{}", record, field);
        let definition = self
            .definitions
            .iter()
            .find(|d| d.name == record)
            .ok_or_else(|| Error::UnknownRecord(record.to_string()))?;
        let declaration = definition
            .fields
            .iter()
            .find(|f| f.name == field)
            .ok_or_else(|| Error::model(location.as_str(), "no such field"))?;

        if raw.is_null() {
            return Ok(Value::Null);
        }
        let lookup: HashMap<&str, &[FieldDeclaration]> = self
            .definitions
            .iter()
            .map(|d| (d.name.as_str(), d.fields.as_slice()))
            .collect();
        let converter = DefaultConverter {
            lookup: &lookup,
            owner: &definition.name,
        };
        converter.convert(raw, &declaration.native_type, &location)
    }

    /// Registers every declared record with `registry`
    pub fn register_all(&self, registry: &RecordRegistry) -> Result<()> {
        for definition in &self.definitions {
            registry.register(definition.clone())?;
        }
        Ok(())
    }
}

impl FromStr for JsonModel {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        Self::parse(text)
    }
}

impl ModelProvider for JsonModel {
    fn definition(&self, name: &str) -> Result<Option<RecordDefinition>> {
        Ok(self.definitions.iter().find(|d| d.name == name).cloned())
    }
}

fn parse_record(value: &JsonValue, location: &str) -> Result<PendingRecord> {
    let obj = match value {
        JsonValue::Object(obj) => obj,
        _ => return Err(Error::model(location, "record must be a JSON object")),
    };

    let name = get_string_field(obj, "name", location)?;
    let fields = match obj.get("fields") {
        Some(JsonValue::Array(fields)) => fields,
        Some(_) => return Err(Error::model(name.as_str(), "'fields' must be an array")),
        None => return Err(Error::model(name.as_str(), "required key 'fields' is missing")),
    };

    let mut definition = RecordDefinition::new(name.clone());
    definition.namespace = get_optional_string(obj, "namespace", &name)?;
    definition.doc = get_optional_string(obj, "doc", &name)?;
    definition.aliases = get_string_list(obj, "aliases", &name)?;

    let mut defaults = Vec::with_capacity(fields.len());
    for (index, field) in fields.iter().enumerate() {
        let (declaration, default) = parse_field(field, &format!("{}.fields[{}]", name, index))?;
        definition.fields.push(declaration);
        defaults.push(default);
    }

    Ok(PendingRecord { definition, defaults })
}

fn parse_field(value: &JsonValue, location: &str) -> Result<(FieldDeclaration, Option<JsonValue>)> {
    let obj = match value {
        JsonValue::Object(obj) => obj,
        _ => return Err(Error::model(location, "field must be a JSON object")),
    };

    let name = get_string_field(obj, "name", location)?;
    let location = format!("{}({})", location, name);
    let native_type = match obj.get("type") {
        Some(type_value) => parse_type(type_value, &location)?,
        None => return Err(Error::model(location, "required key 'type' is missing")),
    };

    let metadata = FieldMetadata {
        precision: get_optional_u32(obj, "precision", &location)?,
        scale: get_optional_u32(obj, "scale", &location)?,
        size: get_optional_u32(obj, "size", &location)?.map(|s| s as usize),
        fixed_name: get_optional_string(obj, "fixed_name", &location)?,
        doc: get_optional_string(obj, "doc", &location)?,
        aliases: get_string_list(obj, "aliases", &location)?,
    };

    let declaration = FieldDeclaration::new(name, native_type).with_metadata(metadata);
    Ok((declaration, obj.get("default").cloned()))
}

/// Parses a type expression into a native type annotation
fn parse_type(value: &JsonValue, location: &str) -> Result<NativeType> {
    match value {
        JsonValue::String(type_name) => Ok(match type_name.as_str() {
            "boolean" => NativeType::Bool,
            "int32" => NativeType::Int32,
            "int64" => NativeType::Int64,
            "float32" => NativeType::Float32,
            "float64" => NativeType::Float64,
            "bytes" => NativeType::Bytes,
            "string" => NativeType::Str,
            "null" => NativeType::Null,
            "date" => NativeType::Date,
            "time-millis" => NativeType::TimeMillis,
            "time-micros" => NativeType::TimeMicros,
            "timestamp-millis" => NativeType::TimestampMillis,
            "timestamp-micros" => NativeType::TimestampMicros,
            "uuid" => NativeType::Uuid,
            "decimal" => NativeType::Decimal,
            "fixed" => NativeType::Fixed,
            "self" => NativeType::SelfRef,
            "" => return Err(Error::model(location, "type name must not be empty")),
            record => NativeType::Record(record.to_string()),
        }),
        JsonValue::Object(obj) => {
            if let Some(enum_name) = obj.get("enum") {
                let name = match enum_name {
                    JsonValue::String(name) => name.clone(),
                    _ => return Err(Error::model(location, "enum name must be a string")),
                };
                let symbols = get_string_list(obj, "symbols", location)?;
                let default = get_optional_string(obj, "default", location)?;
                return Ok(NativeType::Enum { name, symbols, default });
            }

            if obj.len() != 1 {
                return Err(Error::model(
                    location,
                    "composite type must have exactly one of 'array', 'tuple', 'map', 'union', 'optional'",
                ));
            }
            let (key, inner) = obj
                .iter()
                .next()
                .ok_or_else(|| Error::model(location, "composite type is empty"))?;
            match key.as_str() {
                "array" => Ok(NativeType::List(Box::new(parse_type(inner, location)?))),
                "tuple" => Ok(NativeType::Tuple(Box::new(parse_type(inner, location)?))),
                "map" => Ok(NativeType::Dict(Box::new(parse_type(inner, location)?))),
                "optional" => Ok(NativeType::Optional(Box::new(parse_type(inner, location)?))),
                "union" => match inner {
                    JsonValue::Array(members) => {
                        let members = members
                            .iter()
                            .map(|m| parse_type(m, location))
                            .collect::<Result<Vec<_>>>()?;
                        Ok(NativeType::Union(members))
                    }
                    _ => Err(Error::model(location, "'union' must be an array of types")),
                },
                other => Err(Error::model(location, format!("unknown composite type '{}'", other))),
            }
        }
        _ => Err(Error::model(
            location,
            format!("invalid type definition: {}", value),
        )),
    }
}

/// Converts raw JSON defaults into values of the declared type
struct DefaultConverter<'a> {
    lookup: &'a HashMap<&'a str, &'a [FieldDeclaration]>,
    /// Record that `self` refers to
    owner: &'a str,
}

impl DefaultConverter<'_> {
    fn convert(&self, raw: &JsonValue, native_type: &NativeType, location: &str) -> Result<Value> {
        let mismatch = || {
            Error::model(
                location,
                format!("default {} is not a valid {}", raw, describe(native_type)),
            )
        };

        let value = match (native_type, raw) {
            (_, JsonValue::Null) if accepts_null(native_type) => Value::Null,
            (NativeType::Bool, JsonValue::Bool(b)) => Value::Boolean(*b),
            (NativeType::Int32, JsonValue::Number(n)) => {
                let n = n.as_i64().ok_or_else(mismatch)?;
                Value::Int(i32::try_from(n).map_err(|_| mismatch())?)
            }
            (NativeType::Int64, JsonValue::Number(n)) => Value::Long(n.as_i64().ok_or_else(mismatch)?),
            (NativeType::Float32, JsonValue::Number(n)) => Value::Float(n.as_f64().ok_or_else(mismatch)? as f32),
            (NativeType::Float64, JsonValue::Number(n)) => Value::Double(n.as_f64().ok_or_else(mismatch)?),
            (NativeType::Str, JsonValue::String(s)) => Value::String(s.clone()),
            (NativeType::Bytes, JsonValue::String(s)) => Value::Bytes(latin1(s).ok_or_else(mismatch)?),
            (NativeType::Fixed, JsonValue::String(s)) => Value::Fixed(latin1(s).ok_or_else(mismatch)?),
            (NativeType::Date, raw) => Value::Date(parse_date(raw).ok_or_else(mismatch)?),
            (NativeType::TimeMillis, raw) => Value::TimeMillis(parse_time(raw, 1_000).ok_or_else(mismatch)?),
            (NativeType::TimeMicros, raw) => Value::TimeMicros(parse_time(raw, 1_000_000).ok_or_else(mismatch)?),
            (NativeType::TimestampMillis, raw) => {
                Value::TimestampMillis(parse_timestamp(raw, 1_000).ok_or_else(mismatch)?)
            }
            (NativeType::TimestampMicros, raw) => {
                Value::TimestampMicros(parse_timestamp(raw, 1_000_000).ok_or_else(mismatch)?)
            }
            (NativeType::Uuid, JsonValue::String(s)) => {
                Value::Uuid(uuid::Uuid::parse_str(s).map_err(|_| mismatch())?)
            }
            (NativeType::Decimal, JsonValue::String(s)) => Value::Decimal(Decimal::parse(s).ok_or_else(mismatch)?),
            (NativeType::Enum { .. }, JsonValue::String(s)) => Value::Enum(s.clone()),
            (NativeType::List(items) | NativeType::Tuple(items), JsonValue::Array(values)) => {
                let mut converted = Vec::with_capacity(values.len());
                for (index, value) in values.iter().enumerate() {
                    converted.push(self.convert(value, items, &format!("{}[{}]", location, index))?);
                }
                Value::Array(converted)
            }
            (NativeType::Dict(values_type), JsonValue::Object(entries)) => {
                let mut converted = BTreeMap::new();
                for (key, value) in entries {
                    let value = self.convert(value, values_type, &format!("{}.{}", location, key))?;
                    converted.insert(key.clone(), value);
                }
                Value::Map(converted)
            }
            (NativeType::Optional(inner), raw) => self.convert(raw, inner, location)?,
            (NativeType::Union(members), raw) => self.convert_union(raw, members, location)?,
            (NativeType::Record(name), JsonValue::Object(obj)) => self.convert_record(obj, name, location)?,
            (NativeType::SelfRef, JsonValue::Object(obj)) => self.convert_record(obj, self.owner, location)?,
            _ => return Err(mismatch()),
        };
        Ok(value)
    }

    /// First member that accepts the default wins; a `$record` tag selects among records
    fn convert_union(&self, raw: &JsonValue, members: &[NativeType], location: &str) -> Result<Value> {
        let tagged = match raw {
            JsonValue::Object(obj) => obj.get(RECORD_TAG).and_then(JsonValue::as_str),
            _ => None,
        };
        for member in members {
            if let Some(tag) = tagged {
                let name = match member {
                    NativeType::Record(name) => name.as_str(),
                    NativeType::SelfRef => self.owner,
                    _ => continue,
                };
                if name != tag {
                    continue;
                }
            }
            if let Ok(value) = self.convert(raw, member, location) {
                return Ok(value);
            }
        }
        Err(Error::model(
            location,
            format!("default {} matches no member of the union", raw),
        ))
    }

    fn convert_record(&self, obj: &Map<String, JsonValue>, name: &str, location: &str) -> Result<Value> {
        let fields = self
            .lookup
            .get(name)
            .ok_or_else(|| Error::model(location, format!("default refers to undeclared record '{}'", name)))?;

        if let Some(tag) = obj.get(RECORD_TAG).and_then(JsonValue::as_str) {
            if tag != name {
                return Err(Error::model(location, format!("default is tagged '{}', expected '{}'", tag, name)));
            }
        }
        if let Some(unknown) = obj
            .keys()
            .find(|k| k.as_str() != RECORD_TAG && !fields.iter().any(|f| &f.name == *k))
        {
            return Err(Error::model(
                location,
                format!("'{}' is not a field of record '{}'", unknown, name),
            ));
        }

        let nested = DefaultConverter {
            lookup: self.lookup,
            owner: name,
        };
        let mut instance = Instance::new(name);
        for field in fields.iter() {
            if let Some(raw) = obj.get(&field.name) {
                let value = nested.convert(raw, &field.native_type, &format!("{}.{}", location, field.name))?;
                instance.fields.push((field.name.clone(), value));
            }
        }
        Ok(Value::Record(instance))
    }
}

fn accepts_null(native_type: &NativeType) -> bool {
    match native_type {
        NativeType::Null | NativeType::Optional(_) => true,
        NativeType::Union(members) => members.iter().any(accepts_null),
        _ => false,
    }
}

fn describe(native_type: &NativeType) -> String {
    match native_type {
        NativeType::Record(name) => format!("record '{}'", name),
        NativeType::Enum { name, .. } => format!("enum '{}'", name),
        other => format!("{:?}", other).to_lowercase(),
    }
}

/// ISO-8859-1 decoding: every char must fit in one byte
fn latin1(text: &str) -> Option<Bytes> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect::<Option<Vec<u8>>>()
        .map(Bytes::from)
}

/// `"YYYY-MM-DD"` or days since the Unix epoch
fn parse_date(raw: &JsonValue) -> Option<NaiveDate> {
    match raw {
        JsonValue::String(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").ok(),
        JsonValue::Number(n) => {
            let epoch = DateTime::<Utc>::UNIX_EPOCH.date_naive();
            epoch.checked_add_signed(Duration::days(n.as_i64()?))
        }
        _ => None,
    }
}

/// `"HH:MM:SS[.fraction]"` or units since midnight (`per_second` units per second)
fn parse_time(raw: &JsonValue, per_second: i64) -> Option<NaiveTime> {
    match raw {
        JsonValue::String(s) => NaiveTime::parse_from_str(s, "%H:%M:%S%.f").ok(),
        JsonValue::Number(n) => {
            let units = n.as_i64()?;
            if units < 0 {
                return None;
            }
            let seconds = u32::try_from(units / per_second).ok()?;
            let nanos = u32::try_from((units % per_second) * (1_000_000_000 / per_second)).ok()?;
            NaiveTime::from_num_seconds_from_midnight_opt(seconds, nanos)
        }
        _ => None,
    }
}

/// RFC 3339 text or units since the Unix epoch (`per_second` units per second)
fn parse_timestamp(raw: &JsonValue, per_second: i64) -> Option<DateTime<Utc>> {
    match raw {
        JsonValue::String(s) => DateTime::parse_from_rfc3339(s).ok().map(|t| t.with_timezone(&Utc)),
        JsonValue::Number(n) => {
            let units = n.as_i64()?;
            if per_second == 1_000 {
                DateTime::from_timestamp_millis(units)
            } else {
                DateTime::from_timestamp_micros(units)
            }
        }
        _ => None,
    }
}

fn get_string_field(obj: &Map<String, JsonValue>, field: &str, location: &str) -> Result<String> {
    match obj.get(field) {
        Some(JsonValue::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(JsonValue::String(_)) => Err(Error::model(location, format!("'{}' must not be empty", field))),
        Some(_) => Err(Error::model(location, format!("'{}' must be a string", field))),
        None => Err(Error::model(location, format!("required key '{}' is missing", field))),
    }
}

fn get_optional_string(obj: &Map<String, JsonValue>, field: &str, location: &str) -> Result<Option<String>> {
    match obj.get(field) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(Error::model(location, format!("'{}' must be a string", field))),
    }
}

fn get_optional_u32(obj: &Map<String, JsonValue>, field: &str, location: &str) -> Result<Option<u32>> {
    match obj.get(field) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Number(n)) => n
            .as_u64()
            .and_then(|u| u32::try_from(u).ok())
            .map(Some)
            .ok_or_else(|| Error::model(location, format!("'{}' must be a non-negative 32-bit integer", field))),
        Some(_) => Err(Error::model(location, format!("'{}' must be a number", field))),
    }
}

fn get_string_list(obj: &Map<String, JsonValue>, field: &str, location: &str) -> Result<Vec<String>> {
    match obj.get(field) {
        None | Some(JsonValue::Null) => Ok(Vec::new()),
        Some(JsonValue::Array(items)) => items
            .iter()
            .map(|item| match item {
                JsonValue::String(s) => Ok(s.clone()),
                _ => Err(Error::model(location, format!("'{}' must contain only strings", field))),
            })
            .collect(),
        Some(_) => Err(Error::model(location, format!("'{}' must be an array of strings", field))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::error::ErrorKind;
    use chrono::{Datelike, Timelike};
    use serde_json::json;
    use std::io::Write;

    const USER_MODEL: &str = r#"{
        "records": [
            {
                "name": "Address",
                "fields": [
                    {"name": "street", "type": "string"},
                    {"name": "street_number", "type": "int64"}
                ]
            },
            {
                "name": "User",
                "namespace": "app",
                "doc": "An user",
                "fields": [
                    {"name": "name", "type": "string"},
                    {"name": "age", "type": "int32", "default": 20},
                    {"name": "pets", "type": {"array": "string"}},
                    {"name": "address", "type": {"optional": "Address"}, "default": null},
                    {"name": "balance", "type": "decimal", "precision": 10, "scale": 2, "default": "10.50"},
                    {"name": "color", "type": {"enum": "Color", "symbols": ["BLUE", "RED"]}, "default": "RED"},
                    {"name": "md5", "type": "fixed", "size": 16},
                    {"name": "teammate", "type": {"optional": "self"}, "default": null}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_records_and_types() {
        let model = JsonModel::parse(USER_MODEL).unwrap();
        assert_eq!(model.names(), vec!["Address", "User"]);

        let user = model.definition("User").unwrap().unwrap();
        assert_eq!(user.namespace.as_deref(), Some("app"));
        assert_eq!(user.fields.len(), 8);
        assert_eq!(user.fields[2].native_type, NativeType::list(NativeType::Str));
        assert_eq!(
            user.fields[3].native_type,
            NativeType::optional(NativeType::record("Address"))
        );
        assert_eq!(user.fields[4].metadata.precision, Some(10));
        assert_eq!(user.fields[6].metadata.size, Some(16));
        assert_eq!(user.fields[7].native_type, NativeType::optional(NativeType::SelfRef));
        assert!(model.definition("Missing").unwrap().is_none());
    }

    #[test]
    fn test_defaults_follow_declared_type() {
        let model = JsonModel::parse(USER_MODEL).unwrap();
        let user = model.definition("User").unwrap().unwrap();

        match &user.fields[1].default {
            Some(FieldDefault::Value(Value::Int(20))) => {}
            other => panic!("unexpected default {:?}", other),
        }
        assert!(matches!(user.fields[3].default, Some(FieldDefault::Null)));
        match &user.fields[4].default {
            Some(FieldDefault::Value(Value::Decimal(d))) => assert_eq!(d.to_string(), "10.50"),
            other => panic!("unexpected default {:?}", other),
        }
        match &user.fields[5].default {
            Some(FieldDefault::Value(Value::Enum(symbol))) => assert_eq!(symbol, "RED"),
            other => panic!("unexpected default {:?}", other),
        }
        assert!(user.fields[0].default.is_none());
    }

    #[test]
    fn test_logical_defaults() {
        let model = JsonModel::from_value(&json!({
            "records": [{
                "name": "Event",
                "fields": [
                    {"name": "day", "type": "date", "default": "2019-10-12"},
                    {"name": "epoch_day", "type": "date", "default": 1},
                    {"name": "at", "type": "time-millis", "default": "17:57:42.100"},
                    {"name": "at_micros", "type": "time-micros", "default": 1500},
                    {"name": "when", "type": "timestamp-millis", "default": "2019-10-12T17:57:42Z"},
                    {"name": "id", "type": "uuid", "default": "d793fc4e-2eef-440a-a1ce-3e4b2b0e9cf7"},
                    {"name": "raw", "type": "bytes", "default": "ÿ\u{1}"}
                ]
            }]
        }))
        .unwrap();
        let event = model.definition("Event").unwrap().unwrap();
        let default = |i: usize| match &event.fields[i].default {
            Some(FieldDefault::Value(value)) => value.clone(),
            other => panic!("unexpected default {:?}", other),
        };

        match default(0) {
            Value::Date(date) => assert_eq!((date.year(), date.month(), date.day()), (2019, 10, 12)),
            other => panic!("unexpected value {}", other),
        }
        match default(1) {
            Value::Date(date) => assert_eq!(date, NaiveDate::from_ymd_opt(1970, 1, 2).unwrap()),
            other => panic!("unexpected value {}", other),
        }
        match default(2) {
            Value::TimeMillis(time) => assert_eq!(time.nanosecond(), 100_000_000),
            other => panic!("unexpected value {}", other),
        }
        match default(3) {
            Value::TimeMicros(time) => assert_eq!(time.nanosecond(), 1_500_000),
            other => panic!("unexpected value {}", other),
        }
        assert!(matches!(default(4), Value::TimestampMillis(_)));
        assert!(matches!(default(5), Value::Uuid(_)));
        assert_eq!(default(6), Value::Bytes(Bytes::from_static(&[0xff, 0x01])));
    }

    #[test]
    fn test_tagged_record_default_in_union() {
        let model = JsonModel::from_value(&json!({
            "records": [
                {"name": "Bus", "fields": [{"name": "engine_name", "type": "string"}]},
                {"name": "Car", "fields": [{"name": "engine_name", "type": "string"}]},
                {"name": "Trip", "fields": [{
                    "name": "mountain_trip",
                    "type": {"union": ["Bus", "Car"]},
                    "default": {"$record": "Car", "engine_name": "honda"}
                }]}
            ]
        }))
        .unwrap();
        let trip = model.definition("Trip").unwrap().unwrap();
        match &trip.fields[0].default {
            Some(FieldDefault::Value(Value::Record(instance))) => {
                assert_eq!(instance.record, "Car");
                assert_eq!(instance.get("engine_name"), Some(&Value::from("honda")));
            }
            other => panic!("unexpected default {:?}", other),
        }
    }

    #[test]
    fn test_malformed_documents() {
        let cases = [
            "[]",
            r#"{"records": {}}"#,
            r#"{"records": [{"fields": []}]}"#,
            r#"{"records": [{"name": "A", "fields": [{"name": "x"}]}]}"#,
            r#"{"records": [{"name": "A", "fields": [{"name": "x", "type": {"set": "int32"}}]}]}"#,
            r#"{"records": [{"name": "A", "fields": [{"name": "x", "type": "int32", "default": "ten"}]}]}"#,
            r#"{"records": [{"name": "A", "fields": []}, {"name": "A", "fields": []}]}"#,
            "not json",
        ];
        for case in cases {
            let err = JsonModel::parse(case).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Model, "case {}", case);
        }
    }

    #[test]
    fn test_int32_default_out_of_range() {
        let err = JsonModel::parse(
            r#"{"records": [{"name": "A", "fields": [{"name": "x", "type": "int32", "default": 4294967296}]}]}"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Model);
        assert!(err.to_string().contains("A.x"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(USER_MODEL.as_bytes()).unwrap();

        let model = JsonModel::load(file.path()).unwrap();
        assert_eq!(model.definitions().len(), 2);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonModel::load(dir.path().join("missing.json")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_provider_backs_registry() {
        let model = JsonModel::parse(USER_MODEL).unwrap();
        let registry = RecordRegistry::with_provider(model);
        let user = registry.resolve("User").unwrap();
        assert_eq!(user.fields.len(), 8);
        assert!(registry.contains("User"));
    }

    #[test]
    fn test_field_value_for_override() {
        let model = JsonModel::parse(USER_MODEL).unwrap();
        assert_eq!(model.field_value("User", "age", &json!(42)).unwrap(), Value::Int(42));
        assert_eq!(model.field_value("User", "address", &JsonValue::Null).unwrap(), Value::Null);

        let address = model
            .field_value("User", "address", &json!({"street": "Main", "street_number": 10}))
            .unwrap();
        let address = address.as_record().unwrap();
        assert_eq!(address.get("street_number"), Some(&Value::Long(10)));

        let err = model.field_value("User", "nickname", &json!("q")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Model);
        let err = model.field_value("Nobody", "age", &json!(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownRecord);
    }

    #[test]
    fn test_register_all() {
        let model: JsonModel = USER_MODEL.parse().unwrap();
        let registry = RecordRegistry::new();
        model.register_all(&registry).unwrap();
        assert_eq!(registry.names(), vec!["Address".to_string(), "User".to_string()]);
    }
}
