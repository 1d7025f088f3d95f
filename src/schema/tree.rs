// Schema tree for schemaforge
//
// The schema tree is the canonical, format-agnostic output of the schema
// builder. `to_json` renders it in Avro's JSON schema notation.

use serde_json::{json, Map, Value as JsonValue};

use crate::schema::types::{LogicalType, PrimitiveKind};

/// A field of a record node
#[derive(Debug, Clone, PartialEq)]
pub struct FieldNode {
    /// Field name
    pub name: String,
    /// Field type
    pub node: SchemaNode,
    /// Default, already encoded for the target notation
    pub default: Option<JsonValue>,
    /// Field documentation
    pub doc: Option<String>,
    /// Alternative names
    pub aliases: Vec<String>,
}

/// A fully expanded record
#[derive(Debug, Clone, PartialEq)]
pub struct RecordNode {
    pub name: String,
    pub namespace: Option<String>,
    pub doc: Option<String>,
    pub aliases: Vec<String>,
    /// Fields in declaration order
    pub fields: Vec<FieldNode>,
}

impl RecordNode {
    /// Looks up a field node by name
    pub fn field(&self, name: &str) -> Option<&FieldNode> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One node of the schema tree
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Record(RecordNode),
    Enum {
        name: String,
        symbols: Vec<String>,
        default: Option<String>,
    },
    Fixed {
        name: String,
        size: usize,
    },
    Array {
        items: Box<SchemaNode>,
    },
    Map {
        values: Box<SchemaNode>,
    },
    Union {
        members: Vec<SchemaNode>,
    },
    Logical {
        kind: LogicalType,
    },
    Primitive {
        kind: PrimitiveKind,
    },
    /// Back-reference by full name to a named type expanded earlier in the same tree
    Ref {
        name: String,
    },
}

impl SchemaNode {
    /// Returns the record node, if this is an expanded record
    pub fn as_record(&self) -> Option<&RecordNode> {
        match self {
            SchemaNode::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Returns the union members, if this is a union
    pub fn union_members(&self) -> Option<&[SchemaNode]> {
        match self {
            SchemaNode::Union { members } => Some(members),
            _ => None,
        }
    }

    /// Renders the tree in Avro JSON schema notation
    pub fn to_json(&self) -> JsonValue {
        match self {
            SchemaNode::Record(record) => {
                let mut obj = Map::new();
                obj.insert("type".to_string(), json!("record"));
                obj.insert("name".to_string(), json!(record.name));
                if let Some(namespace) = &record.namespace {
                    obj.insert("namespace".to_string(), json!(namespace));
                }
                if let Some(doc) = &record.doc {
                    obj.insert("doc".to_string(), json!(doc));
                }
                if !record.aliases.is_empty() {
                    obj.insert("aliases".to_string(), json!(record.aliases));
                }
                let fields: Vec<JsonValue> = record.fields.iter().map(field_to_json).collect();
                obj.insert("fields".to_string(), JsonValue::Array(fields));
                JsonValue::Object(obj)
            }
            SchemaNode::Enum { name, symbols, default } => {
                let mut obj = Map::new();
                obj.insert("type".to_string(), json!("enum"));
                obj.insert("name".to_string(), json!(name));
                obj.insert("symbols".to_string(), json!(symbols));
                if let Some(default) = default {
                    obj.insert("default".to_string(), json!(default));
                }
                JsonValue::Object(obj)
            }
            SchemaNode::Fixed { name, size } => json!({
                "type": "fixed",
                "name": name,
                "size": size,
            }),
            SchemaNode::Array { items } => json!({
                "type": "array",
                "items": items.to_json(),
            }),
            SchemaNode::Map { values } => json!({
                "type": "map",
                "values": values.to_json(),
            }),
            SchemaNode::Union { members } => JsonValue::Array(members.iter().map(SchemaNode::to_json).collect()),
            SchemaNode::Logical { kind } => {
                let mut obj = Map::new();
                obj.insert("type".to_string(), json!(kind.physical().avro_name()));
                obj.insert("logicalType".to_string(), json!(kind.name()));
                if let LogicalType::Decimal { precision, scale } = kind {
                    obj.insert("precision".to_string(), json!(precision));
                    obj.insert("scale".to_string(), json!(scale));
                }
                JsonValue::Object(obj)
            }
            SchemaNode::Primitive { kind } => json!(kind.avro_name()),
            SchemaNode::Ref { name } => json!(name),
        }
    }
}

fn field_to_json(field: &FieldNode) -> JsonValue {
    let mut obj = Map::new();
    obj.insert("name".to_string(), json!(field.name));
    obj.insert("type".to_string(), field.node.to_json());
    if let Some(default) = &field.default {
        obj.insert("default".to_string(), default.clone());
    }
    if let Some(doc) = &field.doc {
        obj.insert("doc".to_string(), json!(doc));
    }
    if !field.aliases.is_empty() {
        obj.insert("aliases".to_string(), json!(field.aliases));
    }
    JsonValue::Object(obj)
}
