// Schema builder for schemaforge
//
// Walks the type descriptors of a record, and of every record it references,
// and emits the schema tree. Each named type (record, enum, fixed) is expanded
// the first time it is met during one `build` call; later occurrences become
// back-references by full name, which is what terminates self-reference and
// keeps every name defined once.

use std::collections::HashMap;

use log::debug;
use serde_json::Value as JsonValue;

use crate::internal::error::{Error, Result};
use crate::schema::defaults::{check_field_default, ordered_members};
use crate::schema::registry::RecordRegistry;
use crate::schema::tree::{FieldNode, RecordNode, SchemaNode};
use crate::schema::types::{Field, TypeDescriptor};
use crate::schema::value::Value;

/// Configuration for schema building
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Require a union field's default to match the first union member.
    ///
    /// Avro-style encodings need this; turn it off for formats that do not.
    pub enforce_union_default_order: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            enforce_union_default_order: true,
        }
    }
}

/// A named type already emitted in the tree being built
struct Defined {
    full_name: String,
    /// `None` for records, the descriptor for enums and fixed types
    descriptor: Option<TypeDescriptor>,
}

/// Names emitted so far during one `build`
#[derive(Default)]
struct BuildState {
    /// Bare name to definition
    defined: HashMap<String, Defined>,
    /// Namespace inherited by nested named types
    namespace: Option<String>,
    /// Record whose fields are being built
    current: String,
}

impl BuildState {
    fn qualify(&self, name: &str) -> String {
        match &self.namespace {
            Some(ns) if !ns.is_empty() => format!("{}.{}", ns, name),
            _ => name.to_string(),
        }
    }

    fn define(&mut self, name: &str, full_name: String, descriptor: Option<TypeDescriptor>) {
        self.defined.insert(name.to_string(), Defined { full_name, descriptor });
    }
}

/// Schema builder over a record registry
#[derive(Debug)]
pub struct SchemaBuilder<'r> {
    registry: &'r RecordRegistry,
    config: BuilderConfig,
}

impl<'r> SchemaBuilder<'r> {
    /// Creates a new schema builder with default configuration
    pub fn new(registry: &'r RecordRegistry) -> Self {
        Self {
            registry,
            config: BuilderConfig::default(),
        }
    }

    /// Creates a new schema builder with custom configuration
    pub fn with_config(registry: &'r RecordRegistry, config: BuilderConfig) -> Self {
        Self { registry, config }
    }

    /// Builds the schema tree rooted at `record_name`
    pub fn build(&self, record_name: &str) -> Result<SchemaNode> {
        let mut state = BuildState::default();
        let node = self.build_record(record_name, &mut state)?;
        debug!(
            "Built schema for '{}' defining {} named type(s)",
            record_name,
            state.defined.len()
        );
        Ok(node)
    }

    /// Builds the schema tree and renders it as Avro JSON
    pub fn build_json(&self, record_name: &str) -> Result<JsonValue> {
        Ok(self.build(record_name)?.to_json())
    }

    fn build_record(&self, name: &str, state: &mut BuildState) -> Result<SchemaNode> {
        let record = self.registry.resolve(name)?;

        // A record without a namespace inherits the enclosing one
        let outer = state.namespace.clone();
        let enclosing = std::mem::replace(&mut state.current, record.name.clone());
        if record.namespace.is_some() {
            state.namespace = record.namespace.clone();
        }
        let full_name = match record.namespace {
            Some(_) => record.full_name(),
            None => state.qualify(&record.name),
        };
        state.define(&record.name, full_name, None);

        let mut fields = Vec::with_capacity(record.fields.len());
        for field in &record.fields {
            check_field_default(&record, field, self.config.enforce_union_default_order)?;
            fields.push(FieldNode {
                name: field.name.clone(),
                node: self.build_field_type(field, state)?,
                default: field.default.as_ref().map(Value::to_json),
                doc: field.doc.clone(),
                aliases: field.aliases.clone(),
            });
        }
        state.namespace = outer;
        state.current = enclosing;

        Ok(SchemaNode::Record(RecordNode {
            name: record.name.clone(),
            namespace: record.namespace.clone(),
            doc: record.doc.clone(),
            aliases: record.aliases.clone(),
            fields,
        }))
    }

    /// A field's top-level union is ordered according to its default
    fn build_field_type(&self, field: &Field, state: &mut BuildState) -> Result<SchemaNode> {
        if field.field_type.is_union_like() {
            let members = ordered_members(&field.field_type, field.default.as_ref());
            return self.build_union(&members, state);
        }
        self.build_type(&field.field_type, state)
    }

    fn build_union(&self, members: &[&TypeDescriptor], state: &mut BuildState) -> Result<SchemaNode> {
        let mut nodes = Vec::with_capacity(members.len());
        for member in members {
            nodes.push(self.build_type(member, state)?);
        }
        Ok(SchemaNode::Union { members: nodes })
    }

    /// Returns a back-reference if `name` is already defined as exactly `descriptor`.
    ///
    /// Reusing a name for a different type is a schema error.
    fn named_reference(
        &self,
        name: &str,
        descriptor: &TypeDescriptor,
        state: &BuildState,
    ) -> Result<Option<SchemaNode>> {
        match state.defined.get(name) {
            None => Ok(None),
            Some(defined) if defined.descriptor.as_ref() == Some(descriptor) => Ok(Some(SchemaNode::Ref {
                name: defined.full_name.clone(),
            })),
            Some(_) => Err(conflicting_name(name, state)),
        }
    }

    fn build_type(&self, descriptor: &TypeDescriptor, state: &mut BuildState) -> Result<SchemaNode> {
        let node = match descriptor {
            TypeDescriptor::Primitive(kind) => SchemaNode::Primitive { kind: *kind },
            TypeDescriptor::Logical(kind) => SchemaNode::Logical { kind: *kind },
            TypeDescriptor::Fixed(fixed) => match self.named_reference(&fixed.name, descriptor, state)? {
                Some(reference) => reference,
                None => {
                    let full_name = state.qualify(&fixed.name);
                    state.define(&fixed.name, full_name, Some(descriptor.clone()));
                    SchemaNode::Fixed {
                        name: fixed.name.clone(),
                        size: fixed.size,
                    }
                }
            },
            TypeDescriptor::Enum(enum_type) => match self.named_reference(&enum_type.name, descriptor, state)? {
                Some(reference) => reference,
                None => {
                    let full_name = state.qualify(&enum_type.name);
                    state.define(&enum_type.name, full_name, Some(descriptor.clone()));
                    SchemaNode::Enum {
                        name: enum_type.name.clone(),
                        symbols: enum_type.symbols.clone(),
                        default: enum_type.default.clone(),
                    }
                }
            },
            TypeDescriptor::Array(items) => SchemaNode::Array {
                items: Box::new(self.build_type(items, state)?),
            },
            TypeDescriptor::Map(values) => SchemaNode::Map {
                values: Box::new(self.build_type(values, state)?),
            },
            TypeDescriptor::Union(_) | TypeDescriptor::Optional(_) => {
                self.build_union(&descriptor.members(), state)?
            }
            TypeDescriptor::RecordRef(name) => match state.defined.get(name) {
                Some(Defined {
                    full_name,
                    descriptor: None,
                }) => SchemaNode::Ref {
                    name: full_name.clone(),
                },
                Some(_) => return Err(conflicting_name(name, state)),
                None => self.build_record(name, state)?,
            },
        };
        Ok(node)
    }
}

fn conflicting_name(name: &str, state: &BuildState) -> Error {
    Error::schema(
        &state.current,
        None,
        format!("name '{}' is already defined as a different type", name),
    )
}
