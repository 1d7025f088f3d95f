// schemaforge library entry point
//
// Derives Avro-style schema trees from record declarations and generates fake
// instances that conform to them.

pub mod fake;
pub mod internal;
pub mod schema;

pub use crate::fake::{FakeGenerator, GeneratorConfig};
pub use crate::internal::error::{Error, ErrorKind, Result};
pub use crate::schema::{
    BuilderConfig, FieldDeclaration, Instance, JsonModel, NativeType, RecordDefinition, RecordRegistry,
    SchemaBuilder, SchemaNode, Value,
};
