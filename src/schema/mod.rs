// Schema module for schemaforge
//
// This module turns record declarations into a canonical schema tree. It includes:
//
// 1. Type descriptor model and instance values
// 2. Field declarations and the field resolver
// 3. Record registry with on-demand model providers
// 4. Default value rules and the schema builder
// 5. JSON model file parser

// Re-export public types and functions
pub use self::builder::{BuilderConfig, SchemaBuilder};
pub use self::declaration::{
    FieldDeclaration, FieldDefault, FieldMetadata, ModelProvider, NativeType, RecordDefinition,
};
pub use self::defaults::conforms;
pub use self::parser::JsonModel;
pub use self::registry::RecordRegistry;
pub use self::resolver::FieldResolver;
pub use self::tree::{FieldNode, RecordNode, SchemaNode};
pub use self::types::{EnumType, Field, FixedType, LogicalType, PrimitiveKind, Record, TypeDescriptor};
pub use self::value::{Decimal, Instance, Value};

// Sub-modules
pub mod builder;
pub mod declaration;
pub mod defaults;
pub mod parser;
pub mod registry;
pub mod resolver;
pub mod tree;
pub mod types;
pub mod value;
