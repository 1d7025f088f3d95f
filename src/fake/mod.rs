// Fake instance generation for schemaforge
//
// Produces random instances that conform to the schema the builder emits for
// the same record, with caller overrides for top-level fields.

pub use self::config::GeneratorConfig;
pub use self::generator::FakeGenerator;

pub mod config;
pub mod generator;
