// Internal building blocks shared by the schema and fake modules

pub mod error;
