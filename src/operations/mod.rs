//! Invocable operations ("tools"): registry, declarative schemas and validation

pub mod registry;
pub mod schema;

pub use registry::{Operation, OperationHandler, OperationMetadata, OperationRegistry};
pub use schema::{ArgValue, FieldType, InputSchema, ValidatedInput};
