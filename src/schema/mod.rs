//! Schema module - field definitions, validation, and transcoding

pub mod registry;
pub mod transcode;

pub use registry::{DisplayField, DisplaySchema, FieldDef, FieldKind, SchemaRegistry, Widget};
