//! Export Archives
//!
//! Serializes an agent definition and its language resources into the zip
//! archive format the remote platform imports, and reads such archives back
//! into the model.

pub mod archive;
pub mod render;
pub mod schema;

pub use archive::{
    export_to_file, export_to_vec, export_to_writer, import_from_file, import_from_reader,
};
pub use render::{ExportOptions, RICH_RESPONSE_PLATFORMS};
