//! Export and import of profile containers.
//!
//! ```text
//! export: store → ExportPayload → ContainerCodec → file
//! import: file → ContainerCodec → conflict resolution → store
//! ```

mod export;
mod import;
mod naming;

pub use export::Exporter;
pub use import::{
    ConflictRecord, ImportFailure, ImportOptions, ImportResult, ImportSummary, Importer,
    RenamedProfile,
};
pub use naming::alternative_name;
