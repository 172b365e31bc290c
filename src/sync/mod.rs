pub mod exporter;
pub mod syncer;

pub use exporter::ApiExporter;
pub use syncer::ContentSyncer;
