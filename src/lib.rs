pub mod types;
pub mod error;
pub mod config;
pub mod utils;
pub mod remote;
pub mod storage;
pub mod sync;
pub mod aggregate;
pub mod pipeline;

pub use types::*;
pub use error::{Result, SyncError};
pub use pipeline::IngestPipeline;
