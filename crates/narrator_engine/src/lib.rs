//! Narrator engine: HTTP clients for the generation service and the
//! runtime that executes core effects.
mod catalog;
mod decode;
mod download;
mod engine;
mod extract;
mod persist;
mod progress;
mod settings;
mod sse;
mod submit;
mod types;

pub use catalog::{ModelCatalog, ReqwestModelCatalog};
pub use decode::{decode_progress_event, DecodeError};
pub use download::ArtifactDownloader;
pub use engine::{EngineHandle, EngineServices};
pub use extract::{ReqwestTextExtractor, TextExtractor, SUPPORTED_EXTENSIONS};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use progress::{ProgressChannel, ProgressSource, ReqwestProgressSource};
pub use settings::{EngineSettings, ServiceEndpoints};
pub use sse::SseDecoder;
pub use submit::{JobSubmitter, ReqwestJobSubmitter};
pub use types::{
    CatalogUnavailable, ChannelOpenError, DownloadError, EngineError, EngineEvent,
    ExtractionError, HttpDetail, SubmissionError,
};
