use std::path::PathBuf;

use crate::{GenerationRequest, GenerationToken};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchModels,
    ExtractText {
        path: PathBuf,
    },
    SubmitJob {
        token: GenerationToken,
        request: GenerationRequest,
    },
    OpenProgress {
        token: GenerationToken,
        job_id: String,
    },
    /// Idempotent; closing an unknown or finished channel is a no-op.
    CloseProgress {
        token: GenerationToken,
    },
}
