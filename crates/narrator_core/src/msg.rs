use std::path::PathBuf;

use crate::{GenerationToken, JobHandle, ModelChoice, ModelEntry, ProgressEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Application finished wiring; kicks off the catalog load.
    AppStarted,
    /// User picked a document to narrate.
    DocumentSelected(PathBuf),
    /// Extraction service returned the document text (or text was typed in).
    TextExtracted(String),
    /// Extraction service failed.
    ExtractionFailed(String),
    /// Catalog fetched, in server order.
    ModelsLoaded(Vec<ModelEntry>),
    /// Catalog could not be fetched; custom entry remains usable.
    CatalogUnavailable(String),
    /// User picked an option from the model list.
    ModelChosen(ModelChoice),
    /// User edited the custom model id box.
    CustomModelEdited(String),
    /// Caller names a model id directly; catalog entry if known, custom otherwise.
    ModelRequested(String),
    /// User asked for a new generation attempt.
    GenerateClicked,
    /// User abandoned the in-flight attempt.
    CancelClicked,
    /// Engine created the job for `token`.
    JobSubmitted {
        token: GenerationToken,
        handle: JobHandle,
    },
    /// Engine could not create the job for `token`.
    SubmissionFailed {
        token: GenerationToken,
        message: String,
    },
    /// Engine decoded a progress event for `token`.
    ProgressReceived {
        token: GenerationToken,
        event: ProgressEvent,
    },
    /// Progress transport for `token` ended without a terminal event.
    ChannelClosed { token: GenerationToken },
    NoOp,
}
