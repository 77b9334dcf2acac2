//! Narrator core: the generation-job state machine and view-model helpers.
//!
//! Everything in here is pure. IO is requested through [`Effect`] values and
//! its results come back as [`Msg`] values tagged with a [`GenerationToken`].
mod artifact;
mod effect;
mod event;
mod model;
mod msg;
mod request;
mod state;
mod update;
mod view_model;

pub use artifact::{ArtifactError, ArtifactResolver, AudioLocator};
pub use effect::Effect;
pub use event::ProgressEvent;
pub use model::{ModelChoice, ModelEntry, ModelSelection, CUSTOM_MODEL_LABEL};
pub use msg::Msg;
pub use request::{GenerationRequest, GenerationToken, JobHandle, ValidationError};
pub use state::{AppState, CatalogStatus, ExtractionStatus, JobState};
pub use update::update;
pub use view_model::{AppViewModel, ModelOptionView, TEXT_PREVIEW_CHARS};
