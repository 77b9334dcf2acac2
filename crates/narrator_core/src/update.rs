use crate::{AppState, CatalogStatus, Effect, ExtractionStatus, Msg};

/// Pure update function: applies a message to state and returns any effects.
///
/// Messages produced by the engine carry the token of the attempt they belong
/// to. Anything tagged with an older token is dropped here, which is what makes
/// closing a channel take effect immediately for the caller.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::AppStarted => {
            let needs_load = matches!(
                state.catalog(),
                CatalogStatus::NotLoaded | CatalogStatus::Unavailable(_)
            );
            if needs_load {
                state.begin_catalog_load();
                vec![Effect::FetchModels]
            } else {
                Vec::new()
            }
        }
        Msg::DocumentSelected(path) => {
            if *state.extraction() == ExtractionStatus::Extracting {
                return (state, Vec::new());
            }
            state.begin_extraction();
            vec![Effect::ExtractText { path }]
        }
        Msg::TextExtracted(text) => {
            state.set_text(text);
            Vec::new()
        }
        Msg::ExtractionFailed(message) => {
            state.fail_extraction(message);
            Vec::new()
        }
        Msg::ModelsLoaded(entries) => {
            state.apply_catalog(entries);
            Vec::new()
        }
        Msg::CatalogUnavailable(reason) => {
            state.apply_catalog_unavailable(reason);
            Vec::new()
        }
        Msg::ModelChosen(choice) => {
            state.choose_model(choice);
            Vec::new()
        }
        Msg::CustomModelEdited(input) => {
            state.edit_custom_model(input);
            Vec::new()
        }
        Msg::ModelRequested(input) => {
            state.request_model(&input);
            Vec::new()
        }
        Msg::GenerateClicked => {
            if state.is_in_flight() || *state.extraction() == ExtractionStatus::Extracting {
                return (state, Vec::new());
            }
            match state.generation_request() {
                Err(error) => {
                    state.reject(error);
                    Vec::new()
                }
                Ok(request) => {
                    let previous = state.current_token();
                    let token = state.begin_attempt();
                    let mut effects = Vec::with_capacity(2);
                    if previous != 0 {
                        effects.push(Effect::CloseProgress { token: previous });
                    }
                    effects.push(Effect::SubmitJob { token, request });
                    effects
                }
            }
        }
        Msg::CancelClicked => {
            if !state.job().is_active() {
                return (state, Vec::new());
            }
            let token = state.current_token();
            state.abandon_attempt();
            vec![Effect::CloseProgress { token }]
        }
        Msg::JobSubmitted { token, handle } => {
            if state.is_current(token) && state.apply_submitted(handle.job_id.clone()) {
                vec![Effect::OpenProgress {
                    token,
                    job_id: handle.job_id,
                }]
            } else {
                Vec::new()
            }
        }
        Msg::SubmissionFailed { token, message } => {
            if state.is_current(token) {
                state.apply_submission_failed(message);
            }
            Vec::new()
        }
        Msg::ProgressReceived { token, event } => {
            if state.is_current(token) && state.apply_progress(event) {
                vec![Effect::CloseProgress { token }]
            } else {
                Vec::new()
            }
        }
        Msg::ChannelClosed { token } => {
            if state.is_current(token) && state.apply_channel_closed() {
                vec![Effect::CloseProgress { token }]
            } else {
                Vec::new()
            }
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
