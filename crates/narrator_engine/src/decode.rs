use narrator_core::ProgressEvent;
use serde::Deserialize;

/// Fallback when the service reports an error without saying what went wrong.
const UNSPECIFIED_ERROR: &str = "generation failed";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("not a progress message: {0}")]
    Json(String),
    #[error("non-conforming progress message: {0}")]
    NonConforming(&'static str),
}

#[derive(Debug, Deserialize)]
struct WireProgress {
    status: String,
    #[serde(default)]
    percent: Option<f64>,
    #[serde(default, alias = "audioRef", alias = "audio_ref")]
    audio_url: Option<String>,
    #[serde(default, alias = "errorMessage", alias = "error_message")]
    error: Option<String>,
}

/// Decode one `data:` payload of the progress stream.
///
/// `queued`, `running`, `complete` and `error` are matched case-insensitively.
/// Any other status is free-form progress text and becomes `Running` with that
/// text as its detail.
pub fn decode_progress_event(payload: &str) -> Result<ProgressEvent, DecodeError> {
    let wire: WireProgress =
        serde_json::from_str(payload).map_err(|err| DecodeError::Json(err.to_string()))?;

    let status = wire.status.trim();
    if status.is_empty() {
        return Err(DecodeError::NonConforming("empty status"));
    }
    let audio_ref = non_blank(wire.audio_url);
    let error = non_blank(wire.error);

    if status.eq_ignore_ascii_case("complete") {
        if error.is_some() {
            return Err(DecodeError::NonConforming("error message on complete"));
        }
        let audio_ref = audio_ref.ok_or(DecodeError::NonConforming("complete without audio"))?;
        return Ok(ProgressEvent::Complete { audio_ref });
    }

    if status.eq_ignore_ascii_case("error") {
        if audio_ref.is_some() {
            return Err(DecodeError::NonConforming("audio reference on error"));
        }
        let message = error.unwrap_or_else(|| UNSPECIFIED_ERROR.to_string());
        return Ok(ProgressEvent::Error { message });
    }

    if audio_ref.is_some() || error.is_some() {
        return Err(DecodeError::NonConforming("terminal payload on progress"));
    }
    let percent = clamp_percent(wire.percent);
    if status.eq_ignore_ascii_case("queued") {
        Ok(ProgressEvent::Queued { percent })
    } else if status.eq_ignore_ascii_case("running") {
        Ok(ProgressEvent::Running {
            percent,
            detail: None,
        })
    } else {
        Ok(ProgressEvent::Running {
            percent,
            detail: Some(status.to_string()),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn clamp_percent(percent: Option<f64>) -> u8 {
    percent.map_or(0, |value| value.clamp(0.0, 100.0) as u8)
}
