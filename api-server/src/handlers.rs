use std::sync::Arc;

use actix_web::{
    http::StatusCode,
    web::{Data, Json},
    Responder,
};
use footsies_core::{button, PolicySettings};

use crate::config::AppState;
use crate::response::{bad_request, json_error_with_code, json_ok};
use crate::types::{
    EncodedStateResponse, EventsResponse, HealthResponse, SessionResponse, SettingsResponse,
    StateResponse, StepRequest,
};

/// Returns `(error_message, error_code)` on failure.
pub(crate) fn validate_step(
    request: &StepRequest,
    max_step_frames: u32,
) -> Result<(u8, u8, u32), (String, &'static str)> {
    if request.n_frames == 0 || request.n_frames > max_step_frames {
        return Err((
            format!("n_frames must be between 1 and {max_step_frames}"),
            "invalid_n_frames",
        ));
    }
    let action = |name: &str, value: u32| {
        u8::try_from(value)
            .ok()
            .filter(|bits| bits & !button::MASK == 0)
            .ok_or_else(|| {
                (
                    format!("{name} must be an input bitmask in 0..={}", button::MASK),
                    "invalid_action",
                )
            })
    };
    Ok((
        action("p1_action", request.p1_action)?,
        action("p2_action", request.p2_action)?,
        request.n_frames,
    ))
}

/// Returns `(error_message, error_code)` on failure.
pub(crate) fn validate_settings(settings: &PolicySettings) -> Result<(), (String, &'static str)> {
    settings
        .validate()
        .map_err(|err| (format!("invalid settings: {err}"), "invalid_settings"))
}

pub(crate) async fn health(state: Data<AppState>) -> impl Responder {
    let session = state.session.lock().await;
    json_ok(&HealthResponse {
        status: "healthy",
        service: "footsies-api",
        running: session.is_running(),
        ticks: session.ticks(),
        policy_loaded: session.policy().is_loaded(),
        settings: session.settings().clone(),
        max_step_frames: state.max_step_frames,
        buffered_events: state.events.len(),
        model_root: state
            .model_root
            .as_ref()
            .map(|path| path.display().to_string()),
    })
}

pub(crate) async fn start_game(state: Data<AppState>) -> impl Responder {
    let mut session = state.session.lock().await;
    session.start_game();
    json_ok(&SessionResponse {
        success: true,
        running: session.is_running(),
    })
}

pub(crate) async fn reset_game(state: Data<AppState>) -> impl Responder {
    let mut session = state.session.lock().await;
    session.reset_game();
    json_ok(&SessionResponse {
        success: true,
        running: session.is_running(),
    })
}

pub(crate) async fn step(state: Data<AppState>, body: Json<StepRequest>) -> impl Responder {
    let (p1, p2, n_frames) = match validate_step(&body, state.max_step_frames) {
        Ok(step) => step,
        Err(err) => return bad_request(err),
    };

    // Stepping runs per-frame inference; keep it off the actix worker.
    let mut session = Arc::clone(&state.session).lock_owned().await;
    let stepped = tokio::task::spawn_blocking(move || {
        let running = session.is_running();
        (running, session.step_n_frames(p1, p2, n_frames))
    })
    .await;
    let (running, game_state) = match stepped {
        Ok(stepped) => stepped,
        Err(err) => {
            tracing::error!(error = %err, "step worker join failure");
            return json_error_with_code(
                StatusCode::INTERNAL_SERVER_ERROR,
                "step worker failed",
                Some("step_failed"),
            );
        }
    };
    tracing::debug!(p1, p2, n_frames, frame = game_state.frame_count, "stepped");
    json_ok(&StateResponse {
        success: true,
        running,
        state: game_state,
    })
}

pub(crate) async fn get_state(state: Data<AppState>) -> impl Responder {
    let session = state.session.lock().await;
    json_ok(&StateResponse {
        success: true,
        running: session.is_running(),
        state: session.get_state(),
    })
}

pub(crate) async fn get_encoded_state(state: Data<AppState>) -> impl Responder {
    let session = state.session.lock().await;
    json_ok(&EncodedStateResponse {
        success: true,
        running: session.is_running(),
        encoded: session.get_encoded_state(),
    })
}

pub(crate) async fn update_settings(
    state: Data<AppState>,
    body: Json<PolicySettings>,
) -> impl Responder {
    let settings = body.into_inner();
    if let Err(err) = validate_settings(&settings) {
        return bad_request(err);
    }

    let mut session = state.session.lock().await;
    session.update_settings(settings);
    tracing::info!(
        model_id = %session.settings().model_id,
        loaded = session.policy().is_loaded(),
        "policy settings updated"
    );
    json_ok(&SettingsResponse {
        success: true,
        settings: session.settings().clone(),
        policy_loaded: session.policy().is_loaded(),
    })
}

pub(crate) async fn drain_events(state: Data<AppState>) -> impl Responder {
    json_ok(&EventsResponse {
        success: true,
        events: state.events.drain(),
    })
}
