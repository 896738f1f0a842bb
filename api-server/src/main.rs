mod config;
mod events;
mod handlers;
mod response;
mod types;

use actix_cors::Cors;
use actix_web::{http::StatusCode, middleware, web, App, HttpServer};

use crate::config::{AppState, ServerConfig};
use crate::handlers::{
    drain_events, get_encoded_state, get_state, health, reset_game, start_game, step,
    update_settings,
};
use crate::response::json_error_with_code;

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/api/start", web::post().to(start_game))
        .route("/api/reset", web::post().to(reset_game))
        .route("/api/step", web::post().to(step))
        .route("/api/state", web::get().to(get_state))
        .route("/api/encoded-state", web::get().to(get_encoded_state))
        .route("/api/settings", web::put().to(update_settings))
        .route("/api/events", web::get().to(drain_events));
}

fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            let response = json_error_with_code(
                StatusCode::BAD_REQUEST,
                format!("invalid json body: {err}"),
                Some("invalid_json"),
            );
            actix_web::error::InternalError::from_response(err, response).into()
        })
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(
        "starting footsies api: bind_addr={} max_step_frames={} model_id={:?} frame_skip={} observation_delay={} control={:?}",
        config.bind_addr,
        config.max_step_frames,
        config.policy.model_id,
        config.policy.frame_skip,
        config.policy.observation_delay,
        config.control
    );

    let state = AppState::new(&config);
    let json_limit = config.json_limit_bytes;

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(json_config(json_limit))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(routes)
    })
    .bind(config.bind_addr.as_str())?
    .run()
    .await
}
