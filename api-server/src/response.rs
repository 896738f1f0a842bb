use actix_web::{http::StatusCode, HttpResponse};
use serde::Serialize;

pub(crate) fn json_error_with_code(
    status: StatusCode,
    message: impl Into<String>,
    error_code: Option<&str>,
) -> HttpResponse {
    let mut body = serde_json::json!({
        "success": false,
        "error": message.into(),
    });
    if let Some(code) = error_code {
        body["error_code"] = serde_json::Value::String(code.to_string());
    }
    HttpResponse::build(status).json(body)
}

/// 400 from a `(message, error_code)` validation failure.
pub(crate) fn bad_request((message, code): (String, &'static str)) -> HttpResponse {
    json_error_with_code(StatusCode::BAD_REQUEST, message, Some(code))
}

pub(crate) fn json_ok<T: Serialize>(body: &T) -> HttpResponse {
    HttpResponse::Ok().json(body)
}
