//! Success envelope and request body extractor shared by all endpoints.

use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use super::error::ApiError;

/// `{ "success": true, "status": 200, "message": "...", "data": ... }`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub status: u16,
    pub message: String,
    pub data: T,
}

pub type ApiResult<T> = Result<(StatusCode, Json<Envelope<T>>), ApiError>;

pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    respond(StatusCode::OK, "", data)
}

pub fn respond<T: Serialize>(status: StatusCode, message: &str, data: T) -> ApiResult<T> {
    Ok((
        status,
        Json(Envelope {
            success: true,
            status: status.as_u16(),
            message: message.to_owned(),
            data,
        }),
    ))
}

/// `{ "message": ... }`
#[derive(Debug, Serialize)]
pub struct MessageData<T> {
    pub message: T,
}

/// `{ "messages": [...] }`
#[derive(Debug, Serialize)]
pub struct MessagesData<T> {
    pub messages: Vec<T>,
}

/// JSON body extractor whose rejections use the API error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
