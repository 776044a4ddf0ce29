use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Response envelope every endpoint returns, success or failure.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub errors: Option<String>,
    pub data: T,
}

/// Successful handler result: status code plus the `data` payload.
pub struct ApiOk<T>(pub StatusCode, pub T);

impl<T: Serialize> IntoResponse for ApiOk<T> {
    fn into_response(self) -> Response {
        let ApiOk(status, data) = self;
        let body = Envelope {
            success: true,
            status_code: status.as_u16(),
            errors: None,
            data,
        };
        (status, Json(body)).into_response()
    }
}
