//! Uniform success envelope
//!
//! Every gateway operation answers `{status, ...payload}`. Failures take the
//! same shape through [`crate::error::ApiError`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// `{status: 200, ...body}` with `body`'s fields flattened in
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    status: u16,
    #[serde(flatten)]
    body: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(body: T) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            body,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Dealers {
        dealers: Vec<u32>,
    }

    #[test]
    fn test_body_fields_are_flattened() {
        let value = serde_json::to_value(Envelope::ok(Dealers { dealers: vec![1, 2] })).unwrap();
        assert_eq!(value, json!({"status": 200, "dealers": [1, 2]}));
    }
}
